// src/routes/daily.rs
use crate::auth::{AdminUser, AuthUser};
use crate::cache::ContentCache;
use crate::db;
use crate::db::content::OrderedTable;
use crate::error::AppError;
use crate::models::content::{
    Affirmation, Aphorism, DailyContentInput, DailyContentView, DailyIncrementResult,
};
use crate::ordering;
use crate::routes::{not_found_unless, require_positive};
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(today);
    cfg.service(increment_all);
    cfg.service(list_daily_contents);
    cfg.service(create_daily_content);
    cfg.service(get_daily_content);
    cfg.service(update_daily_content);
    cfg.service(delete_daily_content);
}

/// Resolves the bundle at `day_order`, going through the cache.
async fn view_for_order(
    pool: &PgPool,
    cache: &ContentCache,
    day_order: i32,
) -> Result<Option<DailyContentView>, AppError> {
    if let Some(view) = cache.daily(day_order).await {
        return Ok(Some(view));
    }

    let Some(daily) = db::daily::get_daily_content_by_order(pool, day_order).await? else {
        return Ok(None);
    };
    let affirmation: Affirmation =
        db::content::get_ordered(pool, OrderedTable::Affirmations, daily.affirmation_id)
            .await?
            .ok_or(AppError::NotFound("Affirmation"))?;
    let aphorism: Aphorism =
        db::content::get_ordered(pool, OrderedTable::Aphorisms, daily.aphorism_id)
            .await?
            .ok_or(AppError::NotFound("Aphorism"))?;

    let view = DailyContentView {
        id: daily.id,
        day_order: daily.day_order,
        affirmation,
        aphorism,
    };
    cache.put_daily(view.clone()).await;
    Ok(Some(view))
}

#[get("/daily-contents/today")]
pub async fn today(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    caller: AuthUser,
) -> Result<HttpResponse, AppError> {
    let user = crate::routes::users::load_active_user(&pool, &caller).await?;
    let view = view_for_order(&pool, &cache, user.daily_content_order)
        .await?
        .ok_or(AppError::NotFound("Daily content"))?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/daily-contents/increment-all")]
pub async fn increment_all(
    pool: web::Data<PgPool>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let mut tx = pool.begin().await?;
    let outcome = db::daily::increment_daily_content_for_all_users(&mut *tx).await?;
    let Some(max_day_order) = outcome.max_day_order else {
        return Err(AppError::Conflict("No daily content to rotate through".into()));
    };

    db::audit::record_batch(
        &mut *tx,
        "increment_daily_content",
        Some(admin.0.id),
        outcome.updated,
        outcome.skipped,
        json!({ "max_day_order": max_day_order }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        "Daily content advanced for {} users ({} skipped, max order {})",
        outcome.updated,
        outcome.skipped,
        max_day_order
    );
    Ok(HttpResponse::Ok().json(DailyIncrementResult {
        updated_count: outcome.updated,
        skipped_count: outcome.skipped,
        max_day_order,
    }))
}

#[get("/daily-contents")]
pub async fn list_daily_contents(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::daily::list_daily_contents(&pool).await?))
}

#[get("/daily-contents/{id}")]
pub async fn get_daily_content(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let daily = db::daily::get_daily_content(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Daily content"))?;
    Ok(HttpResponse::Ok().json(daily))
}

#[post("/daily-contents")]
pub async fn create_daily_content(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    req: web::Json<DailyContentInput>,
) -> Result<HttpResponse, AppError> {
    require_positive("day_order", req.day_order)?;
    let day_order = match req.day_order {
        Some(order) => order,
        None => ordering::next_order(db::daily::get_max_day_order(pool.get_ref()).await?),
    };

    let id = Uuid::new_v4();
    db::daily::insert_daily_content(&pool, id, &req, day_order).await?;
    cache.invalidate_daily();

    let daily = db::daily::get_daily_content(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Daily content"))?;
    Ok(HttpResponse::Created().json(daily))
}

#[put("/daily-contents/{id}")]
pub async fn update_daily_content(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<DailyContentInput>,
) -> Result<HttpResponse, AppError> {
    require_positive("day_order", req.day_order)?;
    let id = path.into_inner();
    not_found_unless(db::daily::update_daily_content(&pool, id, &req).await?, "Daily content")?;
    cache.invalidate_daily();

    let daily = db::daily::get_daily_content(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Daily content"))?;
    Ok(HttpResponse::Ok().json(daily))
}

#[delete("/daily-contents/{id}")]
pub async fn delete_daily_content(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(
        db::daily::delete_daily_content(&pool, path.into_inner()).await?,
        "Daily content",
    )?;
    cache.invalidate_daily();
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{ADMIN_ROLE, USER_ROLE};
    use crate::test_support::{bearer, lazy_pool, test_accounts, test_cache, test_tokens};
    use actix_web::{App, http::StatusCode, test};
    use chrono::Utc;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(test_tokens()))
                    .app_data(web::Data::new(test_accounts()))
                    .app_data(web::Data::new(test_cache()))
                    .app_data(crate::routes::json_config())
                    .configure(init_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn cached_bundle_is_served_without_the_database() {
        let cache = test_cache();
        let now = Utc::now();
        cache
            .put_daily(DailyContentView {
                id: Uuid::new_v4(),
                day_order: 3,
                affirmation: Affirmation {
                    id: Uuid::new_v4(),
                    text: "I am enough".into(),
                    sort_order: 1,
                    created_at: now,
                },
                aphorism: Aphorism {
                    id: Uuid::new_v4(),
                    text: "Know thyself".into(),
                    author: None,
                    sort_order: 1,
                    created_at: now,
                },
            })
            .await;

        let view = view_for_order(&lazy_pool(), &cache, 3).await.unwrap().unwrap();
        assert_eq!(view.affirmation.text, "I am enough");
    }

    #[actix_web::test]
    async fn increment_all_is_admin_only() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/daily-contents/increment-all")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn explicit_day_order_must_be_positive() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/daily-contents")
            .insert_header(bearer(Uuid::new_v4(), ADMIN_ROLE))
            .set_json(json!({
                "affirmation_id": Uuid::new_v4(),
                "aphorism_id": Uuid::new_v4(),
                "day_order": -1,
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn today_requires_authentication() {
        let app = app!();
        let req = test::TestRequest::get().uri("/daily-contents/today").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
