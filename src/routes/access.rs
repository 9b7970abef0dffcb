// src/routes/access.rs
use crate::auth::{AdminUser, AuthUser};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::progress::{BulkGrantAccessRequest, GrantAccessRequest};
use crate::target::AccessScope;
use actix_web::{HttpResponse, get, post, web};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

pub const MAX_BULK_USERS: usize = 10_000;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(my_access);
    cfg.service(grant);
    cfg.service(bulk_grant);
    cfg.service(user_access);
}

fn validate_sequence(sequence: i32) -> AppResult<()> {
    if sequence < 1 {
        return Err(AppError::validation("sequence must be at least 1"));
    }
    Ok(())
}

#[get("/user-series-access/me")]
pub async fn my_access(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::access::list_access_for_user(&pool, caller.id).await?))
}

#[get("/user-series-access/{user_id}")]
pub async fn user_access(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    db::users::get_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(db::access::list_access_for_user(&pool, user_id).await?))
}

#[post("/user-series-access/grant")]
pub async fn grant(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<GrantAccessRequest>,
) -> Result<HttpResponse, AppError> {
    validate_sequence(req.sequence)?;
    let scope = AccessScope::from_ids(req.series_id, req.article_id)?;
    db::users::get_user_by_id(&pool, req.user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let mut tx = pool.begin().await?;
    let access = db::access::grant_access(&mut *tx, req.user_id, scope, req.sequence).await?;
    tx.commit().await?;

    tracing::info!(
        "Granted user {} access up to {} (now {})",
        req.user_id,
        req.sequence,
        access.current_accessible_sequence
    );
    Ok(HttpResponse::Ok().json(access))
}

#[post("/user-series-access/bulk-grant")]
pub async fn bulk_grant(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    req: web::Json<BulkGrantAccessRequest>,
) -> Result<HttpResponse, AppError> {
    validate_sequence(req.sequence)?;
    let scope = AccessScope::from_ids(req.series_id, req.article_id)?;
    if req.user_ids.is_empty() {
        return Err(AppError::validation("user_ids must not be empty"));
    }
    if req.user_ids.len() > MAX_BULK_USERS {
        return Err(AppError::validation(format!(
            "at most {MAX_BULK_USERS} users per request"
        )));
    }

    let mut tx = pool.begin().await?;
    let result = db::access::bulk_grant_access(&mut *tx, &req.user_ids, scope, req.sequence).await?;
    db::audit::record_batch(
        &mut *tx,
        "bulk_grant_access",
        Some(admin.0.id),
        result.updated_count,
        result.skipped_count,
        json!({ "scope": scope, "sequence": req.sequence, "requested": req.user_ids.len() }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        "Bulk access grant: {} updated, {} skipped",
        result.updated_count,
        result.skipped_count
    );
    Ok(HttpResponse::Ok().json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{ADMIN_ROLE, USER_ROLE};
    use crate::test_support::{bearer, lazy_pool, test_accounts, test_tokens};
    use actix_web::{App, http::StatusCode, test};

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(test_tokens()))
                    .app_data(web::Data::new(test_accounts()))
                    .app_data(crate::routes::json_config())
                    .configure(init_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn grant_is_admin_only() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/user-series-access/grant")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .set_json(json!({ "user_id": Uuid::new_v4(), "series_id": Uuid::new_v4(), "sequence": 3 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn grant_needs_exactly_one_scope() {
        let app = app!();
        let both = json!({
            "user_id": Uuid::new_v4(),
            "series_id": Uuid::new_v4(),
            "article_id": Uuid::new_v4(),
            "sequence": 2,
        });
        let req = test::TestRequest::post()
            .uri("/user-series-access/grant")
            .insert_header(bearer(Uuid::new_v4(), ADMIN_ROLE))
            .set_json(both)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let neither = json!({ "user_id": Uuid::new_v4(), "sequence": 2 });
        let req = test::TestRequest::post()
            .uri("/user-series-access/grant")
            .insert_header(bearer(Uuid::new_v4(), ADMIN_ROLE))
            .set_json(neither)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn bulk_grant_validates_before_touching_the_database() {
        let app = app!();
        for body in [
            json!({ "user_ids": [], "series_id": Uuid::new_v4(), "sequence": 2 }),
            json!({ "user_ids": [Uuid::new_v4()], "series_id": Uuid::new_v4(), "sequence": 0 }),
        ] {
            let req = test::TestRequest::post()
                .uri("/user-series-access/bulk-grant")
                .insert_header(bearer(Uuid::new_v4(), ADMIN_ROLE))
                .set_json(body)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        }
    }
}
