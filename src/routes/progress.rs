// src/routes/progress.rs
use crate::access;
use crate::auth::{AdminUser, AuthUser};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::progress::{CompleteProgressRequest, ProgressOutcome};
use crate::models::users::User;
use crate::target::{AccessScope, ProgressTarget};
use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(complete);
    cfg.service(my_progress);
    cfg.service(my_last_progress);
    cfg.service(user_last_progress);
}

/// Gated item finished by a completion.
#[derive(Clone, Copy, Debug)]
pub struct Position {
    pub scope: AccessScope,
    pub completed: i32,
    /// First existing item after `completed`.
    pub next: Option<i32>,
    pub requires_keci_time: bool,
}

/// Page finished when completing an article; other targets take no page.
pub fn completed_page(target: ProgressTarget, page: Option<i32>) -> AppResult<Option<i32>> {
    match (target, page) {
        (ProgressTarget::Article(_), None) => Ok(Some(1)),
        (ProgressTarget::Article(_), Some(page)) if page >= 1 => Ok(Some(page)),
        (ProgressTarget::Article(_), Some(_)) => Err(AppError::validation("page must be at least 1")),
        (_, None) => Ok(None),
        (_, Some(_)) => Err(AppError::validation("page is only valid for articles")),
    }
}

/// Non-admins may only complete items they are entitled to and have unlocked.
pub fn check_completion(
    user: &User,
    position: &Position,
    current: i32,
    now: DateTime<Utc>,
) -> AppResult<()> {
    access::require_entitlement(user, position.requires_keci_time, now)?;
    if !access::is_unlocked(position.completed, current) {
        return Err(AppError::Forbidden("Item is locked"));
    }
    Ok(())
}

async fn gated_position(
    pool: &PgPool,
    target: ProgressTarget,
    page: Option<i32>,
) -> AppResult<Option<Position>> {
    match target {
        ProgressTarget::Episode(id) => {
            let episode = db::podcasts::get_episode(pool, id)
                .await?
                .ok_or(AppError::NotFound("Podcast episode"))?;
            let series = db::podcasts::get_series(pool, episode.series_id)
                .await?
                .ok_or(AppError::NotFound("Podcast series"))?;
            let next =
                db::podcasts::next_sequence_after(pool, series.id, episode.sequence_number).await?;
            Ok(Some(Position {
                scope: AccessScope::Series(series.id),
                completed: episode.sequence_number,
                next,
                requires_keci_time: series.requires_keci_time,
            }))
        }
        ProgressTarget::Article(id) => {
            let article = db::content::get_article(pool, id)
                .await?
                .ok_or(AppError::NotFound("Article"))?;
            let total = article.pages.len() as i32;
            let page = page.unwrap_or(1);
            if page > total.max(1) {
                return Err(AppError::validation(format!(
                    "page must be between 1 and {}",
                    total.max(1)
                )));
            }
            Ok(Some(Position {
                scope: AccessScope::Article(id),
                completed: page,
                next: (page < total).then_some(page + 1),
                requires_keci_time: false,
            }))
        }
        ProgressTarget::Week(_) | ProgressTarget::DailyContent(_) => Ok(None),
    }
}

#[post("/user-progress")]
pub async fn complete(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    req: web::Json<CompleteProgressRequest>,
) -> Result<HttpResponse, AppError> {
    let target = ProgressTarget::try_from(req.target)?;
    let page = completed_page(target, req.page)?;
    let position = gated_position(&pool, target, page).await?;

    if let Some(position) = position.filter(|_| !caller.is_admin()) {
        let user = crate::routes::users::load_active_user(&pool, &caller).await?;
        let stored = db::access::get_sequence(pool.get_ref(), caller.id, position.scope).await?;
        check_completion(&user, &position, access::effective_sequence(stored), Utc::now())?;
    }

    let mut tx = pool.begin().await?;
    let progress = db::progress::upsert_progress(&mut *tx, caller.id, target).await?;
    let unlocked_sequence = match position {
        Some(position) => {
            db::access::advance_on_completion(
                &mut *tx,
                caller.id,
                position.scope,
                position.completed,
                position.next,
            )
            .await?
        }
        None => None,
    };
    tx.commit().await?;

    if let Some(sequence) = unlocked_sequence {
        tracing::debug!("User {} unlocked sequence {}", caller.id, sequence);
    }
    Ok(HttpResponse::Ok().json(ProgressOutcome {
        progress,
        unlocked_sequence,
    }))
}

#[get("/user-progress/me")]
pub async fn my_progress(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::progress::list_progress_for_user(&pool, caller.id).await?))
}

#[get("/user-progress/me/last")]
pub async fn my_last_progress(
    pool: web::Data<PgPool>,
    caller: AuthUser,
) -> Result<HttpResponse, AppError> {
    let last = db::progress::last_progress_for_user(&pool, caller.id)
        .await?
        .ok_or(AppError::NotFound("Progress"))?;
    Ok(HttpResponse::Ok().json(last))
}

#[get("/user-progress/{user_id}/last")]
pub async fn user_last_progress(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let last = db::progress::last_progress_for_user(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Progress"))?;
    Ok(HttpResponse::Ok().json(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::USER_ROLE;
    use crate::test_support::{bearer, lazy_pool, test_accounts, test_tokens, test_user};
    use actix_web::{App, http::StatusCode, test};
    use serde_json::json;

    #[actix_web::test]
    async fn article_page_defaults_to_first() {
        let article = ProgressTarget::Article(Uuid::new_v4());
        assert_eq!(completed_page(article, None).unwrap(), Some(1));
        assert_eq!(completed_page(article, Some(4)).unwrap(), Some(4));
        assert!(completed_page(article, Some(0)).is_err());
    }

    #[actix_web::test]
    async fn page_is_rejected_for_other_targets() {
        let episode = ProgressTarget::Episode(Uuid::new_v4());
        assert_eq!(completed_page(episode, None).unwrap(), None);
        assert!(completed_page(episode, Some(2)).is_err());
    }

    fn episode_position(completed: i32, requires_keci_time: bool) -> Position {
        Position {
            scope: AccessScope::Series(Uuid::new_v4()),
            completed,
            next: Some(completed + 1),
            requires_keci_time,
        }
    }

    #[actix_web::test]
    async fn locked_item_cannot_be_completed() {
        let user = test_user(30, None);
        let now = Utc::now();
        assert!(check_completion(&user, &episode_position(2, false), 2, now).is_ok());
        assert!(matches!(
            check_completion(&user, &episode_position(3, false), 2, now),
            Err(AppError::Forbidden("Item is locked"))
        ));
    }

    #[actix_web::test]
    async fn expired_subscription_cannot_complete() {
        let expired = test_user(-1, None);
        assert!(matches!(
            check_completion(&expired, &episode_position(1, false), 1, Utc::now()),
            Err(AppError::Forbidden("Subscription has expired"))
        ));
    }

    #[actix_web::test]
    async fn keci_series_needs_keci_time_to_complete() {
        let now = Utc::now();
        let position = episode_position(1, true);
        assert!(check_completion(&test_user(30, None), &position, 1, now).is_err());
        assert!(check_completion(&test_user(30, Some(5)), &position, 1, now).is_ok());
    }

    #[actix_web::test]
    async fn completion_needs_exactly_one_target() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_tokens()))
                .app_data(web::Data::new(test_accounts()))
                .app_data(crate::routes::json_config())
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/user-progress")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .set_json(json!({ "week_id": Uuid::new_v4(), "episode_id": Uuid::new_v4() }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn other_users_progress_is_admin_only() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_tokens()))
                .app_data(web::Data::new(test_accounts()))
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!("/user-progress/{}/last", Uuid::new_v4()))
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
