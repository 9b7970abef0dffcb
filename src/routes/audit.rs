// src/routes/audit.rs
use crate::auth::AdminUser;
use crate::db;
use crate::error::AppError;
use crate::models::audit::LogQuery;
use actix_web::{HttpResponse, get, web};
use sqlx::PgPool;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(api_logs);
    cfg.service(batches);
}

#[get("/audit/api-logs")]
pub async fn api_logs(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    query: web::Query<LogQuery>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::audit::list_api_logs(&pool, query.effective_limit()).await?))
}

#[get("/audit/batches")]
pub async fn batches(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    query: web::Query<LogQuery>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::audit::list_batches(&pool, query.effective_limit()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::USER_ROLE;
    use crate::test_support::{bearer, lazy_pool, test_accounts, test_tokens};
    use actix_web::{App, http::StatusCode, test};
    use uuid::Uuid;

    #[actix_web::test]
    async fn logs_are_admin_only() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_tokens()))
                .app_data(web::Data::new(test_accounts()))
                .configure(init_routes),
        )
        .await;

        let anonymous = test::TestRequest::get().uri("/audit/api-logs").to_request();
        assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

        let user = test::TestRequest::get()
            .uri("/audit/batches?limit=5")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .to_request();
        assert_eq!(test::call_service(&app, user).await.status(), StatusCode::FORBIDDEN);
    }
}
