// src/routes/uploads.rs
//! Raw-body uploads forwarded to the CDN storage zone.
use crate::auth::{AdminUser, AuthUser};
use crate::cdn::{CdnClient, MAX_UPLOAD_BYTES, UploadFolder};
use crate::db;
use crate::error::{AppError, AppResult};
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/uploads/{folder}")
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
            .route(web::post().to(upload_file)),
    );
    cfg.service(
        web::resource("/users/me/profile-picture")
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
            .route(web::post().to(upload_profile_picture)),
    );
}

#[derive(Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

#[derive(Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

fn content_type(req: &HttpRequest) -> String {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// The body is handed to the CDN client as-is, without copying.
fn checked_body(body: web::Bytes) -> AppResult<web::Bytes> {
    if body.is_empty() {
        return Err(AppError::validation("file is empty"));
    }
    Ok(body)
}

pub async fn upload_file(
    cdn: web::Data<CdnClient>,
    _admin: AdminUser,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let folder = UploadFolder::parse(&path)
        .ok_or_else(|| AppError::validation(format!("unknown upload folder '{path}'")))?;
    let bytes = checked_body(body)?;
    let url = cdn
        .upload(folder, &query.filename, &content_type(&req), bytes)
        .await?;
    Ok(HttpResponse::Created().json(UploadResponse { url }))
}

pub async fn upload_profile_picture(
    pool: web::Data<PgPool>,
    cdn: web::Data<CdnClient>,
    caller: AuthUser,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    crate::routes::users::load_active_user(&pool, &caller).await?;
    let bytes = checked_body(body)?;
    let url = cdn
        .upload(UploadFolder::Profiles, &query.filename, &content_type(&req), bytes)
        .await?;
    db::users::set_profile_picture(&pool, caller.id, &url).await?;
    Ok(HttpResponse::Ok().json(UploadResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{ADMIN_ROLE, USER_ROLE};
    use crate::test_support::{bearer, lazy_pool, test_accounts, test_cdn, test_tokens};
    use actix_web::{App, http::StatusCode, test};
    use uuid::Uuid;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(test_tokens()))
                    .app_data(web::Data::new(test_accounts()))
                    .app_data(web::Data::new(test_cdn()))
                    .app_data(crate::routes::query_config())
                    .configure(init_routes),
            )
            .await
        };
    }

    fn upload(uri: &str, role: &str, body: &'static [u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header(bearer(Uuid::new_v4(), role))
            .insert_header((CONTENT_TYPE, "image/png"))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn uploads_are_admin_only() {
        let app = app!();
        let req = upload("/uploads/movies?filename=poster.png", USER_ROLE, b"png").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn unknown_folder_is_rejected() {
        let app = app!();
        let req = upload("/uploads/secrets?filename=a.png", ADMIN_ROLE, b"png").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn empty_body_is_rejected() {
        let app = app!();
        let req = upload("/uploads/popups?filename=a.png", ADMIN_ROLE, b"").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_filename_is_rejected() {
        let app = app!();
        let req = upload("/uploads/popups", ADMIN_ROLE, b"png").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn checked_body_shares_the_request_buffer() {
        let body = web::Bytes::from_static(b"ID3 audio");
        let checked = checked_body(body.clone()).unwrap();
        assert_eq!(checked.as_ptr(), body.as_ptr());
        assert!(checked_body(web::Bytes::new()).is_err());
    }

    #[actix_web::test]
    async fn unconfigured_cdn_is_unavailable() {
        let app = app!();
        let req = upload("/uploads/episodes?filename=intro.mp3", ADMIN_ROLE, b"ID3").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
