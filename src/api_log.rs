// src/api_log.rs
use crate::auth::bearer_token;
use crate::db;
use crate::models::audit::NewApiLog;
use crate::token::TokenService;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{Error, web};
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

const SKIPPED_PATHS: &[&str] = &["/health"];

fn caller_id(req: &ServiceRequest) -> Option<Uuid> {
    let tokens = req.app_data::<web::Data<TokenService>>()?;
    let claims = tokens
        .validate_access_token(bearer_token(req.request())?)
        .ok()?;
    Uuid::parse_str(&claims.sub).ok()
}

/// Writes one `api_logs` row per request once the response is ready.
/// The insert runs in the background and never affects the response.
pub async fn record_request(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if SKIPPED_PATHS.contains(&req.path()) {
        return next.call(req).await;
    }

    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.path().to_string();
    let user_id = caller_id(&req);
    let pool = req.app_data::<web::Data<PgPool>>().cloned();

    let res = next.call(req).await?;

    let log = NewApiLog {
        method,
        path,
        status_code: i32::from(res.status().as_u16()),
        duration_ms: started.elapsed().as_millis() as i64,
        user_id,
    };
    if log.status_code >= 500 {
        tracing::warn!("{} {} failed with {}", log.method, log.path, log.status_code);
    }

    if let Some(pool) = pool {
        actix_web::rt::spawn(async move {
            if let Err(e) = db::audit::insert_api_log(&pool, &log).await {
                tracing::warn!("Failed to write api log: {}", e);
            }
        });
    }

    Ok(res)
}
