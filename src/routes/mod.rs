// src/routes/mod.rs
use crate::error::{AppError, AppResult};
use actix_web::{HttpResponse, get, web};
use serde_json::json;

pub mod access;
pub mod audit;
pub mod content;
pub mod daily;
pub mod engagement;
pub mod podcasts;
pub mod popups;
pub mod progress;
pub mod roles;
pub mod uploads;
pub mod users;
pub mod weekly;

/// Mounts every resource module. Literal segments such as `/users/me` are
/// registered before their `/{id}` siblings inside each module.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health);
    cfg.configure(crate::auth::init_routes)
        .configure(users::init_routes)
        .configure(roles::init_routes)
        .configure(content::init_routes)
        .configure(podcasts::init_routes)
        .configure(access::init_routes)
        .configure(daily::init_routes)
        .configure(weekly::init_routes)
        .configure(engagement::init_routes)
        .configure(progress::init_routes)
        .configure(popups::init_routes)
        .configure(uploads::init_routes)
        .configure(audit::init_routes);
}

/// JSON bodies that fail to deserialize come back as `{"error": ...}` 400s.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err, _req| AppError::validation(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::validation(err.to_string()).into())
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn require_text(field: &str, value: &str, max_chars: usize) -> AppResult<()> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if len > max_chars {
        return Err(AppError::validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(())
}

pub fn require_positive(field: &str, value: Option<i32>) -> AppResult<()> {
    match value {
        Some(v) if v < 1 => Err(AppError::validation(format!("{field} must be at least 1"))),
        _ => Ok(()),
    }
}

pub fn not_found_unless(found: bool, what: &'static str) -> AppResult<()> {
    if found { Ok(()) } else { Err(AppError::NotFound(what)) }
}
