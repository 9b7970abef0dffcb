// src/routes/popups.rs
use crate::auth::{AdminUser, AuthUser};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::content::{Popup, PopupInput};
use crate::routes::{not_found_unless, require_text};
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(active_popup);
    cfg.service(list_popups);
    cfg.service(create_popup);
    cfg.service(get_popup);
    cfg.service(update_popup);
    cfg.service(delete_popup);
}

#[derive(Serialize)]
struct ActivePopup {
    popup: Option<Popup>,
    has_seen_popup: bool,
}

fn validate_popup(input: &PopupInput) -> AppResult<()> {
    require_text("title", &input.title, 300)?;
    require_text("body", &input.body, 5000)
}

/// A newly active popup is shown to everyone again.
async fn announce(pool: &PgPool, input: &PopupInput) -> AppResult<()> {
    if input.is_active {
        let reset = db::users::reset_popup_seen(pool).await?;
        tracing::info!("Popup activated, {} users will see it again", reset);
    }
    Ok(())
}

#[get("/popups/active")]
pub async fn active_popup(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    let user = crate::routes::users::load_active_user(&pool, &caller).await?;
    let popup = db::popups::get_active_popup(&pool).await?;
    Ok(HttpResponse::Ok().json(ActivePopup {
        popup,
        has_seen_popup: user.has_seen_popup,
    }))
}

#[get("/popups")]
pub async fn list_popups(pool: web::Data<PgPool>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::popups::list_popups(&pool).await?))
}

#[get("/popups/{id}")]
pub async fn get_popup(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let popup = db::popups::get_popup(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Popup"))?;
    Ok(HttpResponse::Ok().json(popup))
}

#[post("/popups")]
pub async fn create_popup(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<PopupInput>,
) -> Result<HttpResponse, AppError> {
    validate_popup(&req)?;
    let id = Uuid::new_v4();
    db::popups::insert_popup(&pool, id, &req).await?;
    announce(&pool, &req).await?;

    let popup = db::popups::get_popup(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Popup"))?;
    Ok(HttpResponse::Created().json(popup))
}

#[put("/popups/{id}")]
pub async fn update_popup(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<PopupInput>,
) -> Result<HttpResponse, AppError> {
    validate_popup(&req)?;
    let id = path.into_inner();
    let was_active = db::popups::get_popup(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Popup"))?
        .is_active;
    not_found_unless(db::popups::update_popup(&pool, id, &req).await?, "Popup")?;
    if !was_active {
        announce(&pool, &req).await?;
    }

    let popup = db::popups::get_popup(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Popup"))?;
    Ok(HttpResponse::Ok().json(popup))
}

#[delete("/popups/{id}")]
pub async fn delete_popup(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(db::popups::delete_popup(&pool, path.into_inner()).await?, "Popup")?;
    Ok(HttpResponse::NoContent().finish())
}
