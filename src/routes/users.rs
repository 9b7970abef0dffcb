// src/routes/users.rs
use crate::auth::{self, AdminUser, AuthUser};
use crate::cache::AccountCache;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::users::{
    ChangePasswordRequest, ExtendTimeRequest, SetPasswordRequest, UpdateUserRequest, User,
};
use crate::routes::not_found_unless;
use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub const MAX_EXTENSION_DAYS: i64 = 3650;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_me);
    cfg.service(mark_popup_seen);
    cfg.service(change_own_password);
    cfg.service(list_users);
    cfg.service(get_user);
    cfg.service(update_user);
    cfg.service(extend_subscription);
    cfg.service(extend_keci_time);
    cfg.service(set_user_password);
    cfg.service(delete_user);
    cfg.service(user_favorites);
    cfg.service(user_notes);
    cfg.service(user_questions);
    cfg.service(user_weekly_answers);
    cfg.service(user_progress);
}

/// Loads the caller's row; a token for a deleted or disabled user is rejected.
pub async fn load_active_user(pool: &PgPool, caller: &AuthUser) -> AppResult<User> {
    match db::users::get_user_by_id(pool, caller.id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AppError::Unauthorized("Unauthorized")),
    }
}

pub fn validate_extension(days: i64) -> AppResult<i32> {
    if !(1..=MAX_EXTENSION_DAYS).contains(&days) {
        return Err(AppError::validation(format!(
            "days must be between 1 and {MAX_EXTENSION_DAYS}"
        )));
    }
    Ok(days as i32)
}

#[get("/users/me")]
pub async fn get_me(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    let user = load_active_user(&pool, &caller).await?;
    Ok(HttpResponse::Ok().json(user.profile(Utc::now())))
}

#[post("/users/me/popup-seen")]
pub async fn mark_popup_seen(
    pool: web::Data<PgPool>,
    caller: AuthUser,
) -> Result<HttpResponse, AppError> {
    db::users::mark_popup_seen(&pool, caller.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[put("/users/me/password")]
pub async fn change_own_password(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    req: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    auth::validate_password(&req.new_password)?;

    let user = load_active_user(&pool, &caller).await?;
    if !auth::verify_password(req.current_password, user.password_hash).await? {
        return Err(AppError::Unauthorized("Current password is incorrect"));
    }

    let password_hash = auth::hash_password(req.new_password).await?;
    db::users::set_password_hash(&pool, user.id, &password_hash).await?;
    let revoked = db::tokens::revoke_all_for_user(pool.get_ref(), user.id).await?;
    tracing::info!("User {} changed password; revoked {} sessions", user.id, revoked);
    Ok(HttpResponse::NoContent().finish())
}

#[get("/users")]
pub async fn list_users(pool: web::Data<PgPool>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let users: Vec<_> = db::users::list_users(&pool)
        .await?
        .iter()
        .map(|u| u.profile(now))
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[get("/users/{id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user = db::users::get_user_by_id(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(user.profile(Utc::now())))
}

#[put("/users/{id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    accounts: web::Data<AccountCache>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    auth::validate_email(&req.email)?;
    crate::routes::require_text("full_name", &req.full_name, 200)?;

    let user_id = path.into_inner();
    not_found_unless(db::users::update_user(&pool, user_id, &req).await?, "User")?;
    accounts.invalidate(user_id);
    if !req.is_active {
        db::tokens::revoke_all_for_user(pool.get_ref(), user_id).await?;
    }
    let user = db::users::get_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(user.profile(Utc::now())))
}

#[post("/users/{id}/extend-subscription")]
pub async fn extend_subscription(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<ExtendTimeRequest>,
) -> Result<HttpResponse, AppError> {
    let days = validate_extension(req.days)?;
    let user_id = path.into_inner();
    not_found_unless(db::users::extend_subscription(&pool, user_id, days).await?, "User")?;
    tracing::info!("Admin {} extended subscription of {} by {} days", admin.0.id, user_id, days);

    let user = db::users::get_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(user.profile(Utc::now())))
}

#[post("/users/{id}/extend-keci-time")]
pub async fn extend_keci_time(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<ExtendTimeRequest>,
) -> Result<HttpResponse, AppError> {
    let days = validate_extension(req.days)?;
    let user_id = path.into_inner();
    not_found_unless(db::users::extend_keci_time(&pool, user_id, days).await?, "User")?;
    tracing::info!("Admin {} extended KeciTime of {} by {} days", admin.0.id, user_id, days);

    let user = db::users::get_user_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(user.profile(Utc::now())))
}

#[put("/users/{id}/password")]
pub async fn set_user_password(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<SetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    auth::validate_password(&req.new_password)?;

    let user_id = path.into_inner();
    let password_hash = auth::hash_password(req.new_password).await?;
    not_found_unless(
        db::users::set_password_hash(&pool, user_id, &password_hash).await?,
        "User",
    )?;
    db::tokens::revoke_all_for_user(pool.get_ref(), user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/users/{id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    accounts: web::Data<AccountCache>,
    admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    if user_id == admin.0.id {
        return Err(AppError::Conflict("Admins cannot delete themselves".into()));
    }
    not_found_unless(db::users::delete_user(&pool, user_id).await?, "User")?;
    accounts.invalidate(user_id);
    tracing::info!("Admin {} deleted user {}", admin.0.id, user_id);
    Ok(HttpResponse::NoContent().finish())
}

#[get("/users/{id}/favorites")]
pub async fn user_favorites(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let favorites = db::engagement::list_favorites_for_user(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(favorites))
}

#[get("/users/{id}/notes")]
pub async fn user_notes(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let notes = db::engagement::list_notes_for_user(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notes))
}

#[get("/users/{id}/questions")]
pub async fn user_questions(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let questions = db::engagement::list_questions_for_user(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[get("/users/{id}/weekly-answers")]
pub async fn user_weekly_answers(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let answers = db::weekly::list_weekly_answers_for_user(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(answers))
}

#[get("/users/{id}/progress")]
pub async fn user_progress(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let progress = db::progress::list_progress_for_user(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(progress))
}
