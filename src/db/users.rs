// src/db/users.rs
use crate::models::users::{AccountStatus, Role, UpdateUserRequest, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USER_SELECT: &str = "SELECT u.id, u.email, u.full_name, u.password_hash, u.role_id, \
     r.name AS role_name, u.subscription_end, u.keci_time_end, u.daily_content_order, \
     u.weekly_content_id, u.has_seen_popup, u.profile_picture_url, u.is_active, \
     u.created_at, u.updated_at \
     FROM users u JOIN roles r ON r.id = u.role_id";

pub struct NewUser<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub role_name: &'a str,
    pub subscription_end: DateTime<Utc>,
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE lower(u.email) = lower($1)"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_account_status(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<AccountStatus>, sqlx::Error> {
    sqlx::query_as::<_, AccountStatus>(
        "SELECT u.is_active, r.name AS role FROM users u JOIN roles r ON r.id = u.role_id \
         WHERE u.id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{USER_SELECT} ORDER BY u.created_at DESC"))
        .fetch_all(pool)
        .await
}

pub async fn create_user(pool: &PgPool, user: &NewUser<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, email, full_name, password_hash, role_id, subscription_end) \
         VALUES ($1, $2, $3, $4, (SELECT id FROM roles WHERE name = $5), $6)",
    )
    .bind(user.id)
    .bind(user.email)
    .bind(user.full_name)
    .bind(user.password_hash)
    .bind(user.role_name)
    .bind(user.subscription_end)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    req: &UpdateUserRequest,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET email = $2, full_name = $3, role_id = $4, is_active = $5, \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .bind(&req.email)
    .bind(&req.full_name)
    .bind(req.role_id)
    .bind(req.is_active)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Extends the subscription from whichever is later: now or the current end.
pub async fn extend_subscription(
    pool: &PgPool,
    user_id: Uuid,
    days: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET subscription_end = GREATEST(subscription_end, NOW()) + make_interval(days => $2), \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .bind(days)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn extend_keci_time(pool: &PgPool, user_id: Uuid, days: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET keci_time_end = GREATEST(COALESCE(keci_time_end, NOW()), NOW()) + make_interval(days => $2), \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .bind(days)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_password_hash(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_popup_seen(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET has_seen_popup = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Clears the popup flag for everyone, used when a new popup goes live.
pub async fn reset_popup_seen(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET has_seen_popup = FALSE WHERE has_seen_popup")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn set_profile_picture(
    pool: &PgPool,
    user_id: Uuid,
    url: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET profile_picture_url = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(url)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn assign_weekly_content(
    pool: &PgPool,
    user_id: Uuid,
    weekly_content_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE users SET weekly_content_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(weekly_content_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_roles(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn create_role(pool: &PgPool, role: &Role) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO roles (id, name) VALUES ($1, $2)")
        .bind(role.id)
        .bind(&role.name)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_users_with_role(pool: &PgPool, role_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = $1")
        .bind(role_id)
        .fetch_one(pool)
        .await
}

pub async fn delete_role(pool: &PgPool, role_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(role_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
