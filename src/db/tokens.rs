// src/db/tokens.rs
use crate::models::users::RefreshToken;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

pub async fn insert_refresh_token<'e>(
    executor: impl PgExecutor<'e>,
    token_hash: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO refresh_tokens (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(executor)
        .await?;
    Ok(())
}

/// Loads a token and locks its row for the rest of the transaction.
pub async fn lock_refresh_token(
    conn: &mut PgConnection,
    token_hash: &str,
) -> Result<Option<RefreshToken>, sqlx::Error> {
    sqlx::query_as::<_, RefreshToken>(
        "SELECT token_hash, user_id, expires_at, created_at, revoked_at, replaced_by_hash \
         FROM refresh_tokens WHERE token_hash = $1 FOR UPDATE",
    )
    .bind(token_hash)
    .fetch_optional(conn)
    .await
}

pub async fn mark_replaced(
    conn: &mut PgConnection,
    token_hash: &str,
    replaced_by: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = NOW(), replaced_by_hash = $2 WHERE token_hash = $1",
    )
    .bind(token_hash)
    .bind(replaced_by)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn revoke_token<'e>(
    executor: impl PgExecutor<'e>,
    token_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
    )
    .bind(token_hash)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn revoke_all_for_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
    )
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
