// src/db/audit.rs
use crate::models::audit::{ApiLog, ContentUpdateBatch, NewApiLog};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

pub async fn record_batch<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    operation: &str,
    performed_by: Option<Uuid>,
    updated_count: i64,
    skipped_count: i64,
    details: serde_json::Value,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO content_update_batches \
         (id, operation, performed_by, updated_count, skipped_count, details) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(operation)
    .bind(performed_by)
    .bind(updated_count)
    .bind(skipped_count)
    .bind(Json(details))
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn list_batches(pool: &PgPool, limit: i64) -> Result<Vec<ContentUpdateBatch>, sqlx::Error> {
    sqlx::query_as::<_, ContentUpdateBatch>(
        "SELECT id, operation, performed_by, updated_count, skipped_count, details, created_at \
         FROM content_update_batches ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn insert_api_log(pool: &PgPool, log: &NewApiLog) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO api_logs (method, path, status_code, duration_ms, user_id) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&log.method)
    .bind(&log.path)
    .bind(log.status_code)
    .bind(log.duration_ms)
    .bind(log.user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_api_logs(pool: &PgPool, limit: i64) -> Result<Vec<ApiLog>, sqlx::Error> {
    sqlx::query_as::<_, ApiLog>(
        "SELECT id, method, path, status_code, duration_ms, user_id, created_at \
         FROM api_logs ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
