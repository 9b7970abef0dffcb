// src/db/popups.rs
use crate::models::content::{Popup, PopupInput};
use sqlx::PgPool;
use uuid::Uuid;

const POPUP_SELECT: &str = "SELECT id, title, body, image_url, is_active, created_at FROM popups";

pub async fn list_popups(pool: &PgPool) -> Result<Vec<Popup>, sqlx::Error> {
    sqlx::query_as::<_, Popup>(&format!("{POPUP_SELECT} ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await
}

pub async fn get_popup(pool: &PgPool, id: Uuid) -> Result<Option<Popup>, sqlx::Error> {
    sqlx::query_as::<_, Popup>(&format!("{POPUP_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_active_popup(pool: &PgPool) -> Result<Option<Popup>, sqlx::Error> {
    sqlx::query_as::<_, Popup>(&format!(
        "{POPUP_SELECT} WHERE is_active ORDER BY created_at DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

pub async fn insert_popup(pool: &PgPool, id: Uuid, input: &PopupInput) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO popups (id, title, body, image_url, is_active) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.body)
    .bind(&input.image_url)
    .bind(input.is_active)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_popup(pool: &PgPool, id: Uuid, input: &PopupInput) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE popups SET title = $2, body = $3, image_url = $4, is_active = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.body)
    .bind(&input.image_url)
    .bind(input.is_active)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_popup(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM popups WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
