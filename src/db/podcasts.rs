// src/db/podcasts.rs
use crate::models::podcasts::{PodcastEpisode, PodcastEpisodeInput, PodcastSeries, PodcastSeriesInput};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

const SERIES_SELECT: &str =
    "SELECT id, title, description, image_url, requires_keci_time, created_at FROM podcast_series";

const EPISODE_SELECT: &str = "SELECT id, series_id, title, description, sequence_number, content, \
     created_at FROM podcast_episodes";

pub async fn list_series(pool: &PgPool) -> Result<Vec<PodcastSeries>, sqlx::Error> {
    sqlx::query_as::<_, PodcastSeries>(&format!("{SERIES_SELECT} ORDER BY created_at"))
        .fetch_all(pool)
        .await
}

pub async fn get_series(pool: &PgPool, id: Uuid) -> Result<Option<PodcastSeries>, sqlx::Error> {
    sqlx::query_as::<_, PodcastSeries>(&format!("{SERIES_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_series(
    pool: &PgPool,
    id: Uuid,
    input: &PodcastSeriesInput,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO podcast_series (id, title, description, image_url, requires_keci_time) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(input.requires_keci_time)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_series(
    pool: &PgPool,
    id: Uuid,
    input: &PodcastSeriesInput,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE podcast_series SET title = $2, description = $3, image_url = $4, \
         requires_keci_time = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(input.requires_keci_time)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Episodes, and everything referencing them, go with the series via FK cascades.
pub async fn delete_series(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM podcast_series WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_episodes(pool: &PgPool, series_id: Uuid) -> Result<Vec<PodcastEpisode>, sqlx::Error> {
    sqlx::query_as::<_, PodcastEpisode>(&format!(
        "{EPISODE_SELECT} WHERE series_id = $1 ORDER BY sequence_number"
    ))
    .bind(series_id)
    .fetch_all(pool)
    .await
}

pub async fn get_episode(pool: &PgPool, id: Uuid) -> Result<Option<PodcastEpisode>, sqlx::Error> {
    sqlx::query_as::<_, PodcastEpisode>(&format!("{EPISODE_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_max_sequence(pool: &PgPool, series_id: Uuid) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<i32>>(
        "SELECT MAX(sequence_number) FROM podcast_episodes WHERE series_id = $1",
    )
    .bind(series_id)
    .fetch_one(pool)
    .await
}

/// First episode after `sequence` in the series; gaps left by deletions or
/// explicit numbering are skipped.
pub async fn next_sequence_after(
    pool: &PgPool,
    series_id: Uuid,
    sequence: i32,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<i32>>(
        "SELECT MIN(sequence_number) FROM podcast_episodes \
         WHERE series_id = $1 AND sequence_number > $2",
    )
    .bind(series_id)
    .bind(sequence)
    .fetch_one(pool)
    .await
}

pub async fn insert_episode(
    pool: &PgPool,
    id: Uuid,
    input: &PodcastEpisodeInput,
    sequence_number: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO podcast_episodes (id, series_id, title, description, sequence_number, content) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(input.series_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(sequence_number)
    .bind(Json(&input.content))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_episode(
    pool: &PgPool,
    id: Uuid,
    input: &PodcastEpisodeInput,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE podcast_episodes SET series_id = $2, title = $3, description = $4, \
         sequence_number = COALESCE($5, sequence_number), content = $6 WHERE id = $1",
    )
    .bind(id)
    .bind(input.series_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.sequence_number)
    .bind(Json(&input.content))
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_episode(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM podcast_episodes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
