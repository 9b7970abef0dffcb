// src/db/content.rs
//! Standalone content items: ordered lists (affirmations, aphorisms, tasks,
//! weekly questions, articles) plus movies and music.
use crate::models::content::{
    AffirmationInput, AphorismInput, Article, ArticleInput, Movie, MovieInput, Music, MusicInput,
    TaskInput, WeeklyQuestionInput,
};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Tables whose rows carry a unique `sort_order`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderedTable {
    Affirmations,
    Aphorisms,
    Tasks,
    WeeklyQuestions,
    Articles,
}

impl OrderedTable {
    pub fn name(self) -> &'static str {
        match self {
            OrderedTable::Affirmations => "affirmations",
            OrderedTable::Aphorisms => "aphorisms",
            OrderedTable::Tasks => "tasks",
            OrderedTable::WeeklyQuestions => "weekly_questions",
            OrderedTable::Articles => "articles",
        }
    }

    fn columns(self) -> &'static str {
        match self {
            OrderedTable::Affirmations => "id, text, sort_order, created_at",
            OrderedTable::Aphorisms => "id, text, author, sort_order, created_at",
            OrderedTable::Tasks => "id, title, description, sort_order, created_at",
            OrderedTable::WeeklyQuestions => "id, text, sort_order, created_at",
            OrderedTable::Articles => {
                "id, title, summary, image_url, pages, sort_order, created_at, updated_at"
            }
        }
    }
}

pub async fn list_ordered<T>(pool: &PgPool, table: OrderedTable) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = format!(
        "SELECT {} FROM {} ORDER BY sort_order",
        table.columns(),
        table.name()
    );
    sqlx::query_as::<_, T>(&sql).fetch_all(pool).await
}

pub async fn get_ordered<T>(
    pool: &PgPool,
    table: OrderedTable,
    id: Uuid,
) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1",
        table.columns(),
        table.name()
    );
    sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_max_order(pool: &PgPool, table: OrderedTable) -> Result<Option<i32>, sqlx::Error> {
    let sql = format!("SELECT MAX(sort_order) FROM {}", table.name());
    sqlx::query_scalar::<_, Option<i32>>(&sql)
        .fetch_one(pool)
        .await
}

pub async fn get_id_by_order(
    pool: &PgPool,
    table: OrderedTable,
    order: i32,
) -> Result<Option<Uuid>, sqlx::Error> {
    let sql = format!("SELECT id FROM {} WHERE sort_order = $1", table.name());
    sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(order)
        .fetch_optional(pool)
        .await
}

pub async fn delete_ordered(pool: &PgPool, table: OrderedTable, id: Uuid) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = $1", table.name());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_affirmation(
    pool: &PgPool,
    id: Uuid,
    input: &AffirmationInput,
    order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO affirmations (id, text, sort_order) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(&input.text)
        .bind(order)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_affirmation(
    pool: &PgPool,
    id: Uuid,
    input: &AffirmationInput,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE affirmations SET text = $2, sort_order = COALESCE($3, sort_order) WHERE id = $1",
    )
    .bind(id)
    .bind(&input.text)
    .bind(input.sort_order)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_aphorism(
    pool: &PgPool,
    id: Uuid,
    input: &AphorismInput,
    order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO aphorisms (id, text, author, sort_order) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&input.text)
        .bind(&input.author)
        .bind(order)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_aphorism(
    pool: &PgPool,
    id: Uuid,
    input: &AphorismInput,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE aphorisms SET text = $2, author = $3, sort_order = COALESCE($4, sort_order) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&input.text)
    .bind(&input.author)
    .bind(input.sort_order)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_task(
    pool: &PgPool,
    id: Uuid,
    input: &TaskInput,
    order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tasks (id, title, description, sort_order) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(order)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_task(pool: &PgPool, id: Uuid, input: &TaskInput) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tasks SET title = $2, description = $3, sort_order = COALESCE($4, sort_order) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.sort_order)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_weekly_question(
    pool: &PgPool,
    id: Uuid,
    input: &WeeklyQuestionInput,
    order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO weekly_questions (id, text, sort_order) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(&input.text)
        .bind(order)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_weekly_question(
    pool: &PgPool,
    id: Uuid,
    input: &WeeklyQuestionInput,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE weekly_questions SET text = $2, sort_order = COALESCE($3, sort_order) WHERE id = $1",
    )
    .bind(id)
    .bind(&input.text)
    .bind(input.sort_order)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_article(
    pool: &PgPool,
    id: Uuid,
    input: &ArticleInput,
    order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO articles (id, title, summary, image_url, pages, sort_order) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.image_url)
    .bind(Json(&input.pages))
    .bind(order)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_article(
    pool: &PgPool,
    id: Uuid,
    input: &ArticleInput,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE articles SET title = $2, summary = $3, image_url = $4, pages = $5, \
         sort_order = COALESCE($6, sort_order), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.image_url)
    .bind(Json(&input.pages))
    .bind(input.sort_order)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_article(pool: &PgPool, id: Uuid) -> Result<Option<Article>, sqlx::Error> {
    get_ordered(pool, OrderedTable::Articles, id).await
}

pub async fn list_movies(pool: &PgPool) -> Result<Vec<Movie>, sqlx::Error> {
    sqlx::query_as::<_, Movie>(
        "SELECT id, title, description, image_url, link, created_at FROM movies ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_movie(pool: &PgPool, id: Uuid) -> Result<Option<Movie>, sqlx::Error> {
    sqlx::query_as::<_, Movie>(
        "SELECT id, title, description, image_url, link, created_at FROM movies WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_movie(pool: &PgPool, id: Uuid, input: &MovieInput) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO movies (id, title, description, image_url, link) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(&input.link)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_movie(pool: &PgPool, id: Uuid, input: &MovieInput) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE movies SET title = $2, description = $3, image_url = $4, link = $5 WHERE id = $1",
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(&input.link)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_movie(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM movies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_music(pool: &PgPool) -> Result<Vec<Music>, sqlx::Error> {
    sqlx::query_as::<_, Music>(
        "SELECT id, title, artist, url, created_at FROM music ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_music(pool: &PgPool, id: Uuid) -> Result<Option<Music>, sqlx::Error> {
    sqlx::query_as::<_, Music>("SELECT id, title, artist, url, created_at FROM music WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_music(pool: &PgPool, id: Uuid, input: &MusicInput) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO music (id, title, artist, url) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&input.title)
        .bind(&input.artist)
        .bind(&input.url)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_music(pool: &PgPool, id: Uuid, input: &MusicInput) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE music SET title = $2, artist = $3, url = $4 WHERE id = $1")
        .bind(id)
        .bind(&input.title)
        .bind(&input.artist)
        .bind(&input.url)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_music(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM music WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_columns_include_pages() {
        assert!(OrderedTable::Articles.columns().contains("pages"));
        assert_eq!(OrderedTable::WeeklyQuestions.name(), "weekly_questions");
    }
}
