// src/db/weekly.rs
use crate::models::content::{WeeklyContent, WeeklyContentInput, WeeklyQuestionAnswer};
use sqlx::PgPool;
use uuid::Uuid;

const WEEKLY_SELECT: &str = "SELECT id, music_id, movie_id, task_id, weekly_question_id, \
     week_order, created_at FROM weekly_contents";

const ANSWER_SELECT: &str = "SELECT id, user_id, weekly_question_id, answer, created_at, \
     updated_at FROM weekly_question_answers";

pub async fn list_weekly_contents(pool: &PgPool) -> Result<Vec<WeeklyContent>, sqlx::Error> {
    sqlx::query_as::<_, WeeklyContent>(&format!("{WEEKLY_SELECT} ORDER BY week_order"))
        .fetch_all(pool)
        .await
}

pub async fn get_weekly_content(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<WeeklyContent>, sqlx::Error> {
    sqlx::query_as::<_, WeeklyContent>(&format!("{WEEKLY_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_weekly_content_id_by_order(
    pool: &PgPool,
    week_order: i32,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM weekly_contents WHERE week_order = $1")
        .bind(week_order)
        .fetch_optional(pool)
        .await
}

pub async fn get_max_week_order(pool: &PgPool) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<i32>>("SELECT MAX(week_order) FROM weekly_contents")
        .fetch_one(pool)
        .await
}

pub async fn insert_weekly_content(
    pool: &PgPool,
    id: Uuid,
    input: &WeeklyContentInput,
    week_order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO weekly_contents (id, music_id, movie_id, task_id, weekly_question_id, week_order) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(input.music_id)
    .bind(input.movie_id)
    .bind(input.task_id)
    .bind(input.weekly_question_id)
    .bind(week_order)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_weekly_content(
    pool: &PgPool,
    id: Uuid,
    input: &WeeklyContentInput,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE weekly_contents SET music_id = $2, movie_id = $3, task_id = $4, \
         weekly_question_id = $5, week_order = COALESCE($6, week_order) WHERE id = $1",
    )
    .bind(id)
    .bind(input.music_id)
    .bind(input.movie_id)
    .bind(input.task_id)
    .bind(input.weekly_question_id)
    .bind(input.week_order)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_weekly_content(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM weekly_contents WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Inserts or replaces the user's answer to a weekly question.
pub async fn upsert_weekly_answer(
    pool: &PgPool,
    user_id: Uuid,
    weekly_question_id: Uuid,
    answer: &str,
) -> Result<WeeklyQuestionAnswer, sqlx::Error> {
    sqlx::query_as::<_, WeeklyQuestionAnswer>(
        "INSERT INTO weekly_question_answers (id, user_id, weekly_question_id, answer) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, weekly_question_id) \
         DO UPDATE SET answer = EXCLUDED.answer, updated_at = NOW() \
         RETURNING id, user_id, weekly_question_id, answer, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(weekly_question_id)
    .bind(answer)
    .fetch_one(pool)
    .await
}

pub async fn list_weekly_answers_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<WeeklyQuestionAnswer>, sqlx::Error> {
    sqlx::query_as::<_, WeeklyQuestionAnswer>(&format!(
        "{ANSWER_SELECT} WHERE user_id = $1 ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_all_weekly_answers(pool: &PgPool) -> Result<Vec<WeeklyQuestionAnswer>, sqlx::Error> {
    sqlx::query_as::<_, WeeklyQuestionAnswer>(&format!("{ANSWER_SELECT} ORDER BY updated_at DESC"))
        .fetch_all(pool)
        .await
}
