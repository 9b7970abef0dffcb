// src/db/engagement.rs
//! Favorites, notes, questions and answers. All point at one content item.
use crate::models::engagement::{Answer, Favorite, FavoriteRow, Note, NoteRow, Question, QuestionRow};
use crate::target::{ContentTarget, TargetRef};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const TARGET_COLUMNS: &str = "episode_id, article_id, affirmation_id, aphorism_id";

fn stored_target(target: TargetRef) -> Result<ContentTarget, sqlx::Error> {
    ContentTarget::try_from(target).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl TryFrom<FavoriteRow> for Favorite {
    type Error = sqlx::Error;

    fn try_from(row: FavoriteRow) -> Result<Self, Self::Error> {
        Ok(Favorite {
            id: row.id,
            user_id: row.user_id,
            target: stored_target(row.target)?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<NoteRow> for Note {
    type Error = sqlx::Error;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        Ok(Note {
            id: row.id,
            user_id: row.user_id,
            target: stored_target(row.target)?,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn insert_favorite(
    pool: &PgPool,
    user_id: Uuid,
    target: ContentTarget,
) -> Result<Favorite, sqlx::Error> {
    let [episode, article, affirmation, aphorism] = target.columns();
    let row = sqlx::query_as::<_, FavoriteRow>(&format!(
        "INSERT INTO favorites (id, user_id, {TARGET_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, user_id, {TARGET_COLUMNS}, created_at"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(episode)
    .bind(article)
    .bind(affirmation)
    .bind(aphorism)
    .fetch_one(pool)
    .await?;
    row.try_into()
}

pub async fn list_favorites_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Favorite>, sqlx::Error> {
    let rows = sqlx::query_as::<_, FavoriteRow>(&format!(
        "SELECT id, user_id, {TARGET_COLUMNS}, created_at FROM favorites \
         WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Favorite::try_from).collect()
}

/// Deletes a favorite only if it belongs to `user_id`.
pub async fn delete_favorite(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorites WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_note(
    pool: &PgPool,
    user_id: Uuid,
    target: ContentTarget,
    body: &str,
) -> Result<Note, sqlx::Error> {
    let [episode, article, affirmation, aphorism] = target.columns();
    let row = sqlx::query_as::<_, NoteRow>(&format!(
        "INSERT INTO notes (id, user_id, {TARGET_COLUMNS}, body) VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, user_id, {TARGET_COLUMNS}, body, created_at, updated_at"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(episode)
    .bind(article)
    .bind(affirmation)
    .bind(aphorism)
    .bind(body)
    .fetch_one(pool)
    .await?;
    row.try_into()
}

pub async fn list_notes_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Note>, sqlx::Error> {
    let rows = sqlx::query_as::<_, NoteRow>(&format!(
        "SELECT id, user_id, {TARGET_COLUMNS}, body, created_at, updated_at FROM notes \
         WHERE user_id = $1 ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Note::try_from).collect()
}

pub async fn update_note(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    body: &str,
) -> Result<Option<Note>, sqlx::Error> {
    let row = sqlx::query_as::<_, NoteRow>(&format!(
        "UPDATE notes SET body = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2 \
         RETURNING id, user_id, {TARGET_COLUMNS}, body, created_at, updated_at"
    ))
    .bind(id)
    .bind(user_id)
    .bind(body)
    .fetch_optional(pool)
    .await?;
    row.map(Note::try_from).transpose()
}

pub async fn delete_note(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

const QUESTION_SELECT: &str = "SELECT q.id, q.user_id, u.email AS user_email, q.episode_id, \
     q.article_id, q.affirmation_id, q.aphorism_id, q.body, q.created_at \
     FROM questions q JOIN users u ON u.id = q.user_id";

pub async fn insert_question(
    pool: &PgPool,
    user_id: Uuid,
    target: ContentTarget,
    body: &str,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let [episode, article, affirmation, aphorism] = target.columns();
    sqlx::query(&format!(
        "INSERT INTO questions (id, user_id, {TARGET_COLUMNS}, body) VALUES ($1, $2, $3, $4, $5, $6, $7)"
    ))
    .bind(id)
    .bind(user_id)
    .bind(episode)
    .bind(article)
    .bind(affirmation)
    .bind(aphorism)
    .bind(body)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn get_question(pool: &PgPool, id: Uuid) -> Result<Option<Question>, sqlx::Error> {
    let row = sqlx::query_as::<_, QuestionRow>(&format!("{QUESTION_SELECT} WHERE q.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => Ok(with_answers(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn list_questions_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Question>, sqlx::Error> {
    let rows = sqlx::query_as::<_, QuestionRow>(&format!(
        "{QUESTION_SELECT} WHERE q.user_id = $1 ORDER BY q.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    with_answers(pool, rows).await
}

pub async fn list_all_questions(pool: &PgPool, unanswered_only: bool) -> Result<Vec<Question>, sqlx::Error> {
    let rows = sqlx::query_as::<_, QuestionRow>(&format!(
        "{QUESTION_SELECT} WHERE NOT $1 OR NOT EXISTS \
         (SELECT 1 FROM answers a WHERE a.question_id = q.id) \
         ORDER BY q.created_at DESC"
    ))
    .bind(unanswered_only)
    .fetch_all(pool)
    .await?;
    with_answers(pool, rows).await
}

pub async fn delete_question(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_answer(
    pool: &PgPool,
    question_id: Uuid,
    responder_id: Uuid,
    body: &str,
) -> Result<Answer, sqlx::Error> {
    sqlx::query_as::<_, Answer>(
        "INSERT INTO answers (id, question_id, responder_id, body) VALUES ($1, $2, $3, $4) \
         RETURNING id, question_id, responder_id, body, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(question_id)
    .bind(responder_id)
    .bind(body)
    .fetch_one(pool)
    .await
}

/// Attaches answers to questions with a single extra query.
async fn with_answers(pool: &PgPool, rows: Vec<QuestionRow>) -> Result<Vec<Question>, sqlx::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let answers = sqlx::query_as::<_, Answer>(
        "SELECT id, question_id, responder_id, body, created_at FROM answers \
         WHERE question_id = ANY($1) ORDER BY created_at",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_question: HashMap<Uuid, Vec<Answer>> = HashMap::new();
    for answer in answers {
        by_question.entry(answer.question_id).or_default().push(answer);
    }

    rows.into_iter()
        .map(|row| {
            Ok(Question {
                id: row.id,
                user_id: row.user_id,
                user_email: row.user_email,
                target: stored_target(row.target)?,
                body: row.body,
                created_at: row.created_at,
                answers: by_question.remove(&row.id).unwrap_or_default(),
            })
        })
        .collect()
}
