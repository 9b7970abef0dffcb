// src/models/engagement.rs
use crate::target::{ContentTarget, TargetRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Debug, FromRow)]
pub struct FavoriteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(flatten)]
    pub target: TargetRef,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: ContentTarget,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(flatten)]
    pub target: TargetRef,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: ContentTarget,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(flatten)]
    pub target: TargetRef,
    pub body: String,
}

#[derive(Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub body: String,
}

#[derive(Clone, Debug, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    #[sqlx(flatten)]
    pub target: TargetRef,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub responder_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Question {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub target: ContentTarget,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub answers: Vec<Answer>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    #[serde(flatten)]
    pub target: TargetRef,
    pub body: String,
}

#[derive(Serialize, Deserialize)]
pub struct CreateAnswerRequest {
    pub body: String,
}

#[derive(Serialize, Deserialize, Default)]
pub struct QuestionFilter {
    #[serde(default)]
    pub unanswered: bool,
}
