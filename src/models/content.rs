// src/models/content.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Affirmation {
    pub id: Uuid,
    pub text: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AffirmationInput {
    pub text: String,
    pub sort_order: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Aphorism {
    pub id: Uuid,
    pub text: String,
    pub author: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AphorismInput {
    pub text: String,
    pub author: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub sort_order: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct WeeklyQuestion {
    pub id: Uuid,
    pub text: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WeeklyQuestionInput {
    pub text: String,
    pub sort_order: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub pages: Json<Vec<String>>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ArticleInput {
    pub title: String,
    pub summary: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub pages: Vec<String>,
    pub sort_order: Option<i32>,
}

/// Article as seen by a reader: only the unlocked pages are included.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ArticleReading {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub total_pages: i32,
    pub current_accessible_page: i32,
    pub pages: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MovieInput {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Music {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MusicInput {
    pub title: String,
    pub artist: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct DailyContent {
    pub id: Uuid,
    pub affirmation_id: Uuid,
    pub aphorism_id: Uuid,
    pub day_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DailyContentInput {
    pub affirmation_id: Uuid,
    pub aphorism_id: Uuid,
    pub day_order: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DailyContentView {
    pub id: Uuid,
    pub day_order: i32,
    pub affirmation: Affirmation,
    pub aphorism: Aphorism,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DailyIncrementResult {
    pub updated_count: i64,
    pub skipped_count: i64,
    pub max_day_order: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct WeeklyContent {
    pub id: Uuid,
    pub music_id: Option<Uuid>,
    pub movie_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub weekly_question_id: Option<Uuid>,
    pub week_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WeeklyContentInput {
    pub music_id: Option<Uuid>,
    pub movie_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub weekly_question_id: Option<Uuid>,
    pub week_order: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WeeklyContentDetails {
    pub id: Uuid,
    pub week_order: i32,
    pub music: Option<Music>,
    pub movie: Option<Movie>,
    pub task: Option<Task>,
    pub weekly_question: Option<WeeklyQuestion>,
}

#[derive(Serialize, Deserialize)]
pub struct AssignWeeklyContentRequest {
    pub user_id: Uuid,
    pub weekly_content_id: Uuid,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct WeeklyQuestionAnswer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub weekly_question_id: Uuid,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct WeeklyQuestionAnswerInput {
    pub weekly_question_id: Uuid,
    pub answer: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Popup {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PopupInput {
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

/// `{id}` payload of the `by-order` lookups.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IdResponse {
    pub id: Uuid,
}
