// src/models/progress.rs
use crate::target::{AccessScope, ProgressRef, ProgressTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Debug, FromRow)]
pub struct UserProgressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(flatten)]
    pub target: ProgressRef,
    pub completed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: ProgressTarget,
    pub completed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct CompleteProgressRequest {
    #[serde(flatten)]
    pub target: ProgressRef,
    /// Page finished when completing an article.
    pub page: Option<i32>,
}

#[derive(Clone, Debug, FromRow)]
pub struct UserSeriesAccessRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub series_id: Option<Uuid>,
    pub article_id: Option<Uuid>,
    pub current_accessible_sequence: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserSeriesAccess {
    pub id: Uuid,
    pub user_id: Uuid,
    pub scope: AccessScope,
    pub current_accessible_sequence: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct GrantAccessRequest {
    pub user_id: Uuid,
    pub series_id: Option<Uuid>,
    pub article_id: Option<Uuid>,
    pub sequence: i32,
}

#[derive(Serialize, Deserialize)]
pub struct BulkGrantAccessRequest {
    pub user_ids: Vec<Uuid>,
    pub series_id: Option<Uuid>,
    pub article_id: Option<Uuid>,
    pub sequence: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BulkResult {
    pub updated_count: i64,
    pub skipped_count: i64,
}

/// Recorded completion plus the counter it unlocked, if any.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProgressOutcome {
    pub progress: UserProgress,
    pub unlocked_sequence: Option<i32>,
}
