// src/target.rs
//! Polymorphic references from user-owned rows to content items.
//!
//! Requests name their target with one of several optional ids; the rest of
//! the service only sees the sum types below. In the database each variant
//! is its own nullable FK column guarded by `num_nonnulls(...) = 1`.
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ContentTarget {
    Episode(Uuid),
    Article(Uuid),
    Affirmation(Uuid),
    Aphorism(Uuid),
}

impl ContentTarget {
    pub fn id(&self) -> Uuid {
        match *self {
            ContentTarget::Episode(id)
            | ContentTarget::Article(id)
            | ContentTarget::Affirmation(id)
            | ContentTarget::Aphorism(id) => id,
        }
    }

    /// Column values in `episode_id, article_id, affirmation_id, aphorism_id` order.
    pub fn columns(&self) -> [Option<Uuid>; 4] {
        let mut cols = [None; 4];
        let idx = match self {
            ContentTarget::Episode(_) => 0,
            ContentTarget::Article(_) => 1,
            ContentTarget::Affirmation(_) => 2,
            ContentTarget::Aphorism(_) => 3,
        };
        cols[idx] = Some(self.id());
        cols
    }
}

/// Wire shape of a content reference: exactly one field must be set.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, sqlx::FromRow)]
pub struct TargetRef {
    pub episode_id: Option<Uuid>,
    pub article_id: Option<Uuid>,
    pub affirmation_id: Option<Uuid>,
    pub aphorism_id: Option<Uuid>,
}

impl TryFrom<TargetRef> for ContentTarget {
    type Error = AppError;

    fn try_from(r: TargetRef) -> Result<Self, Self::Error> {
        match (r.episode_id, r.article_id, r.affirmation_id, r.aphorism_id) {
            (Some(id), None, None, None) => Ok(ContentTarget::Episode(id)),
            (None, Some(id), None, None) => Ok(ContentTarget::Article(id)),
            (None, None, Some(id), None) => Ok(ContentTarget::Affirmation(id)),
            (None, None, None, Some(id)) => Ok(ContentTarget::Aphorism(id)),
            (None, None, None, None) => Err(AppError::validation(
                "one of episode_id, article_id, affirmation_id, aphorism_id is required",
            )),
            _ => Err(AppError::validation(
                "only one of episode_id, article_id, affirmation_id, aphorism_id may be set",
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProgressTarget {
    Week(Uuid),
    Article(Uuid),
    Episode(Uuid),
    DailyContent(Uuid),
}

impl ProgressTarget {
    pub fn id(&self) -> Uuid {
        match *self {
            ProgressTarget::Week(id)
            | ProgressTarget::Article(id)
            | ProgressTarget::Episode(id)
            | ProgressTarget::DailyContent(id) => id,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            ProgressTarget::Week(_) => "weekly_content_id",
            ProgressTarget::Article(_) => "article_id",
            ProgressTarget::Episode(_) => "episode_id",
            ProgressTarget::DailyContent(_) => "daily_content_id",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, sqlx::FromRow)]
pub struct ProgressRef {
    #[serde(alias = "weekly_content_id")]
    pub week_id: Option<Uuid>,
    pub article_id: Option<Uuid>,
    pub episode_id: Option<Uuid>,
    pub daily_content_id: Option<Uuid>,
}

impl TryFrom<ProgressRef> for ProgressTarget {
    type Error = AppError;

    fn try_from(r: ProgressRef) -> Result<Self, Self::Error> {
        match (r.week_id, r.article_id, r.episode_id, r.daily_content_id) {
            (Some(id), None, None, None) => Ok(ProgressTarget::Week(id)),
            (None, Some(id), None, None) => Ok(ProgressTarget::Article(id)),
            (None, None, Some(id), None) => Ok(ProgressTarget::Episode(id)),
            (None, None, None, Some(id)) => Ok(ProgressTarget::DailyContent(id)),
            (None, None, None, None) => Err(AppError::validation(
                "one of week_id, article_id, episode_id, daily_content_id is required",
            )),
            _ => Err(AppError::validation(
                "only one of week_id, article_id, episode_id, daily_content_id may be set",
            )),
        }
    }
}

/// What a `user_series_access` row gates: episodes of a series or pages of an article.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AccessScope {
    Series(Uuid),
    Article(Uuid),
}

impl AccessScope {
    pub fn id(&self) -> Uuid {
        match *self {
            AccessScope::Series(id) | AccessScope::Article(id) => id,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            AccessScope::Series(_) => "series_id",
            AccessScope::Article(_) => "article_id",
        }
    }

    pub fn from_ids(series_id: Option<Uuid>, article_id: Option<Uuid>) -> Result<Self, AppError> {
        match (series_id, article_id) {
            (Some(id), None) => Ok(AccessScope::Series(id)),
            (None, Some(id)) => Ok(AccessScope::Article(id)),
            (None, None) => Err(AppError::validation("series_id or article_id is required")),
            (Some(_), Some(_)) => Err(AppError::validation(
                "series_id and article_id are mutually exclusive",
            )),
        }
    }
}
