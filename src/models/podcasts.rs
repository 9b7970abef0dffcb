// src/models/podcasts.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct PodcastSeries {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub requires_keci_time: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PodcastSeriesInput {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub requires_keci_time: bool,
}

/// Media attached to an episode, stored as a JSON column.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EpisodeContent {
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct PodcastEpisode {
    pub id: Uuid,
    pub series_id: Uuid,
    pub title: String,
    pub description: String,
    pub sequence_number: i32,
    pub content: Json<EpisodeContent>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PodcastEpisodeInput {
    pub series_id: Uuid,
    pub title: String,
    pub description: String,
    pub sequence_number: Option<i32>,
    #[serde(default)]
    pub content: EpisodeContent,
}

/// Episode in the listening view; locked episodes carry no media.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EpisodeListing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub sequence_number: i32,
    pub locked: bool,
    pub content: Option<EpisodeContent>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SeriesListening {
    pub series: PodcastSeries,
    pub current_accessible_sequence: i32,
    pub episodes: Vec<EpisodeListing>,
}
