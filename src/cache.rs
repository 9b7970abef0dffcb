// src/cache.rs
use crate::models::content::DailyContentView;
use crate::models::podcasts::PodcastSeries;
use crate::models::users::AccountStatus;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SERIES_KEY: &str = "podcast_series";

/// Read-mostly content served on every app launch.
#[derive(Clone)]
pub struct ContentCache {
    daily: Cache<i32, DailyContentView>,
    series: Cache<&'static str, Arc<Vec<PodcastSeries>>>,
}

impl ContentCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            daily: Cache::new(capacity),
            series: Cache::new(1),
        }
    }

    pub async fn daily(&self, day_order: i32) -> Option<DailyContentView> {
        let hit = self.daily.get(&day_order).await;
        if hit.is_some() {
            tracing::debug!("Cache hit for day order {}", day_order);
        }
        hit
    }

    pub async fn put_daily(&self, view: DailyContentView) {
        self.daily.insert(view.day_order, view).await;
    }

    /// Affirmation, aphorism or daily content rows changed.
    pub fn invalidate_daily(&self) {
        self.daily.invalidate_all();
    }

    pub async fn series(&self) -> Option<Arc<Vec<PodcastSeries>>> {
        self.series.get(&SERIES_KEY).await
    }

    pub async fn put_series(&self, series: Vec<PodcastSeries>) -> Arc<Vec<PodcastSeries>> {
        let series = Arc::new(series);
        self.series.insert(SERIES_KEY, series.clone()).await;
        series
    }

    pub async fn invalidate_series(&self) {
        self.series.invalidate(&SERIES_KEY).await;
    }
}

/// Account state looked up by the auth extractors. Entries expire after
/// `ttl`; admin changes to a user invalidate theirs immediately.
#[derive(Clone)]
pub struct AccountCache {
    accounts: moka::sync::Cache<Uuid, AccountStatus>,
}

impl AccountCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            accounts: moka::sync::Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, user_id: Uuid) -> Option<AccountStatus> {
        self.accounts.get(&user_id)
    }

    pub fn put(&self, user_id: Uuid, status: AccountStatus) {
        self.accounts.insert(user_id, status);
    }

    pub fn invalidate(&self, user_id: Uuid) {
        self.accounts.invalidate(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::{Affirmation, Aphorism};
    use chrono::Utc;
    use uuid::Uuid;

    fn view(day_order: i32) -> DailyContentView {
        DailyContentView {
            id: Uuid::new_v4(),
            day_order,
            affirmation: Affirmation {
                id: Uuid::new_v4(),
                text: "I am enough".into(),
                sort_order: 1,
                created_at: Utc::now(),
            },
            aphorism: Aphorism {
                id: Uuid::new_v4(),
                text: "Know thyself".into(),
                author: None,
                sort_order: 1,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn daily_views_are_cached_by_order() {
        let cache = ContentCache::new(10);
        assert!(cache.daily(3).await.is_none());

        cache.put_daily(view(3)).await;
        assert_eq!(cache.daily(3).await.map(|v| v.day_order), Some(3));
    }

    #[tokio::test]
    async fn series_invalidation_drops_entry() {
        let cache = ContentCache::new(10);
        cache.put_series(Vec::new()).await;
        assert!(cache.series().await.is_some());

        cache.invalidate_series().await;
        assert!(cache.series().await.is_none());
    }

    #[test]
    fn account_invalidation_forces_a_reload() {
        let accounts = AccountCache::new(10, Duration::from_secs(60));
        let id = Uuid::new_v4();
        let status = AccountStatus {
            is_active: true,
            role: "User".into(),
        };
        accounts.put(id, status.clone());
        assert_eq!(accounts.get(id), Some(status));

        accounts.invalidate(id);
        assert!(accounts.get(id).is_none());
    }
}
