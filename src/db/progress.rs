// src/db/progress.rs
use crate::models::progress::{UserProgress, UserProgressRow};
use crate::target::{ProgressRef, ProgressTarget};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const PROGRESS_COLUMNS: &str = "id, user_id, weekly_content_id AS week_id, article_id, \
     episode_id, daily_content_id, completed_at";

impl TryFrom<UserProgressRow> for UserProgress {
    type Error = sqlx::Error;

    fn try_from(row: UserProgressRow) -> Result<Self, Self::Error> {
        let target: ProgressRef = row.target;
        Ok(UserProgress {
            id: row.id,
            user_id: row.user_id,
            target: ProgressTarget::try_from(target).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            completed_at: row.completed_at,
        })
    }
}

/// Records a completion. Repeating it refreshes `completed_at` on the
/// existing row instead of inserting a duplicate.
pub async fn upsert_progress(
    conn: &mut PgConnection,
    user_id: Uuid,
    target: ProgressTarget,
) -> Result<UserProgress, sqlx::Error> {
    let column = target.column();
    let row = sqlx::query_as::<_, UserProgressRow>(&format!(
        "INSERT INTO user_progress (id, user_id, {column}) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, {column}) DO UPDATE SET completed_at = NOW() \
         RETURNING {PROGRESS_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(target.id())
    .fetch_one(conn)
    .await?;
    row.try_into()
}

pub async fn list_progress_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<UserProgress>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserProgressRow>(&format!(
        "SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE user_id = $1 ORDER BY completed_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(UserProgress::try_from).collect()
}

pub async fn last_progress_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserProgress>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserProgressRow>(&format!(
        "SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE user_id = $1 \
         ORDER BY completed_at DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    row.map(UserProgress::try_from).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_article, seed_user};

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn repeated_completion_keeps_one_row(pool: PgPool) -> sqlx::Result<()> {
        let user = seed_user(&pool, true, 30).await?;
        let target = ProgressTarget::Article(seed_article(&pool, &["one", "two"]).await?);

        let mut conn = pool.acquire().await?;
        let first = upsert_progress(&mut conn, user, target).await?;
        let second = upsert_progress(&mut conn, user, target).await?;

        assert_eq!(first.id, second.id);
        assert!(second.completed_at >= first.completed_at);
        assert_eq!(list_progress_for_user(&pool, user).await?.len(), 1);
        assert_eq!(
            last_progress_for_user(&pool, user).await?.map(|p| p.target),
            Some(target)
        );
        Ok(())
    }
}
