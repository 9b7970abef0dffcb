// src/db/access.rs
use crate::access;
use crate::models::progress::{BulkResult, UserSeriesAccess, UserSeriesAccessRow};
use crate::target::AccessScope;
use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;
use uuid::Uuid;

const ACCESS_COLUMNS: &str =
    "id, user_id, series_id, article_id, current_accessible_sequence, updated_at";

impl TryFrom<UserSeriesAccessRow> for UserSeriesAccess {
    type Error = sqlx::Error;

    fn try_from(row: UserSeriesAccessRow) -> Result<Self, Self::Error> {
        let scope = AccessScope::from_ids(row.series_id, row.article_id)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(UserSeriesAccess {
            id: row.id,
            user_id: row.user_id,
            scope,
            current_accessible_sequence: row.current_accessible_sequence,
            updated_at: row.updated_at,
        })
    }
}

/// Stored counter for (user, scope); `None` when no row exists yet.
pub async fn get_sequence<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    user_id: Uuid,
    scope: AccessScope,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT current_accessible_sequence FROM user_series_access \
         WHERE user_id = $1 AND {} = $2",
        scope.column()
    ))
    .bind(user_id)
    .bind(scope.id())
    .fetch_optional(executor)
    .await
}

pub async fn list_access_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<UserSeriesAccess>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserSeriesAccessRow>(&format!(
        "SELECT {ACCESS_COLUMNS} FROM user_series_access WHERE user_id = $1 ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(UserSeriesAccess::try_from).collect()
}

/// Locks the (user, scope) row, if any, for the rest of the transaction.
async fn lock_sequence(
    conn: &mut PgConnection,
    user_id: Uuid,
    scope: AccessScope,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT current_accessible_sequence FROM user_series_access \
         WHERE user_id = $1 AND {} = $2 FOR UPDATE",
        scope.column()
    ))
    .bind(user_id)
    .bind(scope.id())
    .fetch_optional(conn)
    .await
}

/// Writes `sequence` for (user, scope). The stored value never decreases,
/// even if a concurrent writer inserted the row first.
async fn store_sequence(
    conn: &mut PgConnection,
    user_id: Uuid,
    scope: AccessScope,
    sequence: i32,
) -> Result<UserSeriesAccessRow, sqlx::Error> {
    let column = scope.column();
    sqlx::query_as::<_, UserSeriesAccessRow>(&format!(
        "INSERT INTO user_series_access (id, user_id, {column}, current_accessible_sequence) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, {column}) DO UPDATE SET \
         current_accessible_sequence = GREATEST(user_series_access.current_accessible_sequence, \
         EXCLUDED.current_accessible_sequence), updated_at = NOW() \
         RETURNING {ACCESS_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(scope.id())
    .bind(sequence)
    .fetch_one(conn)
    .await
}

/// Admin grant. Call inside a transaction.
pub async fn grant_access(
    conn: &mut PgConnection,
    user_id: Uuid,
    scope: AccessScope,
    requested: i32,
) -> Result<UserSeriesAccess, sqlx::Error> {
    let stored = lock_sequence(&mut *conn, user_id, scope).await?;
    let next = access::merge_grant(stored, requested);
    store_sequence(conn, user_id, scope, next).await?.try_into()
}

/// Grants `sequence` to many users in one statement.
///
/// Unknown or inactive users, repeated ids and rows already at or above
/// `sequence` are counted as skipped, so the two counts add up to
/// `user_ids.len()`.
pub async fn bulk_grant_access(
    conn: &mut PgConnection,
    user_ids: &[Uuid],
    scope: AccessScope,
    sequence: i32,
) -> Result<BulkResult, sqlx::Error> {
    // ON CONFLICT cannot touch the same row twice in one statement
    let unique: Vec<Uuid> = user_ids
        .iter()
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let column = scope.column();
    let result = sqlx::query(&format!(
        "INSERT INTO user_series_access (id, user_id, {column}, current_accessible_sequence) \
         SELECT gen_random_uuid(), u.id, $2, $3 FROM users u \
         WHERE u.id = ANY($1) AND u.is_active \
         ON CONFLICT (user_id, {column}) DO UPDATE SET \
         current_accessible_sequence = EXCLUDED.current_accessible_sequence, updated_at = NOW() \
         WHERE user_series_access.current_accessible_sequence < EXCLUDED.current_accessible_sequence"
    ))
    .bind(&unique)
    .bind(scope.id())
    .bind(sequence)
    .execute(conn)
    .await?;

    Ok(tally(user_ids.len(), result.rows_affected()))
}

fn tally(requested: usize, updated: u64) -> BulkResult {
    let updated = updated as i64;
    BulkResult {
        updated_count: updated,
        skipped_count: requested as i64 - updated,
    }
}

/// Unlocks `next`, the item following `completed`, when it lies past the
/// counter. Call inside a transaction. Returns the new counter when it moved.
pub async fn advance_on_completion(
    conn: &mut PgConnection,
    user_id: Uuid,
    scope: AccessScope,
    completed: i32,
    next: Option<i32>,
) -> Result<Option<i32>, sqlx::Error> {
    let stored = lock_sequence(&mut *conn, user_id, scope).await?;
    let current = access::effective_sequence(stored);
    match access::advance_after_completion(current, completed, next) {
        Some(next) => {
            let row = store_sequence(conn, user_id, scope, next).await?;
            Ok(Some(row.current_accessible_sequence))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_episode, seed_series, seed_user};

    #[test]
    fn duplicates_count_as_skipped() {
        // three ids requested, one repeated, one row written
        let result = tally(3, 1);
        assert_eq!(result.updated_count + result.skipped_count, 3);
        assert_eq!(result.skipped_count, 2);
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn grants_never_lower_the_stored_counter(pool: PgPool) -> sqlx::Result<()> {
        let user = seed_user(&pool, true, 30).await?;
        let scope = AccessScope::Series(seed_series(&pool).await?);

        let mut tx = pool.begin().await?;
        assert_eq!(grant_access(&mut tx, user, scope, 5).await?.current_accessible_sequence, 5);
        assert_eq!(grant_access(&mut tx, user, scope, 3).await?.current_accessible_sequence, 5);
        tx.commit().await?;

        assert_eq!(get_sequence(&pool, user, scope).await?, Some(5));
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn bulk_grant_counts_every_requested_id(pool: PgPool) -> sqlx::Result<()> {
        let fresh = seed_user(&pool, true, 30).await?;
        let inactive = seed_user(&pool, false, 30).await?;
        let ahead = seed_user(&pool, true, 30).await?;
        let scope = AccessScope::Series(seed_series(&pool).await?);

        let mut tx = pool.begin().await?;
        grant_access(&mut tx, ahead, scope, 7).await?;
        let ids = [fresh, fresh, inactive, Uuid::new_v4(), ahead];
        let result = bulk_grant_access(&mut tx, &ids, scope, 4).await?;
        tx.commit().await?;

        assert_eq!(
            result,
            BulkResult {
                updated_count: 1,
                skipped_count: 4,
            }
        );
        assert_eq!(get_sequence(&pool, fresh, scope).await?, Some(4));
        assert_eq!(get_sequence(&pool, inactive, scope).await?, None);
        assert_eq!(get_sequence(&pool, ahead, scope).await?, Some(7));
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn completion_skips_missing_episode_numbers(pool: PgPool) -> sqlx::Result<()> {
        let user = seed_user(&pool, true, 30).await?;
        let series = seed_series(&pool).await?;
        for sequence in [1, 2, 5] {
            seed_episode(&pool, series, sequence).await?;
        }
        let scope = AccessScope::Series(series);

        let mut tx = pool.begin().await?;
        for completed in [1, 2] {
            let next = crate::db::podcasts::next_sequence_after(&pool, series, completed).await?;
            advance_on_completion(&mut tx, user, scope, completed, next).await?;
        }
        tx.commit().await?;

        assert_eq!(get_sequence(&pool, user, scope).await?, Some(5));
        Ok(())
    }
}
