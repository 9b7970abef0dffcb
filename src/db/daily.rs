// src/db/daily.rs
use crate::models::content::{DailyContent, DailyContentInput};
use crate::ordering;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const DAILY_SELECT: &str =
    "SELECT id, affirmation_id, aphorism_id, day_order, created_at FROM daily_contents";

pub async fn list_daily_contents(pool: &PgPool) -> Result<Vec<DailyContent>, sqlx::Error> {
    sqlx::query_as::<_, DailyContent>(&format!("{DAILY_SELECT} ORDER BY day_order"))
        .fetch_all(pool)
        .await
}

pub async fn get_daily_content(pool: &PgPool, id: Uuid) -> Result<Option<DailyContent>, sqlx::Error> {
    sqlx::query_as::<_, DailyContent>(&format!("{DAILY_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_daily_content_by_order(
    pool: &PgPool,
    day_order: i32,
) -> Result<Option<DailyContent>, sqlx::Error> {
    sqlx::query_as::<_, DailyContent>(&format!("{DAILY_SELECT} WHERE day_order = $1"))
        .bind(day_order)
        .fetch_optional(pool)
        .await
}

pub async fn get_max_day_order<'e>(
    executor: impl sqlx::PgExecutor<'e>,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<i32>>("SELECT MAX(day_order) FROM daily_contents")
        .fetch_one(executor)
        .await
}

/// Every existing day order, ascending.
pub async fn list_day_orders(conn: &mut PgConnection) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT day_order FROM daily_contents ORDER BY day_order")
        .fetch_all(conn)
        .await
}

pub async fn insert_daily_content(
    pool: &PgPool,
    id: Uuid,
    input: &DailyContentInput,
    day_order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO daily_contents (id, affirmation_id, aphorism_id, day_order) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(input.affirmation_id)
    .bind(input.aphorism_id)
    .bind(day_order)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_daily_content(
    pool: &PgPool,
    id: Uuid,
    input: &DailyContentInput,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE daily_contents SET affirmation_id = $2, aphorism_id = $3, \
         day_order = COALESCE($4, day_order) WHERE id = $1",
    )
    .bind(id)
    .bind(input.affirmation_id)
    .bind(input.aphorism_id)
    .bind(input.day_order)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_daily_content(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM daily_contents WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Outcome of moving every eligible user to the next day.
pub struct DailyIncrement {
    pub updated: i64,
    pub skipped: i64,
    pub max_day_order: Option<i32>,
}

/// Advances `daily_content_order` for every active, subscribed user.
///
/// Must run inside a transaction: eligible rows are locked before the new
/// orders are computed and written back in one statement.
pub async fn increment_daily_content_for_all_users(
    conn: &mut PgConnection,
) -> Result<DailyIncrement, sqlx::Error> {
    let days = list_day_orders(&mut *conn).await?;
    let max_day_order = days.last().copied();
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *conn)
        .await?;

    if days.is_empty() {
        return Ok(DailyIncrement {
            updated: 0,
            skipped: total,
            max_day_order,
        });
    }

    let eligible: Vec<(Uuid, i32)> = sqlx::query_as(
        "SELECT id, daily_content_order FROM users \
         WHERE is_active AND subscription_end > NOW() FOR UPDATE",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut ids = Vec::with_capacity(eligible.len());
    let mut orders = Vec::with_capacity(eligible.len());
    for (id, current) in eligible {
        if let Some(next) = ordering::next_day_order(current, &days) {
            ids.push(id);
            orders.push(next);
        }
    }

    let result = sqlx::query(
        "UPDATE users u SET daily_content_order = v.day_order, updated_at = NOW() \
         FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, day_order) WHERE u.id = v.id",
    )
    .bind(&ids)
    .bind(&orders)
    .execute(&mut *conn)
    .await?;

    let updated = result.rows_affected() as i64;
    Ok(DailyIncrement {
        updated,
        skipped: total - updated,
        max_day_order,
    })
}
