// src/access.rs
//! Sequential unlock rules for podcast episodes and article pages.
//!
//! A user may open item `n` of a series (or page `n` of an article) when
//! `n <= current_accessible_sequence`. The counter only moves forward. The
//! SQL in `db::access` implements the same rules as single statements; the
//! functions here are what handlers use to shape responses.
use crate::error::{AppError, AppResult};
use crate::models::users::User;
use chrono::{DateTime, Utc};

/// Accessible sequence for a user with no access row yet.
pub const DEFAULT_ACCESSIBLE_SEQUENCE: i32 = 1;

pub fn effective_sequence(stored: Option<i32>) -> i32 {
    stored.unwrap_or(DEFAULT_ACCESSIBLE_SEQUENCE)
}

pub fn is_unlocked(sequence: i32, current: i32) -> bool {
    sequence <= current
}

/// Subscription (and, where the content asks for it, KeciTime) a non-admin
/// needs before reading, listening or recording progress.
pub fn require_entitlement(user: &User, requires_keci_time: bool, now: DateTime<Utc>) -> AppResult<()> {
    if !user.has_active_subscription(now) {
        return Err(AppError::Forbidden("Subscription has expired"));
    }
    if requires_keci_time && !user.has_keci_time(now) {
        return Err(AppError::Forbidden("KeciTime is not active"));
    }
    Ok(())
}

/// Result of an admin grant: grants never lower an existing counter.
pub fn merge_grant(stored: Option<i32>, requested: i32) -> i32 {
    effective_sequence(stored).max(requested)
}

/// Counter value after item `completed` is finished, if it moves at all.
///
/// `next` is the first existing item after `completed`. Finishing an
/// unlocked item opens `next` when it lies past the counter, so gaps in the
/// numbering never strand a user. Re-completing an earlier item or finishing
/// the last one leaves the counter alone.
pub fn advance_after_completion(current: i32, completed: i32, next: Option<i32>) -> Option<i32> {
    if !is_unlocked(completed, current) {
        return None;
    }
    next.filter(|&next| next > current)
}
