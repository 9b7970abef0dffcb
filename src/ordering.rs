// src/ordering.rs
//! Positional ordering shared by ordered content tables and the daily rotation.

/// Position assigned to a new row when the caller did not pick one.
pub fn next_order(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}

/// Next `DayOrder` for a user during the daily increment.
///
/// `days` holds the existing day orders in ascending order. The pointer
/// moves to the first day after `current`, skipping gaps, and wraps to the
/// first day after the last one. Returns `None` when there is no daily
/// content at all.
pub fn next_day_order(current: i32, days: &[i32]) -> Option<i32> {
    let first = *days.first()?;
    Some(days.iter().copied().find(|&day| day > current).unwrap_or(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rows_go_after_the_current_max() {
        assert_eq!(next_order(Some(7)), 8);
    }

    #[test]
    fn first_row_gets_order_one() {
        assert_eq!(next_order(None), 1);
    }

    #[test]
    fn day_order_advances_by_one() {
        let days: Vec<i32> = (1..=10).collect();
        assert_eq!(next_day_order(3, &days), Some(4));
    }

    #[test]
    fn day_order_wraps_at_maximum() {
        let days: Vec<i32> = (1..=10).collect();
        assert_eq!(next_day_order(10, &days), Some(1));
    }

    #[test]
    fn day_order_past_maximum_wraps() {
        // content was deleted after the user moved past it
        let days: Vec<i32> = (1..=10).collect();
        assert_eq!(next_day_order(12, &days), Some(1));
    }

    #[test]
    fn deleted_days_are_skipped() {
        assert_eq!(next_day_order(2, &[1, 2, 4, 5]), Some(4));
    }

    #[test]
    fn wrap_lands_on_the_first_existing_day() {
        assert_eq!(next_day_order(5, &[2, 3, 5]), Some(2));
        assert_eq!(next_day_order(0, &[2, 3, 5]), Some(2));
    }

    #[test]
    fn single_day_stays_put() {
        assert_eq!(next_day_order(1, &[1]), Some(1));
    }

    #[test]
    fn no_daily_content_means_no_rotation() {
        assert_eq!(next_day_order(1, &[]), None);
    }
}
