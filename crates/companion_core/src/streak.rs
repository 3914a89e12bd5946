//! crates/companion_core/src/streak.rs
//!
//! The streak tracker: pure calendar-day logic deciding new streak values
//! when a session completes "today". Persistence and the at-most-once-per-day
//! write are the database adapter's concern; this module is total over valid
//! dates and has no error path.

use chrono::{Days, NaiveDate};

use crate::domain::StreakRecord;

/// Whether a streak is alive, already extended today, or about to lapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakStatus {
    /// A session was already completed today.
    ActiveToday,
    /// Last activity was yesterday; a session today keeps the streak going.
    Safe,
    /// Last activity was 2+ days ago (or never); the next session resets to 1.
    AtRisk,
}

/// Advances a streak record for a session completed on `today`.
///
/// Calling twice with the same `today` is a no-op on the second call, so a
/// user mutates their streak at most once per calendar day.
pub fn advance_streak(record: &StreakRecord, today: NaiveDate) -> StreakRecord {
    if record.last_activity_date == Some(today) {
        return record.clone();
    }

    let yesterday = today - Days::new(1);
    let new_current = if record.last_activity_date == Some(yesterday) {
        record.current_streak + 1
    } else {
        // Gap of 2+ days, or first-ever activity.
        1
    };

    StreakRecord {
        user_id: record.user_id,
        current_streak: new_current,
        longest_streak: record.longest_streak.max(new_current),
        last_activity_date: Some(today),
    }
}

/// Classifies a streak relative to `today`, for "Active Today!" / "At Risk!"
/// style badges.
pub fn streak_status(record: &StreakRecord, today: NaiveDate) -> StreakStatus {
    match record.last_activity_date {
        Some(d) if d == today => StreakStatus::ActiveToday,
        Some(d) if d == today - Days::new(1) => StreakStatus::Safe,
        _ => StreakStatus::AtRisk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(current: u32, longest: u32, last: Option<NaiveDate>) -> StreakRecord {
        StreakRecord {
            user_id: Uuid::new_v4(),
            current_streak: current,
            longest_streak: longest,
            last_activity_date: last,
        }
    }

    #[test]
    fn first_ever_activity_starts_at_one() {
        let today = date(2026, 3, 14);
        let updated = advance_streak(&record(0, 0, None), today);
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.longest_streak, 1);
        assert_eq!(updated.last_activity_date, Some(today));
    }

    #[test]
    fn consecutive_day_increments() {
        let today = date(2026, 3, 14);
        let r = record(6, 5, Some(date(2026, 3, 13)));
        let updated = advance_streak(&r, today);
        assert_eq!(updated.current_streak, 7);
        // Longest follows along when overtaken.
        assert_eq!(updated.longest_streak, 7);
    }

    #[test]
    fn same_day_is_idempotent() {
        let today = date(2026, 3, 14);
        let first = advance_streak(&record(3, 8, Some(date(2026, 3, 13))), today);
        let second = advance_streak(&first, today);
        assert_eq!(first, second);
    }

    #[test]
    fn gap_of_two_or_more_days_resets_to_one() {
        let today = date(2026, 3, 14);
        let updated = advance_streak(&record(42, 42, Some(date(2026, 3, 11))), today);
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.longest_streak, 42);
    }

    #[test]
    fn reset_works_across_month_boundaries() {
        let updated = advance_streak(&record(5, 5, Some(date(2026, 2, 28))), date(2026, 3, 1));
        assert_eq!(updated.current_streak, 6);
    }

    #[test]
    fn longest_never_falls_below_current() {
        let mut r = record(0, 0, None);
        let mut day = date(2026, 1, 1);
        for _ in 0..40 {
            r = advance_streak(&r, day);
            assert!(r.longest_streak >= r.current_streak);
            day = day + Days::new(1);
        }
        assert_eq!(r.current_streak, 40);
        assert_eq!(r.longest_streak, 40);
    }

    #[test]
    fn day_after_advance_increments_by_exactly_one() {
        let today = date(2026, 6, 1);
        let r = advance_streak(&record(0, 3, None), today);
        let next = advance_streak(&r, today + Days::new(1));
        assert_eq!(next.current_streak, r.current_streak + 1);
    }

    #[test]
    fn status_reflects_calendar_position() {
        let today = date(2026, 3, 14);
        let active = record(2, 2, Some(today));
        let safe = record(2, 2, Some(date(2026, 3, 13)));
        let risky = record(2, 2, Some(date(2026, 3, 10)));
        let never = record(0, 0, None);

        assert_eq!(streak_status(&active, today), StreakStatus::ActiveToday);
        assert_eq!(streak_status(&safe, today), StreakStatus::Safe);
        assert_eq!(streak_status(&risky, today), StreakStatus::AtRisk);
        assert_eq!(streak_status(&never, today), StreakStatus::AtRisk);
    }
}
