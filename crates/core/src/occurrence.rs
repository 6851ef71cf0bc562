//! Pure weekly-recurrence expansion.
//!
//! This module lives in `core` (zero internal deps) so the engine and
//! any tooling can expand a recurring slot without touching the store.
//! The store-side counterpart is a "replace all occurrences for slot X"
//! operation; regeneration is always delete-then-recreate, never an
//! incremental diff.

use chrono::{Datelike, Duration, NaiveTime};

use crate::types::Timestamp;

/// Expand a weekly recurrence into concrete instants.
///
/// Returns every instant within `[period_start, period_end)` whose date
/// falls on `day_of_week` and whose time-of-day is `slot_start`,
/// ascending and free of duplicates. Empty when the range contains no
/// matching weekday.
///
/// `day_of_week` follows the 0 = Sunday .. 6 = Saturday convention.
/// Out-of-range values produce an empty expansion; callers validate
/// weekday bounds before persisting a slot.
pub fn occurrence_times(
    period_start: Timestamp,
    period_end: Timestamp,
    day_of_week: i16,
    slot_start: NaiveTime,
) -> Vec<Timestamp> {
    if !(0..=6).contains(&day_of_week) || period_start >= period_end {
        return Vec::new();
    }

    let first_date = period_start.date_naive();
    let offset =
        (day_of_week as i64 - first_date.weekday().num_days_from_sunday() as i64).rem_euclid(7);
    let mut date = first_date + Duration::days(offset);

    let mut out = Vec::new();
    loop {
        let instant = date.and_time(slot_start).and_utc();
        if instant >= period_end {
            break;
        }
        if instant >= period_start {
            out.push(instant);
        }
        date += Duration::days(7);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn nine_am() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // Basic expansion
    // -----------------------------------------------------------------------

    #[test]
    fn two_week_period_yields_two_mondays() {
        // 2025-01-06 is a Monday. Monday = 1 in days-from-Sunday terms.
        let times = occurrence_times(ts(2025, 1, 6, 0, 0), ts(2025, 1, 20, 0, 0), 1, nine_am());
        assert_eq!(times, vec![ts(2025, 1, 6, 9, 0), ts(2025, 1, 13, 9, 0)]);
    }

    #[test]
    fn end_is_exclusive() {
        // Third Monday falls exactly on the period end instant.
        let times = occurrence_times(ts(2025, 1, 6, 0, 0), ts(2025, 1, 20, 9, 0), 1, nine_am());
        assert_eq!(times.len(), 2);
    }

    #[test]
    fn occurrence_on_end_boundary_minus_one_included() {
        let times = occurrence_times(
            ts(2025, 1, 6, 0, 0),
            ts(2025, 1, 20, 9, 1),
            1,
            nine_am(),
        );
        assert_eq!(times.len(), 3);
        assert_eq!(*times.last().unwrap(), ts(2025, 1, 20, 9, 0));
    }

    #[test]
    fn start_day_time_already_passed_skips_first_week() {
        // Period starts Monday at noon; the 09:00 slot that day is gone.
        let times = occurrence_times(ts(2025, 1, 6, 12, 0), ts(2025, 1, 20, 0, 0), 1, nine_am());
        assert_eq!(times, vec![ts(2025, 1, 13, 9, 0)]);
    }

    #[test]
    fn weekday_before_period_start_weekday() {
        // Period starts Monday, slot is on Sunday (0): first match is the
        // following Sunday.
        let times = occurrence_times(ts(2025, 1, 6, 0, 0), ts(2025, 1, 20, 0, 0), 0, nine_am());
        assert_eq!(times, vec![ts(2025, 1, 12, 9, 0), ts(2025, 1, 19, 9, 0)]);
    }

    #[test]
    fn ascending_and_unique() {
        let times = occurrence_times(ts(2025, 1, 1, 0, 0), ts(2025, 6, 1, 0, 0), 3, nine_am());
        let mut sorted = times.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(times, sorted);
    }

    // -----------------------------------------------------------------------
    // Empty expansions
    // -----------------------------------------------------------------------

    #[test]
    fn no_matching_weekday_in_short_range() {
        // Monday through Wednesday, slot on Saturday (6).
        let times = occurrence_times(ts(2025, 1, 6, 0, 0), ts(2025, 1, 8, 0, 0), 6, nine_am());
        assert!(times.is_empty());
    }

    #[test]
    fn inverted_range_is_empty() {
        let times = occurrence_times(ts(2025, 1, 20, 0, 0), ts(2025, 1, 6, 0, 0), 1, nine_am());
        assert!(times.is_empty());
    }

    #[test]
    fn out_of_range_weekday_is_empty() {
        let times = occurrence_times(ts(2025, 1, 6, 0, 0), ts(2025, 1, 20, 0, 0), 7, nine_am());
        assert!(times.is_empty());
        let times = occurrence_times(ts(2025, 1, 6, 0, 0), ts(2025, 1, 20, 0, 0), -1, nine_am());
        assert!(times.is_empty());
    }

    #[test]
    fn full_year_of_fridays() {
        let times = occurrence_times(ts(2025, 1, 1, 0, 0), ts(2026, 1, 1, 0, 0), 5, nine_am());
        assert_eq!(times.len(), 52);
        for t in &times {
            assert_eq!(t.date_naive().weekday().num_days_from_sunday(), 5);
        }
    }
}
