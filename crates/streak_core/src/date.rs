//! Calendar date helpers.
//!
//! # Responsibility
//! - Provide pure day arithmetic for streak and window computations.
//! - Own the `YYYY-MM-DD` wire format used by storage and FFI.
//!
//! # Invariants
//! - All arithmetic is done on `NaiveDate`, never on timestamps, so time
//!   zones and DST transitions cannot change day differences.
//! - Only `today()` reads the system clock.

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};

/// Wire format for persisted and FFI-facing dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Number of days shown per page in the habit grid.
pub const GRID_PAGE_DAYS: u32 = 12;

/// Returns the current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Returns the date `n` days before `today`.
///
/// Saturates at `NaiveDate::MIN` instead of panicking.
pub fn days_ago(today: NaiveDate, n: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(n)))
        .unwrap_or(NaiveDate::MIN)
}

/// Returns the previous calendar day, or `None` at the calendar floor.
pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

/// Returns the last `n` calendar days ending at `today`, oldest first.
pub fn last_n_days(today: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..n).rev().map(|offset| days_ago(today, offset)).collect()
}

/// Returns an `n`-day strip ending at `today + offset`, oldest first.
///
/// Negative offsets page into the past; the grid pages by
/// [`GRID_PAGE_DAYS`]. Positive offsets are clamped to zero so the strip
/// never ends in the future.
pub fn dates_with_offset(today: NaiveDate, offset: i64, n: u32) -> Vec<NaiveDate> {
    let back = offset.min(0).unsigned_abs();
    let end = today
        .checked_sub_days(Days::new(back))
        .unwrap_or(NaiveDate::MIN);
    last_n_days(end, n)
}

/// Returns a three-letter English weekday label (`Sun`..`Sat`).
pub fn day_of_week(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` date, tolerating surrounding whitespace.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Inclusive count of calendar days in `[from, to]`; 0 when `from > to`.
pub fn inclusive_day_count(from: NaiveDate, to: NaiveDate) -> u32 {
    let diff = to.signed_duration_since(from).num_days();
    if diff < 0 {
        return 0;
    }
    u32::try_from(diff + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn last_n_days_is_oldest_first_and_ends_today() {
        let days = last_n_days(ymd(2024, 3, 2), 3);
        assert_eq!(days, vec![ymd(2024, 2, 29), ymd(2024, 3, 1), ymd(2024, 3, 2)]);
        assert!(last_n_days(ymd(2024, 3, 2), 0).is_empty());
    }

    #[test]
    fn dates_with_offset_pages_backwards_and_clamps_future() {
        let today = ymd(2024, 1, 20);
        let page = dates_with_offset(today, -i64::from(GRID_PAGE_DAYS), GRID_PAGE_DAYS);
        assert_eq!(page.len(), 12);
        assert_eq!(page.last().copied(), Some(ymd(2024, 1, 8)));
        assert_eq!(dates_with_offset(today, 5, 2), vec![ymd(2024, 1, 19), today]);
    }

    #[test]
    fn inclusive_day_count_handles_order_and_leap_years() {
        assert_eq!(inclusive_day_count(ymd(2024, 2, 28), ymd(2024, 3, 1)), 3);
        assert_eq!(inclusive_day_count(ymd(2024, 1, 5), ymd(2024, 1, 5)), 1);
        assert_eq!(inclusive_day_count(ymd(2024, 1, 6), ymd(2024, 1, 5)), 0);
    }

    #[test]
    fn format_and_parse_use_iso_dates() {
        assert_eq!(format_date(ymd(2024, 2, 9)), "2024-02-09");
        assert_eq!(parse_date(" 2024-02-09 "), Some(ymd(2024, 2, 9)));
        assert_eq!(parse_date("02/09/2024"), None);
        assert_eq!(day_of_week(ymd(2024, 2, 10)), "Sat");
    }
}
