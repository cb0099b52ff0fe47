//! Per-habit streak and completion-rate engine.
//!
//! # Responsibility
//! - Compute current/longest streaks from one habit's sparse log.
//! - Compute windowed and all-time completion rates.
//! - Assemble the habit detail summary.
//!
//! # Invariants
//! - `current_streak` is anchored at `today`: an incomplete today yields 0.
//! - `longest_streak >= current_streak` for any log and any `today`.
//! - Pre-creation days are excluded only through earliest-completion
//!   anchoring, never through `Habit::created_at`.

use crate::date::{self, inclusive_day_count};
use crate::model::state::HabitLog;
use crate::stats::percent;
use chrono::NaiveDate;
use serde::Serialize;

/// Length of the mini heatmap shown on the habit detail view.
pub const DETAIL_STRIP_DAYS: u32 = 90;

/// Completed/total counts for one range of days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionStats {
    pub completed: u32,
    pub total: u32,
    /// `round(completed / total * 100)`, 0 when `total == 0`.
    pub rate: u8,
}

impl CompletionStats {
    pub fn new(completed: u32, total: u32) -> Self {
        Self {
            completed,
            total,
            rate: percent(completed, total),
        }
    }
}

/// One cell of a per-habit completion strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayMark {
    pub date: NaiveDate,
    pub completed: bool,
    /// Part of the run counted by [`current_streak`].
    pub in_streak: bool,
}

/// Everything the habit detail view derives from one log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub earliest_completion: Option<NaiveDate>,
    pub days_since_earliest: u32,
    pub last7: CompletionStats,
    pub last30: CompletionStats,
    pub last90: CompletionStats,
    pub all_time: CompletionStats,
    pub strip: Vec<DayMark>,
}

fn is_done(logs: &HabitLog, day: NaiveDate) -> bool {
    logs.get(&day).copied().unwrap_or(false)
}

/// Consecutive completed days ending at and including `today`.
pub fn current_streak(logs: &HabitLog, today: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut cursor = Some(today);
    while let Some(day) = cursor {
        if !is_done(logs, day) {
            break;
        }
        streak = streak.saturating_add(1);
        cursor = date::previous_day(day);
    }
    streak
}

/// Longest run of calendar-consecutive completed dates; 0 with no completions.
pub fn longest_streak(logs: &HabitLog) -> u32 {
    let mut longest = 0u32;
    let mut current = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for day in completed_dates(logs) {
        let consecutive = previous.is_some_and(|prev| prev.succ_opt() == Some(day));
        current = if consecutive { current + 1 } else { 1 };
        longest = longest.max(current);
        previous = Some(day);
    }
    longest
}

/// Stats over the last `window_days` days ending at `today`.
///
/// Every day in the window counts toward `total`, including days before
/// the habit existed. Use [`windowed_stats_since`] for an anchored variant.
pub fn windowed_stats(logs: &HabitLog, window_days: u32, today: NaiveDate) -> CompletionStats {
    if window_days == 0 {
        return CompletionStats::default();
    }
    let start = date::days_ago(today, window_days - 1);
    CompletionStats::new(count_completed(logs, start, today), window_days)
}

/// Stats over the last `window_days` days ending at `today`, counting only
/// days on or after `floor`.
pub fn windowed_stats_since(
    logs: &HabitLog,
    window_days: u32,
    today: NaiveDate,
    floor: NaiveDate,
) -> CompletionStats {
    if window_days == 0 {
        return CompletionStats::default();
    }
    let window_start = date::days_ago(today, window_days - 1);
    let start = window_start.max(floor);
    let total = inclusive_day_count(start, today);
    CompletionStats::new(count_completed(logs, start, today), total)
}

/// Stats from `earliest` through `today`, inclusive.
///
/// `None` (no completion ever) and an `earliest` after `today` both yield
/// all zeros.
pub fn all_time_stats(
    logs: &HabitLog,
    earliest: Option<NaiveDate>,
    today: NaiveDate,
) -> CompletionStats {
    let Some(earliest) = earliest else {
        return CompletionStats::default();
    };
    let total = inclusive_day_count(earliest, today);
    CompletionStats::new(count_completed(logs, earliest, today), total)
}

/// Earliest date with a truthy entry.
pub fn earliest_completion_date(logs: &HabitLog) -> Option<NaiveDate> {
    completed_dates(logs).next()
}

/// Number of truthy entries across the whole log.
pub fn total_completions(logs: &HabitLog) -> u32 {
    u32::try_from(completed_dates(logs).count()).unwrap_or(u32::MAX)
}

/// Inclusive day count from `earliest` to `today`; 0 for `None`.
pub fn days_since(earliest: Option<NaiveDate>, today: NaiveDate) -> u32 {
    earliest.map_or(0, |earliest| inclusive_day_count(earliest, today))
}

/// Whether `day` lies inside the current streak ending at `today`.
///
/// Days after `today` are never part of the streak.
pub fn in_current_streak(logs: &HabitLog, today: NaiveDate, day: NaiveDate) -> bool {
    streak_contains(current_streak(logs, today), today, day)
}

fn streak_contains(streak: u32, today: NaiveDate, day: NaiveDate) -> bool {
    let days_back = (today - day).num_days();
    days_back >= 0 && days_back < i64::from(streak)
}

/// Per-day completion flags for the last `days` days, oldest first.
pub fn completion_strip(logs: &HabitLog, today: NaiveDate, days: u32) -> Vec<DayMark> {
    dates_strip(logs, today, &date::last_n_days(today, days))
}

/// Marks for an arbitrary run of dates, e.g. one page of the habit grid.
pub fn dates_strip(logs: &HabitLog, today: NaiveDate, dates: &[NaiveDate]) -> Vec<DayMark> {
    let streak = current_streak(logs, today);
    dates
        .iter()
        .map(|&day| DayMark {
            date: day,
            completed: is_done(logs, day),
            in_streak: streak_contains(streak, today, day),
        })
        .collect()
}

/// Builds the habit detail summary.
///
/// Windowed rates are floored at the earliest completion; with no
/// completions every stat is zero.
pub fn habit_summary(logs: &HabitLog, today: NaiveDate) -> HabitSummary {
    let earliest = earliest_completion_date(logs);
    let window = |days: u32| {
        earliest.map_or_else(CompletionStats::default, |floor| {
            windowed_stats_since(logs, days, today, floor)
        })
    };

    HabitSummary {
        current_streak: current_streak(logs, today),
        longest_streak: longest_streak(logs),
        total_completions: total_completions(logs),
        earliest_completion: earliest,
        days_since_earliest: days_since(earliest, today),
        last7: window(7),
        last30: window(30),
        last90: window(90),
        all_time: all_time_stats(logs, earliest, today),
        strip: completion_strip(logs, today, DETAIL_STRIP_DAYS),
    }
}

fn completed_dates(logs: &HabitLog) -> impl Iterator<Item = NaiveDate> + '_ {
    logs.iter().filter(|(_, done)| **done).map(|(day, _)| *day)
}

fn count_completed(logs: &HabitLog, from: NaiveDate, to: NaiveDate) -> u32 {
    if from > to {
        return 0;
    }
    let count = logs.range(from..=to).filter(|(_, done)| **done).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn log_of(entries: &[(NaiveDate, bool)]) -> HabitLog {
        entries.iter().copied().collect()
    }

    fn january_log() -> HabitLog {
        log_of(&[
            (ymd(2024, 1, 1), true),
            (ymd(2024, 1, 2), true),
            (ymd(2024, 1, 3), true),
            (ymd(2024, 1, 5), true),
        ])
    }

    #[test]
    fn gap_breaks_trailing_streak_but_not_longest() {
        let logs = january_log();
        assert_eq!(longest_streak(&logs), 3);
        assert_eq!(current_streak(&logs, ymd(2024, 1, 5)), 1);
        assert_eq!(current_streak(&logs, ymd(2024, 1, 3)), 3);
    }

    #[test]
    fn incomplete_today_means_zero_streak() {
        let mut logs = january_log();
        assert_eq!(current_streak(&logs, ymd(2024, 1, 6)), 0);
        logs.insert(ymd(2024, 1, 6), false);
        assert_eq!(current_streak(&logs, ymd(2024, 1, 6)), 0);
    }

    #[test]
    fn false_entries_break_longest_runs() {
        let logs = log_of(&[
            (ymd(2024, 1, 1), true),
            (ymd(2024, 1, 2), false),
            (ymd(2024, 1, 3), true),
        ]);
        assert_eq!(longest_streak(&logs), 1);
        assert_eq!(longest_streak(&HabitLog::new()), 0);
    }

    #[test]
    fn longest_streak_crosses_month_and_year_boundaries() {
        let logs = log_of(&[
            (ymd(2023, 12, 30), true),
            (ymd(2023, 12, 31), true),
            (ymd(2024, 1, 1), true),
            (ymd(2024, 2, 28), true),
            (ymd(2024, 2, 29), true),
        ]);
        assert_eq!(longest_streak(&logs), 3);
    }

    #[test]
    fn windowed_stats_counts_whole_window() {
        let stats = windowed_stats(&january_log(), 7, ymd(2024, 1, 5));
        assert_eq!(stats, CompletionStats::new(4, 7));
        assert_eq!(stats.rate, 57);

        assert_eq!(windowed_stats(&january_log(), 0, ymd(2024, 1, 5)).rate, 0);
    }

    #[test]
    fn windowed_stats_since_floors_total() {
        let logs = january_log();
        let stats = windowed_stats_since(&logs, 30, ymd(2024, 1, 5), ymd(2024, 1, 1));
        assert_eq!(stats, CompletionStats { completed: 4, total: 5, rate: 80 });

        let later_floor = windowed_stats_since(&logs, 30, ymd(2024, 1, 5), ymd(2024, 2, 1));
        assert_eq!(later_floor, CompletionStats::default());
    }

    #[test]
    fn all_time_stats_anchor_at_earliest_completion() {
        let logs = january_log();
        let earliest = earliest_completion_date(&logs);
        assert_eq!(earliest, Some(ymd(2024, 1, 1)));

        let stats = all_time_stats(&logs, earliest, ymd(2024, 1, 10));
        assert_eq!(stats, CompletionStats { completed: 4, total: 10, rate: 40 });
        assert_eq!(all_time_stats(&logs, None, ymd(2024, 1, 10)), CompletionStats::default());
    }

    #[test]
    fn summary_of_empty_log_is_all_zero() {
        let summary = habit_summary(&HabitLog::new(), ymd(2024, 1, 10));
        assert_eq!(summary.current_streak, 0);
        assert_eq!(summary.total_completions, 0);
        assert_eq!(summary.days_since_earliest, 0);
        assert_eq!(summary.last7, CompletionStats::default());
        assert_eq!(summary.all_time, CompletionStats::default());
        assert_eq!(summary.strip.len(), DETAIL_STRIP_DAYS as usize);
        assert!(summary.strip.iter().all(|mark| !mark.completed));
    }

    #[test]
    fn summary_windows_are_floored_at_earliest_completion() {
        let summary = habit_summary(&january_log(), ymd(2024, 1, 5));
        assert_eq!(summary.last7, CompletionStats { completed: 4, total: 5, rate: 80 });
        assert_eq!(summary.last90, summary.last7);
        assert_eq!(summary.days_since_earliest, 5);
        assert_eq!(summary.strip.last().map(|mark| mark.completed), Some(true));
    }

    #[test]
    fn streak_membership_follows_run_ending_today() {
        let logs = january_log();
        let today = ymd(2024, 1, 3);
        assert!(in_current_streak(&logs, today, ymd(2024, 1, 1)));
        assert!(in_current_streak(&logs, today, ymd(2024, 1, 3)));
        assert!(!in_current_streak(&logs, today, ymd(2024, 1, 5)));

        let after_gap = ymd(2024, 1, 5);
        assert!(in_current_streak(&logs, after_gap, after_gap));
        assert!(!in_current_streak(&logs, after_gap, ymd(2024, 1, 3)));
        assert!(!in_current_streak(&logs, ymd(2024, 1, 6), ymd(2024, 1, 5)));
    }

    #[test]
    fn strip_flags_only_the_current_run() {
        let strip = completion_strip(&january_log(), ymd(2024, 1, 5), 5);
        let flags: Vec<(bool, bool)> = strip
            .iter()
            .map(|mark| (mark.completed, mark.in_streak))
            .collect();
        assert_eq!(
            flags,
            vec![(true, false), (true, false), (true, false), (false, false), (true, true)]
        );
    }

    #[test]
    fn longest_is_never_below_current() {
        let logs = january_log();
        for day in 1..=10 {
            let today = ymd(2024, 1, day);
            assert!(longest_streak(&logs) >= current_streak(&logs, today));
        }
    }
}
