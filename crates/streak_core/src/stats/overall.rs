//! Cross-habit aggregate engine: daily heatmap, perfect days, rankings.
//!
//! # Responsibility
//! - Aggregate every habit's log over a trailing period.
//! - Derive perfect-day streaks and per-habit rankings from that series.
//!
//! # Invariants
//! - The daily series is oldest first and has exactly `period_days` entries.
//! - A day with zero habits has percentage 0 and is never perfect.
//! - Rankings sort by rate descending; ties keep the input order.

use crate::date;
use crate::model::habit::{Habit, HabitId};
use crate::model::state::HabitLog;
use crate::stats::{longest_run, percent, trailing_run};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Fixed trailing windows offered by the overall view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Period {
    Week,
    Month,
    #[default]
    Quarter,
    HalfYear,
    Year,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Week,
        Period::Month,
        Period::Quarter,
        Period::HalfYear,
        Period::Year,
    ];

    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::HalfYear => 180,
            Self::Year => 365,
        }
    }

    /// Maps a day count back to its period; other counts are rejected.
    pub fn from_days(days: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|period| period.days() == days)
    }
}

/// Completion totals across all habits for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCompletion {
    pub date: NaiveDate,
    pub completed_count: u32,
    pub total_habits: u32,
    pub percentage: u8,
}

impl DailyCompletion {
    pub fn is_perfect(&self) -> bool {
        self.percentage == 100
    }

    /// Heatmap intensity level for this day.
    pub fn bucket(&self) -> u8 {
        heatmap_bucket(self.percentage)
    }
}

/// Period-level aggregate numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverallStats {
    pub total_completions: u32,
    pub total_possible: u32,
    pub overall_rate: u8,
    pub perfect_days: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// One habit's standing within the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitRanking {
    pub habit: Habit,
    pub completions: u32,
    pub rate: u8,
}

/// Everything the overall view renders for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallView {
    pub period_days: u32,
    pub days: Vec<DailyCompletion>,
    pub stats: OverallStats,
    pub rankings: Vec<HabitRanking>,
}

fn done_on(logs_by_habit: &HashMap<HabitId, HabitLog>, habit_id: HabitId, day: NaiveDate) -> bool {
    logs_by_habit
        .get(&habit_id)
        .and_then(|log| log.get(&day))
        .copied()
        .unwrap_or(false)
}

/// Per-day completion counts for the trailing `period_days`, oldest first.
pub fn daily_completion(
    habits: &[Habit],
    logs_by_habit: &HashMap<HabitId, HabitLog>,
    period_days: u32,
    today: NaiveDate,
) -> Vec<DailyCompletion> {
    let total_habits = u32::try_from(habits.len()).unwrap_or(u32::MAX);
    date::last_n_days(today, period_days)
        .into_iter()
        .map(|day| {
            let completed = habits
                .iter()
                .filter(|habit| done_on(logs_by_habit, habit.id, day))
                .count();
            let completed_count = u32::try_from(completed).unwrap_or(u32::MAX);
            DailyCompletion {
                date: day,
                completed_count,
                total_habits,
                percentage: percent(completed_count, total_habits),
            }
        })
        .collect()
}

/// Totals, overall rate and perfect-day streaks for a daily series.
///
/// Streaks use the per-habit rules applied to "day is perfect": the
/// current streak ends at the last day of the series.
pub fn overall_stats(daily: &[DailyCompletion]) -> OverallStats {
    let total_completions = daily
        .iter()
        .fold(0u32, |sum, day| sum.saturating_add(day.completed_count));
    let total_possible = daily
        .iter()
        .fold(0u32, |sum, day| sum.saturating_add(day.total_habits));
    let perfect = || daily.iter().map(DailyCompletion::is_perfect);

    OverallStats {
        total_completions,
        total_possible,
        overall_rate: percent(total_completions, total_possible),
        perfect_days: u32::try_from(perfect().filter(|flag| *flag).count()).unwrap_or(u32::MAX),
        current_streak: trailing_run(perfect()),
        longest_streak: longest_run(perfect()),
    }
}

/// Ranks habits by completion rate over the series' dates.
///
/// `rate = round(completions / period_days * 100)` with
/// `period_days = daily.len()`.
pub fn habit_rankings(
    habits: &[Habit],
    logs_by_habit: &HashMap<HabitId, HabitLog>,
    daily: &[DailyCompletion],
) -> Vec<HabitRanking> {
    let period_days = u32::try_from(daily.len()).unwrap_or(u32::MAX);
    let mut rankings: Vec<HabitRanking> = habits
        .iter()
        .map(|habit| {
            let completions = daily
                .iter()
                .filter(|day| done_on(logs_by_habit, habit.id, day.date))
                .count();
            let completions = u32::try_from(completions).unwrap_or(u32::MAX);
            HabitRanking {
                habit: habit.clone(),
                completions,
                rate: percent(completions, period_days),
            }
        })
        .collect();
    // `sort_by` is stable, so equal rates keep display order.
    rankings.sort_by(|a, b| b.rate.cmp(&a.rate));
    rankings
}

/// Display intensity level (0..=5) for a completion percentage.
pub fn heatmap_bucket(percentage: u8) -> u8 {
    match percentage {
        0 => 0,
        1..=24 => 1,
        25..=49 => 2,
        50..=74 => 3,
        75..=99 => 4,
        _ => 5,
    }
}

/// Computes the full overall view for `period` ending at `today`.
pub fn overall_view(
    habits: &[Habit],
    logs_by_habit: &HashMap<HabitId, HabitLog>,
    period: Period,
    today: NaiveDate,
) -> OverallView {
    let days = daily_completion(habits, logs_by_habit, period.days(), today);
    let stats = overall_stats(&days);
    let rankings = habit_rankings(habits, logs_by_habit, &days);
    OverallView {
        period_days: period.days(),
        days,
        stats,
        rankings,
    }
}
