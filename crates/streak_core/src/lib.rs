//! Core domain logic for Streak Seeker.
//! This crate is the single source of truth for habit and streak invariants.

pub mod config;
pub mod date;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stats;

pub use config::{ConfigError, StreakConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::habit::{Habit, HabitId, HabitPatch, HabitValidationError};
pub use model::state::{AppState, CompletionLogs, HabitLog};
pub use repo::state_repo::{
    MemoryStateBackend, RepoError, RepoResult, SqliteStateBackend, StateBackend,
};
pub use service::habit_store::{HabitStore, StoreError, StoreResult};
pub use stats::overall::{
    daily_completion, habit_rankings, heatmap_bucket, overall_stats, overall_view,
    DailyCompletion, HabitRanking, OverallStats, OverallView, Period,
};
pub use stats::streak::{
    all_time_stats, completion_strip, current_streak, dates_strip, days_since,
    earliest_completion_date, habit_summary, in_current_streak, longest_streak,
    total_completions, windowed_stats, windowed_stats_since, CompletionStats, DayMark,
    HabitSummary,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
