//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose habit store and stats use cases to Dart via FRB.
//! - Convert ids and dates to strings at the boundary.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every DB-backed call reports failure through its envelope (`ok` + `message`).
//! - Store calls in this process are serialized; each one is a full
//!   load -> mutate -> save cycle.

use chrono::NaiveDate;
use log::{error, warn};
use streak_core::date::{format_date, parse_date, today};
use streak_core::db::open_db;
use streak_core::{
    core_version as core_version_inner, habit_summary, init_logging as init_logging_inner,
    overall_view as overall_view_inner, ping as ping_inner, CompletionStats, DayMark, Habit,
    HabitId, HabitPatch, HabitStore, Period, SqliteStateBackend, StoreError, StoreResult,
    StreakConfig,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Habit projection for list and detail screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitItem {
    /// Stable habit ID in string form.
    pub id: String,
    pub name: String,
    pub icon: String,
    /// `YYYY-MM-DD`.
    pub created_at: String,
    pub order: u32,
}

/// Habit list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitListResponse {
    pub ok: bool,
    /// Habits ascending by `order` (empty on failure).
    pub items: Vec<HabitItem>,
    pub message: String,
}

/// Generic action response envelope for habit mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected habit, when the operation returns one.
    pub habit: Option<HabitItem>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl HabitActionResponse {
    fn success(message: impl Into<String>, habit: Option<HabitItem>) -> Self {
        Self {
            ok: true,
            habit,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            habit: None,
            message: message.into(),
        }
    }
}

/// Toggle result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitToggleResponse {
    pub ok: bool,
    /// Completion value after the flip.
    pub completed: Option<bool>,
    pub message: String,
}

/// One explicit log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntryItem {
    pub date: String,
    pub completed: bool,
}

/// One cell of the detail view's mini heatmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripCellItem {
    pub date: String,
    pub completed: bool,
    /// Inside the current streak; rendered with the flame marker.
    pub in_streak: bool,
}

/// Per-habit log envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitLogsResponse {
    pub ok: bool,
    /// Explicit entries, oldest first.
    pub entries: Vec<LogEntryItem>,
    pub message: String,
}

/// Completed/total/rate triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionStatsItem {
    pub completed: u32,
    pub total: u32,
    pub rate: u8,
}

/// Habit detail view model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDetailItem {
    pub habit: HabitItem,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub earliest_completion: Option<String>,
    pub days_since_earliest: u32,
    pub last7: CompletionStatsItem,
    pub last30: CompletionStatsItem,
    pub last90: CompletionStatsItem,
    pub all_time: CompletionStatsItem,
    /// Mini heatmap cells, oldest first.
    pub strip: Vec<StripCellItem>,
}

/// Habit detail envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDetailResponse {
    pub ok: bool,
    pub detail: Option<HabitDetailItem>,
    pub message: String,
}

/// One heatmap cell of the overall view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCompletionItem {
    pub date: String,
    pub completed_count: u32,
    pub total_habits: u32,
    pub percentage: u8,
    /// Intensity level 0..=5.
    pub bucket: u8,
}

/// One row of the habit ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitRankingItem {
    pub habit: HabitItem,
    pub completions: u32,
    pub rate: u8,
}

/// Overall view envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallViewResponse {
    pub ok: bool,
    pub period_days: u32,
    pub days: Vec<DailyCompletionItem>,
    pub total_completions: u32,
    pub total_possible: u32,
    pub overall_rate: u8,
    pub perfect_days: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub rankings: Vec<HabitRankingItem>,
    pub message: String,
}

impl OverallViewResponse {
    fn failure(period_days: u32, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            period_days,
            days: Vec::new(),
            total_completions: 0,
            total_possible: 0,
            overall_rate: 0,
            perfect_days: 0,
            current_streak: 0,
            longest_streak: 0,
            rankings: Vec::new(),
            message: message.into(),
        }
    }
}

/// Lists habits in display order.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn habits_list() -> HabitListResponse {
    match with_store(|store| store.list_habits()) {
        Ok(habits) => HabitListResponse {
            ok: true,
            message: format!("Found {} habit(s).", habits.len()),
            items: habits.iter().map(to_habit_item).collect(),
        },
        Err(err) => HabitListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("habits_list failed: {err}"),
        },
    }
}

/// Creates a habit appended at the end of the list.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Invalid name/icon is reported with `ok=false`; nothing is written.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_add(name: String, icon: String) -> HabitActionResponse {
    match with_store(|store| store.add_habit(&name, &icon)) {
        Ok(habit) => HabitActionResponse::success("Habit created.", Some(to_habit_item(&habit))),
        Err(err) => HabitActionResponse::failure(format!("habit_add failed: {err}")),
    }
}

/// Updates name and/or icon of one habit.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `None` fields are left unchanged.
/// - Unknown id returns `ok=false` with a not-found message.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_update(
    habit_id: String,
    name: Option<String>,
    icon: Option<String>,
) -> HabitActionResponse {
    let id = match parse_habit_id(&habit_id) {
        Ok(id) => id,
        Err(err) => return HabitActionResponse::failure(format!("habit_update failed: {err}")),
    };
    let patch = HabitPatch { name, icon };
    match with_store(|store| store.update_habit(id, &patch)) {
        Ok(Some(habit)) => {
            HabitActionResponse::success("Habit updated.", Some(to_habit_item(&habit)))
        }
        Ok(None) => HabitActionResponse::failure(format!("habit `{habit_id}` not found")),
        Err(err) => HabitActionResponse::failure(format!("habit_update failed: {err}")),
    }
}

/// Deletes one habit and all of its log entries.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Deleting an unknown id succeeds with a "nothing to delete" message.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_delete(habit_id: String) -> HabitActionResponse {
    let id = match parse_habit_id(&habit_id) {
        Ok(id) => id,
        Err(err) => return HabitActionResponse::failure(format!("habit_delete failed: {err}")),
    };
    match with_store(|store| store.delete_habit(id)) {
        Ok(true) => HabitActionResponse::success("Habit deleted.", None),
        Ok(false) => HabitActionResponse::success("Nothing to delete.", None),
        Err(err) => HabitActionResponse::failure(format!("habit_delete failed: {err}")),
    }
}

/// Reassigns display order from the given id sequence.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Any malformed id rejects the whole call before touching the store.
#[flutter_rust_bridge::frb(sync)]
pub fn habits_reorder(habit_ids: Vec<String>) -> HabitActionResponse {
    let ids = match habit_ids
        .iter()
        .map(|raw| parse_habit_id(raw))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(ids) => ids,
        Err(err) => return HabitActionResponse::failure(format!("habits_reorder failed: {err}")),
    };
    match with_store(|store| store.reorder_habits(&ids)) {
        Ok(()) => HabitActionResponse::success("Habits reordered.", None),
        Err(err) => HabitActionResponse::failure(format!("habits_reorder failed: {err}")),
    }
}

/// Flips completion of one habit on one date.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `date` is `YYYY-MM-DD`.
/// - Unknown id returns `ok=false`; nothing is written.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_toggle(habit_id: String, date: String) -> HabitToggleResponse {
    let failure = |message: String| HabitToggleResponse {
        ok: false,
        completed: None,
        message,
    };
    let id = match parse_habit_id(&habit_id) {
        Ok(id) => id,
        Err(err) => return failure(format!("habit_toggle failed: {err}")),
    };
    let day = match parse_day(&date) {
        Ok(day) => day,
        Err(err) => return failure(format!("habit_toggle failed: {err}")),
    };
    match with_store(|store| store.toggle_completion(id, day)) {
        Ok(Some(completed)) => HabitToggleResponse {
            ok: true,
            completed: Some(completed),
            message: if completed {
                "Marked complete.".to_string()
            } else {
                "Marked incomplete.".to_string()
            },
        },
        Ok(None) => failure(format!("habit `{habit_id}` not found")),
        Err(err) => failure(format!("habit_toggle failed: {err}")),
    }
}

/// Returns the explicit log entries of one habit.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Unknown id yields an empty successful response.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_logs(habit_id: String) -> HabitLogsResponse {
    let id = match parse_habit_id(&habit_id) {
        Ok(id) => id,
        Err(err) => {
            return HabitLogsResponse {
                ok: false,
                entries: Vec::new(),
                message: format!("habit_logs failed: {err}"),
            };
        }
    };
    match with_store(|store| store.get_habit_logs(id)) {
        Ok(log) => HabitLogsResponse {
            ok: true,
            message: format!("Found {} entry(ies).", log.len()),
            entries: log
                .into_iter()
                .map(|(day, completed)| LogEntryItem {
                    date: format_date(day),
                    completed,
                })
                .collect(),
        },
        Err(err) => HabitLogsResponse {
            ok: false,
            entries: Vec::new(),
            message: format!("habit_logs failed: {err}"),
        },
    }
}

/// Computes the detail view for one habit.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `today` overrides the local date (`YYYY-MM-DD`); `None` uses the clock.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_detail(habit_id: String, today: Option<String>) -> HabitDetailResponse {
    let failure = |message: String| HabitDetailResponse {
        ok: false,
        detail: None,
        message,
    };
    let id = match parse_habit_id(&habit_id) {
        Ok(id) => id,
        Err(err) => return failure(format!("habit_detail failed: {err}")),
    };
    let today = match resolve_today(today.as_deref()) {
        Ok(day) => day,
        Err(err) => return failure(format!("habit_detail failed: {err}")),
    };

    let loaded = with_store(|store| {
        let Some(habit) = store.get_habit(id)? else {
            return Ok(None);
        };
        Ok(Some((habit, store.get_habit_logs(id)?)))
    });
    match loaded {
        Ok(Some((habit, log))) => {
            let summary = habit_summary(&log, today);
            HabitDetailResponse {
                ok: true,
                message: "Detail computed.".to_string(),
                detail: Some(HabitDetailItem {
                    habit: to_habit_item(&habit),
                    current_streak: summary.current_streak,
                    longest_streak: summary.longest_streak,
                    total_completions: summary.total_completions,
                    earliest_completion: summary.earliest_completion.map(format_date),
                    days_since_earliest: summary.days_since_earliest,
                    last7: to_stats_item(summary.last7),
                    last30: to_stats_item(summary.last30),
                    last90: to_stats_item(summary.last90),
                    all_time: to_stats_item(summary.all_time),
                    strip: summary.strip.iter().map(to_strip_cell).collect(),
                }),
            }
        }
        Ok(None) => failure(format!("habit `{habit_id}` not found")),
        Err(err) => failure(format!("habit_detail failed: {err}")),
    }
}

/// Computes the cross-habit overview for a trailing period.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `period_days` must be one of 7|30|90|180|365; `None` means 90.
/// - `today` overrides the local date (`YYYY-MM-DD`); `None` uses the clock.
#[flutter_rust_bridge::frb(sync)]
pub fn overall_view(period_days: Option<u32>, today: Option<String>) -> OverallViewResponse {
    let period = match period_days {
        None => Period::default(),
        Some(days) => match Period::from_days(days) {
            Some(period) => period,
            None => {
                return OverallViewResponse::failure(
                    days,
                    format!("overall_view failed: unsupported period of {days} day(s)"),
                );
            }
        },
    };
    let today = match resolve_today(today.as_deref()) {
        Ok(day) => day,
        Err(err) => {
            return OverallViewResponse::failure(
                period.days(),
                format!("overall_view failed: {err}"),
            );
        }
    };

    let loaded = with_store(|store| {
        let habits = store.list_habits()?;
        let logs = store.logs_by_habit()?;
        Ok((habits, logs))
    });
    let (habits, logs) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            return OverallViewResponse::failure(
                period.days(),
                format!("overall_view failed: {err}"),
            );
        }
    };

    let view = overall_view_inner(&habits, &logs, period, today);
    OverallViewResponse {
        ok: true,
        period_days: view.period_days,
        days: view
            .days
            .iter()
            .map(|day| DailyCompletionItem {
                date: format_date(day.date),
                completed_count: day.completed_count,
                total_habits: day.total_habits,
                percentage: day.percentage,
                bucket: day.bucket(),
            })
            .collect(),
        total_completions: view.stats.total_completions,
        total_possible: view.stats.total_possible,
        overall_rate: view.stats.overall_rate,
        perfect_days: view.stats.perfect_days,
        current_streak: view.stats.current_streak,
        longest_streak: view.stats.longest_streak,
        rankings: view
            .rankings
            .iter()
            .map(|ranking| HabitRankingItem {
                habit: to_habit_item(&ranking.habit),
                completions: ranking.completions,
                rate: ranking.rate,
            })
            .collect(),
        message: format!("Overview for {} day(s).", view.period_days),
    }
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(StreakConfig::db_path_from_env)
        .clone()
}

fn with_store<T>(
    f: impl FnOnce(&HabitStore<SqliteStateBackend<'_>>) -> StoreResult<T>,
) -> Result<T, String> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let db_path = resolve_store_db_path();
    let conn = open_db(&db_path).map_err(|err| {
        error!("event=ffi_store module=ffi status=error stage=open error={err}");
        format!("store DB open failed: {err}")
    })?;
    let backend = SqliteStateBackend::try_new(&conn).map_err(|err| {
        error!("event=ffi_store module=ffi status=error stage=backend error={err}");
        format!("store backend init failed: {err}")
    })?;
    let store = HabitStore::new(backend);
    f(&store).map_err(|err| {
        match &err {
            StoreError::Validation(_) => {
                warn!("event=ffi_store module=ffi status=rejected stage=call");
            }
            StoreError::Persistence(cause) => {
                error!("event=ffi_store module=ffi status=error stage=call error={cause}");
            }
        }
        err.to_string()
    })
}

fn parse_habit_id(raw: &str) -> Result<HabitId, String> {
    HabitId::parse_str(raw.trim()).map_err(|_| format!("invalid habit id `{raw}`"))
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("invalid date `{raw}`; expected YYYY-MM-DD"))
}

fn resolve_today(raw: Option<&str>) -> Result<NaiveDate, String> {
    raw.map_or_else(|| Ok(today()), parse_day)
}

fn to_habit_item(habit: &Habit) -> HabitItem {
    HabitItem {
        id: habit.id.to_string(),
        name: habit.name.clone(),
        icon: habit.icon.clone(),
        created_at: format_date(habit.created_at),
        order: habit.order,
    }
}

fn to_strip_cell(mark: &DayMark) -> StripCellItem {
    StripCellItem {
        date: format_date(mark.date),
        completed: mark.completed,
        in_streak: mark.in_streak,
    }
}

fn to_stats_item(stats: CompletionStats) -> CompletionStatsItem {
    CompletionStatsItem {
        completed: stats.completed,
        total: stats.total,
        rate: stats.rate,
    }
}
