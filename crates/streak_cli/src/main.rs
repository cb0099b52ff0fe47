//! Streak CLI - command-line front end for the habit store.
//!
//! Commands:
//! - list: habits with a 12-day completion grid
//! - add / edit / delete / reorder: habit management
//! - toggle: flip completion for a date
//! - detail: streaks and completion rates for one habit
//! - overall: cross-habit summary for a trailing period

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use streak_core::date::{self, GRID_PAGE_DAYS};
use streak_core::db::{open_db, DbError};
use streak_core::{
    dates_strip, habit_summary, init_logging_from_config, overall_view, ConfigError, DayMark,
    HabitId, HabitLog, HabitPatch, HabitStore, Period, RepoError, SqliteStateBackend, StoreError,
    StreakConfig,
};
use uuid::Uuid;

/// Streak Seeker - track daily habits and their streaks
#[derive(Parser)]
#[command(name = "streak")]
#[command(version = streak_core::core_version())]
#[command(about = "Track daily habits and their streaks", long_about = None)]
struct Cli {
    /// Database file (defaults to STREAK_DB_PATH or the temp directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true, value_parser = parse_day_arg)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List habits with a completion grid
    List {
        /// Grid page; 0 ends today, 1 is the 12 days before that
        #[arg(long, default_value = "0")]
        page: u32,
    },

    /// Create a habit
    Add {
        name: String,
        /// A single emoji
        icon: String,
    },

    /// Rename a habit or change its icon
    Edit {
        id: Uuid,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// Delete a habit and its history
    Delete { id: Uuid },

    /// Set display order from the given id sequence
    Reorder {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },

    /// Flip completion of a habit (defaults to today)
    Toggle {
        id: Uuid,

        #[arg(long, value_parser = parse_day_arg)]
        date: Option<NaiveDate>,
    },

    /// Show streaks and completion rates for one habit
    Detail { id: Uuid },

    /// Show the cross-habit summary
    Overall {
        /// Period length in days: 7, 30, 90, 180 or 365
        #[arg(long, default_value = "90")]
        period: u32,
    },
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Db(DbError),
    Repo(RepoError),
    Store(StoreError),
    Logging(String),
    NotFound(HabitId),
    UnsupportedPeriod(u32),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Repo(err) => write!(f, "storage error: {err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "logging error: {err}"),
            Self::NotFound(id) => write!(f, "habit {id} not found"),
            Self::UnsupportedPeriod(days) => {
                write!(f, "unsupported period {days}; expected 7, 30, 90, 180 or 365")
            }
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Logging(_) | Self::NotFound(_) | Self::UnsupportedPeriod(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

type Store<'conn> = HabitStore<SqliteStateBackend<'conn>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = StreakConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    init_logging_from_config(&config).map_err(CliError::Logging)?;

    let today = cli.today.unwrap_or_else(date::today);
    let conn = open_db(&config.db_path)?;
    let store = HabitStore::new(SqliteStateBackend::try_new(&conn)?);

    match cli.command {
        Commands::List { page } => cmd_list(&store, today, page),
        Commands::Add { name, icon } => {
            let habit = store.add_habit_on(&name, &icon, today)?;
            println!("created {} {} {}", habit.id, habit.icon, habit.name);
            Ok(())
        }
        Commands::Edit { id, name, icon } => {
            let habit = store
                .update_habit(id, &HabitPatch { name, icon })?
                .ok_or(CliError::NotFound(id))?;
            println!("updated {} {} {}", habit.id, habit.icon, habit.name);
            Ok(())
        }
        Commands::Delete { id } => {
            if store.delete_habit(id)? {
                println!("deleted {id}");
            } else {
                println!("nothing to delete");
            }
            Ok(())
        }
        Commands::Reorder { ids } => {
            store.reorder_habits(&ids)?;
            cmd_list(&store, today, 0)
        }
        Commands::Toggle { id, date: day } => {
            let day = day.unwrap_or(today);
            let completed = store
                .toggle_completion(id, day)?
                .ok_or(CliError::NotFound(id))?;
            let state = if completed { "done" } else { "not done" };
            println!("{id} {} {state}", date::format_date(day));
            Ok(())
        }
        Commands::Detail { id } => cmd_detail(&store, id, today),
        Commands::Overall { period } => {
            let period = Period::from_days(period).ok_or(CliError::UnsupportedPeriod(period))?;
            cmd_overall(&store, period, today)
        }
    }
}

fn cmd_list(store: &Store<'_>, today: NaiveDate, page: u32) -> Result<(), CliError> {
    let habits = store.list_habits()?;
    if habits.is_empty() {
        println!("no habits yet");
        return Ok(());
    }
    let logs = store.logs_by_habit()?;
    let offset = -i64::from(page) * i64::from(GRID_PAGE_DAYS);
    let days = date::dates_with_offset(today, offset, GRID_PAGE_DAYS);

    let header: Vec<String> = days
        .iter()
        .map(|day| date::day_of_week(*day)[..2].to_string())
        .collect();
    println!("{:<40} {}", "", header.join(" "));
    let empty = HabitLog::new();
    for habit in &habits {
        let log = logs.get(&habit.id).unwrap_or(&empty);
        let cells: Vec<&str> = dates_strip(log, today, &days)
            .iter()
            .map(grid_cell)
            .collect();
        println!(
            "{} {} {:<20} {}",
            habit.id,
            habit.icon,
            habit.name,
            cells.join(" ")
        );
    }
    Ok(())
}

fn cmd_detail(store: &Store<'_>, id: HabitId, today: NaiveDate) -> Result<(), CliError> {
    let habit = store.get_habit(id)?.ok_or(CliError::NotFound(id))?;
    let summary = habit_summary(&store.get_habit_logs(id)?, today);

    println!("{} {}", habit.icon, habit.name);
    println!("created:        {}", date::format_date(habit.created_at));
    println!("current streak: {}", summary.current_streak);
    println!("longest streak: {}", summary.longest_streak);
    println!("completions:    {}", summary.total_completions);
    match summary.earliest_completion {
        Some(earliest) => println!(
            "tracking since: {} ({} days)",
            date::format_date(earliest),
            summary.days_since_earliest
        ),
        None => println!("tracking since: -"),
    }
    for (label, stats) in [
        ("last 7 days", summary.last7),
        ("last 30 days", summary.last30),
        ("last 90 days", summary.last90),
        ("all time", summary.all_time),
    ] {
        println!(
            "{label:<14}  {:>3}%  ({}/{})",
            stats.rate, stats.completed, stats.total
        );
    }
    let strip: String = summary
        .strip
        .iter()
        .map(|mark| match (mark.in_streak, mark.completed) {
            (true, _) => '*',
            (false, true) => '#',
            (false, false) => '.',
        })
        .collect();
    println!("{strip}");
    Ok(())
}

/// `**` for days in the current streak, `##` for other completed days.
fn grid_cell(mark: &DayMark) -> &'static str {
    match (mark.in_streak, mark.completed) {
        (true, _) => "**",
        (false, true) => "##",
        (false, false) => "..",
    }
}

fn cmd_overall(store: &Store<'_>, period: Period, today: NaiveDate) -> Result<(), CliError> {
    let habits = store.list_habits()?;
    let logs = store.logs_by_habit()?;
    let view = overall_view(&habits, &logs, period, today);
    let stats = view.stats;

    println!("last {} days", view.period_days);
    println!(
        "completion rate: {}% ({}/{})",
        stats.overall_rate, stats.total_completions, stats.total_possible
    );
    println!("perfect days:    {}", stats.perfect_days);
    println!("current streak:  {}", stats.current_streak);
    println!("longest streak:  {}", stats.longest_streak);

    let heatmap: String = view
        .days
        .iter()
        .map(|day| char::from(b'0' + day.bucket()))
        .collect();
    println!("{heatmap}");

    for (rank, ranking) in view.rankings.iter().enumerate() {
        println!(
            "{:>2}. {} {:<20} {:>3}% ({})",
            rank + 1,
            ranking.habit.icon,
            ranking.habit.name,
            ranking.rate,
            ranking.completions
        );
    }
    Ok(())
}

fn parse_day_arg(value: &str) -> Result<NaiveDate, String> {
    date::parse_date(value).ok_or_else(|| format!("invalid date `{value}`; expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::{grid_cell, parse_day_arg, Cli};
    use chrono::NaiveDate;
    use clap::CommandFactory;
    use streak_core::{dates_strip, HabitLog};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn grid_cells_distinguish_streak_days() {
        let logs: HabitLog = [
            (ymd(2024, 1, 1), true),
            (ymd(2024, 1, 3), true),
            (ymd(2024, 1, 4), true),
        ]
        .into_iter()
        .collect();
        let days: Vec<NaiveDate> = (1..=4).map(|d| ymd(2024, 1, d)).collect();

        let cells: Vec<&str> = dates_strip(&logs, ymd(2024, 1, 4), &days)
            .iter()
            .map(grid_cell)
            .collect();
        assert_eq!(cells, vec!["##", "..", "**", "**"]);
    }

    #[test]
    fn parse_day_arg_accepts_iso_dates_only() {
        assert!(parse_day_arg("2024-01-05").is_ok());
        assert!(parse_day_arg("01/05/2024").is_err());
    }
}
