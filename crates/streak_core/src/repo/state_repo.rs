//! Aggregate state backends: SQLite and in-memory.
//!
//! # Responsibility
//! - Load and save the whole `AppState` document as one unit.
//! - Keep SQL and JSON encoding inside the persistence boundary.
//!
//! # Invariants
//! - A missing record loads as an empty aggregate.
//! - Loaded habits pass `Habit::validate()`.

use crate::db::migrations::ensure_current;
use crate::db::DbError;
use crate::model::state::AppState;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Record key of the persisted aggregate.
pub const STATE_KEY: &str = "streak_seeker_data";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for aggregate load/save.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "state encoding failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted state: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Load/save contract for the persisted aggregate.
pub trait StateBackend {
    fn load(&self) -> RepoResult<AppState>;
    fn save(&self, state: &AppState) -> RepoResult<()>;
}

/// SQLite-backed aggregate storage: one JSON row per key.
pub struct SqliteStateBackend<'conn> {
    conn: &'conn Connection,
    key: String,
}

impl<'conn> SqliteStateBackend<'conn> {
    /// Creates a backend after verifying the schema is fully migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_key(conn, STATE_KEY)
    }

    /// Creates a backend storing its aggregate under a custom key.
    pub fn with_key(conn: &'conn Connection, key: impl Into<String>) -> RepoResult<Self> {
        ensure_current(conn)?;
        Ok(Self {
            conn,
            key: key.into(),
        })
    }
}

impl StateBackend for SqliteStateBackend<'_> {
    fn load(&self) -> RepoResult<AppState> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM app_state WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(payload) => {
                let state: AppState = serde_json::from_str(&payload)?;
                check_state(&state)?;
                Ok(state)
            }
            None => Ok(AppState::default()),
        }
    }

    fn save(&self, state: &AppState) -> RepoResult<()> {
        let payload = serde_json::to_string(state)?;
        self.conn.execute(
            "INSERT INTO app_state (key, payload) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.key.as_str(), payload],
        )?;
        Ok(())
    }
}

/// Process-local backend for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStateBackend {
    state: RefCell<AppState>,
    saves: Cell<usize>,
}

impl MemoryStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            state: RefCell::new(state),
            saves: Cell::new(0),
        }
    }

    /// Number of completed saves, for asserting write behavior.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl StateBackend for MemoryStateBackend {
    fn load(&self) -> RepoResult<AppState> {
        Ok(self.state.borrow().clone())
    }

    fn save(&self, state: &AppState) -> RepoResult<()> {
        *self.state.borrow_mut() = state.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

fn check_state(state: &AppState) -> RepoResult<()> {
    let mut seen = HashSet::with_capacity(state.habits.len());
    for habit in &state.habits {
        habit
            .validate()
            .map_err(|err| RepoError::InvalidData(format!("habit {}: {err}", habit.id)))?;
        if !seen.insert(habit.id) {
            return Err(RepoError::InvalidData(format!(
                "duplicate habit id {}",
                habit.id
            )));
        }
    }
    Ok(())
}
