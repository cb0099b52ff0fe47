//! Schema history for the habit store.
//!
//! Each entry of `MIGRATIONS` is one schema step; its 1-based position is
//! the `user_version` it leaves behind. Steps are append-only.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

const MIGRATIONS: &[&str] = &[include_str!("0001_init.sql")];

/// Schema version produced by running every known step.
pub fn latest_version() -> u32 {
    u32::try_from(MIGRATIONS.len()).unwrap_or(u32::MAX)
}

/// Reads the schema version recorded on `conn`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Fails unless `conn` is exactly at [`latest_version`].
pub fn ensure_current(conn: &Connection) -> DbResult<()> {
    match current_user_version(conn)? {
        version if version == latest_version() => Ok(()),
        version => Err(unsupported(version)),
    }
}

/// Runs every step above the recorded version inside one transaction.
///
/// A database written by a newer build is refused untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let recorded = current_user_version(conn)?;
    let latest = latest_version();
    if recorded > latest {
        return Err(unsupported(recorded));
    }

    let mut pending = MIGRATIONS
        .iter()
        .zip(1u32..)
        .skip_while(|(_, version)| *version <= recorded)
        .peekable();
    if pending.peek().is_none() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (sql, version) in pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;
    Ok(())
}

fn unsupported(db_version: u32) -> DbError {
    DbError::UnsupportedSchemaVersion {
        db_version,
        latest_supported: latest_version(),
    }
}
