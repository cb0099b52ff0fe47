use rusqlite::Connection;
use streak_core::db::migrations::{apply_migrations, current_user_version, latest_version};
use streak_core::db::{open_db, open_db_in_memory, DbError};
use streak_core::{AppState, RepoError, SqliteStateBackend, StateBackend};

#[test]
fn fresh_connection_is_migrated_to_latest() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_eq!(
        column_names(&conn, "app_state"),
        vec!["key", "payload", "updated_at"]
    );
}

#[test]
fn applying_migrations_twice_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO app_state (key, payload) VALUES ('probe', '{}');",
        [],
    )
    .unwrap();

    apply_migrations(&mut conn).unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM app_state;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
}

#[test]
fn reopening_a_file_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streak.db");

    {
        let conn = open_db(&path).unwrap();
        let backend = SqliteStateBackend::try_new(&conn).unwrap();
        backend.save(&AppState::default()).unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    let updated_at: i64 = conn
        .query_row(
            "SELECT updated_at FROM app_state WHERE key = 'streak_seeker_data';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(updated_at > 0);
}

#[test]
fn newer_schema_is_refused_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("from-the-future.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 42;")
        .unwrap();

    match open_db(&path) {
        Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        }) => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, latest_version());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer schema must be refused"),
    }
}

#[test]
fn state_backend_requires_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let Err(err) = SqliteStateBackend::try_new(&conn) else {
        panic!("unmigrated connection must be rejected");
    };
    assert!(matches!(
        err,
        RepoError::Db(DbError::UnsupportedSchemaVersion { db_version: 0, .. })
    ));
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}
