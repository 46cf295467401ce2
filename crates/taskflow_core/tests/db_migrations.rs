use rusqlite::Connection;
use taskflow_core::db::migrations::latest_version;
use taskflow_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tasks");
    assert_table_exists(&conn, "app_settings");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskflow.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "tasks");
}

#[test]
fn file_database_uses_wal_journal() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("wal.db")).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_ascii_lowercase(), "wal");
}

#[test]
fn reader_and_writer_connections_share_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let writer = open_db(&path).unwrap();
    let reader = open_db(&path).unwrap();

    writer
        .execute(
            "INSERT INTO tasks (id, title, priority, created_at, sort_order)
             VALUES ('00000000-0000-4000-8000-000000000001', 'shared', 'low', 1, 0);",
            [],
        )
        .unwrap();

    let seen: i64 = reader
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(seen, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert_eq!(err.schema_version(), Some(999));
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_migration_names_its_version_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE tasks (id TEXT PRIMARY KEY, title TEXT);")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(err, DbError::Migration { version: 1, .. }),
        "unexpected error: {err}"
    );
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.to_string().contains("migration v1"), "{err}");

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    let settings_tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'app_settings';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(settings_tables, 0);
}

#[test]
fn tasks_table_rejects_blank_title_and_unknown_priority() {
    let conn = open_db_in_memory().unwrap();

    let blank = conn.execute(
        "INSERT INTO tasks (id, title, priority, created_at) VALUES ('a', '  ', 'low', 1);",
        [],
    );
    assert!(blank.is_err());

    let bad_priority = conn.execute(
        "INSERT INTO tasks (id, title, priority, created_at) VALUES ('b', 'x', 'urgent', 1);",
        [],
    );
    assert!(bad_priority.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
