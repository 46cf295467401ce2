//! Key/value settings persistence.
//!
//! # Invariants
//! - Keys are unique; `set_setting` upserts.
//! - `set_settings` writes every entry or none.

use crate::repo::ensure_schema_ready;
use crate::repo::task_repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

const SETTINGS_COLUMNS: &[&str] = &["key", "value", "updated_at"];

const UPSERT_SETTING_SQL: &str = "INSERT INTO app_settings (key, value)
     VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = (strftime('%s', 'now') * 1000);";

/// Repository interface for app settings.
pub trait SettingsRepository {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>>;
    fn set_setting(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Upserts a group of keys atomically.
    fn set_settings(&self, entries: &[(&str, &str)]) -> RepoResult<()>;
    /// Returns whether a row was removed.
    fn remove_setting(&self, key: &str) -> RepoResult<bool>;
}

/// SQLite-backed settings repository over `app_settings`.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, "app_settings", SETTINGS_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(UPSERT_SETTING_SQL, params![key, value])?;
        Ok(())
    }

    fn set_settings(&self, entries: &[(&str, &str)]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for &(key, value) in entries {
            tx.execute(UPSERT_SETTING_SQL, params![key, value])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove_setting(&self, key: &str) -> RepoResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM app_settings WHERE key = ?1;", [key])?;
        Ok(removed > 0)
    }
}
