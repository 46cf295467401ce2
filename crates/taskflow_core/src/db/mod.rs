//! Task database: file bootstrap and the migration ladder.
//!
//! Everything above this module receives a `Connection` that is already
//! at `migrations::latest_version()`. Failures are reported as [`DbError`]
//! so callers can tell a broken migration script from an app downgrade.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Driver failure while opening or configuring the connection.
    Sqlite(rusqlite::Error),
    /// A migration script failed. Its transaction was rolled back, so
    /// `user_version` still reads the version before it.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file carries a schema this build does not know. Opening it
    /// would risk writing rows a newer app cannot read back.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Schema version the failure is tied to, if any.
    pub fn schema_version(&self) -> Option<u32> {
        match self {
            Self::Sqlite(_) => None,
            Self::Migration { version, .. } => Some(*version),
            Self::SchemaTooNew { found, .. } => Some(*found),
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Migration { version, source } => {
                write!(f, "task database migration v{version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "task database version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
