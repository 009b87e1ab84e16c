//! SQLite storage for tenant slots.
//!
//! Every dealership document (contacts, todos, calendar events, settings) and
//! the system-wide dealership registry live as JSON payloads in a single
//! `storage_slots` table keyed by `(tenant_id, slot_key)`.
//!
//! # Invariants
//! - Schema version is `PRAGMA user_version`; a file newer than this build is
//!   refused rather than read.
//! - Connections handed out by this module are fully migrated.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The database directory could not be prepared.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "storage error: {err}"),
            Self::Io { path, source } => {
                write!(f, "cannot prepare storage at {}: {source}", path.display())
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "storage schema v{found} was written by a newer recondesk (this build knows v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
