//! SQLite storage lifecycle for the address book.
//!
//! # Responsibility
//! - Open the single database file and hand out read/write connections.
//! - Create the `users`/`contacts` schema and rebuild it when the stamped
//!   version is older than the configured one.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No application data is read or written before the version gate passes.
//! - Every failure while opening, creating or upgrading surfaces as [`DbError`].

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod schema;
mod store;

pub use store::{ReadHandle, Store, WriteHandle};

pub type DbResult<T> = Result<T, DbError>;

/// Storage initialization fault.
#[derive(Debug)]
pub enum DbError {
    InvalidConfig(String),
    Open {
        location: String,
        source: rusqlite::Error,
    },
    /// Connection pragmas or first-time schema creation failed.
    Bootstrap(rusqlite::Error),
    Upgrade {
        from_version: u32,
        to_version: u32,
        source: rusqlite::Error,
    },
}

impl DbError {
    /// Stable error code emitted in `db_open` log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "invalid_config",
            Self::Open { .. } => "db_open_failed",
            Self::Bootstrap(_) => "db_bootstrap_failed",
            Self::Upgrade { .. } => "db_upgrade_failed",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid store config: {message}"),
            Self::Open { location, source } => {
                write!(f, "failed to open store at `{location}`: {source}")
            }
            Self::Bootstrap(err) => write!(f, "failed to initialize store: {err}"),
            Self::Upgrade {
                from_version,
                to_version,
                source,
            } => write!(
                f,
                "failed to upgrade store from version {from_version} to {to_version}: {source}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::Open { source, .. } => Some(source),
            Self::Bootstrap(err) => Some(err),
            Self::Upgrade { source, .. } => Some(source),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Bootstrap(value)
    }
}
