//! Connection ownership for the address-book database.
//!
//! # Responsibility
//! - Open the store once, run the schema version gate, and keep the
//!   resulting connections for the lifetime of the process.
//! - Hand out read handles (concurrent) and write handles (serialized).
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` on the writer.
//! - Exactly one writer connection exists; writes serialize on its mutex.
//! - File stores run in WAL mode so readers proceed alongside the writer.
//! - The database file is never deleted or truncated by opening it.

use super::schema::{apply_schema, current_user_version, SchemaAction};
use super::{DbError, DbResult};
use crate::config::{StoreConfig, StoreLocation};
use log::{error, info, warn};
use rusqlite::{Connection, OpenFlags};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, Instant};

/// Opened address-book store.
pub struct Store {
    location: StoreLocation,
    schema_version: u32,
    writer: Mutex<Connection>,
    /// Read-only connections; empty for in-memory stores.
    readers: Vec<Mutex<Connection>>,
    read_cursor: AtomicUsize,
}

/// Connection borrowed for reading.
pub struct ReadHandle<'store> {
    conn: MutexGuard<'store, Connection>,
}

/// Exclusive writer connection. Other writers block until it is dropped.
pub struct WriteHandle<'store> {
    conn: MutexGuard<'store, Connection>,
}

impl Deref for ReadHandle<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Deref for WriteHandle<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for WriteHandle<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Store {
    /// Opens (creating or rebuilding if needed) the store described by `config`.
    ///
    /// # Side effects
    /// - Creates the database file when absent.
    /// - Drops and recreates both tables when the stamped version is older
    ///   than `config.schema_version`.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(config: &StoreConfig) -> DbResult<Self> {
        let started_at = Instant::now();
        let mode = config.location.mode();
        info!(
            "event=db_open module=db status=start mode={mode} target_version={}",
            config.schema_version
        );

        match Self::open_inner(config) {
            Ok(store) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={} schema_version={} readers={}",
                    started_at.elapsed().as_millis(),
                    store.schema_version,
                    store.readers.len()
                );
                Ok(store)
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn open_inner(config: &StoreConfig) -> DbResult<Self> {
        config.validate().map_err(DbError::InvalidConfig)?;
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

        let mut writer = open_writer(&config.location)?;
        configure_writer(&writer, &config.location, busy_timeout).map_err(DbError::Bootstrap)?;

        match apply_schema(&mut writer, config.schema_version)? {
            SchemaAction::Created => {
                info!(
                    "event=db_schema module=db status=ok action=created version={}",
                    config.schema_version
                );
            }
            SchemaAction::Rebuilt { from_version } => {
                warn!(
                    "event=db_schema module=db status=ok action=rebuilt from_version={from_version} to_version={}",
                    config.schema_version
                );
            }
            SchemaAction::Current => {}
            SchemaAction::Newer { found_version } => {
                warn!(
                    "event=db_schema module=db status=ok action=kept_newer found_version={found_version} requested_version={}",
                    config.schema_version
                );
            }
        }
        let schema_version = current_user_version(&writer)?;

        let readers = match &config.location {
            StoreLocation::File(path) => (0..config.read_pool_size)
                .map(|_| open_reader(path, busy_timeout).map(Mutex::new))
                .collect::<DbResult<Vec<_>>>()?,
            StoreLocation::Memory => Vec::new(),
        };

        Ok(Self {
            location: config.location.clone(),
            schema_version,
            writer: Mutex::new(writer),
            readers,
            read_cursor: AtomicUsize::new(0),
        })
    }

    /// Opens a private in-memory store at the current schema version.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Schema version stamped in the store after opening.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Returns a connection for reads.
    ///
    /// Prefers an idle reader; blocks on the next reader in rotation when all
    /// are busy. In-memory stores read through the writer connection.
    pub fn acquire_read(&self) -> ReadHandle<'_> {
        if self.readers.is_empty() {
            return ReadHandle {
                conn: lock_recovering(&self.writer),
            };
        }

        let len = self.readers.len();
        let start = self.read_cursor.fetch_add(1, Ordering::Relaxed) % len;
        for offset in 0..len {
            match self.readers[(start + offset) % len].try_lock() {
                Ok(conn) => return ReadHandle { conn },
                Err(TryLockError::Poisoned(poisoned)) => {
                    return ReadHandle {
                        conn: poisoned.into_inner(),
                    }
                }
                Err(TryLockError::WouldBlock) => continue,
            }
        }

        ReadHandle {
            conn: lock_recovering(&self.readers[start]),
        }
    }

    /// Returns the writer connection, waiting for any in-flight writer.
    pub fn acquire_write(&self) -> WriteHandle<'_> {
        WriteHandle {
            conn: lock_recovering(&self.writer),
        }
    }
}

fn lock_recovering(mutex: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn open_writer(location: &StoreLocation) -> DbResult<Connection> {
    match location {
        StoreLocation::File(path) => Connection::open(path).map_err(|source| DbError::Open {
            location: path.display().to_string(),
            source,
        }),
        StoreLocation::Memory => Connection::open_in_memory().map_err(|source| DbError::Open {
            location: ":memory:".to_string(),
            source,
        }),
    }
}

fn configure_writer(
    conn: &Connection,
    location: &StoreLocation,
    busy_timeout: Duration,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    if matches!(location, StoreLocation::File(_)) {
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            warn!("event=db_open module=db status=degraded journal_mode={journal_mode}");
        }
    }
    Ok(())
}

fn open_reader(path: &Path, busy_timeout: Duration) -> DbResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(path, flags).map_err(|source| DbError::Open {
        location: path.display().to_string(),
        source,
    })?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}
