//! Store configuration.
//!
//! # Responsibility
//! - Describe where the address-book database lives and which schema version
//!   the running binary expects.
//! - Carry connection tuning knobs consumed by [`crate::db::Store::open`].
//!
//! # Invariants
//! - `schema_version` is strictly positive; `0` is reserved for "no store".
//! - `read_pool_size` is at least one reader.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Database file name used when only a directory is provided.
pub const DATABASE_FILE_NAME: &str = "AddressBook.db";
/// Schema version shipped by this build.
pub const DATABASE_VERSION: u32 = 1;

const DEFAULT_READ_POOL_SIZE: usize = 4;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Physical location of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "path")]
pub enum StoreLocation {
    /// Single database file on disk.
    File(PathBuf),
    /// Private in-memory database, gone when the store is dropped.
    Memory,
}

impl StoreLocation {
    /// Short label used in log lines (`file` or `memory`).
    pub fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Options for opening an address-book store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Desired schema version; older stores are rebuilt on open.
    pub schema_version: u32,
    /// Number of read-only connections for file stores.
    pub read_pool_size: usize,
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            schema_version: DATABASE_VERSION,
            read_pool_size: DEFAULT_READ_POOL_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// Config for a database file at an explicit path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            ..Self::default()
        }
    }

    /// Config for the default database file name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::file(dir.as_ref().join(DATABASE_FILE_NAME))
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    pub fn with_read_pool_size(mut self, size: usize) -> Self {
        self.read_pool_size = size;
        self
    }

    /// Checks option ranges before any connection is opened.
    ///
    /// # Errors
    /// - Returns a message when `schema_version` or `read_pool_size` is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version == 0 {
            return Err("schema_version must be greater than zero".to_string());
        }
        if self.read_pool_size == 0 {
            return Err("read_pool_size must be at least 1".to_string());
        }
        Ok(())
    }
}
