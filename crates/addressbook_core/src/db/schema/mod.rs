//! Version-gated schema creation for the address-book store.
//!
//! # Responsibility
//! - Create `users` and `contacts` together on a fresh store.
//! - Rebuild both tables when the stamped version is older than requested.
//!
//! # Invariants
//! - Both tables are created and dropped together; there is no per-table
//!   migration.
//! - Create/rebuild and the version stamp commit in one transaction.
//! - A store stamped with an equal or newer version is left untouched.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

const CREATE_SQL: &str = include_str!("address_book.sql");
const DROP_SQL: &str = include_str!("drop_address_book.sql");

/// What the version gate did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaAction {
    /// No schema existed; tables were created.
    Created,
    /// Older schema was dropped and recreated. All rows are gone.
    Rebuilt { from_version: u32 },
    /// Stamped version equals the requested one.
    Current,
    /// Stamped version is newer than the requested one; nothing was touched.
    Newer { found_version: u32 },
}

/// Brings the schema to `target_version`, destructively if needed.
pub fn apply_schema(conn: &mut Connection, target_version: u32) -> DbResult<SchemaAction> {
    let current_version = current_user_version(conn)?;

    if current_version > target_version {
        return Ok(SchemaAction::Newer {
            found_version: current_version,
        });
    }
    if current_version == target_version {
        return Ok(SchemaAction::Current);
    }

    match rebuild(conn, target_version) {
        Ok(()) if current_version == 0 => Ok(SchemaAction::Created),
        Ok(()) => Ok(SchemaAction::Rebuilt {
            from_version: current_version,
        }),
        Err(err) if current_version == 0 => Err(DbError::Bootstrap(err)),
        Err(err) => Err(DbError::Upgrade {
            from_version: current_version,
            to_version: target_version,
            source: err,
        }),
    }
}

/// Reads the stamped schema version (`0` for a fresh file).
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn rebuild(conn: &mut Connection, target_version: u32) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    // Version 0 may still hold tables from an unstamped file.
    tx.execute_batch(DROP_SQL)?;
    tx.execute_batch(CREATE_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {target_version};"))?;
    tx.commit()
}
