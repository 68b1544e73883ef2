//! Resource router and CRUD dispatcher.
//!
//! # Responsibility
//! - Resolve resource identifiers (`/users`, `/contacts`, `/contacts/{id}`)
//!   to a [`ResourceKind`] through an explicit [`RouteTable`].
//! - Gate operations per kind, build parameterized statements, run them on
//!   store handles, and emit change notifications on effective mutations.
//!
//! # Invariants
//! - Collections never accept update/delete; single rows never accept insert.
//! - Contacts-collection operations are always filtered by the session user.
//! - Notifications are emitted only after a confirmed, non-zero effect.

use crate::db::DbError;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod cursor;
mod dispatcher;
mod routes;
mod sql;
mod uri;
mod values;

pub use cursor::{Cursor, ResultRow};
pub use dispatcher::AddressBookProvider;
pub use routes::{
    Operation, ResourceKind, RouteMatch, RouteTable, RouteTableBuilder, RouteTableError,
};
pub use uri::{InvalidUri, ResourceUri};
pub use values::{Comparison, ContentValues, Predicate, QueryRequest, Selection, SortKey};

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Dispatcher fault surfaced to the immediate caller.
#[derive(Debug)]
pub enum ProviderError {
    /// Identifier matches no route.
    UnsupportedResource { uri: String },
    OperationNotAllowed {
        operation: Operation,
        kind: ResourceKind,
        uri: ResourceUri,
    },
    /// Store returned no positive row id, or rejected the row.
    InsertFailed {
        uri: ResourceUri,
        source: Option<rusqlite::Error>,
    },
    StorageInit(DbError),
    /// Any other store error while executing a statement.
    Execution(rusqlite::Error),
    /// Contacts-collection operation without a signed-in user.
    NoActiveSession { uri: ResourceUri },
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    /// Column exists but callers may not write it (row ids).
    ReadOnlyColumn {
        table: &'static str,
        column: &'static str,
    },
    EmptyValues { uri: ResourceUri },
    /// Insert tried to attach a contact to someone other than the session user.
    UserScopeMismatch {
        session_user_id: i64,
        requested: Value,
    },
}

impl ProviderError {
    /// Stable error code emitted in `provider_*` log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedResource { .. } => "unsupported_resource",
            Self::OperationNotAllowed { .. } => "operation_not_allowed",
            Self::InsertFailed { .. } => "insert_failed",
            Self::StorageInit(_) => "storage_init_failed",
            Self::Execution(_) => "storage_execution_failed",
            Self::NoActiveSession { .. } => "no_active_session",
            Self::UnknownColumn { .. } => "unknown_column",
            Self::ReadOnlyColumn { .. } => "read_only_column",
            Self::EmptyValues { .. } => "empty_values",
            Self::UserScopeMismatch { .. } => "user_scope_mismatch",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedResource { uri } => write!(f, "unsupported resource: {uri}"),
            Self::OperationNotAllowed {
                operation,
                kind,
                uri,
            } => write!(f, "{operation} is not supported for {kind} resource {uri}"),
            Self::InsertFailed { uri, source } => match source {
                Some(err) => write!(f, "insert failed: {uri}: {err}"),
                None => write!(f, "insert failed: {uri}"),
            },
            Self::StorageInit(err) => write!(f, "{err}"),
            Self::Execution(err) => write!(f, "storage error: {err}"),
            Self::NoActiveSession { uri } => write!(f, "no active session for {uri}"),
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` for table {table}")
            }
            Self::ReadOnlyColumn { table, column } => {
                write!(f, "column `{column}` of table {table} is read-only")
            }
            Self::EmptyValues { uri } => write!(f, "no values to write for {uri}"),
            Self::UserScopeMismatch {
                session_user_id,
                requested,
            } => write!(
                f,
                "contact owner {requested:?} does not match session user {session_user_id}"
            ),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InsertFailed {
                source: Some(err), ..
            } => Some(err),
            Self::StorageInit(err) => Some(err),
            Self::Execution(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ProviderError {
    fn from(value: DbError) -> Self {
        Self::StorageInit(value)
    }
}

impl From<rusqlite::Error> for ProviderError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Execution(value)
    }
}

impl From<InvalidUri> for ProviderError {
    fn from(value: InvalidUri) -> Self {
        Self::UnsupportedResource { uri: value.0 }
    }
}
