//! CRUD dispatch over the address-book store.

use super::cursor::{Cursor, ResultRow};
use super::routes::{Operation, ResourceKind, RouteMatch, RouteTable};
use super::sql::{self, resolve_column, Filter, Statement};
use super::uri::ResourceUri;
use super::values::{ContentValues, QueryRequest, Selection};
use super::{ProviderError, ProviderResult};
use crate::config::StoreConfig;
use crate::db::Store;
use crate::model::tables::{contact_columns, TableSpec, ID};
use crate::notify::ChangeRegistry;
use crate::session::Session;
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

/// Routes resource identifiers to store operations.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and may be
/// called from several threads at once.
pub struct AddressBookProvider {
    store: Arc<Store>,
    routes: RouteTable,
    changes: Arc<ChangeRegistry>,
}

impl AddressBookProvider {
    pub fn new(store: Arc<Store>, routes: RouteTable, changes: Arc<ChangeRegistry>) -> Self {
        Self {
            store,
            routes,
            changes,
        }
    }

    /// Opens the store described by `config` and wires the default routes.
    pub fn open(config: &StoreConfig, changes: Arc<ChangeRegistry>) -> ProviderResult<Self> {
        let store = Store::open(config)?;
        Ok(Self::new(
            Arc::new(store),
            RouteTable::address_book(),
            changes,
        ))
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn changes(&self) -> &Arc<ChangeRegistry> {
        &self.changes
    }

    /// Classifies `uri` against this provider's route table.
    pub fn classify(&self, uri: &ResourceUri) -> ProviderResult<RouteMatch> {
        self.routes
            .classify(uri)
            .ok_or_else(|| ProviderError::UnsupportedResource {
                uri: uri.to_string(),
            })
    }

    /// Runs a query and returns a cursor watching `uri` for later changes.
    ///
    /// - `/contacts/{id}`: the row with that id.
    /// - `/contacts`: rows owned by the session user.
    /// - `/users`: every user.
    ///
    /// The caller's selection and sort apply on top of the implicit filter.
    pub fn query(
        &self,
        session: &Session,
        uri: &ResourceUri,
        request: &QueryRequest,
    ) -> ProviderResult<Cursor> {
        let started_at = Instant::now();
        let result = self.query_inner(session, uri, request);
        log_outcome(Operation::Query, uri, started_at, &result, |cursor| {
            format!("rows={}", cursor.remaining())
        });
        result
    }

    /// Inserts one row into a collection and returns `collection/{new_id}`.
    ///
    /// Contacts inserted without `user_id` are attached to the session user.
    pub fn insert(
        &self,
        session: &Session,
        uri: &ResourceUri,
        values: &ContentValues,
    ) -> ProviderResult<ResourceUri> {
        let started_at = Instant::now();
        let result = self.insert_inner(session, uri, values);
        log_outcome(Operation::Insert, uri, started_at, &result, |new_uri| {
            format!("new_uri={new_uri}")
        });
        result
    }

    /// Updates the addressed contact. Returns the number of rows changed.
    pub fn update(
        &self,
        session: &Session,
        uri: &ResourceUri,
        values: &ContentValues,
        selection: Option<&Selection>,
    ) -> ProviderResult<usize> {
        let started_at = Instant::now();
        let result = self.update_inner(session, uri, values, selection);
        log_outcome(Operation::Update, uri, started_at, &result, |count| {
            format!("rows={count}")
        });
        result
    }

    /// Deletes the addressed contact. Returns the number of rows removed.
    pub fn delete(
        &self,
        session: &Session,
        uri: &ResourceUri,
        selection: Option<&Selection>,
    ) -> ProviderResult<usize> {
        let started_at = Instant::now();
        let result = self.delete_inner(session, uri, selection);
        log_outcome(Operation::Delete, uri, started_at, &result, |count| {
            format!("rows={count}")
        });
        result
    }

    fn query_inner(
        &self,
        session: &Session,
        uri: &ResourceUri,
        request: &QueryRequest,
    ) -> ProviderResult<Cursor> {
        let route = self.authorize(uri, Operation::Query)?;
        let table = route.kind.table();

        let mut filter = scope_filter(session, uri, route)?;
        filter.and_selection(table, request.selection.as_ref())?;

        let projection = match request.projection.as_deref() {
            Some(columns) if !columns.is_empty() => columns
                .iter()
                .map(|column| resolve_column(table, column))
                .collect::<ProviderResult<Vec<_>>>()?,
            _ => table.columns.to_vec(),
        };
        let sort = request
            .sort
            .iter()
            .map(|key| Ok((resolve_column(table, &key.column)?, key.descending)))
            .collect::<ProviderResult<Vec<_>>>()?;

        let statement = sql::select(table, &projection, filter, &sort);
        let (columns, rows) = {
            let conn = self.store.acquire_read();
            fetch_rows(&conn, statement)?
        };

        Ok(Cursor::new(uri.clone(), columns, rows).watch(&self.changes))
    }

    fn insert_inner(
        &self,
        session: &Session,
        uri: &ResourceUri,
        values: &ContentValues,
    ) -> ProviderResult<ResourceUri> {
        let route = self.authorize(uri, Operation::Insert)?;
        let table = route.kind.table();
        let mut columns = resolve_values(table, values)?;

        if route.kind == ResourceKind::Contacts {
            let user_id = require_user(session, uri)?;
            match values.get(contact_columns::USER_ID) {
                None => columns.push((contact_columns::USER_ID, Value::Integer(user_id))),
                Some(Value::Integer(owner)) if *owner == user_id => {}
                Some(other) => {
                    return Err(ProviderError::UserScopeMismatch {
                        session_user_id: user_id,
                        requested: other.clone(),
                    })
                }
            }
        }

        let statement = sql::insert(table, columns);
        let inserted = {
            let conn = self.store.acquire_write();
            conn.execute(&statement.sql, params_from_iter(statement.params))
                .map(|_| conn.last_insert_rowid())
        };
        let row_id = inserted.map_err(|source| ProviderError::InsertFailed {
            uri: uri.clone(),
            source: Some(source),
        })?;
        // SQLite row ids start at 1.
        if row_id <= 0 {
            return Err(ProviderError::InsertFailed {
                uri: uri.clone(),
                source: None,
            });
        }

        self.changes.notify_change(uri);
        Ok(uri.with_appended_id(row_id))
    }

    fn update_inner(
        &self,
        session: &Session,
        uri: &ResourceUri,
        values: &ContentValues,
        selection: Option<&Selection>,
    ) -> ProviderResult<usize> {
        let route = self.authorize(uri, Operation::Update)?;
        if values.is_empty() {
            return Err(ProviderError::EmptyValues { uri: uri.clone() });
        }
        let table = route.kind.table();
        let columns = resolve_values(table, values)?;

        let mut filter = scope_filter(session, uri, route)?;
        filter.and_selection(table, selection)?;

        let changed = self.execute_write(sql::update(table, columns, filter))?;
        if changed > 0 {
            self.changes.notify_change(uri);
        }
        Ok(changed)
    }

    fn delete_inner(
        &self,
        session: &Session,
        uri: &ResourceUri,
        selection: Option<&Selection>,
    ) -> ProviderResult<usize> {
        let route = self.authorize(uri, Operation::Delete)?;
        let table = route.kind.table();

        let mut filter = scope_filter(session, uri, route)?;
        filter.and_selection(table, selection)?;

        let removed = self.execute_write(sql::delete(table, filter))?;
        if removed > 0 {
            self.changes.notify_change(uri);
        }
        Ok(removed)
    }

    fn authorize(&self, uri: &ResourceUri, operation: Operation) -> ProviderResult<RouteMatch> {
        let route = self.classify(uri)?;
        if !route.kind.allows(operation) {
            return Err(ProviderError::OperationNotAllowed {
                operation,
                kind: route.kind,
                uri: uri.clone(),
            });
        }
        Ok(route)
    }

    fn execute_write(&self, statement: Statement) -> ProviderResult<usize> {
        let conn = self.store.acquire_write();
        let changed = conn.execute(&statement.sql, params_from_iter(statement.params))?;
        Ok(changed)
    }
}

/// Implicit predicate for a classified resource.
fn scope_filter(session: &Session, uri: &ResourceUri, route: RouteMatch) -> ProviderResult<Filter> {
    let mut filter = Filter::default();
    match route.kind {
        ResourceKind::SingleContact => {
            let id = route.id.ok_or_else(|| ProviderError::UnsupportedResource {
                uri: uri.to_string(),
            })?;
            filter.push(format!("{ID} = ?"), [Value::Integer(id)]);
        }
        ResourceKind::Contacts => {
            let user_id = require_user(session, uri)?;
            filter.push(
                format!("{} = ?", contact_columns::USER_ID),
                [Value::Integer(user_id)],
            );
        }
        ResourceKind::Users => {}
    }
    Ok(filter)
}

fn require_user(session: &Session, uri: &ResourceUri) -> ProviderResult<i64> {
    session
        .user_id()
        .ok_or_else(|| ProviderError::NoActiveSession { uri: uri.clone() })
}

/// Writable columns of `values`. Row ids are assigned by the store only.
fn resolve_values(
    table: TableSpec,
    values: &ContentValues,
) -> ProviderResult<Vec<(&'static str, Value)>> {
    values
        .iter()
        .map(|(column, value)| {
            let column = resolve_column(table, column)?;
            if column == ID {
                return Err(ProviderError::ReadOnlyColumn {
                    table: table.name,
                    column,
                });
            }
            Ok((column, value.clone()))
        })
        .collect()
}

fn fetch_rows(
    conn: &Connection,
    statement: Statement,
) -> rusqlite::Result<(Arc<[String]>, Vec<ResultRow>)> {
    let mut stmt = conn.prepare(&statement.sql)?;
    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into();

    let mut rows = stmt.query(params_from_iter(statement.params))?;
    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        let values = (0..columns.len())
            .map(|index| row.get::<_, Value>(index))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        results.push(ResultRow::new(Arc::clone(&columns), values));
    }
    Ok((columns, results))
}

fn log_outcome<T>(
    operation: Operation,
    uri: &ResourceUri,
    started_at: Instant,
    result: &ProviderResult<T>,
    describe: impl FnOnce(&T) -> String,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) if operation == Operation::Query => debug!(
            "event=provider_{operation} module=provider status=ok uri={uri} duration_ms={duration_ms} {}",
            describe(value)
        ),
        Ok(value) => info!(
            "event=provider_{operation} module=provider status=ok uri={uri} duration_ms={duration_ms} {}",
            describe(value)
        ),
        Err(err) => warn!(
            "event=provider_{operation} module=provider status=error uri={uri} duration_ms={duration_ms} error_code={} error={}",
            err.code(),
            redact(err)
        ),
    }
}

/// Error text for logs; never includes rejected values.
fn redact(err: &ProviderError) -> &dyn Display {
    match err {
        ProviderError::UserScopeMismatch { .. } => &"contact owner does not match session user",
        other => other,
    }
}
