//! Query results.
//!
//! # Invariants
//! - A [`Cursor`] is finite and forward-only; each row is yielded once.
//! - A watched cursor flips to stale on the first change notification for its
//!   path and stays stale; it unregisters itself when dropped.

use super::uri::ResourceUri;
use crate::model::tables::ID;
use crate::notify::{ChangeObserver, ChangeRegistry, ObserverId};
use rusqlite::types::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// One result row with its column names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl ResultRow {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|name| name == column)?;
        self.values.get(index)
    }

    /// Integer value of `column`; `None` when absent, `NULL` or not an integer.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Text value of `column`; `None` when absent, `NULL` or not text.
    pub fn get_text(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Primary key, when projected.
    pub fn id(&self) -> Option<i64> {
        self.get_i64(ID)
    }
}

struct StaleFlag(Weak<AtomicBool>);

impl ChangeObserver for StaleFlag {
    fn on_change(&self, _uri: &ResourceUri) {
        if let Some(flag) = self.0.upgrade() {
            flag.store(true, Ordering::Release);
        }
    }
}

struct Watch {
    registry: Weak<ChangeRegistry>,
    id: ObserverId,
}

impl Drop for Watch {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

/// Forward-only sequence of rows returned by a query.
pub struct Cursor {
    uri: ResourceUri,
    columns: Arc<[String]>,
    rows: std::vec::IntoIter<ResultRow>,
    stale: Arc<AtomicBool>,
    watch: Option<Watch>,
}

impl Cursor {
    pub(crate) fn new(uri: ResourceUri, columns: Arc<[String]>, rows: Vec<ResultRow>) -> Self {
        Self {
            uri,
            columns,
            rows: rows.into_iter(),
            stale: Arc::new(AtomicBool::new(false)),
            watch: None,
        }
    }

    /// Registers this cursor for invalidation on its path and every row below it.
    pub(crate) fn watch(mut self, registry: &Arc<ChangeRegistry>) -> Self {
        let observer = Arc::new(StaleFlag(Arc::downgrade(&self.stale)));
        let id = registry.register(self.uri.clone(), true, observer);
        self.watch = Some(Watch {
            registry: Arc::downgrade(registry),
            id,
        });
        self
    }

    /// Identifier the query was issued against.
    pub fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Whether a mutation on this cursor's path succeeded after the query ran.
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }
}

impl Iterator for Cursor {
    type Item = ResultRow;

    fn next(&mut self) -> Option<ResultRow> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Cursor {}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("uri", &self.uri)
            .field("columns", &self.columns)
            .field("remaining", &self.rows.len())
            .field("stale", &self.is_stale())
            .finish()
    }
}
