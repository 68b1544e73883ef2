//! Request payloads accepted by the dispatcher.
//!
//! # Responsibility
//! - Carry column/value pairs for insert and update.
//! - Carry caller predicates, projections and ordering for queries.
//!
//! # Invariants
//! - Selection values are always bound as parameters; selections carry no SQL text.
//! - Column names are validated against the target table before use.

use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Column/value pairs for an insert or update, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentValues {
    values: BTreeMap<String, Value>,
}

impl ContentValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column` to an arbitrary SQLite value, replacing any previous one.
    pub fn put(&mut self, column: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(column.into(), value);
        self
    }

    pub fn put_text(&mut self, column: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(column, Value::Text(value.into()))
    }

    pub fn put_integer(&mut self, column: impl Into<String>, value: i64) -> &mut Self {
        self.put(column, Value::Integer(value))
    }

    pub fn put_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.put(column, Value::Null)
    }

    /// Sets a text column, or `NULL` when `value` is `None`.
    pub fn put_optional_text(
        &mut self,
        column: impl Into<String>,
        value: Option<&str>,
    ) -> &mut Self {
        match value {
            Some(text) => self.put_text(column, text),
            None => self.put_null(column),
        }
    }

    /// Builder-style variant of [`ContentValues::put_text`].
    pub fn with_text(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.put_text(column, value);
        self
    }

    /// Builder-style variant of [`ContentValues::put_integer`].
    pub fn with_integer(mut self, column: impl Into<String>, value: i64) -> Self {
        self.put_integer(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }
}

/// Comparison applied by one [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// SQL `LIKE` with `%`/`_` wildcards in the bound pattern.
    Like,
}

impl Comparison {
    /// SQL operator for this comparison against `value`.
    ///
    /// Equality against `NULL` uses `IS`/`IS NOT` so it can match.
    pub(crate) fn operator(self, value: &Value) -> &'static str {
        match (self, value) {
            (Self::Eq, Value::Null) => "IS",
            (Self::NotEq, Value::Null) => "IS NOT",
            (Self::Eq, _) => "=",
            (Self::NotEq, _) => "<>",
            (Self::Lt, _) => "<",
            (Self::LtEq, _) => "<=",
            (Self::Gt, _) => ">",
            (Self::GtEq, _) => ">=",
            (Self::Like, _) => "LIKE",
        }
    }
}

/// `column <comparison> value`, with `value` always bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub comparison: Comparison,
    pub value: Value,
}

/// Caller-supplied predicates, ANDed after the dispatcher's implicit filter.
///
/// Columns are checked against the target table and the SQL text is built
/// by the dispatcher; callers never supply SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    predicates: Vec<Predicate>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column <comparison> value` to the conjunction.
    pub fn and(
        mut self,
        column: impl Into<String>,
        comparison: Comparison,
        value: impl Into<Value>,
    ) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            comparison,
            value: value.into(),
        });
        self
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(column, Comparison::Eq, value)
    }

    /// Equality predicate on one column with a bound text argument.
    pub fn text_eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::eq(column, value.into())
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Options for a query dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    /// Columns to return; `None` returns every column of the table.
    pub projection: Option<Vec<String>>,
    pub selection: Option<Selection>,
    /// Empty keeps store order (primary key for these tables).
    pub sort: Vec<SortKey>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn sorted_by(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }
}
