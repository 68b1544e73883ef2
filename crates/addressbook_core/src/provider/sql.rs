//! Parameterized statement construction.
//!
//! # Invariants
//! - Identifiers come only from [`TableSpec`] constants.
//! - Every value, including ids taken from resource paths, is a bound
//!   parameter.
//! - Placeholder order in the SQL text matches `params` order.

use super::values::Selection;
use super::{ProviderError, ProviderResult};
use crate::model::tables::TableSpec;
use rusqlite::types::Value;

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Conjunction of predicates rendered as a `WHERE` clause.
#[derive(Debug, Default)]
pub(crate) struct Filter {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Filter {
    pub fn push(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.params.extend(params);
    }

    /// ANDs a caller selection after the predicates already pushed.
    ///
    /// Each predicate column must belong to `table`.
    pub fn and_selection(
        &mut self,
        table: TableSpec,
        selection: Option<&Selection>,
    ) -> ProviderResult<()> {
        let Some(selection) = selection else {
            return Ok(());
        };
        for predicate in selection.predicates() {
            let column = resolve_column(table, &predicate.column)?;
            let operator = predicate.comparison.operator(&predicate.value);
            self.push(format!("{column} {operator} ?"), [predicate.value.clone()]);
        }
        Ok(())
    }

    fn render(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let joined = self
            .clauses
            .iter()
            .map(|clause| format!("({clause})"))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(" WHERE {joined}")
    }
}

/// Maps a caller column name to the table's canonical name.
pub(crate) fn resolve_column(table: TableSpec, column: &str) -> ProviderResult<&'static str> {
    table
        .column(column)
        .ok_or_else(|| ProviderError::UnknownColumn {
            table: table.name,
            column: column.to_string(),
        })
}

pub(crate) fn select(
    table: TableSpec,
    projection: &[&'static str],
    filter: Filter,
    sort: &[(&'static str, bool)],
) -> Statement {
    let mut sql = format!(
        "SELECT {} FROM {}{}",
        projection.join(", "),
        table.name,
        filter.render()
    );
    if !sort.is_empty() {
        let terms = sort
            .iter()
            .map(|(column, descending)| {
                if *descending {
                    format!("{column} DESC")
                } else {
                    format!("{column} ASC")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms);
    }
    Statement {
        sql,
        params: filter.params,
    }
}

pub(crate) fn insert(table: TableSpec, values: Vec<(&'static str, Value)>) -> Statement {
    if values.is_empty() {
        return Statement {
            sql: format!("INSERT INTO {} DEFAULT VALUES", table.name),
            params: Vec::new(),
        };
    }
    let (columns, params): (Vec<_>, Vec<_>) = values.into_iter().unzip();
    let placeholders = vec!["?"; columns.len()].join(", ");
    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            table.name,
            columns.join(", ")
        ),
        params,
    }
}

pub(crate) fn update(
    table: TableSpec,
    values: Vec<(&'static str, Value)>,
    filter: Filter,
) -> Statement {
    let (columns, mut params): (Vec<_>, Vec<_>) = values.into_iter().unzip();
    let assignments = columns
        .iter()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {assignments}{}", table.name, filter.render());
    params.extend(filter.params);
    Statement { sql, params }
}

pub(crate) fn delete(table: TableSpec, filter: Filter) -> Statement {
    Statement {
        sql: format!("DELETE FROM {}{}", table.name, filter.render()),
        params: filter.params,
    }
}
