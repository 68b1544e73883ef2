//! User account record.

use super::tables::{user_columns, ID};
use crate::provider::{ContentValues, ResultRow};
use serde::{Deserialize, Serialize};

/// Login identity stored in `users`.
///
/// `password` is persisted verbatim. Callers are expected to hand in a
/// derived hash rather than the secret typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row id; `None` until inserted.
    pub id: Option<i64>,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Column values for insert; `id` is left to the store.
    pub fn to_values(&self) -> ContentValues {
        ContentValues::new()
            .with_text(user_columns::USERNAME, self.username.as_str())
            .with_text(user_columns::PASSWORD, self.password.as_str())
    }

    /// Builds a user from a row; columns missing from the projection stay empty.
    pub fn from_row(row: &ResultRow) -> Self {
        Self {
            id: row.get_i64(ID),
            username: row
                .get_text(user_columns::USERNAME)
                .unwrap_or_default()
                .to_string(),
            password: row
                .get_text(user_columns::PASSWORD)
                .unwrap_or_default()
                .to_string(),
        }
    }
}
