//! Address-book contact record.

use super::tables::{contact_columns as col, ID};
use crate::provider::{ContentValues, ResultRow};
use serde::{Deserialize, Serialize};

/// One entry in a user's address book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Row id; `None` until inserted.
    pub id: Option<i64>,
    pub name: String,
    pub phone: Option<String>,
    pub phone_mobile: Option<String>,
    pub phone_work: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    /// Owning user. `None` lets a contacts-collection insert use the session user.
    pub user_id: Option<i64>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Column values for insert or full replacement.
    ///
    /// Unset optional fields are written as `NULL`; `id` is never included and
    /// `user_id` only when set.
    pub fn to_values(&self) -> ContentValues {
        let mut values = ContentValues::new();
        values
            .put_text(col::NAME, self.name.as_str())
            .put_optional_text(col::PHONE, self.phone.as_deref())
            .put_optional_text(col::PHONE_MOBILE, self.phone_mobile.as_deref())
            .put_optional_text(col::PHONE_WORK, self.phone_work.as_deref())
            .put_optional_text(col::EMAIL, self.email.as_deref())
            .put_optional_text(col::STREET, self.street.as_deref())
            .put_optional_text(col::CITY, self.city.as_deref())
            .put_optional_text(col::PROVINCE, self.province.as_deref())
            .put_optional_text(col::POSTAL_CODE, self.postal_code.as_deref());
        if let Some(user_id) = self.user_id {
            values.put_integer(col::USER_ID, user_id);
        }
        values
    }

    pub fn from_row(row: &ResultRow) -> Self {
        let text = |column: &str| row.get_text(column).map(str::to_string);
        Self {
            id: row.get_i64(ID),
            name: text(col::NAME).unwrap_or_default(),
            phone: text(col::PHONE),
            phone_mobile: text(col::PHONE_MOBILE),
            phone_work: text(col::PHONE_WORK),
            email: text(col::EMAIL),
            street: text(col::STREET),
            city: text(col::CITY),
            province: text(col::PROVINCE),
            postal_code: text(col::POSTAL_CODE),
            user_id: row.get_i64(col::USER_ID),
        }
    }
}
