//! Table and column contract shared by the schema DDL and the dispatcher.
//!
//! # Invariants
//! - Names here must match `db/schema/address_book.sql` exactly.
//! - Only names listed in a [`TableSpec`] ever reach SQL as identifiers.

/// Primary key column shared by both tables.
pub const ID: &str = "_id";

pub mod user_columns {
    pub const USERNAME: &str = "username";
    /// Stored exactly as supplied. Callers should pass a password hash, never
    /// the raw secret.
    pub const PASSWORD: &str = "password";
}

pub mod contact_columns {
    pub const NAME: &str = "name";
    pub const PHONE: &str = "phone";
    pub const PHONE_MOBILE: &str = "phone_mobile";
    pub const PHONE_WORK: &str = "phone_work";
    pub const EMAIL: &str = "email";
    pub const STREET: &str = "street";
    pub const CITY: &str = "city";
    pub const PROVINCE: &str = "province";
    pub const POSTAL_CODE: &str = "postal_code";
    /// Owning user (`users._id`).
    pub const USER_ID: &str = "user_id";
}

/// Static description of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl TableSpec {
    /// Returns the canonical column name when `column` belongs to this table.
    pub fn column(&self, column: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .copied()
            .find(|candidate| *candidate == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column(column).is_some()
    }
}

pub const USERS: TableSpec = TableSpec {
    name: "users",
    columns: &[ID, user_columns::USERNAME, user_columns::PASSWORD],
};

pub const CONTACTS: TableSpec = TableSpec {
    name: "contacts",
    columns: &[
        ID,
        contact_columns::NAME,
        contact_columns::PHONE,
        contact_columns::PHONE_MOBILE,
        contact_columns::PHONE_WORK,
        contact_columns::EMAIL,
        contact_columns::STREET,
        contact_columns::CITY,
        contact_columns::PROVINCE,
        contact_columns::POSTAL_CODE,
        contact_columns::USER_ID,
    ],
};
