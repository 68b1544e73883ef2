//! Local persistence core for the address book.
//! Owns the SQLite store lifecycle and the resource-addressed CRUD contract.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod provider;
pub mod service;
pub mod session;

pub use config::{StoreConfig, StoreLocation, DATABASE_FILE_NAME, DATABASE_VERSION};
pub use db::{DbError, DbResult, Store};
pub use logging::{init_logging, logging_status, LogLevel, LogSettings, LoggingError};
pub use model::contact::Contact;
pub use model::user::User;
pub use notify::{ChangeObserver, ChangeRegistry, ObserverId};
pub use provider::{
    AddressBookProvider, Comparison, ContentValues, Cursor, Operation, Predicate, ProviderError,
    ProviderResult, QueryRequest, ResourceKind, ResourceUri, ResultRow, RouteTable, Selection,
    SortKey,
};
pub use service::address_book_service::AddressBookService;
pub use session::Session;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
