//! Address-book records and their table contract.
//!
//! # Responsibility
//! - Name the tables and columns shared by schema DDL and the dispatcher.
//! - Provide typed `User`/`Contact` records converted to and from rows.
//!
//! # Invariants
//! - One user owns many contacts through `contacts.user_id`.
//! - Records without an `id` have not been persisted yet.

pub mod contact;
pub mod tables;
pub mod user;
