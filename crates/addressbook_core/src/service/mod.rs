//! Core use-case services.
//!
//! # Responsibility
//! - Offer typed address-book use-cases on top of the resource dispatcher.
//! - Keep UI layers away from resource paths and column names.

pub mod address_book_service;
