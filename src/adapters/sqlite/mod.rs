//! SQLite integration
//!
//! This module provides the deduplicating store that persists anonymized
//! users in a local SQLite file.

pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use models::{StoredUser, UserRow};
pub use store::{InsertOutcome, TokenlessPolicy, UserStore};
