//! External system integrations for Shroud.
//!
//! This module provides adapters for the systems an ingestion run talks to:
//!
//! - [`source`] - Upstream person API (HTTP, chunked fetch with retry)
//! - [`sqlite`] - Deduplicating user store (SQLite)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The record source sits behind the
//! [`source::RecordSource`] trait so the pipeline can run against an in-memory
//! source.
//!
//! # Store Adapter
//!
//! ```rust,no_run
//! use shroud::adapters::sqlite::UserStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = UserStore::open("./data/users.db")?;
//! store.ensure_schema()?;
//! println!("last id: {}", store.last_id()?);
//! # Ok(())
//! # }
//! ```

pub mod source;
pub mod sqlite;
