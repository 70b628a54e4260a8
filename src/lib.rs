// Shroud - PII Anonymization and Deduplicating Ingestion
// Copyright (c) 2025 Shroud Contributors
// Licensed under the MIT License

//! # Shroud - PII anonymization and deduplicating ingestion
//!
//! Shroud fetches person records from an upstream API, anonymizes their
//! personally identifying fields and stores them in SQLite with at most one
//! row per person.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Masking** names, phone numbers, streets and zip codes
//! - **Generalizing** birthdays into decade-of-age buckets
//! - **Deriving** a deterministic identity token (dedup key) and a randomized,
//!   recoverable identity ciphertext from the original email
//! - **Deduplicating** inserts on the identity token, inside one transaction
//!
//! ## Architecture
//!
//! Shroud follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Ingestion orchestration (quality gate, flattening, coordinator)
//! - [`anonymization`] - Field registry, key material, engine, audit log
//! - [`adapters`] - External integrations (record source, SQLite store)
//! - [`auth`] - Credential gate for store writes
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shroud::anonymization::{AnonymizationEngine, KeyMaterial};
//! use shroud::adapters::sqlite::{TokenlessPolicy, UserStore};
//! use shroud::domain::RawRecord;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = Arc::new(KeyMaterial::load("./keys/identity_keys.json")?);
//! let engine = AnonymizationEngine::new(keys);
//!
//! let records = vec![RawRecord::new()
//!     .with("firstname", "Anna")
//!     .with("email", "anna@example.com")];
//! let anonymized = engine.anonymize(&records)?;
//!
//! let mut store = UserStore::open("./data/users.db")?;
//! store.ensure_schema()?;
//! let outcome = store.insert_batch(&anonymized, TokenlessPolicy::Reject)?;
//! println!("inserted {}, duplicates {}", outcome.inserted, outcome.duplicates);
//! # Ok(())
//! # }
//! ```
//!
//! ## Identity Handling
//!
//! The dedup key and the stored ciphertext come from independent keys. The
//! token is an HMAC, so equal emails always give equal tokens; the ciphertext
//! uses a fresh nonce per call and is never compared.
//!
//! ```rust
//! use shroud::anonymization::KeyMaterial;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = KeyMaterial::generate();
//! assert_eq!(keys.token("a@b.c")?, keys.token("a@b.c")?);
//! assert_ne!(keys.encrypt("a@b.c")?, keys.encrypt("a@b.c")?);
//!
//! let ciphertext = keys.encrypt("a@b.c")?;
//! assert_eq!(keys.decrypt(&ciphertext)?, "a@b.c");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Shroud uses the [`domain::ShroudError`] type for all errors:
//!
//! ```rust,no_run
//! use shroud::domain::ShroudError;
//!
//! fn example() -> Result<(), ShroudError> {
//!     // Errors are automatically converted using the ? operator
//!     let config = shroud::config::load_config("shroud.toml")?;
//!     let _ = config;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod anonymization;
pub mod auth;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
