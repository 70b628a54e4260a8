//! Anonymization module for Shroud
//!
//! Turns raw upstream records into privacy-reduced records under a fixed
//! per-field policy, and derives the identity values used for deduplication
//! and recovery.
//!
//! # Architecture
//!
//! The anonymization pipeline consists of:
//! - **Registry**: static field → strategy table and the masking functions
//! - **Keys**: matching key (identity token) and encryption key (identity ciphertext)
//! - **Engine**: applies the registry to each record and derives its identity
//! - **Audit**: structured per-record log, free of plaintext values
//!
//! # Usage
//!
//! ```rust,ignore
//! use shroud::anonymization::{keys::KeyMaterial, AnonymizationEngine};
//!
//! let keys = KeyMaterial::load("keys.json")?;
//! let engine = AnonymizationEngine::new(Arc::new(keys));
//! let anonymized = engine.anonymize(&records)?;
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod keys;
pub mod registry;
pub mod report;

// Re-export main types
pub use config::AnonymizationConfig;
pub use engine::AnonymizationEngine;
pub use keys::KeyMaterial;
pub use registry::FieldStrategy;
pub use report::AnonymizationReport;
