//! Configuration management for Shroud.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Shroud uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for optional settings
//! - `SHROUD_<SECTION>_<KEY>` environment overrides
//! - Type-safe configuration structs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shroud::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("shroud.toml")?;
//!
//! println!("Source URL: {}", config.source.url);
//! println!("Database: {}", config.storage.database_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level, dry-run
//! - [`SourceConfig`] - Upstream endpoint, query parameters, chunking, retry
//! - [`QualityConfig`] - Required fields
//! - [`StorageConfig`] - SQLite file and tokenless policy
//! - [`KeysConfig`] - Identity key file
//! - [`AuthConfig`] - Credential file and presented secrets
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [source]
//! url = "https://fakerapi.it/api/v1/persons"
//! gender = "female"
//! birthday_start = "2005-01-01"
//! max_records = 1000
//! chunk_size = 100
//!
//! [storage]
//! database_path = "./data/users.db"
//! tokenless_policy = "reject"
//!
//! [keys]
//! path = "./keys/identity_keys.json"
//!
//! [auth]
//! admin_key = "${SHROUD_ADMIN_KEY}"
//! database_key = "${SHROUD_DATABASE_KEY}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, AuthConfig, KeysConfig, LoggingConfig, QualityConfig, RetryConfig,
    ShroudConfig, SourceConfig, StorageConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
