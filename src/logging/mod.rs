//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted file logs
//! - Configurable log levels
//! - Local file logging with rotation
//!
//! Identifying values and key material are never passed to these macros.
//!
//! # Example
//!
//! ```no_run
//! use shroud::logging::init_logging;
//! use shroud::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an ingestion run
///
/// # Example
///
/// ```no_run
/// use shroud::log_ingest_start;
///
/// log_ingest_start!("https://fakerapi.it/api/v1/persons", false);
/// ```
#[macro_export]
macro_rules! log_ingest_start {
    ($source:expr, $dry_run:expr) => {
        tracing::info!(
            source = %$source,
            dry_run = $dry_run,
            "Starting ingestion run"
        );
    };
}

/// Log a fetched chunk
///
/// # Example
///
/// ```no_run
/// use shroud::log_chunk_fetched;
///
/// log_chunk_fetched!(25, 100, 1000);
/// ```
#[macro_export]
macro_rules! log_chunk_fetched {
    ($chunk:expr, $total:expr, $target:expr) => {
        tracing::info!(
            chunk = $chunk,
            total = $total,
            target = $target,
            progress_pct = ($total as f64 / $target as f64 * 100.0),
            "Fetched records"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use shroud::log_error_with_context;
/// use shroud::domain::ShroudError;
///
/// let error = ShroudError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use shroud::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 2000u64, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying request after error"
        );
    };
}
