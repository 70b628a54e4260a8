//! Domain error types
//!
//! This module defines the error hierarchy for Shroud.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Shroud error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ShroudError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record source (fetch) errors
    #[error("Record source error: {0}")]
    Source(#[from] SourceError),

    /// Deduplicating store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Key material errors
    #[error("Key material error: {0}")]
    KeyMaterial(#[from] KeyError),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Validation errors (data quality gate, malformed input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Deduplicating store errors
///
/// Reported per operation; none of them is retried inside the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The users relation (or another required relation) does not exist yet
    #[error("Schema missing: {0}")]
    SchemaMissing(String),

    /// A storage-engine constraint rejected the write (NOT NULL, CHECK, UNIQUE)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The database file could not be opened, read or written
    #[error("Storage I/O failure: {0}")]
    Io(String),

    /// Any other storage-engine failure
    #[error("Query failed: {0}")]
    Query(String),
}

/// Identity key material errors
///
/// Every variant is fatal at startup: the process must never fall back to
/// fresh key material when stored tokens were derived from another key.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Key file expected but not found
    #[error("Key material not found: {0}")]
    Missing(String),

    /// Key file present but unreadable or malformed
    #[error("Key material is corrupt: {0}")]
    Corrupt(String),

    /// Refusing to overwrite an existing key file
    #[error("Key material already exists: {0}")]
    AlreadyExists(String),

    /// Encryption primitive failure
    #[error("Cryptographic failure: {0}")]
    Crypto(String),

    /// Ciphertext could not be decrypted (tampered, truncated or wrong key)
    #[error("Failed to decrypt identity ciphertext: {0}")]
    Decryption(String),

    /// The store was populated with a different matching key
    #[error("Matching key mismatch: store expects fingerprint {expected}, loaded key has {actual}")]
    Mismatch { expected: String, actual: String },
}

/// Record source errors
///
/// Errors that occur while fetching raw records from the upstream API.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the upstream API
    #[error("Failed to connect to record source: {0}")]
    ConnectionFailed(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Response body is not the expected `{ "data": [ {...}, ... ] }` shape
    #[error("Invalid response from record source: {0}")]
    InvalidResponse(String),
}

impl SourceError {
    /// Whether the failure is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::ServerError { .. }
                | Self::RateLimitExceeded(_)
                | Self::Timeout(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ShroudError {
    fn from(err: std::io::Error) -> Self {
        ShroudError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ShroudError {
    fn from(err: serde_json::Error) -> Self {
        ShroudError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ShroudError {
    fn from(err: toml::de::Error) -> Self {
        ShroudError::Configuration(format!("TOML parse error: {err}"))
    }
}
