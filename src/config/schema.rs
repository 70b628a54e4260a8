//! Configuration schema types
//!
//! This module defines the configuration structure for Shroud.

use crate::adapters::sqlite::TokenlessPolicy;
use crate::anonymization::config::AnonymizationConfig;
use crate::config::SecretString;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Shroud configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShroudConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Upstream record source
    pub source: SourceConfig,

    /// Data quality gate
    #[serde(default)]
    pub quality: QualityConfig,

    /// Deduplicating store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Identity key material
    #[serde(default)]
    pub keys: KeysConfig,

    /// Credential gate
    #[serde(default)]
    pub auth: AuthConfig,

    /// Anonymization settings (audit logging)
    #[serde(default)]
    pub anonymization: AnonymizationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ShroudConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.source.validate()?;
        self.quality.validate()?;
        self.storage.validate()?;
        self.keys.validate()?;
        self.auth.validate()?;
        self.anonymization.validate().map_err(|e| format!("{e:#}"))?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (anonymize and report, don't write to the store)
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("source.retry.max_retries must be > 0".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("source.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(
                "source.retry.initial_delay_ms must not exceed source.retry.max_delay_ms"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// Upstream record source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Endpoint returning `{ "data": [...] }`
    pub url: String,

    /// Value of the `_gender` query parameter
    #[serde(default)]
    pub gender: Option<String>,

    /// Value of the `_birthday_start` query parameter (YYYY-MM-DD)
    #[serde(default)]
    pub birthday_start: Option<String>,

    /// Total records to fetch; chunked fetching needs both this and `chunk_size`
    #[serde(default)]
    pub max_records: Option<usize>,

    /// Records per request (`_quantity`)
    #[serde(default)]
    pub chunk_size: Option<usize>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://fakerapi.it/api/v1/persons".to_string(),
            gender: None,
            birthday_start: None,
            max_records: None,
            chunk_size: None,
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("source.url cannot be empty".to_string());
        }
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| format!("source.url '{}' is not a valid URL: {e}", self.url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!(
                "source.url must use http or https, found '{}'",
                parsed.scheme()
            ));
        }

        if let Some(ref gender) = self.gender {
            if !matches!(gender.as_str(), "male" | "female") {
                return Err(format!(
                    "Invalid source.gender '{gender}'. Must be one of: male, female"
                ));
            }
        }

        if let Some(ref start) = self.birthday_start {
            NaiveDate::parse_from_str(start, "%Y-%m-%d").map_err(|_| {
                format!("Invalid source.birthday_start '{start}'. Expected YYYY-MM-DD")
            })?;
        }

        if self.max_records == Some(0) {
            return Err("source.max_records must be > 0".to_string());
        }
        if self.chunk_size == Some(0) {
            return Err("source.chunk_size must be > 0".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("source.timeout_seconds must be > 0".to_string());
        }

        self.retry.validate()
    }
}

/// Data quality gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Fields every fetched record must carry
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            required_fields: default_required_fields(),
        }
    }
}

impl QualityConfig {
    fn validate(&self) -> Result<(), String> {
        if self.required_fields.iter().any(|f| f.trim().is_empty()) {
            return Err("quality.required_fields cannot contain empty names".to_string());
        }
        Ok(())
    }
}

/// Deduplicating store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Handling of records without an identity token
    #[serde(default)]
    pub tokenless_policy: TokenlessPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            tokenless_policy: TokenlessPolicy::default(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.database_path.as_os_str().is_empty() {
            return Err("storage.database_path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Identity key material configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Key file (JSON mapping of named secrets)
    #[serde(default = "default_keys_path")]
    pub path: PathBuf,

    /// Generate the key file on first run when it doesn't exist
    #[serde(default)]
    pub create_if_missing: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            path: default_keys_path(),
            create_if_missing: false,
        }
    }
}

impl KeysConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("keys.path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Credential gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// File holding the salted hashes of both secrets
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    /// Administrative secret presented at ingest time
    #[serde(default)]
    pub admin_key: Option<SecretString>,

    /// Storage secret presented at ingest time
    #[serde(default)]
    pub database_key: Option<SecretString>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            admin_key: None,
            database_key: None,
        }
    }
}

impl AuthConfig {
    fn validate(&self) -> Result<(), String> {
        if self.credentials_path.as_os_str().is_empty() {
            return Err("auth.credentials_path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_required_fields() -> Vec<String> {
    vec!["email".to_string()]
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/users.db")
}

fn default_keys_path() -> PathBuf {
    PathBuf::from("./keys/identity_keys.json")
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("./keys/credentials.json")
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceConfig {
        SourceConfig {
            url: "https://fakerapi.it/api/v1/persons".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
            dry_run: false,
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_config_validation() {
        let mut config = source();
        assert!(config.validate().is_ok());

        config.url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config = source();
        config.gender = Some("other".to_string());
        assert!(config.validate().is_err());

        config = source();
        config.birthday_start = Some("01/01/2000".to_string());
        assert!(config.validate().is_err());

        config = source();
        config.chunk_size = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_validation() {
        let mut retry = RetryConfig::default();
        assert!(retry.validate().is_ok());

        retry.backoff_multiplier = 0.5;
        assert!(retry.validate().is_err());

        retry = RetryConfig {
            initial_delay_ms: 5000,
            max_delay_ms: 100,
            ..Default::default()
        };
        assert!(retry.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(QualityConfig::default().required_fields, vec!["email"]);
        assert_eq!(
            StorageConfig::default().tokenless_policy,
            TokenlessPolicy::Reject
        );
        assert!(!KeysConfig::default().create_if_missing);
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }
}
