//! Anonymization settings
//!
//! The field policy is fixed in [`registry`](super::registry). What can be
//! tuned is the year birthdays are aged against and where the audit trail
//! of each run goes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Earliest accepted reference year
const MIN_REFERENCE_YEAR: i32 = 1900;

/// Latest accepted reference year
const MAX_REFERENCE_YEAR: i32 = 9999;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Year used to compute the age decade of a birthday
    ///
    /// Unset means the current calendar year. Pinning it makes repeated
    /// runs over the same input produce the same labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_year: Option<i32>,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl AnonymizationConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(year) = self.reference_year {
            if !(MIN_REFERENCE_YEAR..=MAX_REFERENCE_YEAR).contains(&year) {
                anyhow::bail!(
                    "anonymization.reference_year must be between {MIN_REFERENCE_YEAR} and \
                     {MAX_REFERENCE_YEAR}, got {year}"
                );
            }
        }
        self.audit.validate().context("Invalid audit configuration")
    }

    /// Reads `SHROUD_ANONYMIZATION_*` variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("SHROUD_ANONYMIZATION_REFERENCE_YEAR") {
            self.reference_year = Some(
                val.parse()
                    .context("Invalid SHROUD_ANONYMIZATION_REFERENCE_YEAR value")?,
            );
        }
        self.audit.apply_env_overrides()
    }
}

/// Per-run audit trail of field names and strategies
///
/// Only field names are written, never values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,

    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// One JSON object per line when true, plain text otherwise
    #[serde(default = "default_audit_json_format")]
    pub json_format: bool,
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/anonymization.log")
}

fn default_audit_json_format() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: default_audit_log_path(),
            json_format: default_audit_json_format(),
        }
    }
}

impl AuditConfig {
    fn validate(&self) -> Result<()> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            anyhow::bail!("anonymization.audit.log_path cannot be empty when audit is enabled");
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        let flag = |name: &str| -> Result<Option<bool>> {
            std::env::var(name)
                .ok()
                .map(|val| val.parse().with_context(|| format!("Invalid {name} value")))
                .transpose()
        };

        if let Some(enabled) = flag("SHROUD_ANONYMIZATION_AUDIT_ENABLED")? {
            self.enabled = enabled;
        }
        if let Ok(val) = std::env::var("SHROUD_ANONYMIZATION_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }
        if let Some(json) = flag("SHROUD_ANONYMIZATION_AUDIT_JSON_FORMAT")? {
            self.json_format = json;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnonymizationConfig::default();
        assert!(config.reference_year.is_none());
        assert!(config.audit.enabled);
        assert!(config.audit.json_format);
    }

    #[test]
    fn test_reference_year_bounds() {
        let mut config = AnonymizationConfig {
            reference_year: Some(2024),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.reference_year = Some(1200);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_audit_path_only_matters_when_enabled() {
        let mut config = AnonymizationConfig::default();
        config.audit.log_path = PathBuf::new();
        assert!(config.validate().is_err());

        config.audit.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AnonymizationConfig = toml::from_str("reference_year = 2030").unwrap();
        assert_eq!(config.reference_year, Some(2030));
        assert!(config.audit.enabled);
    }
}
