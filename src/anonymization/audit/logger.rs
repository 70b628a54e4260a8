//! Audit logger for anonymization operations

use crate::anonymization::registry::FieldStrategy;
use crate::domain::{AnonymizedRecord, Result, ShroudError};
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Audit log entry
///
/// Never carries original values: only field names, strategies and the
/// identity token, which is a keyed digest.
#[derive(Debug, Serialize)]
struct AuditLogEntry<'a> {
    timestamp: String,
    record_index: usize,
    fields_transformed: Vec<AuditField<'a>>,
    fields_passed_through: &'a [String],
    has_identity: bool,
    identity_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct AuditField<'a> {
    field: &'a str,
    strategy: &'static str,
}

/// Audit logger for anonymization operations
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ShroudError::Io(format!(
                        "Failed to create audit log directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Whether entries are written at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log one anonymized record
    pub fn log_record(
        &self,
        index: usize,
        record: &AnonymizedRecord,
        applied: &[(String, FieldStrategy)],
        passed_through: &[String],
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            record_index: index,
            fields_transformed: applied
                .iter()
                .filter(|(_, s)| *s != FieldStrategy::Unchanged)
                .map(|(field, strategy)| AuditField {
                    field,
                    strategy: strategy.label(),
                })
                .collect(),
            fields_passed_through: passed_through,
            has_identity: record.has_identity(),
            identity_token: record.identity_token().map(|t| t.as_str()),
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry<'_>) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                ShroudError::Io(format!(
                    "Failed to open audit log {}: {e}",
                    self.log_path.display()
                ))
            })?;

        if self.json_format {
            let json_line = serde_json::to_string(entry)?;
            writeln!(file, "{json_line}")?;
        } else {
            let fields: Vec<&str> = entry.fields_transformed.iter().map(|f| f.field).collect();
            writeln!(
                file,
                "[{}] Record: {} | Transformed: {} | Identity: {}",
                entry.timestamp,
                entry.record_index,
                fields.join(","),
                entry.identity_token.unwrap_or("none")
            )?;
        }

        Ok(())
    }
}
