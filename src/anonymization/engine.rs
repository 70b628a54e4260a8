//! Main anonymization engine
//!
//! This module provides the [`AnonymizationEngine`] that applies the fixed
//! field policy to a batch of raw records and derives each record's identity.
//!
//! # Architecture
//!
//! For every record, in order:
//! - **Address**: a nested `address` object is lifted to top-level fields
//! - **Identity**: the original email is turned into an identity token
//!   (deterministic, for deduplication) and an identity ciphertext
//!   (randomized, for recovery) before anything is masked
//! - **Transformation**: every declared field is replaced by its masked or
//!   generalized form; undeclared fields pass through untouched
//! - **Audit Logger**: optionally records which fields were transformed
//!
//! The input records are never mutated; each call builds new
//! [`AnonymizedRecord`] values.
//!
//! # Examples
//!
//! ```
//! use shroud::anonymization::{keys::KeyMaterial, AnonymizationEngine};
//! use shroud::domain::RawRecord;
//! use std::sync::Arc;
//!
//! # fn example() -> shroud::domain::Result<()> {
//! let engine = AnonymizationEngine::new(Arc::new(KeyMaterial::generate()));
//!
//! let record = RawRecord::new()
//!     .with("firstname", "Anna")
//!     .with("email", "anna@example.com");
//!
//! let anonymized = engine.anonymize(&[record])?;
//! assert_eq!(anonymized[0].get_str("firstname"), Some("A***"));
//! assert!(anonymized[0].has_identity());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::anonymization::{
    audit::AuditLogger,
    config::AnonymizationConfig,
    keys::KeyMaterial,
    registry::{self, FieldStrategy},
    report::AnonymizationReport,
};
use crate::domain::{AnonymizedRecord, IdentityDerivation, RawRecord, Result};
use crate::domain::record::IDENTITY_FIELD;
use chrono::{Datelike, Utc};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

/// One record's transformation, before it is reported or audited
struct Transformed {
    record: AnonymizedRecord,
    applied: Vec<(String, FieldStrategy)>,
    passed_through: Vec<String>,
}

/// Main anonymization engine
///
/// Holds no per-record state; every record of a batch is processed
/// independently against the same [`KeyMaterial`].
///
/// # Thread Safety
///
/// The key material is shared through an `Arc`, so the engine can be cloned
/// into several tasks cheaply.
#[derive(Debug, Clone)]
pub struct AnonymizationEngine {
    keys: Arc<KeyMaterial>,
    reference_year: Option<i32>,
    audit_logger: Option<AuditLogger>,
}

impl AnonymizationEngine {
    /// Create a new engine over the given key material
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        Self {
            keys,
            reference_year: None,
            audit_logger: None,
        }
    }

    /// Create an engine wired to the configured audit log
    ///
    /// # Errors
    ///
    /// Returns an error if the audit log directory can't be created.
    pub fn from_config(keys: Arc<KeyMaterial>, config: &AnonymizationConfig) -> Result<Self> {
        let mut engine = Self::new(keys);
        engine.reference_year = config.reference_year;
        if config.audit.enabled {
            engine = engine.with_audit_logger(AuditLogger::new(
                config.audit.log_path.clone(),
                config.audit.json_format,
                true,
            )?);
        }
        Ok(engine)
    }

    /// Pin the year used for birthday generalization
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Attach an audit logger
    pub fn with_audit_logger(mut self, logger: AuditLogger) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Key material used for identity derivation
    pub fn keys(&self) -> &Arc<KeyMaterial> {
        &self.keys
    }

    /// Anonymize a batch of records
    ///
    /// Malformed field values degrade to their documented fallback; a record
    /// without a usable email is returned without an identity.
    ///
    /// # Errors
    ///
    /// Fails only on a cryptographic failure or an audit log write error.
    pub fn anonymize(&self, records: &[RawRecord]) -> Result<Vec<AnonymizedRecord>> {
        let start = Instant::now();
        let year = self.year();
        let mut results = Vec::with_capacity(records.len());

        for (index, raw) in records.iter().enumerate() {
            let transformed = self.transform_record(raw, year)?;
            self.audit(index, &transformed)?;
            results.push(transformed.record);
        }

        tracing::debug!(
            records = results.len(),
            tokenless = results.iter().filter(|r| !r.has_identity()).count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Anonymized batch"
        );

        Ok(results)
    }

    /// Anonymize a single record
    pub fn anonymize_record(&self, record: &RawRecord) -> Result<AnonymizedRecord> {
        let transformed = self.transform_record(record, self.year())?;
        self.audit(0, &transformed)?;
        Ok(transformed.record)
    }

    /// Anonymize a batch and collect an [`AnonymizationReport`]
    pub fn anonymize_with_report(
        &self,
        records: &[RawRecord],
    ) -> Result<(Vec<AnonymizedRecord>, AnonymizationReport)> {
        let year = self.year();
        let mut results = Vec::with_capacity(records.len());
        let mut report = AnonymizationReport::new();

        for (index, raw) in records.iter().enumerate() {
            let transformed = self.transform_record(raw, year)?;
            self.audit(index, &transformed)?;
            report.add_record(
                index,
                &transformed.record,
                &transformed.applied,
                &transformed.passed_through,
            );
            results.push(transformed.record);
        }

        Ok((results, report))
    }

    fn year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| Utc::now().year())
    }

    fn audit(&self, index: usize, transformed: &Transformed) -> Result<()> {
        if let Some(ref logger) = self.audit_logger {
            logger.log_record(
                index,
                &transformed.record,
                &transformed.applied,
                &transformed.passed_through,
            )?;
        }
        Ok(())
    }

    fn transform_record(&self, raw: &RawRecord, year: i32) -> Result<Transformed> {
        // Nested address sub-fields are subject to the same policy as
        // top-level ones.
        let raw: Cow<'_, RawRecord> = if raw.has_nested_address() {
            Cow::Owned(raw.clone().flatten_address())
        } else {
            Cow::Borrowed(raw)
        };

        // Identity comes from the original value, never the masked one.
        let identity = match raw.get(IDENTITY_FIELD).and_then(Value::as_str) {
            Some(email) if !email.is_empty() => Some(IdentityDerivation {
                token: self.keys.token(email)?,
                ciphertext: self.keys.encrypt(email)?,
            }),
            _ => None,
        };

        let mut fields = Map::with_capacity(raw.len());
        let mut applied = Vec::new();
        let mut passed_through = Vec::new();

        for (name, value) in raw.iter() {
            let output = match registry::strategy_for(name) {
                Some(strategy) => {
                    applied.push((name.clone(), strategy));
                    registry::apply(strategy, value, year)
                }
                None => {
                    passed_through.push(name.clone());
                    value.clone()
                }
            };
            fields.insert(name.clone(), output);
        }

        Ok(Transformed {
            record: AnonymizedRecord::new(fields, identity),
            applied,
            passed_through,
        })
    }
}
