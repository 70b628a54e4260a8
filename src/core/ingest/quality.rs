//! Data quality gate
//!
//! A batch passes when every record carries every required field. A field
//! that is present with a `null` value counts as missing.

use crate::domain::RawRecord;
use serde_json::Value;

/// A required field missing from one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    /// Position of the record in the batch
    pub index: usize,
    /// Name of the missing field
    pub field: String,
}

/// Outcome of the quality gate over one batch
#[derive(Debug, Clone, Default)]
pub struct QualityReport {
    /// Records checked
    pub total: usize,
    /// Every missing (record, field) pair
    pub missing: Vec<MissingField>,
}

impl QualityReport {
    /// Whether the batch may proceed
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }

    /// Indices of offending records, ascending and without repeats
    pub fn failing_records(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.missing.iter().map(|m| m.index).collect();
        indices.dedup();
        indices
    }

    /// Short human-readable description of the failures
    pub fn describe(&self) -> String {
        let failing = self.failing_records();
        let shown: Vec<String> = self
            .missing
            .iter()
            .take(5)
            .map(|m| format!("record {} missing '{}'", m.index, m.field))
            .collect();

        let mut text = format!(
            "{} of {} record(s) failed the quality check: {}",
            failing.len(),
            self.total,
            shown.join(", ")
        );
        if self.missing.len() > shown.len() {
            text.push_str(&format!(" (and {} more)", self.missing.len() - shown.len()));
        }
        text
    }
}

/// Check that every record carries every required field
pub fn check_required_fields(records: &[RawRecord], required: &[String]) -> QualityReport {
    let mut report = QualityReport {
        total: records.len(),
        missing: Vec::new(),
    };

    for (index, record) in records.iter().enumerate() {
        for field in required {
            if matches!(record.get(field), None | Some(Value::Null)) {
                report.missing.push(MissingField {
                    index,
                    field: field.clone(),
                });
            }
        }
    }

    if report.passed() {
        tracing::debug!(records = report.total, "Quality check passed");
    } else {
        tracing::warn!(
            records = report.total,
            failing = report.failing_records().len(),
            "Quality check failed"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<String> {
        vec!["email".to_string()]
    }

    #[test]
    fn test_all_present() {
        let records = vec![
            RawRecord::new().with("email", "a@b.c"),
            RawRecord::new().with("email", "d@e.f"),
        ];
        let report = check_required_fields(&records, &required());
        assert!(report.passed());
        assert_eq!(report.total, 2);
    }

    #[test]
    fn test_missing_and_null() {
        let records = vec![
            RawRecord::new().with("email", "a@b.c"),
            RawRecord::new().with("firstname", "Bo"),
            RawRecord::new().with("email", Value::Null),
        ];
        let report = check_required_fields(&records, &required());
        assert!(!report.passed());
        assert_eq!(report.failing_records(), vec![1, 2]);
        assert!(report.describe().contains("record 1 missing 'email'"));
    }

    #[test]
    fn test_multiple_fields_same_record() {
        let records = vec![RawRecord::new()];
        let report = check_required_fields(
            &records,
            &["email".to_string(), "firstname".to_string()],
        );
        assert_eq!(report.missing.len(), 2);
        assert_eq!(report.failing_records(), vec![0]);
    }

    #[test]
    fn test_empty_batch_and_no_requirements() {
        assert!(check_required_fields(&[], &required()).passed());
        assert!(check_required_fields(&[RawRecord::new()], &[]).passed());
    }
}
