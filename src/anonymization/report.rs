//! Dry-run reporting for anonymization
//!
//! Shows how the field policy was applied to a batch without writing
//! anything to the store. Only masked values ever appear in a report.

use crate::anonymization::registry::FieldStrategy;
use crate::domain::AnonymizedRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const MAX_SAMPLES: usize = 5;

/// Batch anonymization report with per-strategy statistics
#[derive(Debug, Clone, Serialize)]
pub struct AnonymizationReport {
    /// Total records anonymized
    pub total_records: usize,

    /// Records carrying an identity token
    pub records_with_identity: usize,

    /// Records without a usable identifying field
    pub tokenless_records: usize,

    /// Field transformations applied, by strategy
    pub fields_by_strategy: BTreeMap<FieldStrategy, usize>,

    /// Field names not covered by the policy (passed through)
    pub undeclared_fields: BTreeSet<String>,

    /// Sample anonymized records
    pub samples: Vec<serde_json::Value>,

    /// Warnings
    pub warnings: Vec<String>,
}

impl AnonymizationReport {
    /// Create a new empty dry-run report
    pub fn new() -> Self {
        Self {
            total_records: 0,
            records_with_identity: 0,
            tokenless_records: 0,
            fields_by_strategy: BTreeMap::new(),
            undeclared_fields: BTreeSet::new(),
            samples: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add one anonymized record and the strategies applied to it
    pub fn add_record(
        &mut self,
        index: usize,
        record: &AnonymizedRecord,
        applied: &[(String, FieldStrategy)],
        undeclared: &[String],
    ) {
        self.total_records += 1;

        if record.has_identity() {
            self.records_with_identity += 1;
        } else {
            self.tokenless_records += 1;
            self.add_warning(format!(
                "Record #{index} has no identifying field and can't be deduplicated"
            ));
        }

        for (_, strategy) in applied {
            *self.fields_by_strategy.entry(*strategy).or_insert(0) += 1;
        }
        self.undeclared_fields.extend(undeclared.iter().cloned());

        if self.samples.len() < MAX_SAMPLES {
            self.samples
                .push(serde_json::Value::Object(record.fields().clone()));
        }
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                 ANONYMIZATION DRY-RUN REPORT                  \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "  Total Records Anonymized:    {}\n",
            self.total_records
        ));
        output.push_str(&format!(
            "  Records with Identity:       {}\n",
            self.records_with_identity
        ));
        output.push_str(&format!(
            "  Tokenless Records:           {}\n",
            self.tokenless_records
        ));
        output.push('\n');

        if !self.fields_by_strategy.is_empty() {
            output.push_str("🔧 FIELDS BY STRATEGY\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for (strategy, count) in &self.fields_by_strategy {
                output.push_str(&format!("  {:30} {:>5}\n", strategy.label(), count));
            }
            output.push('\n');
        }

        if !self.undeclared_fields.is_empty() {
            output.push_str("➖ FIELDS PASSED THROUGH\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            let names: Vec<&str> = self.undeclared_fields.iter().map(String::as_str).collect();
            output.push_str(&format!("  {}\n", names.join(", ")));
            output.push('\n');
        }

        if !self.samples.is_empty() {
            output.push_str("📝 SAMPLE RECORDS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for (i, sample) in self.samples.iter().enumerate() {
                output.push_str(&format!("  #{} {}\n", i + 1, sample));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for warning in &self.warnings {
                output.push_str(&format!("  • {}\n", warning));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for AnonymizationReport {
    fn default() -> Self {
        Self::new()
    }
}
