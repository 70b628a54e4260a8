//! Ingestion run summary

use crate::anonymization::AnonymizationReport;
use std::time::Duration;

/// Summary of one ingestion run
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    /// Records returned by the source
    pub fetched: usize,

    /// Records run through the anonymization engine
    pub anonymized: usize,

    /// Anonymized records without an identity token
    pub tokenless: usize,

    /// Rows written to the store
    pub inserted: usize,

    /// Records skipped because their identity was already stored
    pub duplicates: usize,

    /// Tokenless records refused by the store policy
    pub rejected: usize,

    /// Highest row id after the run (0 for an empty store or a dry run)
    pub last_id: i64,

    /// Whether the store was left untouched
    pub dry_run: bool,

    /// Whether the run stopped early on a shutdown signal
    pub interrupted: bool,

    /// Wall-clock duration
    pub duration: Duration,

    /// Per-strategy report, collected on dry runs
    pub report: Option<AnonymizationReport>,
}

impl IngestSummary {
    /// Create a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether every anonymized record was either stored or already present
    pub fn is_complete(&self) -> bool {
        self.dry_run || self.inserted + self.duplicates == self.anonymized
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            fetched = self.fetched,
            anonymized = self.anonymized,
            tokenless = self.tokenless,
            inserted = self.inserted,
            duplicates = self.duplicates,
            rejected = self.rejected,
            last_id = self.last_id,
            dry_run = self.dry_run,
            duration_ms = self.duration.as_millis() as u64,
            "Ingestion completed"
        );

        if self.rejected > 0 {
            tracing::warn!(
                rejected = self.rejected,
                "Tokenless records were rejected by the store policy"
            );
        }
        if self.interrupted {
            tracing::warn!("Ingestion stopped early on shutdown signal");
        }
    }

    /// Multi-line console summary
    pub fn format_console(&self) -> String {
        let mut out = String::new();
        out.push_str("\n═══════════════════════════════════════════════════════════\n");
        if self.dry_run {
            out.push_str("📊 INGESTION SUMMARY (DRY RUN)\n");
        } else {
            out.push_str("📊 INGESTION SUMMARY\n");
        }
        out.push_str("═══════════════════════════════════════════════════════════\n\n");
        out.push_str(&format!("Fetched:     {}\n", self.fetched));
        out.push_str(&format!("Anonymized:  {}\n", self.anonymized));
        out.push_str(&format!("Tokenless:   {}\n", self.tokenless));
        if !self.dry_run {
            out.push_str(&format!("Inserted:    {}\n", self.inserted));
            out.push_str(&format!("Duplicates:  {}\n", self.duplicates));
            out.push_str(&format!("Rejected:    {}\n", self.rejected));
            out.push_str(&format!("Last ID:     {}\n", self.last_id));
        }
        out.push_str(&format!("Duration:    {:.2}s\n", self.duration.as_secs_f64()));
        if self.interrupted {
            out.push_str("\n⚠️  Stopped early on shutdown signal\n");
        }
        out
    }
}
