//! Ingest command implementation
//!
//! This module implements the `ingest` command: fetch a batch of person
//! records, anonymize it and insert it into the deduplicating store.

use super::exit_code;
use crate::config::load_config;
use crate::core::ingest::IngestCoordinator;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the ingest command
#[derive(Args, Debug, Default)]
pub struct IngestArgs {
    /// Dry run mode - anonymize and report without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Override the total number of records to fetch
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Override the number of records requested per call
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

impl IngestArgs {
    /// Execute the ingest command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting ingest command");

        // Load configuration
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        // Apply CLI overrides
        if let Some(max_records) = self.max_records {
            tracing::info!(max_records, "Overriding max_records from CLI");
            config.source.max_records = Some(max_records);
        }
        if let Some(chunk_size) = self.chunk_size {
            tracing::info!(chunk_size, "Overriding chunk_size from CLI");
            config.source.chunk_size = Some(chunk_size);
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let dry_run = config.application.dry_run;
        if dry_run {
            println!("🔍 DRY RUN MODE - No data will be written to the store");
            println!();
        }

        let coordinator = match IngestCoordinator::from_config(config) {
            Ok(c) => c.with_shutdown(shutdown_signal),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create ingest coordinator");
                eprintln!("Failed to initialize ingestion: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        println!("🚀 Starting ingestion...");

        let summary = match coordinator.run().await {
            Ok(s) => s,
            Err(e) => {
                crate::log_error_with_context!(&e, "Ingestion failed");
                eprintln!("Ingestion failed: {e}");
                return Ok(exit_code(&e));
            }
        };

        println!("{}", summary.format_console());
        if let Some(ref report) = summary.report {
            println!("{}", report.format_console());
        }

        let code = if summary.interrupted {
            println!("⚠️  Ingestion interrupted; records fetched before the signal were processed.");
            130 // SIGINT exit code (standard Unix convention)
        } else if summary.rejected > 0 {
            println!(
                "⚠️  {} record(s) without an identity were rejected",
                summary.rejected
            );
            0
        } else {
            println!("✅ Ingestion completed successfully!");
            0
        };

        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_args_defaults() {
        let args = IngestArgs::default();
        assert!(!args.dry_run);
        assert!(args.max_records.is_none());
        assert!(args.chunk_size.is_none());
    }

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let (_tx, rx) = watch::channel(false);
        let code = IngestArgs::default()
            .execute("/nonexistent/shroud.toml", rx)
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
