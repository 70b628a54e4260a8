//! Ingestion coordinator - main orchestrator for an ingestion run
//!
//! This module drives one run end to end: fetch, quality gate, address
//! flattening, anonymization, the credential gate and the deduplicating
//! insert.

use crate::adapters::source::{fetch_all, FetchPlan, HttpRecordSource, RecordSource};
use crate::adapters::sqlite::schema::USERS_TABLE;
use crate::adapters::sqlite::{InsertOutcome, TokenlessPolicy, UserStore};
use crate::anonymization::{AnonymizationEngine, KeyMaterial};
use crate::auth::CredentialStore;
use crate::config::ShroudConfig;
use crate::core::ingest::quality::check_required_fields;
use crate::core::ingest::standardize::standardize;
use crate::core::ingest::summary::IngestSummary;
use crate::domain::{AnonymizedRecord, Result, ShroudError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Ingestion coordinator
pub struct IngestCoordinator {
    config: ShroudConfig,
    source: Arc<dyn RecordSource>,
    shutdown_rx: Option<watch::Receiver<bool>>,
    reference_year: Option<i32>,
}

impl IngestCoordinator {
    /// Create a coordinator over an arbitrary record source
    pub fn new(config: ShroudConfig, source: Arc<dyn RecordSource>) -> Self {
        Self {
            config,
            source,
            shutdown_rx: None,
            reference_year: None,
        }
    }

    /// Create a coordinator fetching from the configured HTTP endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be built.
    pub fn from_config(config: ShroudConfig) -> Result<Self> {
        let source = Arc::new(HttpRecordSource::new(config.source.clone())?);
        Ok(Self::new(config, source))
    }

    /// Stop fetching further chunks once the signal turns `true`
    pub fn with_shutdown(mut self, shutdown_rx: watch::Receiver<bool>) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    /// Pin the year used for birthday generalization
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Execute one ingestion run
    ///
    /// Steps:
    /// 1. Load key material (fatal if missing, unless generation is allowed
    ///    and the store is still empty)
    /// 2. Fetch records, chunk by chunk
    /// 3. Apply the quality gate
    /// 4. Flatten addresses and anonymize
    /// 5. Stop here on a dry run
    /// 6. Authenticate the admin and database secrets
    /// 7. Verify the key fingerprint and insert the batch
    ///
    /// # Errors
    ///
    /// Any failure aborts the run. Rows committed by earlier runs are never
    /// touched, and a failed insert leaves the store unchanged.
    pub async fn run(&self) -> Result<IngestSummary> {
        let start_time = Instant::now();
        let mut summary = IngestSummary::new();
        summary.dry_run = self.config.application.dry_run;

        self.config.validate().map_err(ShroudError::Configuration)?;

        crate::log_ingest_start!(self.source.endpoint(), summary.dry_run);

        let keys = Arc::new(self.load_keys()?);
        let mut engine = AnonymizationEngine::from_config(keys.clone(), &self.config.anonymization)?;
        if let Some(year) = self.reference_year {
            engine = engine.with_reference_year(year);
        }

        let plan = FetchPlan {
            max_records: self.config.source.max_records,
            chunk_size: self.config.source.chunk_size,
        };
        let records = fetch_all(self.source.as_ref(), plan, self.shutdown_rx.as_ref()).await?;
        summary.fetched = records.len();
        summary.interrupted = self.shutdown_rx.as_ref().is_some_and(|rx| *rx.borrow());

        if records.is_empty() {
            tracing::warn!("No records fetched, nothing to ingest");
            let summary = summary.with_duration(start_time.elapsed());
            summary.log_summary();
            return Ok(summary);
        }

        let quality = check_required_fields(&records, &self.config.quality.required_fields);
        if !quality.passed() {
            return Err(ShroudError::Validation(quality.describe()));
        }

        let records = standardize(records);

        let anonymized = if summary.dry_run {
            let (anonymized, report) = engine.anonymize_with_report(&records)?;
            summary.report = Some(report);
            anonymized
        } else {
            engine.anonymize(&records)?
        };
        summary.anonymized = anonymized.len();
        summary.tokenless = anonymized.iter().filter(|r| !r.has_identity()).count();

        if summary.dry_run {
            tracing::info!(
                records = summary.anonymized,
                "Dry run, store left untouched"
            );
            let summary = summary.with_duration(start_time.elapsed());
            summary.log_summary();
            return Ok(summary);
        }

        self.authenticate()?;

        let fingerprint = keys.fingerprint()?;
        let (outcome, last_id) = insert_records(
            self.config.storage.database_path.clone(),
            anonymized,
            self.config.storage.tokenless_policy,
            fingerprint,
        )
        .await?;

        summary.inserted = outcome.inserted;
        summary.duplicates = outcome.duplicates;
        summary.rejected = outcome.rejected;
        summary.last_id = last_id;

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Load the key material, generating it only into an empty store
    fn load_keys(&self) -> Result<KeyMaterial> {
        let keys_config = &self.config.keys;
        let mut allow_create = keys_config.create_if_missing;

        if allow_create && store_has_rows(&self.config.storage.database_path)? {
            tracing::warn!(
                database = %self.config.storage.database_path.display(),
                "Store already holds rows, key generation disabled"
            );
            allow_create = false;
        }

        let (keys, created) = KeyMaterial::load_or_create(&keys_config.path, allow_create)?;
        if created {
            tracing::info!(path = %keys_config.path.display(), "Using newly generated key material");
        }
        Ok(keys)
    }

    /// Admin secret first, then the database secret
    fn authenticate(&self) -> Result<()> {
        let credentials = CredentialStore::load(&self.config.auth.credentials_path)?;

        if !credentials.authenticate_admin(self.config.auth.admin_key.as_ref()) {
            return Err(ShroudError::Authentication(
                "admin authentication failed".to_string(),
            ));
        }
        if !credentials.authenticate_database(self.config.auth.database_key.as_ref()) {
            return Err(ShroudError::Authentication(
                "database authentication failed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether the store file exists and already holds user rows
fn store_has_rows(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let store = UserStore::open(path)?;
    if !store.table_exists(USERS_TABLE)? {
        return Ok(false);
    }
    Ok(store.count()? > 0)
}

/// Run the blocking store work off the async runtime
async fn insert_records(
    database_path: PathBuf,
    records: Vec<AnonymizedRecord>,
    policy: TokenlessPolicy,
    fingerprint: String,
) -> Result<(InsertOutcome, i64)> {
    tokio::task::spawn_blocking(move || -> Result<(InsertOutcome, i64)> {
        let mut store = UserStore::open(&database_path)?;
        store.ensure_schema()?;
        store.verify_key_fingerprint(&fingerprint)?;

        let outcome = store.insert_batch(&records, policy)?;
        let last_id = store.last_id()?;

        tracing::info!(
            database = %database_path.display(),
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            rejected = outcome.rejected,
            "Batch committed"
        );
        Ok((outcome, last_id))
    })
    .await
    .map_err(|e| ShroudError::Other(format!("store task failed: {e}")))?
}
