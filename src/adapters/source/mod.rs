//! Upstream record source
//!
//! The [`RecordSource`] trait isolates the network fetch so the ingestion
//! pipeline can be driven by an in-memory source in tests.

pub mod client;

pub use client::HttpRecordSource;

use crate::domain::{RawRecord, Result};
use async_trait::async_trait;
use tokio::sync::watch;

/// Source of raw person records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one batch; `quantity` is the number of records requested
    async fn fetch(&self, quantity: Option<usize>) -> Result<Vec<RawRecord>>;

    /// Human-readable endpoint, for logging
    fn endpoint(&self) -> &str;
}

/// How many records to pull and in what chunk size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchPlan {
    /// Total records wanted
    pub max_records: Option<usize>,
    /// Records per request
    pub chunk_size: Option<usize>,
}

impl FetchPlan {
    /// Chunked fetching needs both limits
    pub fn is_chunked(&self) -> bool {
        self.max_records.is_some() && self.chunk_size.is_some()
    }

    /// Quantity for the next request, or `None` when the target is reached
    pub fn next_quantity(&self, fetched: usize) -> Option<usize> {
        match (self.max_records, self.chunk_size) {
            (Some(max), Some(chunk)) if fetched < max => Some(chunk.min(max - fetched)),
            _ => None,
        }
    }
}

/// Fetch every record the plan asks for
///
/// Chunked plans request `chunk_size` records at a time until `max_records`
/// is reached or the source returns an empty chunk. The shutdown signal is
/// checked between chunks; records fetched so far are kept. Without chunking
/// a single request is made.
pub async fn fetch_all(
    source: &dyn RecordSource,
    plan: FetchPlan,
    shutdown: Option<&watch::Receiver<bool>>,
) -> Result<Vec<RawRecord>> {
    if !plan.is_chunked() {
        let records = source.fetch(plan.max_records.or(plan.chunk_size)).await?;
        tracing::info!(count = records.len(), "Fetched records in a single request");
        return Ok(records);
    }

    let target = plan.max_records.unwrap_or_default();
    // `target` is user-supplied; grow as chunks arrive.
    let mut records = Vec::new();

    while let Some(quantity) = plan.next_quantity(records.len()) {
        if shutdown.is_some_and(|rx| *rx.borrow()) {
            tracing::warn!(
                fetched = records.len(),
                "Shutdown requested, stopping fetch"
            );
            break;
        }

        let chunk = source.fetch(Some(quantity)).await?;
        if chunk.is_empty() {
            tracing::info!(fetched = records.len(), "No more data available");
            break;
        }

        let chunk_len = chunk.len();
        records.extend(chunk);
        crate::log_chunk_fetched!(chunk_len, records.len(), target);
    }

    // A source may return more than asked for.
    records.truncate(target);
    Ok(records)
}
