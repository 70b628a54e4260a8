//! Ingestion pipeline
//!
//! One run moves a batch from the upstream source into the store:
//! fetch → quality gate → address flattening → anonymization →
//! credential gate → deduplicating insert.

pub mod coordinator;
pub mod quality;
pub mod standardize;
pub mod summary;

pub use coordinator::IngestCoordinator;
pub use quality::{check_required_fields, MissingField, QualityReport};
pub use standardize::{flatten_address, standardize};
pub use summary::IngestSummary;
