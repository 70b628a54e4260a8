//! Core business logic for Shroud.
//!
//! This module contains the orchestration of an ingestion run.
//!
//! # Modules
//!
//! - [`ingest`] - Quality gate, address flattening, coordination and run summary
//!
//! # Ingestion Workflow
//!
//! 1. **Load Keys**: Read the identity key material (never silently regenerated)
//! 2. **Fetch**: Pull records from the upstream API in chunks
//! 3. **Quality Gate**: Every record must carry the required fields
//! 4. **Flatten**: Lift the nested address into top-level fields
//! 5. **Anonymize**: Mask, generalize and derive the identity token and ciphertext
//! 6. **Authenticate**: Check the admin and database secrets
//! 7. **Insert**: Deduplicate on the identity token inside one transaction
//! 8. **Report**: Log the run summary
//!
//! # Example
//!
//! ```rust,no_run
//! use shroud::config::load_config;
//! use shroud::core::ingest::IngestCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("shroud.toml")?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = IngestCoordinator::from_config(config)?.with_shutdown(shutdown_rx);
//! let summary = coordinator.run().await?;
//!
//! println!("Inserted: {}", summary.inserted);
//! println!("Duplicates: {}", summary.duplicates);
//! # Ok(())
//! # }
//! ```

pub mod ingest;
