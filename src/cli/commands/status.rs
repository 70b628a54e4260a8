//! Status command implementation
//!
//! This module implements the `status` command for displaying the state of
//! the deduplicating store.

use crate::adapters::sqlite::schema::USERS_TABLE;
use crate::adapters::sqlite::UserStore;
use crate::anonymization::KeyMaterial;
use crate::config::load_config;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking store status");

        println!("📊 Store Status");
        println!();

        // Load configuration
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let database_path = &config.storage.database_path;
        if !database_path.exists() {
            println!("No store found at {}.", database_path.display());
            println!("Run 'shroud ingest' to start ingesting data.");
            return Ok(0);
        }

        let store = match UserStore::open(database_path) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open store");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        if !store.table_exists(USERS_TABLE)? {
            println!("Store {} has no users table yet.", database_path.display());
            return Ok(0);
        }

        println!("  Database: {}", database_path.display());
        println!("  Rows: {}", store.count()?);
        println!("  Last ID: {}", store.last_id()?);

        let stored = store.stored_fingerprint()?;
        println!(
            "  Key fingerprint (store): {}",
            stored.as_deref().unwrap_or("not recorded")
        );

        match KeyMaterial::load(&config.keys.path) {
            Ok(keys) => {
                let current = keys.fingerprint()?;
                println!("  Key fingerprint (file):  {current}");
                if stored.as_deref().is_some_and(|fp| fp != current) {
                    println!();
                    println!("⚠️  Key file does not match the key the store was written with");
                    return Ok(2);
                }
            }
            Err(e) => {
                println!("  Key file: {e}");
            }
        }

        println!();
        Ok(0)
    }
}
