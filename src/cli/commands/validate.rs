//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Shroud configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Load configuration (validation runs as part of loading)
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Source URL: {}", config.source.url);
        println!(
            "  Gender: {}",
            config.source.gender.as_deref().unwrap_or("any")
        );
        println!(
            "  Birthday Start: {}",
            config.source.birthday_start.as_deref().unwrap_or("any")
        );
        match (config.source.max_records, config.source.chunk_size) {
            (Some(max), Some(chunk)) => println!("  Fetch: {max} records in chunks of {chunk}"),
            (max, chunk) => println!(
                "  Fetch: single request ({} records)",
                max.or(chunk)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "server default".to_string())
            ),
        }
        println!("  Required Fields: {:?}", config.quality.required_fields);
        println!("  Database: {}", config.storage.database_path.display());
        println!("  Tokenless Policy: {}", config.storage.tokenless_policy);
        println!("  Key File: {}", config.keys.path.display());
        println!(
            "  Credentials: {}",
            config.auth.credentials_path.display()
        );
        println!(
            "  Secrets Provided: admin={}, database={}",
            config.auth.admin_key.is_some(),
            config.auth.database_key.is_some()
        );
        println!(
            "  Audit Log: {}",
            if config.anonymization.audit.enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}
            .execute("/nonexistent/shroud.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
