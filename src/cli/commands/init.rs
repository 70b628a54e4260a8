//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "shroud.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Shroud configuration");
        println!();

        // Check if file already exists
        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set SHROUD_AUTH_ADMIN_KEY and SHROUD_AUTH_DATABASE_KEY (or use a .env file)");
                println!("  3. Generate identity keys: shroud init-keys");
                println!("  4. Store the credential hashes: shroud set-credentials");
                println!("  5. Validate configuration: shroud validate-config");
                println!("  6. Run ingestion: shroud ingest --dry-run, then shroud ingest");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate the sample configuration
    pub(crate) fn generate_config() -> String {
        r#"# Shroud Configuration File
# Fetch person records, anonymize them and store them deduplicated

[application]
log_level = "info"
dry_run = false

[source]
url = "https://fakerapi.it/api/v1/persons"
gender = "female"
birthday_start = "2005-01-01"

# Chunked fetching needs both values; otherwise a single request is made
max_records = 1000
chunk_size = 100
timeout_seconds = 60

[source.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[quality]
required_fields = ["email"]

[storage]
database_path = "./data/users.db"
# reject | insert_without_dedup
tokenless_policy = "reject"

[keys]
# Never delete this file once the store holds rows
path = "./keys/identity_keys.json"
create_if_missing = false

[auth]
credentials_path = "./keys/credentials.json"
# Secrets are best supplied through SHROUD_AUTH_ADMIN_KEY / SHROUD_AUTH_DATABASE_KEY
# admin_key = "${SHROUD_ADMIN_KEY}"
# database_key = "${SHROUD_DATABASE_KEY}"

[anonymization]
# Year birthdays are aged against; defaults to the current year
# reference_year = 2025

[anonymization.audit]
enabled = true
log_path = "./audit/anonymization.log"
json_format = true

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"  # daily | hourly | never
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShroudConfig;
    use tempfile::tempdir;

    #[test]
    fn test_generated_config_is_valid() {
        let config: ShroudConfig = toml::from_str(&InitArgs::generate_config()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.source.chunk_size, Some(100));
        assert!(config.auth.admin_key.is_none());
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("shroud.toml");
        fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.display().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "# existing");

        let args = InitArgs {
            output: output.display().to_string(),
            force: true,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[source]"));
    }
}
