//! Set-credentials command implementation
//!
//! Hashes the admin and database secrets from `[auth]` (or their
//! `SHROUD_AUTH_*` overrides) into the credential file.

use crate::auth::CredentialStore;
use crate::config::load_config;
use clap::Args;

/// Arguments for the set-credentials command
#[derive(Args, Debug, Default)]
pub struct SetCredentialsArgs {
    /// Replace credentials that are already set
    #[arg(long)]
    pub force: bool,
}

impl SetCredentialsArgs {
    /// Execute the set-credentials command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let (Some(admin_key), Some(database_key)) =
            (config.auth.admin_key.as_ref(), config.auth.database_key.as_ref())
        else {
            println!("❌ Both auth.admin_key and auth.database_key must be set");
            println!("   Use SHROUD_AUTH_ADMIN_KEY and SHROUD_AUTH_DATABASE_KEY");
            return Ok(2);
        };

        let mut store = match CredentialStore::load(&config.auth.credentials_path) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ {e}");
                return Ok(3); // Authentication error exit code
            }
        };

        if store.is_configured() && !self.force {
            println!(
                "❌ Credentials already set in {}",
                config.auth.credentials_path.display()
            );
            println!("   Use --force to replace them");
            return Ok(2);
        }

        match store.set_keys(admin_key, database_key) {
            Ok(()) => {
                println!(
                    "✅ Credential hashes stored in {}",
                    config.auth.credentials_path.display()
                );
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to store credentials");
                println!("❌ Failed to store credentials");
                println!("   Error: {e}");
                Ok(super::exit_code(&e))
            }
        }
    }
}
