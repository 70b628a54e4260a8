//! Recover command implementation
//!
//! Decrypts the identity ciphertext of one stored row. Requires the admin
//! secret; the recovered value is printed and never logged.

use crate::adapters::sqlite::UserStore;
use crate::anonymization::KeyMaterial;
use crate::auth::CredentialStore;
use crate::config::load_config;
use clap::Args;

/// Arguments for the recover command
#[derive(Args, Debug)]
pub struct RecoverArgs {
    /// Row id in the users table
    #[arg(long)]
    pub id: i64,
}

impl RecoverArgs {
    /// Execute the recover command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let credentials = match CredentialStore::load(&config.auth.credentials_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ {e}");
                return Ok(3);
            }
        };
        if !credentials.authenticate_admin(config.auth.admin_key.as_ref()) {
            println!("❌ Admin authentication failed");
            return Ok(3); // Authentication error exit code
        }

        let keys = match KeyMaterial::load(&config.keys.path) {
            Ok(k) => k,
            Err(e) => {
                println!("❌ {e}");
                return Ok(2);
            }
        };

        if !config.storage.database_path.exists() {
            println!(
                "❌ No store found at {}",
                config.storage.database_path.display()
            );
            return Ok(4);
        }
        let store = match UserStore::open(&config.storage.database_path) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open store");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };
        if let Some(expected) = store.stored_fingerprint()? {
            if expected != keys.fingerprint()? {
                println!("❌ Key file does not match the key the store was written with");
                return Ok(2);
            }
        }

        let Some(user) = store.find_user(self.id)? else {
            println!("❌ No row with id {}", self.id);
            return Ok(5);
        };
        let Some(ciphertext) = user.identity_ciphertext else {
            println!("❌ Row {} was stored without an identity", self.id);
            return Ok(5);
        };

        match keys.decrypt(&ciphertext) {
            Ok(email) => {
                tracing::info!(id = self.id, "Recovered stored identity");
                println!("{email}");
                Ok(0)
            }
            Err(e) => {
                tracing::error!(id = self.id, error = %e, "Failed to decrypt identity");
                println!("❌ {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}
