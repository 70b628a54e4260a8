//! Init-keys command implementation
//!
//! Generates the identity key material once. The file is never overwritten:
//! tokens derived from a new key can't be compared with stored ones.

use crate::anonymization::KeyMaterial;
use crate::config::load_config;
use crate::domain::KeyError;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the init-keys command
#[derive(Args, Debug, Default)]
pub struct InitKeysArgs {
    /// Write the key file here instead of the configured `keys.path`
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl InitKeysArgs {
    /// Execute the init-keys command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let path = match self.path {
            Some(ref path) => path.clone(),
            None => match load_config(config_path) {
                Ok(config) => config.keys.path,
                Err(e) => {
                    println!("❌ Failed to load configuration file");
                    println!("   Error: {e}");
                    return Ok(2); // Configuration error exit code
                }
            },
        };

        tracing::info!(path = %path.display(), "Generating identity key material");

        match KeyMaterial::create(&path) {
            Ok(keys) => {
                println!("🔑 Key material written to {}", path.display());
                println!("   Fingerprint: {}", keys.fingerprint()?);
                println!();
                println!("Back this file up. Losing it makes stored identities unrecoverable");
                println!("and stops deduplication against existing rows.");
                Ok(0)
            }
            Err(KeyError::AlreadyExists(existing)) => {
                println!("❌ Key file already exists: {existing}");
                println!("   Refusing to overwrite existing key material");
                Ok(2)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to generate key material");
                println!("❌ Failed to generate key material");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_keys_never_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys").join("identity_keys.json");
        let args = InitKeysArgs {
            path: Some(path.clone()),
        };

        assert_eq!(args.execute("unused.toml").await.unwrap(), 0);
        let before = std::fs::read_to_string(&path).unwrap();

        assert_eq!(args.execute("unused.toml").await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert!(KeyMaterial::load(&path).is_ok());
    }
}
