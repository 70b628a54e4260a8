//! Credential gate
//!
//! Two static secrets guard writes to the store: an administrative secret and
//! a storage secret. Only salted HMAC-SHA256 digests of them are persisted;
//! verification is constant-time.

use crate::config::SecretString;
use crate::domain::{Result, ShroudError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;

/// Salted digest of one secret
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HashedKey {
    salt: String,
    hash: String,
}

impl HashedKey {
    fn generate(secret: &str) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let hash = digest(&salt, secret)?.finalize().into_bytes();
        Ok(Self {
            salt: STANDARD.encode(salt),
            hash: STANDARD.encode(hash),
        })
    }

    fn verify(&self, secret: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (STANDARD.decode(&self.salt), STANDARD.decode(&self.hash))
        else {
            return false;
        };
        match digest(&salt, secret) {
            Ok(mac) => mac.verify_slice(&expected).is_ok(),
            Err(_) => false,
        }
    }
}

fn digest(salt: &[u8], secret: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(salt)
        .map_err(|e| ShroudError::Authentication(format!("invalid salt: {e}")))?;
    mac.update(secret.as_bytes());
    Ok(mac)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin_key: Option<HashedKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_key: Option<HashedKey>,
}

/// Persisted credential hashes
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    keys: CredentialFile,
}

impl CredentialStore {
    /// Loads the credential file; a missing file gives an empty store
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let keys = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                ShroudError::Authentication(format!(
                    "Failed to read credential file {}: {e}",
                    path.display()
                ))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                ShroudError::Authentication(format!(
                    "Failed to parse credential file {}: {e}",
                    path.display()
                ))
            })?
        } else {
            CredentialFile::default()
        };

        Ok(Self { path, keys })
    }

    /// Whether both secrets have been set
    pub fn is_configured(&self) -> bool {
        self.keys.admin_key.is_some() && self.keys.database_key.is_some()
    }

    /// Hash and persist both secrets, replacing earlier ones
    pub fn set_keys(&mut self, admin_key: &SecretString, database_key: &SecretString) -> Result<()> {
        if admin_key.expose_secret().is_empty() || database_key.expose_secret().is_empty() {
            return Err(ShroudError::Validation(
                "admin and database secrets must not be empty".to_string(),
            ));
        }

        self.keys = CredentialFile {
            admin_key: Some(HashedKey::generate(admin_key.expose_secret().as_ref())?),
            database_key: Some(HashedKey::generate(database_key.expose_secret().as_ref())?),
        };
        self.save()?;

        tracing::info!(path = %self.path.display(), "Stored credential hashes");
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.keys)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Check the administrative secret
    pub fn authenticate_admin(&self, provided: Option<&SecretString>) -> bool {
        let ok = Self::check(self.keys.admin_key.as_ref(), provided);
        if ok {
            tracing::info!("Admin authentication successful");
        } else {
            tracing::warn!("Admin authentication failed");
        }
        ok
    }

    /// Check the storage secret
    pub fn authenticate_database(&self, provided: Option<&SecretString>) -> bool {
        let ok = Self::check(self.keys.database_key.as_ref(), provided);
        if ok {
            tracing::info!("Database authentication successful");
        } else {
            tracing::warn!("Database authentication failed");
        }
        ok
    }

    fn check(stored: Option<&HashedKey>, provided: Option<&SecretString>) -> bool {
        match (stored, provided) {
            (Some(stored), Some(provided)) if !provided.expose_secret().is_empty() => {
                stored.verify(provided.expose_secret().as_ref())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use tempfile::tempdir;

    #[test]
    fn test_set_and_authenticate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let mut store = CredentialStore::load(&path).unwrap();
        assert!(!store.is_configured());
        store
            .set_keys(
                &secret_string("admin-pw".to_string()),
                &secret_string("db-pw".to_string()),
            )
            .unwrap();

        let reloaded = CredentialStore::load(&path).unwrap();
        assert!(reloaded.is_configured());
        assert!(reloaded.authenticate_admin(Some(&secret_string("admin-pw".to_string()))));
        assert!(reloaded.authenticate_database(Some(&secret_string("db-pw".to_string()))));
        assert!(!reloaded.authenticate_admin(Some(&secret_string("db-pw".to_string()))));
        assert!(!reloaded.authenticate_database(None));
    }

    #[test]
    fn test_file_has_no_plaintext() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let mut store = CredentialStore::load(&path).unwrap();
        store
            .set_keys(
                &secret_string("admin-pw".to_string()),
                &secret_string("db-pw".to_string()),
            )
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("admin-pw"));
        assert!(!contents.contains("db-pw"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let dir = tempdir().unwrap();
        let mut store = CredentialStore::load(dir.path().join("c.json")).unwrap();
        let result = store.set_keys(
            &secret_string(String::new()),
            &secret_string("db".to_string()),
        );
        assert!(result.is_err());
        assert!(!store.authenticate_admin(Some(&secret_string(String::new()))));
    }

    #[test]
    fn test_unconfigured_store_denies() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::load(dir.path().join("absent.json")).unwrap();
        assert!(!store.authenticate_admin(Some(&secret_string("x".to_string()))));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            CredentialStore::load(&path),
            Err(ShroudError::Authentication(_))
        ));
    }
}
