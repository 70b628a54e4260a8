//! Identity key material
//!
//! Two independent 32-byte keys:
//! - the **matching key** feeds a deterministic HMAC-SHA256; its output (the
//!   identity token) is the only value ever compared for deduplication;
//! - the **encryption key** feeds XChaCha20-Poly1305 with a random nonce; its
//!   output (the identity ciphertext) is stored for recovery and never compared.
//!
//! The keys must stay stable across runs, otherwise tokens already in the
//! store can no longer be matched. [`KeyMaterial::load`] therefore fails hard
//! on a missing or corrupt file instead of generating a replacement.
//!
//! # Examples
//!
//! ```
//! use shroud::anonymization::keys::KeyMaterial;
//!
//! let keys = KeyMaterial::generate();
//! let a = keys.token("anna@example.com")?;
//! let b = keys.token("anna@example.com")?;
//! assert_eq!(a, b);
//!
//! let ct = keys.encrypt("anna@example.com")?;
//! assert_eq!(keys.decrypt(&ct)?, "anna@example.com");
//! # Ok::<(), shroud::domain::KeyError>(())
//! ```

mod cipher;
mod token;

use crate::domain::{IdentityCiphertext, IdentityToken, KeyError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use zeroize::Zeroize;

/// Key length in bytes for both keys
pub const KEY_LEN: usize = 32;

/// Raw key bytes, zeroed on drop
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct KeyBytes([u8; KEY_LEN]);

impl secrecy::CloneableSecret for KeyBytes {}
impl secrecy::DebugSecret for KeyBytes {}

impl KeyBytes {
    fn random() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    fn from_base64(name: &str, encoded: &str) -> Result<Self, KeyError> {
        let mut decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| KeyError::Corrupt(format!("{name} is not valid base64: {e}")))?;
        if decoded.len() != KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(KeyError::Corrupt(format!(
                "{name} must be {KEY_LEN} bytes, found {len}"
            )));
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(bytes))
    }
}

/// On-disk form: a mapping of named secrets
#[derive(Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
struct KeyFile {
    matching_key: String,
    encryption_key: String,
}

/// Process-wide key material, passed explicitly to the engine and store
#[derive(Clone)]
pub struct KeyMaterial {
    matching_key: Secret<KeyBytes>,
    encryption_key: Secret<KeyBytes>,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("matching_key", &"[REDACTED]")
            .field("encryption_key", &"[REDACTED]")
            .finish()
    }
}

impl KeyMaterial {
    /// Fresh random key material from the OS RNG
    pub fn generate() -> Self {
        Self {
            matching_key: Secret::new(KeyBytes::random()),
            encryption_key: Secret::new(KeyBytes::random()),
        }
    }

    /// Builds key material from raw bytes
    pub fn from_bytes(matching_key: [u8; KEY_LEN], encryption_key: [u8; KEY_LEN]) -> Self {
        Self {
            matching_key: Secret::new(KeyBytes(matching_key)),
            encryption_key: Secret::new(KeyBytes(encryption_key)),
        }
    }

    /// Loads key material persisted by [`KeyMaterial::save`]
    ///
    /// # Errors
    ///
    /// - [`KeyError::Missing`] if the file does not exist
    /// - [`KeyError::Corrupt`] if it can't be read or decoded
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KeyError::Missing(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| KeyError::Corrupt(format!("failed to read {}: {e}", path.display())))?;
        let file: KeyFile = serde_json::from_str(&contents)
            .map_err(|e| KeyError::Corrupt(format!("failed to parse {}: {e}", path.display())))?;

        let keys = Self {
            matching_key: Secret::new(KeyBytes::from_base64("matching_key", &file.matching_key)?),
            encryption_key: Secret::new(KeyBytes::from_base64(
                "encryption_key",
                &file.encryption_key,
            )?),
        };

        tracing::debug!(
            path = %path.display(),
            fingerprint = %keys.fingerprint()?,
            "Loaded key material"
        );
        Ok(keys)
    }

    /// Writes the key material to a new file; never overwrites
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), KeyError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                KeyError::Crypto(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let file = KeyFile {
            matching_key: STANDARD.encode(self.matching_key.expose_secret().0),
            encryption_key: STANDARD.encode(self.encryption_key.expose_secret().0),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| KeyError::Crypto(format!("failed to encode key file: {e}")))?;

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut handle = options.open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                KeyError::AlreadyExists(path.display().to_string())
            } else {
                KeyError::Crypto(format!("failed to create {}: {e}", path.display()))
            }
        })?;
        handle
            .write_all(json.as_bytes())
            .map_err(|e| KeyError::Crypto(format!("failed to write {}: {e}", path.display())))?;

        Ok(())
    }

    /// Generates new key material and persists it at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let keys = Self::generate();
        keys.save(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            fingerprint = %keys.fingerprint()?,
            "Generated new key material"
        );
        Ok(keys)
    }

    /// Loads key material, generating it only when explicitly allowed
    ///
    /// Returns the keys and whether they were freshly created.
    pub fn load_or_create(
        path: impl AsRef<Path>,
        create_if_missing: bool,
    ) -> Result<(Self, bool), KeyError> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(keys) => Ok((keys, false)),
            Err(KeyError::Missing(_)) if create_if_missing => {
                tracing::warn!(
                    path = %path.display(),
                    "Key material not found, generating new keys"
                );
                Ok((Self::create(path)?, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Deterministic identity token for an original identifying value
    pub fn token(&self, value: &str) -> Result<IdentityToken, KeyError> {
        token::derive_token(&self.matching_key.expose_secret().0, value)
    }

    /// Randomized, recoverable encryption of an original identifying value
    pub fn encrypt(&self, value: &str) -> Result<IdentityCiphertext, KeyError> {
        cipher::encrypt(&self.encryption_key.expose_secret().0, value)
    }

    /// Recovers the original value from an identity ciphertext
    pub fn decrypt(&self, ciphertext: &IdentityCiphertext) -> Result<String, KeyError> {
        cipher::decrypt(&self.encryption_key.expose_secret().0, ciphertext)
    }

    /// Non-secret identifier of the matching key
    pub fn fingerprint(&self) -> Result<String, KeyError> {
        token::derive_fingerprint(&self.matching_key.expose_secret().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_distinct_keys() {
        let a = KeyMaterial::generate();
        let b = KeyMaterial::generate();
        assert_ne!(
            a.token("x@y.z").unwrap(),
            b.token("x@y.z").unwrap()
        );
    }

    #[test]
    fn test_token_and_ciphertext_are_independent() {
        let keys = KeyMaterial::generate();
        let token = keys.token("anna@example.com").unwrap();
        let ct = keys.encrypt("anna@example.com").unwrap();
        assert_ne!(token.as_str(), ct.as_str());
    }

    #[test]
    fn test_save_and_load_preserves_tokens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys.json");

        let keys = KeyMaterial::create(&path).unwrap();
        let token = keys.token("anna@example.com").unwrap();
        let ct = keys.encrypt("anna@example.com").unwrap();

        let reloaded = KeyMaterial::load(&path).unwrap();
        assert_eq!(reloaded.token("anna@example.com").unwrap(), token);
        assert_eq!(reloaded.decrypt(&ct).unwrap(), "anna@example.com");
        assert_eq!(reloaded.fingerprint().unwrap(), keys.fingerprint().unwrap());
    }

    #[test]
    fn test_create_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys.json");
        KeyMaterial::create(&path).unwrap();
        assert!(matches!(
            KeyMaterial::create(&path),
            Err(KeyError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_load_missing_is_error() {
        let dir = tempdir().unwrap();
        let result = KeyMaterial::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(KeyError::Missing(_))));
    }

    #[test]
    fn test_load_or_create_requires_permission() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys.json");

        assert!(matches!(
            KeyMaterial::load_or_create(&path, false),
            Err(KeyError::Missing(_))
        ));

        let (_, created) = KeyMaterial::load_or_create(&path, true).unwrap();
        assert!(created);
        let (_, created) = KeyMaterial::load_or_create(&path, true).unwrap();
        assert!(!created);
    }

    #[test]
    fn test_load_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys.json");

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(KeyMaterial::load(&path), Err(KeyError::Corrupt(_))));

        std::fs::write(
            &path,
            r#"{"matching_key": "c2hvcnQ=", "encryption_key": "c2hvcnQ="}"#,
        )
        .unwrap();
        assert!(matches!(KeyMaterial::load(&path), Err(KeyError::Corrupt(_))));
    }

    #[test]
    fn test_debug_redacted() {
        let keys = KeyMaterial::from_bytes([0xAB; 32], [0xCD; 32]);
        let debug = format!("{keys:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("171"));
    }
}
