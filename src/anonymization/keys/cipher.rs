//! Recoverable identity encryption (XChaCha20-Poly1305, random nonce)
//!
//! Encoded form: base64(nonce ‖ ciphertext ‖ tag).

use crate::domain::{IdentityCiphertext, KeyError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;

const NONCE_LEN: usize = 24;

fn aead(key: &[u8; 32]) -> XChaCha20Poly1305 {
    XChaCha20Poly1305::new(Key::from_slice(key))
}

pub(super) fn encrypt(key: &[u8; 32], plaintext: &str) -> Result<IdentityCiphertext, KeyError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let sealed = aead(key)
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| KeyError::Crypto(format!("{e:?}")))?;

    let mut encoded = Vec::with_capacity(NONCE_LEN + sealed.len());
    encoded.extend_from_slice(&nonce);
    encoded.extend_from_slice(&sealed);

    IdentityCiphertext::new(STANDARD.encode(encoded)).map_err(KeyError::Crypto)
}

pub(super) fn decrypt(key: &[u8; 32], ciphertext: &IdentityCiphertext) -> Result<String, KeyError> {
    let raw = STANDARD
        .decode(ciphertext.as_str())
        .map_err(|e| KeyError::Decryption(format!("invalid base64: {e}")))?;
    if raw.len() <= NONCE_LEN {
        return Err(KeyError::Decryption(format!(
            "ciphertext too short: {} bytes",
            raw.len()
        )));
    }

    let (nonce, sealed) = raw.split_at(NONCE_LEN);
    let plaintext = aead(key)
        .decrypt(XNonce::from_slice(nonce), sealed)
        .map_err(|_| KeyError::Decryption("authentication tag mismatch".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| KeyError::Decryption(format!("plaintext is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let key = [9u8; 32];
        let ct = encrypt(&key, "test@gmail.com").unwrap();
        assert_ne!(ct.as_str(), "test@gmail.com");
        assert_eq!(decrypt(&key, &ct).unwrap(), "test@gmail.com");
    }

    #[test]
    fn test_randomized() {
        let key = [9u8; 32];
        let a = encrypt(&key, "test@gmail.com").unwrap();
        let b = encrypt(&key, "test@gmail.com").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let ct = encrypt(&[1u8; 32], "test@gmail.com").unwrap();
        assert!(matches!(
            decrypt(&[2u8; 32], &ct),
            Err(KeyError::Decryption(_))
        ));
    }

    #[test]
    fn test_truncated_fails() {
        let short = IdentityCiphertext::new(STANDARD.encode([0u8; 10])).unwrap();
        assert!(matches!(decrypt(&[1u8; 32], &short), Err(KeyError::Decryption(_))));

        let garbage = IdentityCiphertext::new("not base64!!").unwrap();
        assert!(matches!(decrypt(&[1u8; 32], &garbage), Err(KeyError::Decryption(_))));
    }
}
