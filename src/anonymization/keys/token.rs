//! Deterministic identity token derivation (HMAC-SHA256)

use crate::domain::{IdentityToken, KeyError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const FINGERPRINT_LABEL: &[u8] = b"shroud-matching-key-fingerprint-v1";
const FINGERPRINT_BYTES: usize = 8;

fn mac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|err| KeyError::Crypto(err.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Keyed digest of `value`; equal inputs always give equal tokens
pub(super) fn derive_token(key: &[u8], value: &str) -> Result<IdentityToken, KeyError> {
    let digest = mac(key, value.as_bytes())?;
    IdentityToken::new(STANDARD.encode(digest)).map_err(KeyError::Crypto)
}

/// Short hex identifier of the key, safe to persist next to derived values
pub(super) fn derive_fingerprint(key: &[u8]) -> Result<String, KeyError> {
    let digest = mac(key, FINGERPRINT_LABEL)?;
    Ok(digest[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}
