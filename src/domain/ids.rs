//! Identity value newtypes
//!
//! The identity token and the identity ciphertext are both base64 strings,
//! but they must never be interchanged: the token is the only valid
//! deduplication key, the ciphertext is only ever decrypted for recovery.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deterministic keyed digest of an original identifying value
///
/// Two tokens are equal iff the original values were equal (under the same
/// matching key).
///
/// # Examples
///
/// ```
/// use shroud::domain::ids::IdentityToken;
/// use std::str::FromStr;
///
/// let token = IdentityToken::from_str("q83vEjRWeJA=").unwrap();
/// assert_eq!(token.as_str(), "q83vEjRWeJA=");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// Creates a new IdentityToken from its encoded form
    pub fn new(token: impl Into<String>) -> Result<Self, String> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err("Identity token cannot be empty".to_string());
        }
        Ok(Self(token))
    }

    /// Returns the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdentityToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for IdentityToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reversible, randomized encryption of an original identifying value
///
/// Equal plaintexts produce different ciphertexts; equality on this type
/// only means "same bytes", never "same identity".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCiphertext(String);

impl IdentityCiphertext {
    /// Creates a new IdentityCiphertext from its encoded form
    pub fn new(ciphertext: impl Into<String>) -> Result<Self, String> {
        let ciphertext = ciphertext.into();
        if ciphertext.trim().is_empty() {
            return Err("Identity ciphertext cannot be empty".to_string());
        }
        Ok(Self(ciphertext))
    }

    /// Returns the ciphertext as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for IdentityCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdentityCiphertext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for IdentityCiphertext {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_token_valid() {
        let token = IdentityToken::new("abc=").unwrap();
        assert_eq!(token.as_str(), "abc=");
        assert_eq!(token.to_string(), "abc=");
    }

    #[test]
    fn test_identity_token_empty() {
        assert!(IdentityToken::new("").is_err());
        assert!(IdentityToken::new("   ").is_err());
    }

    #[test]
    fn test_identity_ciphertext_round_trip_str() {
        let ct = IdentityCiphertext::from_str("Zm9vYmFy").unwrap();
        assert_eq!(ct.clone().into_inner(), "Zm9vYmFy");
        assert_eq!(ct.as_ref(), "Zm9vYmFy");
    }

    #[test]
    fn test_identity_ciphertext_empty() {
        assert!(IdentityCiphertext::new("").is_err());
    }

    #[test]
    fn test_serde() {
        let token = IdentityToken::new("tok").unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"tok\"");
        let back: IdentityToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
