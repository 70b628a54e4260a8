//! Domain models and types for Shroud.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Record types** ([`RawRecord`], [`AnonymizedRecord`])
//! - **Identity newtypes** ([`IdentityToken`], [`IdentityCiphertext`])
//! - **Error types** ([`ShroudError`], [`StoreError`], [`KeyError`], [`SourceError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! The dedup key and the recoverable ciphertext are distinct types, so a
//! ciphertext can't be handed to an existence check by mistake:
//!
//! ```rust
//! use shroud::domain::{IdentityCiphertext, IdentityToken};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let token = IdentityToken::new("q83vEjRWeJA=")?;
//! let ciphertext = IdentityCiphertext::new("AAECAwQ=")?;
//!
//! // This won't compile
//! // let wrong: IdentityToken = ciphertext;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{KeyError, ShroudError, SourceError, StoreError};
pub use ids::{IdentityCiphertext, IdentityToken};
pub use record::{AnonymizedRecord, IdentityDerivation, RawRecord};
pub use result::Result;
