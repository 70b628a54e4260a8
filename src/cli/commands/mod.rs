//! CLI command implementations
//!
//! This module contains all CLI command implementations. Every command
//! returns a process exit code:
//!
//! - `0` success
//! - `2` configuration error (including missing or corrupt key material)
//! - `3` authentication failure
//! - `4` upstream or storage failure
//! - `5` fatal error

pub mod credentials;
pub mod ingest;
pub mod init;
pub mod keys;
pub mod recover;
pub mod status;
pub mod validate;

use crate::domain::ShroudError;

/// Exit code for an error that ended a command
pub fn exit_code(error: &ShroudError) -> i32 {
    match error {
        ShroudError::Configuration(_)
        | ShroudError::Validation(_)
        | ShroudError::KeyMaterial(_) => 2,
        ShroudError::Authentication(_) => 3,
        ShroudError::Source(_) | ShroudError::Store(_) | ShroudError::Io(_) => 4,
        ShroudError::Serialization(_) | ShroudError::Other(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{KeyError, SourceError, StoreError};

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&ShroudError::Configuration("x".into())), 2);
        assert_eq!(
            exit_code(&ShroudError::KeyMaterial(KeyError::Missing("k".into()))),
            2
        );
        assert_eq!(exit_code(&ShroudError::Authentication("x".into())), 3);
        assert_eq!(
            exit_code(&ShroudError::Source(SourceError::Timeout("t".into()))),
            4
        );
        assert_eq!(
            exit_code(&ShroudError::Store(StoreError::SchemaMissing("users".into()))),
            4
        );
        assert_eq!(exit_code(&ShroudError::Other("x".into())), 5);
    }
}
