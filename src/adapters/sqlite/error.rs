//! Mapping of SQLite failures onto [`StoreError`]

use crate::domain::StoreError;
use rusqlite::ErrorCode;

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message) => {
                let detail = message.clone().unwrap_or_else(|| err.to_string());
                match failure.code {
                    ErrorCode::ConstraintViolation => StoreError::ConstraintViolation(detail),
                    ErrorCode::CannotOpen
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::DiskFull
                    | ErrorCode::ReadOnly
                    | ErrorCode::PermissionDenied
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked => StoreError::Io(detail),
                    _ if detail.contains("no such table") => StoreError::SchemaMissing(detail),
                    _ => StoreError::Query(detail),
                }
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}
