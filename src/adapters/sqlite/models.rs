//! Row models for the users relation
//!
//! Maps anonymized records onto the fixed column set. Fields the schema
//! does not know (`id`, `website`, `image`, ...) are dropped here.

use crate::adapters::sqlite::schema::RECORD_COLUMNS;
use crate::anonymization::registry::FULL_MASK;
use crate::domain::record::IDENTITY_FIELD;
use crate::domain::{AnonymizedRecord, IdentityCiphertext, IdentityToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    /// Values for [`RECORD_COLUMNS`], same order
    pub values: Vec<Option<String>>,

    /// Dedup key; `None` for tokenless records
    pub identity_token: Option<String>,

    /// Recoverable identity
    pub identity_ciphertext: Option<String>,
}

impl UserRow {
    /// Build the row for an anonymized record
    pub fn from_record(record: &AnonymizedRecord) -> Self {
        let values = RECORD_COLUMNS
            .iter()
            .map(|column| {
                let value = record.get(column).and_then(column_text);
                // A tokenless record may lack an email entirely; the column is
                // NOT NULL so it gets the full mask.
                if value.is_none() && *column == IDENTITY_FIELD {
                    Some(FULL_MASK.to_string())
                } else {
                    value
                }
            })
            .collect();

        Self {
            values,
            identity_token: record.identity_token().map(|t| t.as_str().to_string()),
            identity_ciphertext: record
                .identity_ciphertext()
                .map(|c| c.as_str().to_string()),
        }
    }
}

fn column_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A persisted row, as read back for status and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    /// Surrogate identifier
    pub id: i64,

    /// Masked email
    pub email: String,

    /// Dedup key
    pub identity_token: Option<IdentityToken>,

    /// Recoverable identity
    pub identity_ciphertext: Option<IdentityCiphertext>,
}
