//! Record types flowing through an ingestion run
//!
//! A [`RawRecord`] is what the upstream API sent. An [`AnonymizedRecord`] is a
//! new value built from it by the anonymization engine; the raw record is
//! never mutated.

use super::ids::{IdentityCiphertext, IdentityToken};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name of the nested address sub-object
pub const ADDRESS_FIELD: &str = "address";

/// Fields lifted out of the nested address sub-object
pub const ADDRESS_SUBFIELDS: [&str; 8] = [
    "street",
    "streetName",
    "buildingNumber",
    "city",
    "zipcode",
    "country",
    "latitude",
    "longitude",
];

/// Field holding the original identifying value
pub const IDENTITY_FIELD: &str = "email";

/// A record as received from the upstream source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Creates an empty record
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps an existing JSON object
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Converts a JSON value into a record; non-objects are rejected
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(format!(
                "expected a JSON object for a record, got {}",
                json_kind(&other)
            )),
        }
    }

    /// Returns the value of a field, if present
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether the field is present (null counts as present)
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Sets a field, returning the record for chaining
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Iterates over fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying map
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes self and returns the underlying map
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `address` holds a nested object
    pub fn has_nested_address(&self) -> bool {
        matches!(self.0.get(ADDRESS_FIELD), Some(Value::Object(_)))
    }

    /// Lift the known sub-fields of a nested `address` object to the top level
    ///
    /// Only keys actually present in the sub-object are copied; a lifted value
    /// replaces a top-level field of the same name. Unknown sub-fields are
    /// dropped with the sub-object. An `address` that isn't an object is left
    /// as it is.
    pub fn flatten_address(mut self) -> Self {
        if !self.has_nested_address() {
            return self;
        }

        if let Some(Value::Object(mut address)) = self.0.remove(ADDRESS_FIELD) {
            for name in ADDRESS_SUBFIELDS {
                if let Some(value) = address.remove(name) {
                    self.0.insert(name.to_string(), value);
                }
            }
        }
        self
    }
}

/// Token and ciphertext derived from one original identifying value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityDerivation {
    /// Deterministic dedup key
    pub token: IdentityToken,
    /// Recoverable encrypted form; never compared
    pub ciphertext: IdentityCiphertext,
}

/// A record after the field policy has been applied
///
/// Only serializable; the engine is the sole producer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonymizedRecord {
    fields: Map<String, Value>,
    identity: Option<IdentityDerivation>,
}

impl AnonymizedRecord {
    /// Builds an anonymized record; only the anonymization engine should call this
    pub(crate) fn new(fields: Map<String, Value>, identity: Option<IdentityDerivation>) -> Self {
        Self { fields, identity }
    }

    /// Returns the (masked) value of a field, if present
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field as a string slice when it holds a string
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Borrow all transformed fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Identity derivation, absent when the record had no usable identifying field
    pub fn identity(&self) -> Option<&IdentityDerivation> {
        self.identity.as_ref()
    }

    /// Identity token, the only valid dedup key
    pub fn identity_token(&self) -> Option<&IdentityToken> {
        self.identity.as_ref().map(|i| &i.token)
    }

    /// Identity ciphertext for audit/recovery
    pub fn identity_ciphertext(&self) -> Option<&IdentityCiphertext> {
        self.identity.as_ref().map(|i| &i.ciphertext)
    }

    /// Whether this record can take part in deduplication
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
