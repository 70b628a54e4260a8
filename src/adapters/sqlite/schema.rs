//! Relational schema for the deduplicating store

use rusqlite::Connection;

/// Name of the relation holding anonymized users
pub const USERS_TABLE: &str = "users";

/// Name of the key/value relation holding store metadata
pub const METADATA_TABLE: &str = "store_metadata";

/// Metadata key under which the matching-key fingerprint is kept
pub const FINGERPRINT_KEY: &str = "matching_key_fingerprint";

/// Record columns persisted for every row, in insert order
///
/// `id`, `identity_token` and `identity_ciphertext` are handled separately.
pub const RECORD_COLUMNS: [&str; 14] = [
    "firstname",
    "lastname",
    "email",
    "phone",
    "birthday",
    "gender",
    "street",
    "streetName",
    "buildingNumber",
    "city",
    "zipcode",
    "country",
    "latitude",
    "longitude",
];

// `birthday` holds the decade label and latitude/longitude hold the full
// mask, so all three are TEXT.
pub const USERS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    firstname TEXT,
    lastname TEXT,
    email TEXT NOT NULL,
    phone TEXT,
    birthday TEXT,
    gender TEXT CHECK(gender IN ('male', 'female')),
    street TEXT,
    streetName TEXT,
    buildingNumber TEXT,
    city TEXT,
    zipcode TEXT,
    country TEXT,
    latitude TEXT,
    longitude TEXT,
    identity_token TEXT,
    identity_ciphertext TEXT
);
"#;

pub const USERS_INDEXES: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_identity_token ON users(identity_token);
CREATE INDEX IF NOT EXISTS idx_email_encrypt ON users(identity_ciphertext);
"#;

pub const METADATA_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS store_metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Creates every relation and index; safe to call repeatedly
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(USERS_TABLE_SCHEMA)?;
    conn.execute_batch(USERS_INDEXES)?;
    conn.execute_batch(METADATA_TABLE_SCHEMA)?;
    Ok(())
}

/// `INSERT` statement for one user row, skipping token conflicts
pub fn insert_user_sql() -> String {
    let mut columns: Vec<&str> = RECORD_COLUMNS.to_vec();
    columns.push("identity_token");
    columns.push("identity_ciphertext");

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {USERS_TABLE} ({}) VALUES ({}) ON CONFLICT(identity_token) DO NOTHING",
        columns.join(", "),
        placeholders.join(", ")
    )
}
