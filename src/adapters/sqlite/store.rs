//! Deduplicating user store backed by SQLite
//!
//! At most one row exists per identity token. The unique index on
//! `identity_token` enforces this inside the storage engine, so a batch
//! that repeats a token, or a concurrent writer, can't create a second row.

use crate::adapters::sqlite::models::{StoredUser, UserRow};
use crate::adapters::sqlite::schema::{
    self, FINGERPRINT_KEY, METADATA_TABLE, USERS_TABLE,
};
use crate::domain::{
    AnonymizedRecord, IdentityCiphertext, IdentityToken, KeyError, ShroudError, StoreError,
};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What to do with records that carry no identity token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenlessPolicy {
    /// Skip them and count them as rejected
    #[default]
    Reject,
    /// Insert them; they never match anything
    InsertWithoutDedup,
}

impl fmt::Display for TokenlessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::InsertWithoutDedup => write!(f, "insert_without_dedup"),
        }
    }
}

impl std::str::FromStr for TokenlessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "insert_without_dedup" => Ok(Self::InsertWithoutDedup),
            other => Err(format!(
                "Invalid tokenless policy '{other}'. Must be 'reject' or 'insert_without_dedup'"
            )),
        }
    }
}

/// Result of one [`UserStore::insert_batch`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    /// Rows written
    pub inserted: usize,

    /// Records whose token was already stored (or repeated earlier in the batch)
    pub duplicates: usize,

    /// Tokenless records skipped under [`TokenlessPolicy::Reject`]
    pub rejected: usize,
}

impl InsertOutcome {
    /// Number of records the batch contained
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates + self.rejected
    }
}

/// SQLite-backed deduplicating store
pub struct UserStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl fmt::Debug for UserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserStore").field("path", &self.path).finish()
    }
}

impl UserStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        tracing::debug!(path = %path.display(), "Opened user store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Database file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether a relation named `name` exists
    pub fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Create the users relation, its indexes and the metadata relation
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        schema::init_schema(&self.conn)?;
        tracing::debug!("User store schema ensured");
        Ok(())
    }

    /// Whether a row with this identity token is already stored
    pub fn exists(&self, token: &IdentityToken) -> Result<bool, StoreError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE identity_token = ?1)",
            params![token.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert a batch of anonymized records in one transaction
    ///
    /// Records whose token is already stored, or repeated earlier in the same
    /// batch, are skipped. Any storage failure rolls back the whole batch.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SchemaMissing`] if [`ensure_schema`](Self::ensure_schema)
    ///   was never run
    /// - [`StoreError::ConstraintViolation`] if a row breaks a column constraint
    pub fn insert_batch(
        &mut self,
        records: &[AnonymizedRecord],
        policy: TokenlessPolicy,
    ) -> Result<InsertOutcome, StoreError> {
        if !self.table_exists(USERS_TABLE)? {
            return Err(StoreError::SchemaMissing(format!(
                "table '{USERS_TABLE}' does not exist"
            )));
        }

        let mut outcome = InsertOutcome::default();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&schema::insert_user_sql())?;
            for record in records {
                if !record.has_identity() && policy == TokenlessPolicy::Reject {
                    outcome.rejected += 1;
                    continue;
                }

                let row = UserRow::from_record(record);
                let mut values: Vec<&dyn ToSql> =
                    row.values.iter().map(|v| v as &dyn ToSql).collect();
                values.push(&row.identity_token);
                values.push(&row.identity_ciphertext);

                if stmt.execute(values.as_slice())? == 0 {
                    outcome.duplicates += 1;
                } else {
                    outcome.inserted += 1;
                }
            }
        }
        tx.commit()?;

        tracing::info!(
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            rejected = outcome.rejected,
            policy = %policy,
            "Inserted batch into user store"
        );
        Ok(outcome)
    }

    /// Highest surrogate id, or 0 when the relation is empty
    pub fn last_id(&self) -> Result<i64, StoreError> {
        let last: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM users", [], |row| row.get(0))?;
        Ok(last.unwrap_or(0))
    }

    /// Number of stored rows
    pub fn count(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
    }

    /// Stored row by surrogate id
    pub fn find_user(&self, id: i64) -> Result<Option<StoredUser>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, email, identity_token, identity_ciphertext FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, email, token, ciphertext)| {
            Ok(StoredUser {
                id,
                email,
                identity_token: token
                    .map(IdentityToken::new)
                    .transpose()
                    .map_err(StoreError::Query)?,
                identity_ciphertext: ciphertext
                    .map(IdentityCiphertext::new)
                    .transpose()
                    .map_err(StoreError::Query)?,
            })
        })
        .transpose()
    }

    /// Identity ciphertext stored for row `id`
    pub fn find_ciphertext(&self, id: i64) -> Result<Option<IdentityCiphertext>, StoreError> {
        Ok(self.find_user(id)?.and_then(|user| user.identity_ciphertext))
    }

    /// Matching-key fingerprint the store was populated with, if recorded
    pub fn stored_fingerprint(&self) -> Result<Option<String>, StoreError> {
        if !self.table_exists(METADATA_TABLE)? {
            return Ok(None);
        }
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM store_metadata WHERE key = ?1",
                params![FINGERPRINT_KEY],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Check the matching key against the one the store was written with
    ///
    /// Records `fingerprint` when none is stored yet.
    ///
    /// # Errors
    ///
    /// [`KeyError::Mismatch`] when the store already holds a different
    /// fingerprint; tokens derived now would never match stored ones.
    pub fn verify_key_fingerprint(&self, fingerprint: &str) -> crate::domain::Result<()> {
        match self.stored_fingerprint()? {
            Some(expected) if expected == fingerprint => Ok(()),
            Some(expected) => Err(ShroudError::KeyMaterial(KeyError::Mismatch {
                expected,
                actual: fingerprint.to_string(),
            })),
            None => {
                self.conn
                    .execute(
                        "INSERT INTO store_metadata (key, value) VALUES (?1, ?2)",
                        params![FINGERPRINT_KEY, fingerprint],
                    )
                    .map_err(StoreError::from)?;
                tracing::info!(fingerprint, "Recorded matching key fingerprint");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IdentityDerivation;
    use serde_json::{json, Map};

    fn record(token: Option<&str>) -> AnonymizedRecord {
        let mut fields = Map::new();
        fields.insert("firstname".to_string(), json!("A***"));
        fields.insert("email".to_string(), json!("****@example.com"));
        fields.insert("gender".to_string(), json!("female"));
        let identity = token.map(|t| IdentityDerivation {
            token: IdentityToken::new(t).unwrap(),
            ciphertext: IdentityCiphertext::new(format!("ct-{t}")).unwrap(),
        });
        AnonymizedRecord::new(fields, identity)
    }

    fn store() -> UserStore {
        let store = UserStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn test_ensure_schema_idempotent() {
        let store = UserStore::open_in_memory().unwrap();
        assert!(!store.table_exists("users").unwrap());
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert!(store.table_exists("users").unwrap());
        assert!(store.table_exists("store_metadata").unwrap());
    }

    #[test]
    fn test_last_id_empty_is_zero() {
        assert_eq!(store().last_id().unwrap(), 0);
    }

    #[test]
    fn test_insert_then_exists() {
        let mut store = store();
        let outcome = store
            .insert_batch(&[record(Some("a"))], TokenlessPolicy::Reject)
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        assert!(store.exists(&IdentityToken::new("a").unwrap()).unwrap());
        assert!(!store.exists(&IdentityToken::new("b").unwrap()).unwrap());
        assert_eq!(store.last_id().unwrap(), 1);
    }

    #[test]
    fn test_insert_twice_is_idempotent() {
        let mut store = store();
        let batch = vec![record(Some("a")), record(Some("b"))];

        let first = store.insert_batch(&batch, TokenlessPolicy::Reject).unwrap();
        let second = store.insert_batch(&batch, TokenlessPolicy::Reject).unwrap();

        assert_eq!(first.inserted, 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_batch_internal_duplicates() {
        let mut store = store();
        let outcome = store
            .insert_batch(&[record(Some("a")), record(Some("a"))], TokenlessPolicy::Reject)
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_tokenless_policies() {
        let mut store = store();

        let rejected = store
            .insert_batch(&[record(None)], TokenlessPolicy::Reject)
            .unwrap();
        assert_eq!(rejected.rejected, 1);
        assert_eq!(store.count().unwrap(), 0);

        let kept = store
            .insert_batch(&[record(None), record(None)], TokenlessPolicy::InsertWithoutDedup)
            .unwrap();
        assert_eq!(kept.inserted, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_insert_without_schema() {
        let mut store = UserStore::open_in_memory().unwrap();
        let result = store.insert_batch(&[record(Some("a"))], TokenlessPolicy::Reject);
        assert!(matches!(result, Err(StoreError::SchemaMissing(_))));
    }

    #[test]
    fn test_constraint_violation_rolls_back_batch() {
        let mut store = store();
        let mut fields = Map::new();
        fields.insert("email".to_string(), json!("****@x.org"));
        fields.insert("gender".to_string(), json!("unknown"));
        let bad = AnonymizedRecord::new(
            fields,
            Some(IdentityDerivation {
                token: IdentityToken::new("bad").unwrap(),
                ciphertext: IdentityCiphertext::new("ct").unwrap(),
            }),
        );

        let result = store.insert_batch(&[record(Some("a")), bad], TokenlessPolicy::Reject);
        assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_find_ciphertext() {
        let mut store = store();
        store
            .insert_batch(&[record(Some("a"))], TokenlessPolicy::Reject)
            .unwrap();

        assert_eq!(
            store.find_ciphertext(1).unwrap().unwrap().as_str(),
            "ct-a"
        );
        assert!(store.find_ciphertext(99).unwrap().is_none());
    }

    #[test]
    fn test_key_fingerprint() {
        let store = store();
        assert!(store.stored_fingerprint().unwrap().is_none());

        store.verify_key_fingerprint("aaaa").unwrap();
        store.verify_key_fingerprint("aaaa").unwrap();
        assert_eq!(store.stored_fingerprint().unwrap().as_deref(), Some("aaaa"));

        let err = store.verify_key_fingerprint("bbbb").unwrap_err();
        assert!(matches!(
            err,
            ShroudError::KeyMaterial(KeyError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_tokenless_policy_parse() {
        assert_eq!(
            "insert_without_dedup".parse::<TokenlessPolicy>().unwrap(),
            TokenlessPolicy::InsertWithoutDedup
        );
        assert!("maybe".parse::<TokenlessPolicy>().is_err());
    }
}
