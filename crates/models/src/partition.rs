//! Data partitions.
//!
//! Every tenant owns a PostgreSQL schema named by its [`PartitionKey`]. Shared
//! identity and routing tables live in the `public` schema. Tenant-scoped calls
//! take the key explicitly; nothing here switches `search_path`.

use std::fmt;

use sea_orm::{sqlx, ConnectionTrait, DbBackend, DbErr, RuntimeErr, Statement, Value};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ModelError;
use crate::{project, task};

pub const PUBLIC_SCHEMA: &str = "public";

/// PostgreSQL identifier length limit.
pub const MAX_KEY_LEN: usize = 63;

/// Validated schema name of a tenant partition: non-empty, lowercase ASCII
/// alphanumerics only, at most 63 bytes, never `public`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Derive a key from an organization name: lower-case it, then drop every
    /// character that is not an ASCII letter or digit.
    pub fn derive(organization: &str) -> Result<Self, ModelError> {
        let key: String = organization
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if key.is_empty() {
            return Err(ModelError::Validation(
                "organization name must contain at least one letter or digit".into(),
            ));
        }
        Self::parse(key)
    }

    pub fn parse(raw: impl Into<String>) -> Result<Self, ModelError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ModelError::Validation("partition key required".into()));
        }
        if raw.len() > MAX_KEY_LEN {
            return Err(ModelError::Validation(format!("partition key longer than {MAX_KEY_LEN} characters")));
        }
        if !raw.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(ModelError::Validation(format!("invalid partition key: {raw}")));
        }
        if raw == PUBLIC_SCHEMA {
            return Err(ModelError::Validation("partition key `public` is reserved".into()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Double-quoted identifier, safe to splice into DDL because the key
    /// alphabet excludes quotes.
    pub fn quoted(&self) -> String { format!("\"{}\"", self.0) }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for PartitionKey {
    type Error = ModelError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<PartitionKey> for String {
    fn from(value: PartitionKey) -> Self { value.0 }
}

/// Whether a schema with this name exists in the database.
pub async fn exists<C: ConnectionTrait>(db: &C, key: &PartitionKey) -> Result<bool, ModelError> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT 1 AS present FROM information_schema.schemata WHERE schema_name = $1",
        [Value::from(key.as_str())],
    );
    let row = db.query_one(stmt).await.map_err(ModelError::from_db)?;
    Ok(row.is_some())
}

/// Create the schema and its business tables. Run inside a transaction to get
/// all-or-nothing provisioning (PostgreSQL DDL is transactional).
pub async fn provision<C: ConnectionTrait>(db: &C, key: &PartitionKey) -> Result<(), ModelError> {
    if exists(db, key).await? {
        return Err(ModelError::Conflict(format!("partition {key} already exists")));
    }
    create_schema(db, key).await?;
    let backend = db.get_database_backend();
    for stmt in [project::create_table_stmt(key), task::create_table_stmt(key)] {
        db.execute(backend.build(&stmt))
            .await
            .map_err(|e| ModelError::Partition(e.to_string()))?;
    }
    info!(partition = %key, "partition_provisioned");
    Ok(())
}

/// `CREATE SCHEMA` alone. A schema created concurrently by another
/// registration (SQLSTATE 42P06) is a [`ModelError::Conflict`].
pub(crate) async fn create_schema<C: ConnectionTrait>(db: &C, key: &PartitionKey) -> Result<(), ModelError> {
    db.execute_unprepared(&format!("CREATE SCHEMA {}", key.quoted()))
        .await
        .map(|_| ())
        .map_err(|e| {
            if is_duplicate_schema(&e) {
                ModelError::Conflict(format!("partition {key} already exists"))
            } else {
                ModelError::Partition(e.to_string())
            }
        })
}

const DUPLICATE_SCHEMA: &str = "42P06";

fn is_duplicate_schema(e: &DbErr) -> bool {
    match e {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => {
            db.code().as_deref() == Some(DUPLICATE_SCHEMA)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_lowercases_and_strips() {
        assert_eq!(PartitionKey::derive("Test Organization").unwrap().as_str(), "testorganization");
        assert_eq!(PartitionKey::derive("ACME-Corp, Inc.").unwrap().as_str(), "acmecorpinc");
        assert_eq!(PartitionKey::derive("Team 42").unwrap().as_str(), "team42");
    }

    #[test]
    fn derive_rejects_names_without_alphanumerics() {
        assert!(matches!(PartitionKey::derive(""), Err(ModelError::Validation(_))));
        assert!(matches!(PartitionKey::derive("  -- !! "), Err(ModelError::Validation(_))));
    }

    #[test]
    fn derive_drops_non_ascii_letters() {
        assert_eq!(PartitionKey::derive("Café Ünion").unwrap().as_str(), "cafnion");
    }

    #[test]
    fn public_is_reserved() {
        assert!(PartitionKey::derive("Public").is_err());
        assert!(PartitionKey::parse("public").is_err());
    }

    #[test]
    fn parse_enforces_alphabet_and_length() {
        assert!(PartitionKey::parse("Upper").is_err());
        assert!(PartitionKey::parse("with_underscore").is_err());
        assert!(PartitionKey::parse("a".repeat(64)).is_err());
        assert!(PartitionKey::parse("a".repeat(63)).is_ok());
    }

    #[test]
    fn serde_goes_through_validation() {
        let key: PartitionKey = serde_json::from_str("\"acme\"").unwrap();
        assert_eq!(key.quoted(), "\"acme\"");
        assert!(serde_json::from_str::<PartitionKey>("\"ac me\"").is_err());
    }
}
