//! Entry persistence.
//!
//! One table, three operations: insert a validated RSVP, attach the hub
//! registration outcome to an existing row, and list everything for the
//! admin surface. Handlers depend on the [`EntryStore`] trait so tests can
//! swap the Postgres implementation for a mock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not establish the connection pool.
    #[error("database connection failed: {0}")]
    Connection(String),
    /// Schema migration failed at startup.
    #[error("database migration failed: {0}")]
    Migration(String),
    /// A query failed.
    #[error("database query failed: {0}")]
    Query(String),
    /// An update targeted an entry that does not exist.
    #[error("entry {0} not found")]
    EntryNotFound(Uuid),
}

/// A persisted RSVP record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, FromRow)]
pub struct Entry {
    /// Generated at insert time, immutable.
    pub id: Uuid,
    /// Trimmed, non-empty.
    pub first_name: String,
    /// Trimmed, non-empty.
    pub last_name: String,
    /// Trimmed and lower-cased.
    pub email: String,
    /// Always `true` for persisted entries.
    pub terms_accepted: bool,
    /// Set by the database at insert time.
    pub created_at: DateTime<Utc>,
    /// Hub identifier, present only after successful enrichment.
    pub hub_entry_id: Option<String>,
    /// Diagnostic blob from enrichment.
    pub source_data: Option<serde_json::Value>,
}

/// A validated RSVP ready to persist.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Trimmed first name.
    pub first_name: String,
    /// Trimmed last name.
    pub last_name: String,
    /// Trimmed, lower-cased email.
    pub email: String,
    /// Must be `true`; validation rejects anything else upstream.
    pub terms_accepted: bool,
}

/// Storage operations needed by the API surface.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Insert a new entry and return its generated id.
    async fn insert(&self, entry: &NewEntry) -> Result<Uuid, StoreError>;

    /// Record the hub registration outcome on an existing entry.
    ///
    /// `hub_entry_id` and `source_data` move from null to a value exactly
    /// once; this system never clears them.
    async fn attach_hub_registration(
        &self,
        id: Uuid,
        hub_entry_id: &str,
        source_data: &serde_json::Value,
    ) -> Result<(), StoreError>;

    /// All entries, newest first.
    async fn list_entries(&self) -> Result<Vec<Entry>, StoreError>;
}

/// Postgres-backed [`EntryStore`].
#[derive(Debug, Clone)]
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and run pending migrations.
    ///
    /// # Errors
    ///
    /// [`StoreError::Connection`] if the pool cannot be established,
    /// [`StoreError::Migration`] if the schema cannot be brought up to date.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    #[tracing::instrument(name = "insert_entry", skip_all)]
    async fn insert(&self, entry: &NewEntry) -> Result<Uuid, StoreError> {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO entries (first_name, last_name, email, terms_accepted) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(&entry.first_name)
        .bind(&entry.last_name)
        .bind(&entry.email)
        .bind(entry.terms_accepted)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(format!("failed to insert entry: {e}")))?;
        Ok(id)
    }

    #[tracing::instrument(name = "attach_hub_registration", skip_all, fields(entry_id = %id))]
    async fn attach_hub_registration(
        &self,
        id: Uuid,
        hub_entry_id: &str,
        source_data: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE entries SET hub_entry_id = $1, source_data = $2 WHERE id = $3",
        )
        .bind(hub_entry_id)
        .bind(source_data)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(format!("failed to update entry: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::EntryNotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(name = "list_entries", skip_all)]
    async fn list_entries(&self) -> Result<Vec<Entry>, StoreError> {
        sqlx::query_as::<_, Entry>(
            "SELECT id, first_name, last_name, email, terms_accepted, created_at, \
                    hub_entry_id, source_data \
             FROM entries \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(format!("failed to list entries: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_with_snake_case_columns() {
        let entry = Entry {
            id: Uuid::nil(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@ex.com".to_string(),
            terms_accepted: true,
            created_at: Utc::now(),
            hub_entry_id: None,
            source_data: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["first_name"], "Ada");
        assert_eq!(value["terms_accepted"], true);
        assert!(value["hub_entry_id"].is_null());
        assert!(value.get("firstName").is_none());
    }
}
