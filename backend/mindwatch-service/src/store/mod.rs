//! Document store
//!
//! A narrow collection API over JSON documents. Production data lives in a
//! PostgreSQL JSONB table ([`PgDocumentStore`]); [`MemoryDocumentStore`]
//! implements the same semantics for tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

pub const DOCTORS: &str = "doctors";
pub const PATIENTS: &str = "patients";

/// Top-level fields that must be unique within a collection.
/// Mirrors the unique indexes in `migrations/`.
pub const UNIQUE_FIELDS: &[(&str, &str)] = &[(DOCTORS, "email")];

/// Top-level field equality filter.
pub type Filter = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.body.clone()).map_err(StoreError::from)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique field already holds this value.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document body must be a JSON object")]
    NotAnObject,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError>;

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Documents matching every field of `filter`, newest first.
    async fn find(&self, collection: &str, filter: Filter) -> Result<Vec<Document>, StoreError>;

    /// Replace the body of an existing document. `None` when `id` is unknown.
    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        body: Value,
    ) -> Result<Option<Document>, StoreError>;

    /// `true` when a document was removed.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;

    /// Remove every document matching `filter`, returning how many went.
    async fn delete_many(&self, collection: &str, filter: Filter) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self);
}

/// Build a filter from `json!({...})`. Non-objects yield an empty filter.
pub fn filter(value: Value) -> Filter {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub(crate) fn matches(body: &Value, filter: &Filter) -> bool {
    filter.iter().all(|(key, expected)| body.get(key) == Some(expected))
}

pub(crate) fn conflict_message(collection: &str, field: &str) -> String {
    format!("A {} record with this {} already exists", collection.trim_end_matches('s'), field)
}
