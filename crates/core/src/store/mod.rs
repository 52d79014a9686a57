//! Document store adapter.
//!
//! The store is the only shared mutable state in the system. Callers hold it
//! as `Arc<dyn DocumentStore>`; it is opened at start-up and closed on
//! shutdown. Two backends: [`memory::MemoryStore`] and [`postgres::PgStore`].

pub mod filter;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::document::{Document, Fields};

pub use filter::{Condition, Filter, Sort};
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for unique key `{field}` in `{collection}`")]
    UniqueViolation { collection: String, field: String },

    #[error("invalid store request: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One group of an aggregate-by-key count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCount {
    pub key: Value,
    pub count: u64,
}

/// Persistent collection of JSON documents.
///
/// The store assigns `_id`, `createdAt`, `updatedAt` and an insertion
/// sequence. Every method is a single store call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, filter: &Filter, sort: &Sort) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<Document>;

    /// Overwrite the given top-level fields, leaving the rest untouched.
    async fn update(&self, collection: &str, id: &str, set: Fields) -> StoreResult<Option<Document>>;

    /// Replace all content fields, keeping `_id` and `createdAt`.
    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Option<Document>>;

    /// Remove a document, returning it if it existed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Number of documents per distinct value of `field`.
    async fn count_by(&self, collection: &str, field: &str) -> StoreResult<Vec<KeyCount>>;

    /// Reject writes that would give two documents the same `field` value.
    async fn ensure_unique(&self, collection: &str, field: &str) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;

    async fn close(&self);
}
