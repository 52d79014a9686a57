//! Core of the campus CMS: resource schemas, payload validation, the
//! document store adapter and the generic resource managers built on it.

pub mod catalog;
pub mod document;
pub mod resource;
pub mod schema;
pub mod store;

pub use catalog::Catalog;
pub use document::{Document, Fields, SubRef};
pub use resource::{ResourceError, ResourceResult, ResourceService, UpsertOutcome};
pub use schema::ResourceSchema;
pub use store::{DocumentStore, MemoryStore, PgStore, StoreError};
