//! Generic resource operations.
//!
//! One [`ResourceService`] per catalog entry. Its behaviour is split by
//! concern: plain CRUD and queries in `crud`, display ordering and the
//! active toggle in `ordered`, keyed create-or-update in `upsert`, and the
//! embedded sub-collections in `subdoc`. The service holds no state of its
//! own beyond the schema and a handle to the store.

pub mod crud;
pub mod error;
pub mod ordered;
pub mod subdoc;
pub mod upsert;

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::document::model::ID_FIELD;
use crate::document::{new_id, Document, Fields};
use crate::schema::{ResourceSchema, SubItems};
use crate::store::DocumentStore;

pub use crud::ListQuery;
pub use error::{ResourceError, ResourceResult};
pub use ordered::{OrderUpdate, ReorderOutcome};
pub use subdoc::AddedSub;
pub use upsert::UpsertOutcome;

#[derive(Clone)]
pub struct ResourceService {
    schema: Arc<ResourceSchema>,
    store: Arc<dyn DocumentStore>,
}

impl ResourceService {
    pub fn new(schema: Arc<ResourceSchema>, store: Arc<dyn DocumentStore>) -> Self {
        Self { schema, store }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn collection(&self) -> &str {
        &self.schema.collection
    }

    fn not_found(&self) -> ResourceError {
        ResourceError::NotFound(self.schema.not_found_message())
    }

    /// Whether `fields` writes any embedded entity array.
    fn writes_entities(&self, fields: &Fields) -> bool {
        self.schema
            .sub_collections
            .iter()
            .any(|sub| matches!(sub.items, SubItems::Entities(_)) && fields.contains_key(sub.field))
    }

    /// Settle the `_id` of every embedded entity in `fields`.
    ///
    /// A client-supplied `_id` is kept only when it names an entity already
    /// stored in `current` and appears once in the array; every other entity
    /// gets a fresh identifier.
    fn assign_sub_ids(&self, fields: &mut Fields, current: Option<&Document>) {
        for sub in &self.schema.sub_collections {
            if !matches!(sub.items, SubItems::Entities(_)) {
                continue;
            }
            let Some(Value::Array(items)) = fields.get_mut(sub.field) else {
                continue;
            };

            let known: HashSet<String> = current
                .map(|doc| doc.array(sub.field))
                .unwrap_or_default()
                .iter()
                .filter_map(|item| item.get(ID_FIELD).and_then(Value::as_str).map(str::to_string))
                .collect();
            let mut seen = HashSet::new();

            for item in items.iter_mut() {
                let Value::Object(entity) = item else {
                    continue;
                };
                let keep = match entity.get(ID_FIELD).and_then(Value::as_str) {
                    Some(id) => known.contains(id) && seen.insert(id.to_string()),
                    None => false,
                };
                if !keep {
                    entity.insert(ID_FIELD.to_string(), Value::String(new_id()));
                }
            }
        }
    }
}

impl std::fmt::Debug for ResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("resource", &self.schema.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use serde_json::Value;

    use crate::catalog::Catalog;
    use crate::document::Document;
    use crate::resource::ResourceService;
    use crate::store::MemoryStore;

    pub async fn service(name: &str) -> ResourceService {
        let catalog = Catalog::site();
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        for schema in catalog.iter() {
            if let Some(key) = schema.unique_key {
                crate::store::DocumentStore::ensure_unique(store.as_ref(), &schema.collection, key)
                    .await
                    .unwrap();
            }
        }
        let schema = catalog.get(name).unwrap();
        ResourceService::new(schema, store)
    }

    pub fn field<'a>(doc: &'a Document, name: &str) -> &'a Value {
        doc.get(name).unwrap_or(&Value::Null)
    }
}
