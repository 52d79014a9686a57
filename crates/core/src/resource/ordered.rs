//! Display ordering and the active flag.
//!
//! Reorder is a best-effort batch: every `(id, order)` pair is written by its
//! own concurrent store call, with no ordering between them and no rollback.
//! A pair whose id does not resolve yields a `Missing` outcome and the rest
//! of the batch still applies.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::model::{ACTIVE_FIELD, ORDER_FIELD};
use crate::document::validate::validate_item;
use crate::document::Document;
use crate::resource::{ResourceError, ResourceResult, ResourceService};
use crate::store::Filter;

/// One requested position change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub id: String,
    pub order: i64,
}

/// Result of one pair of a reorder batch.
#[derive(Debug)]
pub enum ReorderOutcome {
    Updated(Document),
    Missing(String),
    Failed { id: String, error: ResourceError },
}

impl ReorderOutcome {
    /// The updated document, or `None` when the pair did not apply.
    pub fn document(&self) -> Option<&Document> {
        match self {
            ReorderOutcome::Updated(doc) => Some(doc),
            ReorderOutcome::Missing(_) | ReorderOutcome::Failed { .. } => None,
        }
    }
}

impl ResourceService {
    /// Documents matching `filter`, ascending by `order`, ties in insertion order.
    pub async fn list_ordered(&self, filter: &Filter) -> ResourceResult<Vec<Document>> {
        Ok(self
            .store
            .find(self.collection(), filter, &self.default_sort())
            .await?)
    }

    pub async fn list_active(&self) -> ResourceResult<Vec<Document>> {
        self.list_ordered(&Filter::new().eq(ACTIVE_FIELD, true)).await
    }

    /// Read the `<resource>Orders` array out of a reorder request body.
    pub fn parse_reorder(&self, body: &Value) -> ResourceResult<Vec<OrderUpdate>> {
        let key = self.schema.reorder_key();
        let Some(Value::Array(items)) = body.get(&key) else {
            return Err(ResourceError::BadInput(format!("{key} must be an array")));
        };

        let order_spec = self.schema.field_spec(ORDER_FIELD);
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let update: OrderUpdate = serde_json::from_value(item.clone()).map_err(|_| {
                    ResourceError::BadInput(format!(
                        "{key}[{i}] must be an object with a string id and an integer order"
                    ))
                })?;
                if let Some(spec) = order_spec {
                    validate_item(spec, &Value::from(update.order))
                        .map_err(|e| ResourceError::BadInput(format!("{key}[{i}]: {e}")))?;
                }
                Ok(update)
            })
            .collect()
    }

    /// Apply every pair independently and report one outcome per pair, in
    /// request order.
    pub async fn reorder(&self, updates: &[OrderUpdate]) -> ResourceResult<Vec<ReorderOutcome>> {
        if !self.schema.ordered {
            return Err(ResourceError::BadInput(format!(
                "{} cannot be reordered",
                self.schema.label
            )));
        }

        let writes = updates.iter().map(|update| async move {
            let mut set = Map::new();
            set.insert(ORDER_FIELD.to_string(), Value::from(update.order));
            match self.store.update(self.collection(), &update.id, set).await {
                Ok(Some(doc)) => ReorderOutcome::Updated(doc),
                Ok(None) => ReorderOutcome::Missing(update.id.clone()),
                Err(err) => ReorderOutcome::Failed {
                    id: update.id.clone(),
                    error: err.into(),
                },
            }
        });
        let outcomes = join_all(writes).await;

        let applied = outcomes.iter().filter(|o| o.document().is_some()).count();
        tracing::info!(
            collection = self.collection(),
            requested = updates.len(),
            applied,
            "reorder applied"
        );
        for outcome in &outcomes {
            if let ReorderOutcome::Failed { id, error } = outcome {
                tracing::warn!(collection = self.collection(), %id, %error, "reorder pair failed");
            }
        }
        Ok(outcomes)
    }

    /// Flip `isActive` and return the updated document.
    pub async fn toggle_active(&self, id: &str) -> ResourceResult<Document> {
        if !self.schema.toggleable {
            return Err(ResourceError::BadInput(format!(
                "{} has no active status",
                self.schema.label
            )));
        }

        let current = self.get(id).await?;
        let mut set = Map::new();
        set.insert(ACTIVE_FIELD.to_string(), Value::Bool(!current.flag(ACTIVE_FIELD, true)));

        let doc = self
            .store
            .update(self.collection(), id, set)
            .await?
            .ok_or_else(|| self.not_found())?;
        tracing::info!(
            collection = self.collection(),
            id,
            active = doc.flag(ACTIVE_FIELD, true),
            "active status toggled"
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::{field, service};
    use serde_json::json;

    async fn hero(svc: &ResourceService, title: &str, order: i64) -> Document {
        svc.create(&json!({"title": title, "imageUrl": "https://cdn.example.com/h.jpg", "order": order}))
            .await
            .unwrap()
    }

    fn titles(docs: &[Document]) -> Vec<Value> {
        docs.iter().map(|d| field(d, "title").clone()).collect()
    }

    #[tokio::test]
    async fn reorder_changes_listing_order() {
        let svc = service("heroimage").await;
        let a = hero(&svc, "A", 0).await;
        let b = hero(&svc, "B", 0).await;

        let outcomes = svc
            .reorder(&[
                OrderUpdate { id: a.id.clone(), order: 3 },
                OrderUpdate { id: b.id.clone(), order: 1 },
            ])
            .await
            .unwrap();
        assert!(outcomes.iter().all(|o| o.document().is_some()));

        let listed = svc.list_ordered(&Filter::new()).await.unwrap();
        assert_eq!(titles(&listed), vec![json!("B"), json!("A")]);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let svc = service("heroimage").await;
        for title in ["first", "second", "third"] {
            hero(&svc, title, 1).await;
        }
        hero(&svc, "zero", 0).await;
        let listed = svc.list_ordered(&Filter::new()).await.unwrap();
        assert_eq!(
            titles(&listed),
            vec![json!("zero"), json!("first"), json!("second"), json!("third")]
        );
    }

    #[tokio::test]
    async fn missing_id_does_not_abort_batch() {
        let svc = service("heroimage").await;
        let a = hero(&svc, "A", 0).await;
        let outcomes = svc
            .reorder(&[
                OrderUpdate { id: "x".into(), order: 5 },
                OrderUpdate { id: a.id.clone(), order: 7 },
            ])
            .await
            .unwrap();
        assert!(matches!(&outcomes[0], ReorderOutcome::Missing(id) if id == "x"));
        assert_eq!(field(outcomes[1].document().unwrap(), "order"), 7);
    }

    #[tokio::test]
    async fn parse_reorder_requires_array() {
        let svc = service("heroimage").await;
        let err = svc.parse_reorder(&json!({"heroImageOrders": "nope"})).unwrap_err();
        assert_eq!(err.to_string(), "heroImageOrders must be an array");
        assert!(svc.parse_reorder(&json!({})).is_err());
        assert!(svc
            .parse_reorder(&json!({"heroImageOrders": [{"id": "a", "order": "1"}]}))
            .is_err());
        assert!(svc
            .parse_reorder(&json!({"heroImageOrders": [{"id": "a", "order": -1}]}))
            .is_err());

        let parsed = svc
            .parse_reorder(&json!({"heroImageOrders": [{"id": "a", "order": 2}]}))
            .unwrap();
        assert_eq!(parsed, vec![OrderUpdate { id: "a".into(), order: 2 }]);
    }

    #[tokio::test]
    async fn toggle_twice_restores_original() {
        let svc = service("heroimage").await;
        let doc = hero(&svc, "A", 0).await;
        assert!(doc.flag(ACTIVE_FIELD, false));

        let once = svc.toggle_active(&doc.id).await.unwrap();
        assert!(!once.flag(ACTIVE_FIELD, true));
        assert!(svc.list_active().await.unwrap().is_empty());

        let twice = svc.toggle_active(&doc.id).await.unwrap();
        assert!(twice.flag(ACTIVE_FIELD, false));
        assert_eq!(svc.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn null_order_and_flag_are_rejected() {
        let svc = service("heroimage").await;
        let err = svc
            .create(&json!({"title": "A", "imageUrl": "u", "order": null, "isActive": null}))
            .await
            .unwrap_err();
        let ResourceError::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        let fields: Vec<_> = errors.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["order", "isActive"]);

        let doc = hero(&svc, "A", 0).await;
        let err = svc.update(&doc.id, &json!({"isActive": null})).await.unwrap_err();
        assert!(matches!(err, ResourceError::Validation(_)));

        let once = svc.toggle_active(&doc.id).await.unwrap();
        let twice = svc.toggle_active(&once.id).await.unwrap();
        assert_eq!(field(&twice, ACTIVE_FIELD), &json!(true));
        assert_eq!(svc.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn toggle_unknown_id_is_not_found() {
        let svc = service("heroimage").await;
        let err = svc.toggle_active("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Hero image not found");
    }

    #[tokio::test]
    async fn unordered_resource_cannot_reorder() {
        let svc = service("enquiry").await;
        assert!(matches!(svc.reorder(&[]).await, Err(ResourceError::BadInput(_))));
    }
}
