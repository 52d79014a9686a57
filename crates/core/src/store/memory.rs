use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::{new_id, Document, Fields};
use crate::store::filter::compare_values;
use crate::store::{DocumentStore, Filter, KeyCount, Sort, StoreError, StoreResult};

/// In-process store. Documents are kept per collection in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
}

#[derive(Debug, Default)]
struct MemCollection {
    docs: Vec<Document>,
    unique: BTreeSet<String>,
}

impl MemCollection {
    fn position(&self, id: &str) -> Option<usize> {
        self.docs.iter().position(|doc| doc.id == id)
    }

    fn check_unique(&self, collection: &str, id: Option<&str>, fields: &Fields) -> StoreResult<()> {
        for field in &self.unique {
            let Some(value) = fields.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = self
                .docs
                .iter()
                .any(|doc| Some(doc.id.as_str()) != id && doc.get(field) == Some(value));
            if taken {
                return Err(StoreError::UniqueViolation {
                    collection: collection.to_string(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, filter: &Filter, sort: &Sort) -> StoreResult<Vec<Document>> {
        let compiled = filter.compile()?;
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut docs: Vec<Document> = coll
            .docs
            .iter()
            .filter(|doc| compiled.matches(doc))
            .cloned()
            .collect();

        // `sort_by` is stable, so ties stay in insertion order.
        match sort {
            Sort::Insertion => {}
            Sort::Newest => docs.reverse(),
            Sort::Asc(field) => docs.sort_by(|a, b| compare_values(a.get(field), b.get(field))),
            Sort::Desc(field) => docs.sort_by(|a, b| {
                let (x, y) = (a.get(field), b.get(field));
                match (x.filter(|v| !v.is_null()), y.filter(|v| !v.is_null())) {
                    (Some(_), Some(_)) => compare_values(y, x),
                    _ => compare_values(x, y),
                }
            }),
        }
        Ok(docs)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let compiled = filter.compile()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|coll| coll.docs.iter().find(|doc| compiled.matches(doc)).cloned()))
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|coll| coll.docs.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        coll.check_unique(collection, None, &fields)?;

        let now = Utc::now();
        let doc = Document {
            id: new_id(),
            created_at: now,
            updated_at: now,
            fields,
        };
        coll.docs.push(doc.clone());
        Ok(doc)
    }

    async fn update(&self, collection: &str, id: &str, set: Fields) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = coll.position(id) else {
            return Ok(None);
        };

        let mut merged = coll.docs[pos].fields.clone();
        merged.extend(set);
        coll.check_unique(collection, Some(id), &merged)?;

        let doc = &mut coll.docs[pos];
        doc.fields = merged;
        doc.updated_at = Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = coll.position(id) else {
            return Ok(None);
        };
        coll.check_unique(collection, Some(id), &fields)?;

        let doc = &mut coll.docs[pos];
        doc.fields = fields;
        doc.updated_at = Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Ok(coll.position(id).map(|pos| coll.docs.remove(pos)))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let compiled = filter.compile()?;
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map_or(0, |coll| coll.docs.iter().filter(|doc| compiled.matches(doc)).count());
        Ok(count as u64)
    }

    async fn count_by(&self, collection: &str, field: &str) -> StoreResult<Vec<KeyCount>> {
        let collections = self.collections.read().await;
        let mut groups: Vec<KeyCount> = Vec::new();
        if let Some(coll) = collections.get(collection) {
            for doc in &coll.docs {
                let key = doc.get(field).cloned().unwrap_or(Value::Null);
                match groups.iter_mut().find(|group| group.key == key) {
                    Some(group) => group.count += 1,
                    None => groups.push(KeyCount { key, count: 1 }),
                }
            }
        }
        Ok(groups)
    }

    async fn ensure_unique(&self, collection: &str, field: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection.to_string()).or_default();
        coll.unique.insert(field.to_string());
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let doc = store.insert("news", fields(json!({"title": "A"}))).await.unwrap();
        assert!(!doc.id.is_empty());
        assert_eq!(doc.created_at, doc.updated_at);

        let fetched = store.get("news", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
        assert!(store.get("other", &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_overwrites_top_level_fields_only() {
        let store = MemoryStore::new();
        let doc = store
            .insert("news", fields(json!({"title": "A", "tags": ["x"]})))
            .await
            .unwrap();
        let updated = store
            .update("news", &doc.id, fields(json!({"title": "B"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.fields["title"], "B");
        assert_eq!(updated.fields["tags"], json!(["x"]));
        assert_eq!(updated.created_at, doc.created_at);

        assert!(store
            .update("news", "missing", fields(json!({"title": "C"})))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn replace_drops_absent_fields() {
        let store = MemoryStore::new();
        let doc = store
            .insert("news", fields(json!({"title": "A", "summary": "s"})))
            .await
            .unwrap();
        let replaced = store
            .replace("news", &doc.id, fields(json!({"title": "B"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.id, doc.id);
        assert!(replaced.get("summary").is_none());
    }

    #[tokio::test]
    async fn asc_sort_is_stable_with_missing_last() {
        let store = MemoryStore::new();
        for (name, order) in [("a", json!(2)), ("b", json!(1)), ("c", Value::Null), ("d", json!(1))] {
            let mut f = fields(json!({"name": name}));
            if !order.is_null() {
                f.insert("order".into(), order);
            }
            store.insert("hero", f).await.unwrap();
        }
        let docs = store.find("hero", &Filter::new(), &Sort::asc("order")).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.fields["name"].clone()).collect();
        assert_eq!(names, vec![json!("b"), json!("d"), json!("a"), json!("c")]);

        let docs = store.find("hero", &Filter::new(), &Sort::desc("order")).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.fields["name"].clone()).collect();
        assert_eq!(names, vec![json!("a"), json!("b"), json!("d"), json!("c")]);

        let docs = store.find("hero", &Filter::new(), &Sort::Newest).await.unwrap();
        assert_eq!(docs[0].fields["name"], "d");
    }

    #[tokio::test]
    async fn unique_key_rejects_duplicates() {
        let store = MemoryStore::new();
        assert_ok!(store.ensure_unique("contents", "sectionType").await);
        let first = store
            .insert("contents", fields(json!({"sectionType": "mission"})))
            .await
            .unwrap();
        let err = store
            .insert("contents", fields(json!({"sectionType": "mission"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { ref field, .. } if field == "sectionType"));

        // Rewriting the owner with its own key is not a conflict.
        assert_ok!(
            store
                .replace("contents", &first.id, fields(json!({"sectionType": "mission", "title": "x"})))
                .await
        );
        assert_eq!(store.count("contents", &Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let store = MemoryStore::new();
        let doc = store.insert("faqs", Fields::new()).await.unwrap();
        assert!(store.delete("faqs", &doc.id).await.unwrap().is_some());
        assert!(store.delete("faqs", &doc.id).await.unwrap().is_none());
        assert!(store.get("faqs", &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn count_by_groups_values() {
        let store = MemoryStore::new();
        for status in ["new", "contacted", "new"] {
            store
                .insert("enquiries", fields(json!({"status": status})))
                .await
                .unwrap();
        }
        let groups = store.count_by("enquiries", "status").await.unwrap();
        assert_eq!(
            groups,
            vec![
                KeyCount { key: json!("new"), count: 2 },
                KeyCount { key: json!("contacted"), count: 1 },
            ]
        );
        let filter = Filter::new().eq("status", "new");
        assert_eq!(store.count("enquiries", &filter).await.unwrap(), 2);
    }
}
