use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::document::validate::{validate, Mode};
use crate::document::Document;
use crate::resource::{ResourceError, ResourceResult, ResourceService};
use crate::schema::FieldKind;
use crate::store::{Filter, Sort};

/// Equality filters taken from a query string, keyed by field name.
pub type ListQuery = BTreeMap<String, String>;

impl ResourceService {
    pub async fn create(&self, payload: &Value) -> ResourceResult<Document> {
        let mut fields = validate(&self.schema.fields, payload, Mode::Create)?;
        self.assign_sub_ids(&mut fields, None);

        let doc = self.store.insert(self.collection(), fields).await?;
        tracing::info!(collection = self.collection(), id = %doc.id, "document created");
        Ok(doc)
    }

    pub async fn get(&self, id: &str) -> ResourceResult<Document> {
        self.store
            .get(self.collection(), id)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// All documents matching the query, in display order for ordered
    /// resources and newest first otherwise.
    pub async fn list(&self, query: &ListQuery) -> ResourceResult<Vec<Document>> {
        let filter = self.query_filter(query)?;
        Ok(self
            .store
            .find(self.collection(), &filter, &self.default_sort())
            .await?)
    }

    /// Overwrite the supplied top-level fields.
    pub async fn update(&self, id: &str, payload: &Value) -> ResourceResult<Document> {
        let mut set = validate(&self.schema.fields, payload, Mode::Update)?;
        if self.writes_entities(&set) {
            let current = self.get(id).await?;
            self.assign_sub_ids(&mut set, Some(&current));
        }

        let doc = self
            .store
            .update(self.collection(), id, set)
            .await?
            .ok_or_else(|| self.not_found())?;
        tracing::info!(collection = self.collection(), id = %doc.id, "document updated");
        Ok(doc)
    }

    /// Remove a document and, by containment, everything embedded in it.
    pub async fn delete(&self, id: &str) -> ResourceResult<Document> {
        let doc = self
            .store
            .delete(self.collection(), id)
            .await?
            .ok_or_else(|| self.not_found())?;
        tracing::info!(collection = self.collection(), id = %doc.id, "document deleted");
        Ok(doc)
    }

    /// Case-insensitive literal match of `text` against the search fields.
    pub async fn search(&self, text: &str) -> ResourceResult<Vec<Document>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ResourceError::BadInput("Search query is required".into()));
        }
        if self.schema.search_fields.is_empty() {
            return Err(ResourceError::BadInput(format!(
                "{} does not support search",
                self.schema.label
            )));
        }

        let filter = Filter::new().search(&self.schema.search_fields, text);
        Ok(self.store.find(self.collection(), &filter, &Sort::Newest).await?)
    }

    /// Document count per status, every declared status present, plus `total`.
    pub async fn status_counts(&self) -> ResourceResult<Map<String, Value>> {
        let Some(field) = self.schema.status_field else {
            return Err(ResourceError::BadInput(format!(
                "{} has no status",
                self.schema.label
            )));
        };

        let mut counts = Map::new();
        for status in self.schema.statuses() {
            counts.insert(status.to_string(), Value::from(0u64));
        }
        let mut total = 0u64;
        for group in self.store.count_by(self.collection(), field).await? {
            total += group.count;
            if let Value::String(status) = group.key {
                counts.insert(status, Value::from(group.count));
            }
        }
        counts.insert("total".to_string(), Value::from(total));
        Ok(counts)
    }

    pub(crate) fn default_sort(&self) -> Sort {
        if self.schema.ordered {
            Sort::asc(crate::document::model::ORDER_FIELD)
        } else {
            Sort::Newest
        }
    }

    fn query_filter(&self, query: &ListQuery) -> ResourceResult<Filter> {
        let mut filter = Filter::new();
        for (key, raw) in query {
            let Some(spec) = self.schema.field_spec(key) else {
                continue;
            };
            let value = match spec.kind {
                FieldKind::String => Value::String(raw.clone()),
                FieldKind::Boolean => raw.parse::<bool>().map(Value::Bool).map_err(|_| {
                    ResourceError::BadInput(format!("{key} must be true or false"))
                })?,
                FieldKind::Integer => raw.parse::<i64>().map(Value::from).map_err(|_| {
                    ResourceError::BadInput(format!("{key} must be an integer"))
                })?,
                FieldKind::Number => raw
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| ResourceError::BadInput(format!("{key} must be a number")))?,
                FieldKind::List(_) | FieldKind::Entities(_) => continue,
            };
            filter = filter.eq(key.as_str(), value);
        }
        Ok(filter)
    }
}
