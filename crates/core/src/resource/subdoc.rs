//! Embedded sub-collections.
//!
//! Sub-documents live inside an array field of their parent and have no
//! storage of their own: every mutation reads the parent, edits the array in
//! memory and writes the whole parent back. Deleting the parent deletes them.
//!
//! Entity arrays are addressed by the entity's `_id`, which never changes.
//! Primitive arrays are addressed by position; deleting splices the array, so
//! every later index shifts down by one.

use serde::Serialize;
use serde_json::Value;

use crate::document::model::ID_FIELD;
use crate::document::validate::{validate, validate_item, Mode};
use crate::document::{new_id, Document, SubRef};
use crate::resource::{ResourceError, ResourceResult, ResourceService};
use crate::schema::{SubCollection, SubItems};

/// A newly appended sub-collection element and its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddedSub {
    pub index: usize,
    pub item: Value,
}

impl ResourceService {
    fn sub_collection(&self, segment: &str) -> ResourceResult<&SubCollection> {
        self.schema.sub_collection(segment).ok_or_else(|| {
            ResourceError::NotFound(format!("{} has no {segment}", self.schema.label))
        })
    }

    fn sub_not_found(sub: &SubCollection) -> ResourceError {
        ResourceError::NotFound(format!("{} not found", sub.label))
    }

    /// Position of `sub_ref` in `items`, if it resolves.
    fn locate(sub: &SubCollection, items: &[Value], sub_ref: &SubRef) -> Option<usize> {
        match &sub.items {
            SubItems::Primitives(_) => sub_ref.as_index().filter(|index| *index < items.len()),
            SubItems::Entities(_) => items
                .iter()
                .position(|item| item.get(ID_FIELD).and_then(Value::as_str) == Some(sub_ref.as_str())),
        }
    }

    /// Write the whole parent back with its edited array.
    async fn save_parent(
        &self,
        mut parent: Document,
        sub: &SubCollection,
        items: Vec<Value>,
    ) -> ResourceResult<Document> {
        parent.fields.insert(sub.field.to_string(), Value::Array(items));
        self.store
            .replace(self.collection(), &parent.id, parent.fields)
            .await?
            .ok_or_else(|| self.not_found())
    }

    pub async fn list_sub(&self, parent_id: &str, segment: &str) -> ResourceResult<Vec<Value>> {
        let sub = self.sub_collection(segment)?;
        let parent = self.get(parent_id).await?;
        Ok(parent.array(sub.field))
    }

    pub async fn add_sub(&self, parent_id: &str, segment: &str, payload: &Value) -> ResourceResult<AddedSub> {
        let sub = self.sub_collection(segment)?;
        let parent = self.get(parent_id).await?;

        let item = match &sub.items {
            SubItems::Entities(fields) => {
                let mut entity = validate(fields, payload, Mode::Create)?;
                entity.insert(ID_FIELD.to_string(), Value::String(new_id()));
                Value::Object(entity)
            }
            SubItems::Primitives(spec) => validate_item(spec, primitive_payload(payload))?,
        };

        let mut items = parent.array(sub.field);
        items.push(item.clone());
        let index = items.len() - 1;
        self.save_parent(parent, sub, items).await?;

        tracing::info!(collection = self.collection(), parent_id, field = sub.field, index, "sub-document added");
        Ok(AddedSub { index, item })
    }

    /// Overwrite the addressed element in place. Entities take a partial
    /// payload merged over their fields; primitives take the new value.
    pub async fn update_sub(
        &self,
        parent_id: &str,
        segment: &str,
        sub_ref: &SubRef,
        payload: &Value,
    ) -> ResourceResult<Value> {
        let sub = self.sub_collection(segment)?;
        let parent = self.get(parent_id).await?;
        let mut items = parent.array(sub.field);
        let pos = Self::locate(sub, &items, sub_ref).ok_or_else(|| Self::sub_not_found(sub))?;

        let updated = match &sub.items {
            SubItems::Entities(fields) => {
                let set = validate(fields, payload, Mode::Update)?;
                let mut entity = items[pos].as_object().cloned().unwrap_or_default();
                entity.extend(set);
                Value::Object(entity)
            }
            SubItems::Primitives(spec) => validate_item(spec, primitive_payload(payload))?,
        };
        items[pos] = updated.clone();
        self.save_parent(parent, sub, items).await?;

        tracing::info!(collection = self.collection(), parent_id, field = sub.field, %sub_ref, "sub-document updated");
        Ok(updated)
    }

    /// Remove the addressed element and return the updated parent.
    pub async fn delete_sub(&self, parent_id: &str, segment: &str, sub_ref: &SubRef) -> ResourceResult<Document> {
        let sub = self.sub_collection(segment)?;
        let parent = self.get(parent_id).await?;
        let mut items = parent.array(sub.field);
        let pos = Self::locate(sub, &items, sub_ref).ok_or_else(|| Self::sub_not_found(sub))?;

        items.remove(pos);
        let doc = self.save_parent(parent, sub, items).await?;

        tracing::info!(collection = self.collection(), parent_id, field = sub.field, %sub_ref, "sub-document deleted");
        Ok(doc)
    }
}

/// Primitive elements arrive either bare (`"Python basics"`) or wrapped as
/// `{"value": "Python basics"}`.
fn primitive_payload(payload: &Value) -> &Value {
    match payload {
        Value::Object(map) => map.get("value").unwrap_or(payload),
        other => other,
    }
}
