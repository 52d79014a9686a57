use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier field the store owns. Client payloads never set it.
pub const ID_FIELD: &str = "_id";

/// Implicit fields added to ordered and toggleable resources.
pub const ORDER_FIELD: &str = "order";
pub const ACTIVE_FIELD: &str = "isActive";

/// Top-level content of a document, keyed by field name.
pub type Fields = Map<String, Value>;

/// A persisted resource document.
///
/// Serializes flat, with the store-assigned `_id` and timestamps next to the
/// content fields, which is the shape every endpoint returns in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Read a boolean flag, treating an absent field as `default`.
    pub fn flag(&self, field: &str, default: bool) -> bool {
        self.fields
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Read an array field, treating an absent or non-array value as empty.
    pub fn array(&self, field: &str) -> Vec<Value> {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Database row representation of a document.
/// Maps to the `documents` PostgreSQL table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub seq: i64,
    pub id: String,
    pub collection: String,
    pub content: sqlx::types::Json<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        let fields = match row.content.0 {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            fields,
        }
    }
}
