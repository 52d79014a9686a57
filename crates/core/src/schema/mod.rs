//! Declarative resource schemas.
//!
//! Each content type of the site is one `ResourceSchema`: its fields, the
//! behaviours it opts into (ordering, active toggle, keyed upsert, status
//! counts, search) and the sub-collections embedded in its documents. Every
//! route and manager is instantiated generically from this declaration.

pub mod field;

pub use field::{FieldKind, FieldSpec};

use crate::document::model::{ACTIVE_FIELD, ORDER_FIELD};

/// Items of an embedded sub-collection.
#[derive(Debug, Clone, PartialEq)]
pub enum SubItems {
    /// Objects with their own `_id`, addressed by identifier.
    Entities(Vec<FieldSpec>),
    /// Bare values, addressed by position.
    Primitives(FieldSpec),
}

/// An array field of a parent document managed through nested routes.
#[derive(Debug, Clone, PartialEq)]
pub struct SubCollection {
    /// Field of the parent document holding the array.
    pub field: &'static str,
    /// Route segment, e.g. `details` in `/program/{id}/details`.
    pub segment: String,
    /// Human name used in messages.
    pub label: &'static str,
    pub items: SubItems,
}

impl SubCollection {
    pub fn entities(field: &'static str, label: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self {
            field,
            segment: field.to_lowercase(),
            label,
            items: SubItems::Entities(fields),
        }
    }

    pub fn primitives(field: &'static str, label: &'static str, item: FieldSpec) -> Self {
        Self {
            field,
            segment: field.to_lowercase(),
            label,
            items: SubItems::Primitives(item),
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.items, SubItems::Primitives(_))
    }

    fn field_spec(&self) -> FieldSpec {
        match &self.items {
            SubItems::Entities(fields) => FieldSpec::entities(self.field, fields.clone()),
            SubItems::Primitives(item) => FieldSpec::list(self.field, item.clone()),
        }
    }
}

/// Declaration of one resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    /// camelCase name, used for the reorder payload key (`heroImageOrders`).
    pub key_name: &'static str,
    /// Lower-case route name (`heroimage`).
    pub name: String,
    /// Lower-case plural route name (`heroimages`).
    pub plural: String,
    /// Human name used in messages (`Hero image`).
    pub label: &'static str,
    /// Store collection holding the documents.
    pub collection: String,
    pub fields: Vec<FieldSpec>,
    pub ordered: bool,
    pub toggleable: bool,
    pub unique_key: Option<&'static str>,
    pub status_field: Option<&'static str>,
    pub search_fields: Vec<&'static str>,
    pub sub_collections: Vec<SubCollection>,
}

impl ResourceSchema {
    pub fn new(key_name: &'static str, label: &'static str) -> Self {
        let name = key_name.to_lowercase();
        let plural = format!("{name}s");
        Self {
            key_name,
            collection: plural.clone(),
            name,
            plural,
            label,
            fields: Vec::new(),
            ordered: false,
            toggleable: false,
            unique_key: None,
            status_field: None,
            search_fields: Vec::new(),
            sub_collections: Vec::new(),
        }
    }

    /// Override the plural route name for irregular nouns.
    pub fn plural(mut self, plural: &str) -> Self {
        self.plural = plural.to_string();
        self.collection = plural.to_string();
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Participate in a user-controlled display order.
    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self.fields
            .push(FieldSpec::integer(ORDER_FIELD).min(0.0).default(0));
        self
    }

    /// Carry an `isActive` flag that can be flipped and filtered on.
    pub fn toggleable(mut self) -> Self {
        self.toggleable = true;
        self.fields
            .push(FieldSpec::boolean(ACTIVE_FIELD).default(true));
        self
    }

    /// At most one document may exist per value of `field`.
    pub fn unique_key(mut self, field: &'static str) -> Self {
        self.unique_key = Some(field);
        self
    }

    /// Enum field aggregated by the status-count endpoint.
    pub fn status_field(mut self, field: &'static str) -> Self {
        self.status_field = Some(field);
        self
    }

    pub fn search(mut self, fields: &[&'static str]) -> Self {
        self.search_fields = fields.to_vec();
        self
    }

    pub fn sub(mut self, sub: SubCollection) -> Self {
        self.fields.push(sub.field_spec());
        self.sub_collections.push(sub);
        self
    }

    /// Key of the reorder request body, e.g. `heroImageOrders`.
    pub fn reorder_key(&self) -> String {
        format!("{}Orders", self.key_name)
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn sub_collection(&self, segment: &str) -> Option<&SubCollection> {
        self.sub_collections
            .iter()
            .find(|sub| sub.segment == segment || sub.field == segment)
    }

    /// Allowed values of the status field, in declaration order.
    pub fn statuses(&self) -> Vec<&'static str> {
        self.status_field
            .and_then(|field| self.field_spec(field))
            .map(|spec| spec.one_of.clone())
            .unwrap_or_default()
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.label)
    }
}
