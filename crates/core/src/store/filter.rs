use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::document::Document;
use crate::store::{StoreError, StoreResult};

/// One predicate over a document's top-level fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the JSON value exactly.
    Eq(String, Value),
    /// Any of the string fields matches the pattern, case-insensitively.
    Matches { fields: Vec<String>, pattern: String },
}

/// Conjunction of conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    pub fn matches_any(mut self, fields: &[&str], pattern: impl Into<String>) -> Self {
        self.conditions.push(Condition::Matches {
            fields: fields.iter().map(ToString::to_string).collect(),
            pattern: pattern.into(),
        });
        self
    }

    /// Literal, case-insensitive text search across `fields`.
    pub fn search(self, fields: &[&str], text: &str) -> Self {
        self.matches_any(fields, regex::escape(text))
    }

    /// Compile for evaluation against in-process documents.
    pub fn compile(&self) -> StoreResult<CompiledFilter<'_>> {
        let mut patterns = Vec::new();
        for condition in &self.conditions {
            if let Condition::Matches { pattern, .. } = condition {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| StoreError::Invalid(format!("bad pattern `{pattern}`: {e}")))?;
                patterns.push(regex);
            }
        }
        Ok(CompiledFilter {
            filter: self,
            patterns,
        })
    }
}

pub struct CompiledFilter<'a> {
    filter: &'a Filter,
    patterns: Vec<Regex>,
}

impl CompiledFilter<'_> {
    pub fn matches(&self, doc: &Document) -> bool {
        let mut patterns = self.patterns.iter();
        self.filter.conditions.iter().all(|condition| match condition {
            Condition::Eq(field, expected) => doc.get(field) == Some(expected),
            Condition::Matches { fields, .. } => {
                let Some(regex) = patterns.next() else {
                    return false;
                };
                fields.iter().any(|field| {
                    doc.get(field)
                        .and_then(Value::as_str)
                        .is_some_and(|text| regex.is_match(text))
                })
            }
        })
    }
}

/// Result ordering for `find`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Sort {
    /// Oldest first.
    #[default]
    Insertion,
    /// Most recently inserted first.
    Newest,
    /// Ascending by field; missing values last, ties in insertion order.
    Asc(String),
    /// Descending by field; missing values last, ties in insertion order.
    Desc(String),
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Sort::Asc(field.into())
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Sort::Desc(field.into())
    }
}

/// Order two optional field values; numbers numerically, strings
/// lexically, absent or null values after everything else.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
