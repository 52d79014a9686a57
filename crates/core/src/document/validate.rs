/// Schema validation for client payloads.
///
/// Pure functions: a payload and a list of field specs go in, a normalized
/// field map (trimmed, defaulted, unknown keys dropped) or every violation
/// found comes out.
use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::model::{Fields, ID_FIELD};
use crate::schema::{FieldKind, FieldSpec};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Reason {
    #[error("is required")]
    Required,
    #[error("must be {0}")]
    WrongType(&'static str),
    #[error("must be at least {0} characters")]
    TooShort(usize),
    #[error("must be at most {0} characters")]
    TooLong(usize),
    #[error("must be at least {0}")]
    BelowMin(f64),
    #[error("must be at most {0}")]
    AboveMax(f64),
    #[error("must be one of: {}", .0.join(", "))]
    NotAllowed(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field} {reason}")]
pub struct FieldViolation {
    pub field: String,
    pub reason: Reason,
}

impl FieldViolation {
    fn new(field: impl Into<String>, reason: Reason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

/// Every violation found in one payload.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render(.0))]
pub struct ValidationErrors(pub Vec<FieldViolation>);

fn render(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, reason: Reason) -> Self {
        Self(vec![FieldViolation::new(field, reason)])
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }
}

/// Whether absent required fields are violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Full payload: required fields enforced, defaults applied.
    Create,
    /// Partial payload: only the supplied fields are checked.
    Update,
}

/// Validate `payload` against `specs`.
pub fn validate(specs: &[FieldSpec], payload: &Value, mode: Mode) -> Result<Fields, ValidationErrors> {
    let Value::Object(input) = payload else {
        return Err(ValidationErrors::single("body", Reason::WrongType("an object")));
    };

    let mut violations = Vec::new();
    let out = validate_object(specs, input, mode, "", &mut violations);

    if violations.is_empty() {
        Ok(out)
    } else {
        Err(ValidationErrors(violations))
    }
}

/// Validate a single primitive value against an item spec.
pub fn validate_item(spec: &FieldSpec, value: &Value) -> Result<Value, ValidationErrors> {
    let mut violations = Vec::new();
    let out = check_value(spec, value, spec.name, &mut violations);
    if violations.is_empty() {
        Ok(out)
    } else {
        Err(ValidationErrors(violations))
    }
}

fn validate_object(
    specs: &[FieldSpec],
    input: &Map<String, Value>,
    mode: Mode,
    prefix: &str,
    violations: &mut Vec<FieldViolation>,
) -> Fields {
    let mut out = Map::new();

    for spec in specs {
        let path = format!("{prefix}{}", spec.name);
        match input.get(spec.name) {
            None => {
                if mode == Mode::Create {
                    if let Some(default) = &spec.default {
                        out.insert(spec.name.to_string(), default.clone());
                    } else if spec.required {
                        violations.push(FieldViolation::new(path, Reason::Required));
                    }
                }
            }
            Some(Value::Null) => {
                if spec.required {
                    violations.push(FieldViolation::new(path, Reason::Required));
                } else if spec.default.is_some() {
                    // Defaulted fields always hold a value of their kind.
                    violations.push(FieldViolation::new(
                        path,
                        Reason::WrongType(spec.kind.describe()),
                    ));
                } else {
                    out.insert(spec.name.to_string(), Value::Null);
                }
            }
            Some(value) => {
                let checked = check_value(spec, value, &path, violations);
                out.insert(spec.name.to_string(), checked);
            }
        }
    }

    // Embedded entities keep their identifier so whole-array writes do not
    // re-key existing items.
    if let Some(Value::String(id)) = input.get(ID_FIELD) {
        if !prefix.is_empty() {
            out.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        }
    }

    out
}

fn check_value(
    spec: &FieldSpec,
    value: &Value,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Value {
    let before = violations.len();
    let wrong_type = |violations: &mut Vec<FieldViolation>| {
        violations.push(FieldViolation::new(path, Reason::WrongType(spec.kind.describe())));
        value.clone()
    };

    match &spec.kind {
        FieldKind::String => {
            let Some(raw) = value.as_str() else {
                return wrong_type(violations);
            };
            let text = if spec.trim { raw.trim() } else { raw };
            let chars = text.chars().count();

            if chars == 0 {
                if spec.required {
                    violations.push(FieldViolation::new(path, Reason::Required));
                }
            } else {
                if let Some(min) = spec.min_len.filter(|min| chars < *min) {
                    violations.push(FieldViolation::new(path, Reason::TooShort(min)));
                }
                if let Some(max) = spec.max_len.filter(|max| chars > *max) {
                    violations.push(FieldViolation::new(path, Reason::TooLong(max)));
                }
            }
            if !spec.one_of.is_empty() && !spec.one_of.contains(&text) {
                violations.push(FieldViolation::new(
                    path,
                    Reason::NotAllowed(spec.one_of.clone()),
                ));
            }
            Value::String(text.to_string())
        }
        FieldKind::Integer => {
            if value.as_i64().is_none() {
                return wrong_type(violations);
            }
            check_range(spec, value, path, violations);
            value.clone()
        }
        FieldKind::Number => {
            if !value.is_number() {
                return wrong_type(violations);
            }
            check_range(spec, value, path, violations);
            value.clone()
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                return wrong_type(violations);
            }
            value.clone()
        }
        FieldKind::List(item) => {
            let Some(items) = value.as_array() else {
                return wrong_type(violations);
            };
            let checked = items
                .iter()
                .enumerate()
                .map(|(i, v)| check_value(item, v, &format!("{path}.{i}"), violations))
                .collect::<Vec<_>>();
            if spec.required && checked.is_empty() && violations.len() == before {
                violations.push(FieldViolation::new(path, Reason::Required));
            }
            Value::Array(checked)
        }
        FieldKind::Entities(fields) => {
            let Some(items) = value.as_array() else {
                return wrong_type(violations);
            };
            let mut checked = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}.{i}");
                match item {
                    Value::Object(map) => {
                        let prefix = format!("{item_path}.");
                        let entity = validate_object(fields, map, Mode::Create, &prefix, violations);
                        checked.push(Value::Object(entity));
                    }
                    _ => violations.push(FieldViolation::new(
                        item_path,
                        Reason::WrongType("an object"),
                    )),
                }
            }
            Value::Array(checked)
        }
    }
}

fn check_range(spec: &FieldSpec, value: &Value, path: &str, violations: &mut Vec<FieldViolation>) {
    let Some(n) = value.as_f64() else { return };
    if let Some(min) = spec.min.filter(|min| n < *min) {
        violations.push(FieldViolation::new(path, Reason::BelowMin(min)));
    }
    if let Some(max) = spec.max.filter(|max| n > *max) {
        violations.push(FieldViolation::new(path, Reason::AboveMax(max)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn testimonial() -> Vec<FieldSpec> {
        vec![
            FieldSpec::string("name").required().length(2, 50),
            FieldSpec::string("message").required().max_len(200),
            FieldSpec::integer("rating").range(1.0, 5.0).default(5),
            FieldSpec::string("kind").one_of(&["student", "parent"]),
            FieldSpec::strings("tags"),
        ]
    }

    #[test]
    fn trims_and_applies_defaults() {
        let out = validate(
            &testimonial(),
            &json!({"name": "  Asha  ", "message": " Great ", "tags": [" a ", "b"]}),
            Mode::Create,
        )
        .unwrap();
        assert_eq!(out["name"], "Asha");
        assert_eq!(out["message"], "Great");
        assert_eq!(out["rating"], 5);
        assert_eq!(out["tags"], json!(["a", "b"]));
    }

    #[test]
    fn drops_unknown_and_store_fields() {
        let out = validate(
            &testimonial(),
            &json!({"name": "Asha", "message": "Hi", "_id": "x", "createdAt": "t", "extra": 1}),
            Mode::Create,
        )
        .unwrap();
        assert!(out.get("_id").is_none());
        assert!(out.get("createdAt").is_none());
        assert!(out.get("extra").is_none());
    }

    #[test]
    fn collects_every_violation() {
        let err = validate(
            &testimonial(),
            &json!({"name": "A", "rating": 9, "kind": "alien"}),
            Mode::Create,
        )
        .unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "message", "rating", "kind"]);
        assert_eq!(err.violations()[0].reason, Reason::TooShort(2));
        assert_eq!(err.violations()[1].reason, Reason::Required);
        assert!(err.to_string().contains("kind must be one of: student, parent"));
    }

    #[test]
    fn whitespace_only_required_string_is_missing() {
        let err = validate(&testimonial(), &json!({"name": "   ", "message": "ok"}), Mode::Create)
            .unwrap_err();
        assert_eq!(err.violations()[0].field, "name");
        assert_eq!(err.violations()[0].reason, Reason::Required);
    }

    #[test]
    fn update_mode_checks_only_supplied_fields() {
        let out = validate(&testimonial(), &json!({"rating": 3}), Mode::Update).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out["rating"], 3);

        let err = validate(&testimonial(), &json!({"name": null}), Mode::Update).unwrap_err();
        assert_eq!(err.violations()[0].reason, Reason::Required);
    }

    #[test]
    fn null_is_rejected_for_defaulted_fields() {
        let err = validate(
            &testimonial(),
            &json!({"name": "Asha", "message": "ok", "rating": null, "kind": null}),
            Mode::Create,
        )
        .unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "rating");
        assert_eq!(err.violations()[0].reason, Reason::WrongType("an integer"));

        let err = validate(&testimonial(), &json!({"rating": null}), Mode::Update).unwrap_err();
        assert_eq!(err.to_string(), "rating must be an integer");
    }

    #[test]
    fn rejects_wrong_types() {
        let err = validate(
            &testimonial(),
            &json!({"name": 7, "message": "ok", "rating": 2.5, "tags": "x"}),
            Mode::Create,
        )
        .unwrap_err();
        let reasons: Vec<_> = err.violations().iter().map(|v| v.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                Reason::WrongType("a string"),
                Reason::WrongType("an integer"),
                Reason::WrongType("an array"),
            ]
        );
    }

    #[test]
    fn non_object_payload() {
        let err = validate(&testimonial(), &json!([1, 2]), Mode::Create).unwrap_err();
        assert_eq!(err.violations()[0].field, "body");
    }

    #[test]
    fn entities_are_validated_with_paths() {
        let specs = vec![FieldSpec::entities(
            "details",
            vec![FieldSpec::string("title").required()],
        )];
        let err = validate(
            &specs,
            &json!({"details": [{"title": "ok"}, {"title": ""}, 3]}),
            Mode::Create,
        )
        .unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["details.1.title", "details.2"]);
    }

    #[test]
    fn entities_keep_existing_ids() {
        let specs = vec![FieldSpec::entities(
            "details",
            vec![FieldSpec::string("title").required()],
        )];
        let out = validate(
            &specs,
            &json!({"details": [{"_id": "keep-me", "title": " t "}]}),
            Mode::Create,
        )
        .unwrap();
        assert_eq!(out["details"][0]["_id"], "keep-me");
        assert_eq!(out["details"][0]["title"], "t");
    }

    #[test]
    fn validate_item_checks_primitive() {
        let item = FieldSpec::string("item").required();
        assert_eq!(validate_item(&item, &json!("  x ")).unwrap(), json!("x"));
        assert!(validate_item(&item, &json!(3)).is_err());
    }
}
