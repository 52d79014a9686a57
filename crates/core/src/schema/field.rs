use serde_json::Value;

/// Value shape accepted for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Array of primitives, each checked against the item spec.
    List(Box<FieldSpec>),
    /// Array of embedded entities, each checked against the nested specs.
    Entities(Vec<FieldSpec>),
}

impl FieldKind {
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Integer => "an integer",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::List(_) | FieldKind::Entities(_) => "an array",
        }
    }
}

/// Constraints for one field of a resource or embedded entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub trim: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub one_of: Vec<&'static str>,
    pub default: Option<Value>,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            trim: false,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
            one_of: Vec::new(),
            default: None,
        }
    }

    /// Trimmed string field.
    pub fn string(name: &'static str) -> Self {
        Self {
            trim: true,
            ..Self::new(name, FieldKind::String)
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Array of trimmed strings.
    pub fn strings(name: &'static str) -> Self {
        Self::list(name, Self::string("item"))
    }

    pub fn list(name: &'static str, item: FieldSpec) -> Self {
        Self::new(name, FieldKind::List(Box::new(item)))
    }

    pub fn entities(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldKind::Entities(fields))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn untrimmed(mut self) -> Self {
        self.trim = false;
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_len = Some(min);
        self.max_len = Some(max);
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn one_of(mut self, allowed: &[&'static str]) -> Self {
        self.one_of = allowed.to_vec();
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}
