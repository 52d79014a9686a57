use thiserror::Error;

use crate::document::validate::ValidationErrors;
use crate::store::StoreError;

/// Failure of a resource operation, before it is mapped to a response.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Message names what did not resolve, e.g. `Hero image not found`.
    #[error("{0}")]
    NotFound(String),

    /// Request shape the operation cannot interpret.
    #[error("{0}")]
    BadInput(String),

    /// Secondary key already taken by another document.
    #[error("{0}")]
    Conflict(String),

    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ResourceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { field, .. } => {
                ResourceError::Conflict(format!("A document with this {field} already exists"))
            }
            other => ResourceError::Store(other),
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: ResourceError = StoreError::UniqueViolation {
            collection: "contents".into(),
            field: "sectionType".into(),
        }
        .into();
        assert!(matches!(err, ResourceError::Conflict(_)));
        assert_eq!(err.to_string(), "A document with this sectionType already exists");
    }

    #[test]
    fn other_store_errors_stay_store_errors() {
        let err: ResourceError = StoreError::Invalid("bad".into()).into();
        assert!(matches!(err, ResourceError::Store(_)));
    }
}
