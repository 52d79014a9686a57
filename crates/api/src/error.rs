use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campus_cms_core::ResourceError;
use serde_json::json;

/// API error type that maps to the failure envelope
/// `{ "success": false, "message": ..., "error"?: ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ResourceError> for ApiError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Validation(errors) => ApiError::Validation(errors.to_string()),
            ResourceError::NotFound(msg) => ApiError::NotFound(msg),
            ResourceError::BadInput(msg) => ApiError::BadRequest(msg),
            ResourceError::Conflict(msg) => ApiError::Conflict(msg),
            ResourceError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(msg) => json!({
                "success": false,
                "message": format!("Validation failed: {msg}"),
            }),
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Conflict(msg) => {
                json!({ "success": false, "message": msg })
            }
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {err}");
                json!({
                    "success": false,
                    "message": "Internal server error",
                    "error": err,
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use campus_cms_core::StoreError;

    #[test]
    fn resource_errors_map_to_statuses() {
        let cases = [
            (ResourceError::NotFound("Mentor not found".into()), StatusCode::NOT_FOUND),
            (ResourceError::BadInput("bad".into()), StatusCode::BAD_REQUEST),
            (ResourceError::Conflict("taken".into()), StatusCode::CONFLICT),
            (
                ResourceError::Store(StoreError::Invalid("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn internal_error_keeps_message_generic() {
        let response = ApiError::Internal("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
