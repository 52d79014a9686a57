use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Success envelope shared by every endpoint:
/// `{ "success": true, "data": ..., "message": "..." }`.
///
/// Failures use the same shape without `data`; see `ApiError`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Status plus envelope, returned by resource handlers.
pub type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

pub fn ok<T: Serialize>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

pub fn ok_with<T: Serialize>(data: T, message: impl Into<String>) -> Reply<T> {
    (StatusCode::OK, Json(ApiResponse::with_message(data, message)))
}

pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> Reply<T> {
    (StatusCode::CREATED, Json(ApiResponse::with_message(data, message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_is_omitted_when_absent() {
        let body = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(body, json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn created_carries_status_and_message() {
        let (status, Json(body)) = created(json!({"a": 1}), "Created");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.message.as_deref(), Some("Created"));
    }
}
