//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as `{"errors": [...]}`.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be read as the expected JSON.
    BadRequest(String),
    /// A saga ran and failed; the messages are safe to show.
    SagaFailed(Vec<String>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, vec![msg]),
            ApiError::SagaFailed(errors) => (StatusCode::BAD_REQUEST, errors),
        };

        let body = serde_json::json!({ "errors": errors });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_saga_failure_lists_every_message() {
        let response =
            ApiError::SagaFailed(vec!["first".to_string(), "second".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errors"], serde_json::json!(["first", "second"]));
    }
}
