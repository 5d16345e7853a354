use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure to hand a frame to a connection's writer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection is closed")]
    Closed,

    #[error("outbound buffer is full")]
    BufferFull,
}

/// Inbound frame could not be decoded as a `SocketMessage`.
#[derive(Error, Debug)]
#[error("malformed frame: {0}")]
pub struct ParseError(#[from] pub serde_json::Error);

/// Aggregate-level dispatch failure. Per-recipient failures never surface here.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

/// Hide internal detail from clients in production.
fn client_message(detail: &str, generic: &str) -> String {
    if is_production() {
        generic.to_string()
    } else {
        detail.to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let log_message = self.to_string();
        let (status, code, message) = match &self {
            AppError::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                client_message(&e.to_string(), "Configuration error"),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Dispatch(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DISPATCH_ERROR",
                client_message(&e.to_string(), "Message could not be dispatched"),
            ),
        };

        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("topic must not be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_error_wraps_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let parse = ParseError::from(err);
        assert!(parse.to_string().starts_with("malformed frame"));
    }
}
