use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Failures building a signer from key material.
///
/// These only occur at startup (or in the client when constructed) and are
/// treated as fatal configuration errors, never as per-request outcomes.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("HMAC key must not be empty")]
    EmptyKey,

    /// Reserved for key types that restrict length; HMAC-SHA256 never does.
    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Application-wide error types with appropriate HTTP status codes.
///
/// Authentication failures are not represented here; they are produced by
/// the HMAC middleware as plain-text 401 responses.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Full details stay in the server log
        tracing::error!(error = %self, "Request failed");

        let (status, error_type, message) = match &self {
            AppError::Signing(_) | AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Service configuration error. Please contact support.".to_string(),
            ),
            AppError::SerializationError(e) => (
                StatusCode::BAD_REQUEST,
                "serialization_error",
                sanitize_serde_error(e),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Reduce a serde error to a message that is safe to show clients.
///
/// Serde messages can name internal types; only the field name is kept.
fn sanitize_serde_error(e: &serde_json::Error) -> String {
    let msg = e.to_string();

    if let Some(field) = backticked(&msg) {
        if msg.contains("missing field") {
            return format!("Missing required field: {field}");
        }
        if msg.contains("unknown field") {
            return format!("Unknown field: {field}");
        }
    }

    if msg.contains("invalid type") || msg.contains("invalid value") {
        return "Invalid data type in request body".to_string();
    }

    if e.is_eof() || e.is_syntax() {
        return "Malformed JSON in request body".to_string();
    }

    "Invalid request format".to_string()
}

fn backticked(msg: &str) -> Option<&str> {
    let start = msg.find('`')? + 1;
    let len = msg.get(start..)?.find('`')?;
    msg.get(start..start + len)
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    #[serde(deny_unknown_fields)]
    #[allow(dead_code)]
    struct Pair {
        a: i32,
        b: i32,
    }

    fn serde_message(input: &str) -> String {
        let err = serde_json::from_str::<Pair>(input).unwrap_err();
        sanitize_serde_error(&err)
    }

    #[test]
    fn test_sanitize_missing_field() {
        assert_eq!(serde_message(r#"{"a":1}"#), "Missing required field: b");
    }

    #[test]
    fn test_sanitize_unknown_field() {
        assert_eq!(
            serde_message(r#"{"a":1,"b":2,"c":3}"#),
            "Unknown field: c"
        );
    }

    #[test]
    fn test_sanitize_invalid_type() {
        assert_eq!(
            serde_message(r#"{"a":"x","b":2}"#),
            "Invalid data type in request body"
        );
    }

    #[test]
    fn test_sanitize_malformed_json() {
        assert_eq!(serde_message(r#"{"a":1,"#), "Malformed JSON in request body");
    }

    #[test]
    fn test_bad_request_status() {
        let response = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_signing_error_is_internal() {
        let response = AppError::from(SigningError::EmptyKey).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
