//! # Error Forwarding
//!
//! Guards and handlers signal failure by returning a [`ForwardedError`].
//! It renders as `{status, message, payload?}` with `status` as the HTTP
//! status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use sea_schema::ValidationFailure;

pub const MESSAGE_BAD_REQUEST: &str = "Bad Request, data was malformed.";
pub const MESSAGE_SERVER_ERROR: &str = "Server Error.";
pub const MESSAGE_NOT_FOUND: &str = "Request not found.";

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{status}: {message}")]
pub struct ForwardedError {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ForwardedError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            payload: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn malformed() -> Self {
        Self::bad_request(MESSAGE_BAD_REQUEST)
    }

    pub fn server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MESSAGE_SERVER_ERROR)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, MESSAGE_NOT_FOUND)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The response status. Out-of-range codes fall back to 500.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ValidationFailure> for ForwardedError {
    fn from(failure: ValidationFailure) -> Self {
        Self::bad_request(failure.message)
    }
}

impl IntoResponse for ForwardedError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                message = %self.message,
                "sending error response"
            );
        } else {
            tracing::debug!(
                status = status.as_u16(),
                message = %self.message,
                "sending error response"
            );
        }
        let body = Self {
            status: status.as_u16(),
            ..self
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_failures_become_bad_requests() {
        let f = ValidationFailure::general("Parameter id is required.");
        let e = ForwardedError::from(f).with_payload(json!({"id": "x"}));
        assert_eq!(e.status, 400);
        assert_eq!(e.message, "Parameter id is required.");
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            json!({"status": 400, "message": "Parameter id is required.", "payload": {"id": "x"}})
        );
    }

    #[test]
    fn payload_is_optional_on_the_wire() {
        let v = serde_json::to_value(ForwardedError::not_found()).unwrap();
        assert_eq!(v, json!({"status": 404, "message": "Request not found."}));
    }

    #[test]
    fn invalid_status_falls_back_to_server_error() {
        let e = ForwardedError {
            status: 42,
            message: "odd".into(),
            payload: None,
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = e.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
