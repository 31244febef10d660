//! # Bootstrap and API Errors
//!
//! [`BootstrapError`] aggregates everything that can abort startup. Request
//! time failures raised outside the guards use [`ApiError`], which renders
//! through the same `{status, message}` contract as forwarded errors and
//! never exposes internal detail.

use std::any::Any;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use sea_docs::DocumentError;
use sea_routes::{ForwardedError, RouteError};
use sea_schema::{SchemaConflict, ValidationFailure};

#[derive(Error, Debug)]
pub enum BootstrapError {
    /// A definition or document file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A definition or document file is not valid YAML or JSON.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The definition, or a layer literal, failed its schema.
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// The validated definition does not fit its typed form.
    #[error("malformed service definition: {0}")]
    Definition(#[source] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaConflict),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Route(#[from] RouteError),

    /// Routes were contributed for a product the definition does not list.
    #[error("product {0} is not declared in the service definition")]
    UnknownProduct(String),

    /// A transport middleware identifier has no built-in mapping.
    #[error("unknown middleware {0}")]
    UnknownMiddleware(String),

    /// A built-in middleware was given parameters it cannot use.
    #[error("invalid params for middleware {name}: {reason}")]
    MiddlewareParams { name: String, reason: String },

    /// A route is mounted under the explorer root.
    #[error("route {0} is shadowed by the API explorer")]
    ExplorerShadowed(String),

    /// `serve` was called on a service without a transport definition.
    #[error("service {0} has no transport definition")]
    NoTransport(String),

    /// A boot hook reported failure.
    #[error("boot hook failed: {0}")]
    Hook(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    /// Logged, never returned to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let forwarded = match &self {
            Self::NotFound(_) => ForwardedError::not_found(),
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                ForwardedError::server_error()
            }
        };
        forwarded.into_response()
    }
}

/// Fallback for requests no route matches.
pub async fn not_found() -> ForwardedError {
    ForwardedError::not_found()
}

/// Renders a handler panic as a generic server error.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(ForwardedError::server_error()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_detail() {
        let resp = ApiError::Internal("disk on fire".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError::NotFound("asset".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn panic_payloads_become_500() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_product_message() {
        let e = BootstrapError::UnknownProduct("gadgets".into());
        assert_eq!(
            e.to_string(),
            "product gadgets is not declared in the service definition"
        );
    }
}
