//! # Core Layer
//!
//! Routes and models every service carries: version and uptime checks
//! tagged `system`, plus the response models for the forwarded error
//! shapes.

use std::time::Instant;

use axum::{Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};

use sea_routes::Route;

use crate::layer::{DocumentLiterals, LayerContribution};

pub const SYSTEM_TAG: &str = "system";

/// Identity of the running service, available to handlers as an
/// [`Extension`].
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub started: Instant,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            started: Instant::now(),
        }
    }

    /// Seconds since the service was assembled.
    pub fn uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Serialize)]
struct VersionBody {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct UptimeBody {
    uptime: f64,
}

async fn version(Extension(info): Extension<ServiceInfo>) -> Json<VersionBody> {
    Json(VersionBody {
        name: info.name,
        version: info.version,
    })
}

async fn healthcheck(Extension(info): Extension<ServiceInfo>) -> Json<UptimeBody> {
    Json(UptimeBody {
        uptime: info.uptime(),
    })
}

pub fn routes() -> Vec<Route> {
    vec![
        Route::get("/version", "Version health check", version)
            .tag(SYSTEM_TAG)
            .response(200, "VersionHealthCheck", "Successful Response"),
        Route::get("/healthcheck", "Uptime health check", healthcheck)
            .tag(SYSTEM_TAG)
            .response(200, "UptimeHealthCheck", "Successful Response"),
    ]
}

fn error_model(name: &str, status: u16, description: &str, message: &str) -> Value {
    json!({
        "name": name,
        "required": ["status", "message"],
        "properties": {
            "status": {
                "type": "integer",
                "format": "int64",
                "description": description,
                "default": status
            },
            "message": {
                "type": "string",
                "description": "Message regarding this status code.",
                "default": message
            },
            "payload": {
                "type": "object",
                "additionalProperties": true
            }
        }
    })
}

pub fn document() -> DocumentLiterals {
    DocumentLiterals {
        models: vec![
            json!({
                "name": "VersionHealthCheck",
                "properties": {
                    "name": {"type": "string"},
                    "version": {"type": "string"}
                }
            }),
            json!({
                "name": "UptimeHealthCheck",
                "properties": {
                    "uptime": {"type": "number"}
                }
            }),
            error_model("ResponseBadRequest", 400, "Http client error code", "Bad Request"),
            error_model("ResponseUnauthorized", 401, "Http user error code", "Unauthorized"),
            error_model("ResponseGeneralError", 500, "Http server error code", "Server error."),
        ],
        tags: vec![json!({
            "name": SYSTEM_TAG,
            "description": "Service version and health checks."
        })],
        servers: Vec::new(),
    }
}

pub fn contribution() -> LayerContribution {
    LayerContribution {
        routes: routes(),
        document: document(),
    }
}
