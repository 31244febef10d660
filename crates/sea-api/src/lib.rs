//! # sea-api
//!
//! Bootstraps a SEA service from a declarative definition.
//!
//! ## Layers
//!
//! Routes and document literals come from three layers, loaded in order:
//!
//! - **core**: `/version`, `/healthcheck` and the shared error models.
//! - **app**: the application's own routes and `<appDir>/document.json`.
//! - **products**: one per declared product, namespaced under
//!   `/<product>` and read from `<appDir>/products/<product>/`.
//!
//! A later layer may replace an earlier route by marking it `overwrite`.
//!
//! ## Request Pipeline
//!
//! ```text
//! panic containment
//!   └─ before middleware
//!        └─ routing ── explorer | not-found fallback
//!             └─ after middleware
//!                  └─ route middleware → body guard → parameter guards → handler
//! ```
//!
//! ## Crate Policy
//!
//! - Startup failures are [`BootstrapError`]; nothing starts half-built.
//! - Request failures render as `{status, message}` with an optional
//!   `payload`. Internal detail is logged, never returned.

pub mod bootstrap;
pub mod core_layer;
pub mod definition;
pub mod error;
pub mod explorer;
pub mod layer;
pub mod schemas;
pub mod transport;

pub use bootstrap::{BootContext, Service, ServiceBuilder};
pub use core_layer::ServiceInfo;
pub use definition::{DocumentMeta, MiddlewareSpec, ServiceDefinition, TransportDefinition};
pub use error::{ApiError, BootstrapError};
pub use layer::{DocumentLiterals, LayerContribution};
pub use transport::{Stage, TransportMiddleware};
