//! # sea-core — Foundational Types for the SEA Service Layer
//!
//! Leaf crate shared by the schema engine, the document model and the route
//! registry. It carries only pure primitives:
//!
//! - [`HttpMethod`]: the fixed set of methods a route or documented path
//!   may declare.
//! - [`path`]: conversion between the registry's `:name` placeholder syntax
//!   and the `{name}` syntax used by OpenAPI and the request router, plus
//!   namespace joining, uniqueness-key normalization and the check that a
//!   template can be mounted.
//! - [`status`]: recognition of registered HTTP status codes.
//! - [`template`]: substitution of `${...}` placeholders in error messages.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sea-*` crates.
//! - No I/O.

pub mod error;
pub mod method;
pub mod path;
pub mod status;
pub mod template;

pub use error::CoreError;
pub use method::HttpMethod;
pub use status::is_known_status;
