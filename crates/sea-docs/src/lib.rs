//! # sea-docs — API Document Model
//!
//! In-memory servers, tags, component models and paths, validated on every
//! mutation through [`sea_schema::SchemaEngine`] and rendered on demand into
//! an OpenAPI 3.0.1 document.
//!
//! ## Invariants
//!
//! - Every collection is keyed: servers by URL, tags and models by name,
//!   paths by normalized template plus lower-case method. A duplicate key
//!   is rejected unless the new item sets `overwrite`.
//! - A path is only accepted when every model it references exists and it
//!   declares a `200` response.
//! - After every model change the document schema installed in the engine
//!   mirrors the model collection, so request bodies validate against the
//!   models as documented.
//! - Rendering is pure: two calls without a mutation in between yield
//!   equal documents.

pub mod error;
pub mod explorer;
pub mod keywords;
pub mod model;
pub mod render;
pub mod schemas;
pub mod types;

pub use error::{DocumentError, EntityKind};
pub use explorer::{ExplorerConfig, ExplorerRoute};
pub use model::DocumentModel;
pub use types::{
    DocumentDefinition, Model, Parameter, ParameterLocation, PathDef, PathKey, RequestBody,
    ResponseSpec, Server, Tag,
};
