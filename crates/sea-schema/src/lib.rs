//! # sea-schema — Schema Engine
//!
//! Every shape the service layer accepts flows through [`SchemaEngine`]:
//! the bootstrap definition, route literals, document entities (models,
//! tags, servers, paths), and request parameters and bodies at request time.
//!
//! ## Validation Pipeline
//!
//! 1. **Normalize**: primitive values are coerced in place toward the
//!    declared `type` (`"42"` to `42` for `number`), and properties not
//!    declared by a closed object schema are removed.
//! 2. **Validate**: the normalized data is checked by the `jsonschema`
//!    crate (Draft 2020-12). Cross-schema `$ref`s resolve against the
//!    engine's own registry, never the network.
//! 3. **Custom keywords**: registered semantic keywords (`validStatusCode`,
//!    `file`, plus whatever the document model registers) are evaluated
//!    against a [`Catalog`] capability supplied by the caller.
//! 4. **Messages**: `errorMessage` declarations in the schema replace the
//!    default error text, with `${/pointer}` placeholders substituted from
//!    the validated data.
//!
//! ## Failure Taxonomy
//!
//! - [`SchemaConflict`]: the schema or keyword itself is wrong. Raised at
//!   registration, never during validation.
//! - [`ValidationFailure`]: the data does not satisfy the schema. Carries
//!   an aggregated message and per-field [`FieldError`]s.
//!
//! ## Thread Safety
//!
//! Registration takes `&mut self` and happens during bootstrap. Validation
//! takes `&self`, so a finished engine can sit behind an `Arc` and serve
//! concurrent requests.

pub mod builtin;
pub mod engine;
pub mod error;
pub mod keyword;
mod messages;
mod normalize;
mod pointer;
mod resolve;
mod walk;

pub use engine::{CompiledSchema, FailureMode, SchemaEngine, SCHEMA_URI_PREFIX};
pub use error::{FieldError, SchemaConflict, ValidationFailure};
pub use keyword::{Catalog, KeywordDefinition, KeywordInput};
