//! # Document Model Errors

use std::fmt;

use sea_schema::{SchemaConflict, ValidationFailure};
use thiserror::Error;

/// The collection an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Document,
    Server,
    Tag,
    Model,
    Path,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Document => "Document",
            Self::Server => "Server",
            Self::Tag => "Tag",
            Self::Model => "Model",
            Self::Path => "Path",
        })
    }
}

#[derive(Error, Debug)]
pub enum DocumentError {
    /// The entity failed its schema.
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// An entity with the same uniqueness key exists and `overwrite` is
    /// not set.
    #[error("{kind} {key} already exists. Use overwrite if you intentionally do it.")]
    DuplicateEntity { kind: EntityKind, key: String },

    /// The derived document schema could not be compiled.
    #[error("document schema rejected: {0}")]
    Schema(#[from] SchemaConflict),

    /// The entity passed validation but does not fit its typed form.
    #[error("malformed {kind}: {reason}")]
    Malformed { kind: EntityKind, reason: String },

    /// Explorer assets could not be written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
