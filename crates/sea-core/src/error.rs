//! # Core Errors

use thiserror::Error;

/// Errors raised while parsing foundational primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The method is not one of `get`, `post`, `put`, `delete`.
    #[error("unsupported HTTP method '{0}', expected one of [get, post, put, delete]")]
    UnsupportedMethod(String),

    /// A path template the request router cannot mount.
    #[error("invalid path template '{path}': {reason}")]
    InvalidTemplate { path: String, reason: &'static str },
}
