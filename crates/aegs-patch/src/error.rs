//! Error types for patch application.

use thiserror::Error;

/// Errors that can occur while applying a patch to a document.
///
/// Any of these rejects the *whole* delta it belongs to; a document is never
/// left with a partially applied delta.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("pointer does not resolve: {0}")]
    InvalidPointer(String),

    #[error("target of {op} at {path} is not a container: found {found}")]
    TypeMismatch {
        op: &'static str,
        path: String,
        found: &'static str,
    },

    #[error("test failed at {path}")]
    TestFailed { path: String },
}

pub type Result<T> = std::result::Result<T, PatchError>;
