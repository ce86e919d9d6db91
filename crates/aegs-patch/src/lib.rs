//! AEGS Patch - JSON document model and patch machinery
//!
//! This crate provides the pure document layer of the Lazulite gossip store:
//!
//! - RFC 6901 pointers and lookup ([`pointer`])
//! - JSON-Patch operations in the RFC 6902 wire shape ([`op`])
//! - All-or-nothing, copy-on-write patch application ([`apply`])
//! - Document diffing ([`diff`])
//! - The redundancy check used to discard already-reflected deltas
//!
//! Documents are plain `serde_json::Value` trees. Applying a delta either
//! succeeds completely or fails completely; the input document is never
//! mutated.

pub mod apply;
pub mod diff;
pub mod error;
pub mod op;
pub mod pointer;

// Re-export main types for convenience
pub use apply::{apply, is_reflected};
pub use diff::diff;
pub use error::PatchError;
pub use op::{Delta, PatchOp};
pub use pointer::{resolve, Pointer};

use serde_json::{Map, Value};

/// A fresh, empty document (`{}`), the state every replica starts from.
pub fn empty_document() -> Value {
    Value::Object(Map::new())
}

/// The delta that rebuilds `state` from an empty document.
///
/// Sent in place of incremental history when a peer's cursor predates the
/// retained log.
pub fn snapshot(state: &Value) -> Delta {
    diff(&empty_document(), state)
}
