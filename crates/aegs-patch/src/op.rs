//! JSON-Patch operations (RFC 6902 wire shape).

use crate::pointer::Pointer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered sequence of operations representing one state transition.
pub type Delta = Vec<PatchOp>;

/// A single change record, wire-compatible with JSON-Patch:
/// `{op, path, value?, from?}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: Pointer, value: Value },
    Remove { path: Pointer },
    Replace { path: Pointer, value: Value },
    Move { from: Pointer, path: Pointer },
    Copy { from: Pointer, path: Pointer },
    Test { path: Pointer, value: Value },
}

impl PatchOp {
    /// The target path of the operation.
    pub fn path(&self) -> &Pointer {
        match self {
            PatchOp::Add { path, .. }
            | PatchOp::Remove { path }
            | PatchOp::Replace { path, .. }
            | PatchOp::Move { path, .. }
            | PatchOp::Copy { path, .. }
            | PatchOp::Test { path, .. } => path,
        }
    }

    /// The explicit value carried by the operation, if any.
    ///
    /// Only add/replace/test carry one; remove/move/copy do not, which is
    /// what keeps them invisible to the redundancy check.
    pub fn value(&self) -> Option<&Value> {
        match self {
            PatchOp::Add { value, .. }
            | PatchOp::Replace { value, .. }
            | PatchOp::Test { value, .. } => Some(value),
            _ => None,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            PatchOp::Add { .. } => "add",
            PatchOp::Remove { .. } => "remove",
            PatchOp::Replace { .. } => "replace",
            PatchOp::Move { .. } => "move",
            PatchOp::Copy { .. } => "copy",
            PatchOp::Test { .. } => "test",
        }
    }
}
