//! Document diffing: produce the delta that turns one document into another.

use crate::op::{Delta, PatchOp};
use crate::pointer::Pointer;
use serde_json::Value;

/// Compute an ordered operation sequence transforming `old` into `new`.
///
/// The result is correct, not minimal: containers of the same kind are
/// diffed recursively, anything else becomes a single `replace`. Applying
/// the result to `old` in order yields `new`.
pub fn diff(old: &Value, new: &Value) -> Delta {
    let mut ops = Vec::new();
    diff_at(&Pointer::root(), old, new, &mut ops);
    ops
}

fn diff_at(path: &Pointer, old: &Value, new: &Value, ops: &mut Delta) {
    if old == new {
        return;
    }
    match (old, new) {
        (Value::Object(prev), Value::Object(next)) => {
            for key in prev.keys() {
                if !next.contains_key(key) {
                    ops.push(PatchOp::Remove {
                        path: path.child_key(key),
                    });
                }
            }
            for (key, value) in next {
                match prev.get(key) {
                    Some(existing) => diff_at(&path.child_key(key), existing, value, ops),
                    None => ops.push(PatchOp::Add {
                        path: path.child_key(key),
                        value: value.clone(),
                    }),
                }
            }
        }
        (Value::Array(prev), Value::Array(next)) => {
            let shared = prev.len().min(next.len());
            // drop the tail highest-index-first so earlier indices stay valid
            for index in (shared..prev.len()).rev() {
                ops.push(PatchOp::Remove {
                    path: path.child_index(index),
                });
            }
            for index in 0..shared {
                diff_at(&path.child_index(index), &prev[index], &next[index], ops);
            }
            for index in shared..next.len() {
                ops.push(PatchOp::Add {
                    path: path.child_index(index),
                    value: next[index].clone(),
                });
            }
        }
        _ => ops.push(PatchOp::Replace {
            path: path.clone(),
            value: new.clone(),
        }),
    }
}
