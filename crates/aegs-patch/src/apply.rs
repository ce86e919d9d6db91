//! All-or-nothing patch application and the redundancy check.

use crate::error::PatchError;
use crate::op::PatchOp;
use crate::pointer::{parse_index, resolve, resolve_mut, Pointer};
use serde_json::Value;

/// Apply a delta to a document, copy-on-write.
///
/// The input document is never mutated. If any operation fails, the whole
/// delta is rejected and the error is returned; there is no partial result.
pub fn apply(doc: &Value, ops: &[PatchOp]) -> Result<Value, PatchError> {
    let mut working = doc.clone();
    for op in ops {
        apply_in_place(&mut working, op)?;
    }
    Ok(working)
}

fn apply_in_place(doc: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Add { path, value } => add(doc, op, path, value.clone()),
        PatchOp::Remove { path } => remove(doc, path).map(|_| ()),
        PatchOp::Replace { path, value } => replace(doc, op, path, value.clone()),
        PatchOp::Move { from, path } => {
            let taken = remove(doc, from)?;
            add(doc, op, path, taken)
        }
        PatchOp::Copy { from, path } => {
            let copied = resolve(doc, from)
                .cloned()
                .ok_or_else(|| PatchError::InvalidPointer(from.to_string()))?;
            add(doc, op, path, copied)
        }
        PatchOp::Test { path, value } => {
            let current = resolve(doc, path)
                .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
            if current == value {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: path.to_string(),
                })
            }
        }
    }
}

fn add(doc: &mut Value, op: &PatchOp, path: &Pointer, value: Value) -> Result<(), PatchError> {
    let Some((parents, last)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };
    let parent = resolve_mut(doc, parents)
        .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
    match parent {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = if last == "-" {
                items.len()
            } else {
                parse_index(last)
                    .filter(|&index| index <= items.len())
                    .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?
            };
            items.insert(index, value);
            Ok(())
        }
        other => Err(PatchError::TypeMismatch {
            op: op.name(),
            path: path.to_string(),
            found: type_name(other),
        }),
    }
}

fn remove(doc: &mut Value, path: &Pointer) -> Result<Value, PatchError> {
    let Some((parents, last)) = path.split_last() else {
        return Err(PatchError::InvalidPointer(path.to_string()));
    };
    let parent = resolve_mut(doc, parents)
        .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
    match parent {
        Value::Object(map) => map
            .remove(last)
            .ok_or_else(|| PatchError::InvalidPointer(path.to_string())),
        Value::Array(items) => {
            let index = parse_index(last)
                .filter(|&index| index < items.len())
                .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
            Ok(items.remove(index))
        }
        _ => Err(PatchError::InvalidPointer(path.to_string())),
    }
}

fn replace(doc: &mut Value, op: &PatchOp, path: &Pointer, value: Value) -> Result<(), PatchError> {
    let Some((parents, last)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };
    let parent = resolve_mut(doc, parents)
        .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
    match parent {
        Value::Object(map) => match map.get_mut(last) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(PatchError::InvalidPointer(path.to_string())),
        },
        Value::Array(items) => {
            let index = parse_index(last)
                .filter(|&index| index < items.len())
                .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
            items[index] = value;
            Ok(())
        }
        other => Err(PatchError::TypeMismatch {
            op: op.name(),
            path: path.to_string(),
            found: type_name(other),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Redundancy check: is the delta already reflected in the document?
///
/// Every operation carrying an explicit value is compared against the
/// document's current value at its path; the delta counts as reflected only
/// if all of them already match. Operations without a value (remove, move,
/// copy) are not inspected, so they never veto the verdict. A reflected
/// delta can be discarded instead of replayed, which is what stops two
/// converged peers from re-applying the same state at each other forever.
pub fn is_reflected(doc: &Value, ops: &[PatchOp]) -> bool {
    ops.iter().all(|op| match op.value() {
        Some(expected) => resolve(doc, op.path()) == Some(expected),
        None => true,
    })
}
