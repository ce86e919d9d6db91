//! RFC 6901 JSON pointers over `serde_json::Value`.

use crate::error::PatchError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A parsed JSON pointer: a sequence of decoded reference tokens.
///
/// The empty pointer addresses the document root. Tokens are stored
/// unescaped; escaping (`~0`, `~1`) only exists in the string form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pointer(Vec<String>);

impl Pointer {
    /// The root pointer (`""`).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse from the RFC 6901 string form.
    pub fn parse(raw: &str) -> Result<Self, PatchError> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        if !raw.starts_with('/') {
            return Err(PatchError::InvalidPointer(raw.to_string()));
        }
        let tokens = raw
            .split('/')
            .skip(1)
            .map(|token| token.replace("~1", "/").replace("~0", "~"))
            .collect();
        Ok(Self(tokens))
    }

    /// The decoded reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into (parent tokens, last token). `None` for the root pointer.
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.0
            .split_last()
            .map(|(last, parents)| (parents, last.as_str()))
    }

    /// Child pointer addressing an object key.
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(key.into());
        Self(tokens)
    }

    /// Child pointer addressing an array index.
    pub fn child_index(&self, index: usize) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(index.to_string());
        Self(tokens)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl FromStr for Pointer {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Pointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pointer::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Interpret a reference token as an array index.
///
/// RFC 6901 indices are `0` or digits without a leading zero.
pub(crate) fn parse_index(token: &str) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Look up the value a pointer addresses, if it resolves.
pub fn resolve<'a>(doc: &'a Value, pointer: &Pointer) -> Option<&'a Value> {
    let mut current = doc;
    for token in pointer.tokens() {
        current = match current {
            Value::Object(map) => map.get(token)?,
            Value::Array(items) => items.get(parse_index(token)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable walk to the value addressed by `tokens`.
pub(crate) fn resolve_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    let mut current = doc;
    for token in tokens {
        current = match current {
            Value::Object(map) => map.get_mut(token)?,
            Value::Array(items) => {
                let index = parse_index(token)?;
                items.get_mut(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}
