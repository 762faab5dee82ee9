//! Token-keyed tree values
//!
//! After normalization every key is a single whitespace-free token and every
//! value is one of three shapes: a scalar, a bare "present" marker, or a
//! nested mapping. Consumers match on [`Value`] exhaustively.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Node value in a token-keyed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Leaf value, e.g. `R1` in `hostname R1`
    Scalar(String),
    /// Key present with no value, e.g. `shutdown`
    Present,
    /// Nested mapping
    Map(TokenMap),
}

/// Shape tag used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Scalar,
    Present,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Present => "present",
            ValueKind::Map => "map",
        };
        write!(f, "{}", name)
    }
}

impl Value {
    pub fn scalar(value: impl Into<String>) -> Self {
        Value::Scalar(value.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Present => ValueKind::Present,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_map(&self) -> Option<&TokenMap> {
        match self {
            Value::Map(map) => Some(map),
            Value::Scalar(_) | Value::Present => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Present | Value::Map(_) => None,
        }
    }

    /// Wrap this value under `path`, innermost key last
    pub fn nest<'a, I>(self, path: I) -> Value
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: DoubleEndedIterator,
    {
        path.into_iter().rev().fold(self, |inner, key| {
            let mut map = TokenMap::new();
            map.insert(key, inner);
            Value::Map(map)
        })
    }
}

impl From<TokenMap> for Value {
    fn from(map: TokenMap) -> Self {
        Value::Map(map)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Scalar(s) => serializer.serialize_str(s),
            Value::Present => serializer.serialize_none(),
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

/// Insertion-ordered token-keyed mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    entries: IndexMap<String, Value>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_key_value(&self, key: &str) -> Option<(&str, &Value)> {
        self.entries.get_key_value(key).map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace; a replaced key keeps its original position
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of key levels (0 for an empty map)
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((map, level)) = pending.pop() {
            if map.is_empty() {
                continue;
            }
            max = max.max(level);
            pending.extend(map.entries.values().filter_map(Value::as_map).map(|m| (m, level + 1)));
        }
        max
    }

    /// First key containing whitespace, anywhere in the tree.
    ///
    /// A normalized tree never has one, so this doubles as a shape check for
    /// mappings that did not come out of the normalizer.
    pub fn find_unsplit_key(&self) -> Option<&str> {
        let mut pending = vec![self];
        while let Some(map) = pending.pop() {
            for (key, value) in &map.entries {
                if key.is_empty() || key.chars().any(char::is_whitespace) {
                    return Some(key.as_str());
                }
                if let Value::Map(child) = value {
                    pending.push(child);
                }
            }
        }
        None
    }

    /// Re-render as indented `key value` text, `indent` spaces per level
    pub fn to_text(&self, indent: usize) -> String {
        let mut out = String::new();
        let mut pending: Vec<(&str, &Value, usize)> =
            self.iter().rev().map(|(k, v)| (k, v, 0)).collect();

        while let Some((key, value, level)) = pending.pop() {
            out.push_str(&" ".repeat(level * indent));
            out.push_str(key);
            match value {
                Value::Scalar(s) => {
                    out.push(' ');
                    out.push_str(s);
                }
                Value::Present => {}
                Value::Map(child) => {
                    pending.extend(child.iter().rev().map(|(k, v)| (k, v, level + 1)));
                }
            }
            out.push('\n');
        }
        out
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for TokenMap {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut map = TokenMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for TokenMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(mut self) -> Self::IntoIter {
        std::mem::take(&mut self.entries).into_iter()
    }
}

/// Nested maps are drained onto a heap stack so dropping a deep tree does not
/// recurse once per level.
impl Drop for TokenMap {
    fn drop(&mut self) {
        if !self.entries.values().any(|v| matches!(v, Value::Map(_))) {
            return;
        }
        let mut pending = vec![std::mem::take(&mut self.entries)];
        while let Some(entries) = pending.pop() {
            for (_, value) in entries {
                if let Value::Map(mut child) = value {
                    pending.push(std::mem::take(&mut child.entries));
                }
            }
        }
    }
}

impl Serialize for TokenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Error converting foreign JSON into a token map
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("expected a JSON object at the top level, got {0}")]
    NotAnObject(&'static str),

    #[error("unsupported JSON array at '{0}'")]
    Array(String),
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl TokenMap {
    /// Load a tree previously dumped as JSON.
    ///
    /// Strings become scalars, `null` becomes [`Value::Present`], numbers and
    /// booleans are kept as their text. Keys are taken as-is; use
    /// [`TokenMap::find_unsplit_key`] to check they are tokens.
    pub fn from_json(json: serde_json::Value) -> Result<Self, ShapeError> {
        match json {
            serde_json::Value::Object(object) => convert_object(object, ""),
            other => Err(ShapeError::NotAnObject(json_type_name(&other))),
        }
    }
}

fn convert_object(
    object: serde_json::Map<String, serde_json::Value>,
    at: &str,
) -> Result<TokenMap, ShapeError> {
    let mut map = TokenMap::new();
    for (key, json) in object {
        let path = format!("{}/{}", at, key);
        let value = match json {
            serde_json::Value::Object(child) => Value::Map(convert_object(child, &path)?),
            serde_json::Value::Null => Value::Present,
            serde_json::Value::String(s) => Value::Scalar(s),
            serde_json::Value::Bool(b) => Value::Scalar(b.to_string()),
            serde_json::Value::Number(n) => Value::Scalar(n.to_string()),
            serde_json::Value::Array(_) => return Err(ShapeError::Array(path)),
        };
        map.insert(key, value);
    }
    Ok(map)
}
