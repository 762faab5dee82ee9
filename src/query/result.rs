//! Query result and context shaping modes

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::QueryError;
use crate::tree::Value;

/// How much of the tree around a match is returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// The matched value only
    #[default]
    None,
    /// Nested from the last fan-out point down to the value
    Partial,
    /// Nested from the root down to the value
    Full,
}

impl FromStr for ContextMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ContextMode::None),
            "partial" => Ok(ContextMode::Partial),
            "full" => Ok(ContextMode::Full),
            other => Err(QueryError::UnknownContext(other.to_string())),
        }
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextMode::None => "none",
            ContextMode::Partial => "partial",
            ContextMode::Full => "full",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one query.
///
/// `matches` and `paths` are parallel. `data` is the first match. A miss is
/// `success == false` with no `error`; a rejected query carries the reason
/// in `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XPathResult {
    pub success: bool,
    pub data: Option<Value>,
    pub matches: Vec<Value>,
    pub count: usize,
    pub query: String,
    pub error: Option<String>,
    pub paths: Vec<Vec<String>>,
}

impl XPathResult {
    pub fn from_matches(query: &str, matches: Vec<Value>, paths: Vec<Vec<String>>) -> Self {
        let count = matches.len();
        Self {
            success: count > 0,
            data: matches.first().cloned(),
            matches,
            count,
            query: query.to_string(),
            error: None,
            paths,
        }
    }

    pub fn failed(query: &str, error: &QueryError) -> Self {
        Self {
            success: false,
            data: None,
            matches: Vec::new(),
            count: 0,
            query: query.to_string(),
            error: Some(error.to_string()),
            paths: Vec::new(),
        }
    }

    /// Iterate `(path, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&[String], &Value)> {
        self.paths.iter().map(Vec::as_slice).zip(&self.matches)
    }
}
