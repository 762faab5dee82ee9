//! Query module - Path expressions over token-keyed trees
//!
//! ```text
//! /hostname                       exact key
//! /interface/*/duplex             one branch per key at a level
//! /interface[fast*]/duplex        case-insensitive glob on the level below `interface`
//! //duplex                        the rest of the path, tried from every mapping
//! ```
//!
//! Evaluation never fails: validation problems and misses both come back as
//! an [`XPathResult`] with `success == false`.

pub mod engine;
pub mod parser;
pub mod result;

pub use engine::Hit;
pub use parser::{KeyPattern, Selector, Step, XPath};
pub use result::{ContextMode, XPathResult};

use crate::tree::ConfigTree;

/// Why a query could not be evaluated
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("XPath query cannot be empty")]
    Empty,

    #[error("XPath query must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("Invalid context '{0}': expected one of none, partial, full")]
    UnknownContext(String),

    #[error("recursive/path queries require the normalized tree shape ({0})")]
    UnsupportedShape(String),

    #[error("malformed predicate in segment '{0}'")]
    MalformedPredicate(String),

    #[error("'//' must be followed by a path segment")]
    EmptyRecursive,

    #[error("invalid key pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Parse `query` and run it against `tree`, shaping matches per `context`
/// (`none`, `partial` or `full`).
pub fn evaluate(tree: &ConfigTree, query: &str, context: &str) -> XPathResult {
    let prepared = XPath::parse(query).and_then(|xpath| Ok((xpath, context.parse::<ContextMode>()?)));
    match prepared {
        Ok((xpath, mode)) => xpath.evaluate(tree, mode),
        Err(err) => XPathResult::failed(query, &err),
    }
}
