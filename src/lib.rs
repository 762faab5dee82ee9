//! shconf - Indented configuration text as queryable trees
//!
//! The pipeline is:
//!
//! 1. [`tree::build_tree`] rebuilds the hierarchy of indented lines into a
//!    line-keyed [`LineTree`].
//! 2. [`tree::Normalize`] splits every key into single tokens, producing a
//!    [`TokenMap`] and a list of conflicts it had to resolve.
//! 3. [`query::evaluate`] runs a path expression such as
//!    `/interface[FastEthernet*]/duplex` against the token-keyed tree.
//!
//! ```
//! use shconf::{evaluate, parse_config, BuildOptions, ConfigTree, NormalizeOptions};
//!
//! let text = "hostname R1\ninterface Fa0/0\n duplex auto\n";
//! let normalized = parse_config(text.lines(), &BuildOptions::default(), &NormalizeOptions::default());
//! let tree = ConfigTree::from(normalized);
//!
//! let result = evaluate(&tree, "/interface/*/duplex", "none");
//! assert!(result.success);
//! assert_eq!(result.count, 1);
//! ```

pub mod cli;
pub mod commands;
pub mod core;
pub mod query;
pub mod sections;
pub mod tree;

pub use crate::core::error::{Error, Result};
pub use crate::query::{evaluate, ContextMode, QueryError, XPath, XPathResult};
pub use crate::sections::{split_sections, SectionMap};
pub use crate::tree::{
    build_tree, parse_config, BuildOptions, ConfigTree, LineTree, Normalize, NormalizeOptions, Normalized,
    TokenMap, Value,
};
