//! Tree module - From indented text to queryable trees
//!
//! Provides:
//! - line: input lines and indentation measurement
//! - builder: line-keyed tree from indentation (hierarchy builder)
//! - value: token-keyed values and maps
//! - normalize: line-keyed → token-keyed (token normalizer)
//! - search: regex search over line-keyed keys

pub mod builder;
pub mod line;
pub mod normalize;
pub mod search;
pub mod value;

pub use builder::{build_from_lines, build_tree, LineNode, LineTree};
pub use line::{BuildOptions, ConfigLine};
pub use normalize::{Anomaly, ConflictPolicy, Normalize, NormalizeOptions, Normalized};
pub use value::{ShapeError, TokenMap, Value, ValueKind};

/// A tree together with the shape it is in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigTree {
    /// Whole lines as keys, as produced by the hierarchy builder
    Lines(LineTree),
    /// Single tokens as keys, as produced by the normalizer
    Tokens(TokenMap),
}

impl ConfigTree {
    pub fn is_normalized(&self) -> bool {
        matches!(self, ConfigTree::Tokens(_))
    }
}

impl From<LineTree> for ConfigTree {
    fn from(tree: LineTree) -> Self {
        ConfigTree::Lines(tree)
    }
}

impl From<TokenMap> for ConfigTree {
    fn from(map: TokenMap) -> Self {
        ConfigTree::Tokens(map)
    }
}

impl From<Normalized> for ConfigTree {
    fn from(normalized: Normalized) -> Self {
        ConfigTree::Tokens(normalized.map)
    }
}

/// Build and normalize in one step
pub fn parse_config<I, S>(lines: I, build: &BuildOptions, normalize: &NormalizeOptions) -> Normalized
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    build_tree(lines, build).normalize(normalize)
}
