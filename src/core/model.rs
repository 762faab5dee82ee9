//! Unified Result Model
//!
//! Every subcommand maps its output to [`ResultItem`]s before rendering, so
//! all formats see the same shape.

use serde::Serialize;

use crate::tree::Anomaly;

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A built tree (normalized or line-keyed)
    Tree,
    /// An evaluated path expression
    Query,
    /// A section of a multi-command dump
    Section,
    /// A key found by regex search
    Match,
    Error,
}

/// Metadata for a result item
#[derive(Debug, Clone, Default, Serialize)]
pub struct Meta {
    /// Input lines considered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,

    /// Nesting depth of the tree
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,

    /// Whether the input was truncated while reading
    pub truncated: bool,

    /// Whether invalid UTF-8 was replaced while reading
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub lossy: bool,

    /// Shape conflicts resolved during normalization
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<Anomaly>,
}

/// Error information for a result
#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub code: String,
    pub message: String,
}

impl ItemError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The unified result item that all commands produce
#[derive(Debug, Clone, Serialize)]
pub struct ResultItem {
    pub kind: Kind,

    /// Input file the item came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Section name, when the input was split
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Structured payload (tree, query result, section summary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Plain-text rendering used by the raw format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    pub meta: Meta,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
}

impl ResultItem {
    fn new(kind: Kind, path: Option<String>) -> Self {
        Self {
            kind,
            path,
            section: None,
            data: None,
            excerpt: None,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self::new(Kind::Tree, Some(path.into()))
    }

    pub fn query(path: impl Into<String>) -> Self {
        Self::new(Kind::Query, Some(path.into()))
    }

    pub fn section(path: impl Into<String>, name: impl Into<String>) -> Self {
        let mut item = Self::new(Kind::Section, Some(path.into()));
        item.section = Some(name.into());
        item
    }

    pub fn match_result(path: impl Into<String>, key: impl Into<String>) -> Self {
        let mut item = Self::new(Kind::Match, Some(path.into()));
        item.excerpt = Some(key.into());
        item
    }

    pub fn error(error: ItemError) -> Self {
        let mut item = Self::new(Kind::Error, None);
        item.errors.push(error);
        item
    }

    pub fn with_section(mut self, section: Option<&str>) -> Self {
        self.section = section.map(str::to_string);
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Set structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_error(mut self, error: ItemError) -> Self {
        self.errors.push(error);
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
