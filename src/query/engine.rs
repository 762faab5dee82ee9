//! Query walk over a token-keyed tree
//!
//! The walk keeps its own stack of frames instead of recursing, so very deep
//! trees cost heap, not call stack. Frames are pushed in reverse so they pop
//! in key order, which keeps matches in pre-order.

use tracing::debug;

use super::parser::{Selector, Step, XPath};
use super::result::{ContextMode, XPathResult};
use super::QueryError;
use crate::tree::{ConfigTree, TokenMap, Value};

#[derive(Debug, Clone, Copy)]
enum Node<'t> {
    Root(&'t TokenMap),
    Child(&'t Value),
}

impl<'t> Node<'t> {
    fn as_map(self) -> Option<&'t TokenMap> {
        match self {
            Node::Root(map) => Some(map),
            Node::Child(value) => value.as_map(),
        }
    }

    fn to_value(self) -> Value {
        match self {
            Node::Root(map) => Value::Map(map.clone()),
            Node::Child(value) => value.clone(),
        }
    }
}

struct Frame<'t> {
    node: Node<'t>,
    path: Vec<&'t str>,
    step: usize,
    fanout: Option<usize>,
}

impl<'t> Frame<'t> {
    fn child(&self, key: &'t str, value: &'t Value, fanout: Option<usize>) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(key);
        Frame {
            node: Node::Child(value),
            path,
            step: self.step + 1,
            fanout,
        }
    }
}

/// One match, borrowed from the tree it was found in
#[derive(Debug, Clone)]
pub struct Hit<'t> {
    node: Node<'t>,
    path: Vec<&'t str>,
    fanout: Option<usize>,
}

impl<'t> Hit<'t> {
    /// Keys walked from the root to this match
    pub fn path(&self) -> &[&'t str] {
        &self.path
    }

    /// The matched value itself
    pub fn value(&self) -> Value {
        self.node.to_value()
    }

    /// The matched value wrapped in the keys `mode` asks for
    pub fn shape(&self, mode: ContextMode) -> Value {
        let value = self.value();
        match mode {
            ContextMode::None => value,
            ContextMode::Full => value.nest(self.path.iter().copied()),
            ContextMode::Partial => {
                let start = self
                    .fanout
                    .unwrap_or_else(|| self.path.len().saturating_sub(1));
                value.nest(self.path[start..].iter().copied())
            }
        }
    }
}

impl XPath {
    /// Walk `map` and collect every match in order
    pub fn select<'t>(&self, map: &'t TokenMap) -> Vec<Hit<'t>> {
        let steps = self.steps();
        let mut hits = Vec::new();
        let mut pending = vec![Frame {
            node: Node::Root(map),
            path: Vec::new(),
            step: 0,
            fanout: None,
        }];

        while let Some(frame) = pending.pop() {
            let Some(step) = steps.get(frame.step) else {
                hits.push(Hit {
                    node: frame.node,
                    path: frame.path,
                    fanout: frame.fanout,
                });
                continue;
            };
            let Some(children) = frame.node.as_map() else {
                continue;
            };
            let mark = pending.len();

            match step {
                Step::Select(Selector::Key(key)) => {
                    if let Some((key, value)) = children.get_key_value(key) {
                        pending.push(frame.child(key, value, frame.fanout));
                    }
                }
                Step::Select(selector) => {
                    let fanout = Some(frame.path.len());
                    for (key, value) in children.iter() {
                        let keep = match selector {
                            Selector::Glob(pattern) => pattern.is_match(key),
                            Selector::Any | Selector::Key(_) => true,
                        };
                        if keep {
                            pending.push(frame.child(key, value, fanout));
                        }
                    }
                }
                Step::Descend => {
                    // Nested mappings keep this step so they descend further.
                    for (key, value) in children.iter() {
                        if value.as_map().is_some() {
                            let mut below = frame.child(key, value, frame.fanout);
                            below.step = frame.step;
                            pending.push(below);
                        }
                    }
                    // The current mapping resumes at the next step first.
                    let fanout = frame.path.len().checked_sub(1).or(frame.fanout);
                    pending.push(Frame {
                        node: frame.node,
                        path: frame.path,
                        step: frame.step + 1,
                        fanout,
                    });
                    let end = pending.len() - 1;
                    pending[mark..end].reverse();
                    continue;
                }
            }
            pending[mark..].reverse();
        }
        hits
    }

    /// Run against `tree`, folding shape errors into the result
    pub fn evaluate(&self, tree: &ConfigTree, mode: ContextMode) -> XPathResult {
        let map = match check_shape(tree) {
            Ok(map) => map,
            Err(err) => return XPathResult::failed(self.as_str(), &err),
        };
        let hits = self.select(map);
        debug!(
            query = %self,
            recursive = self.is_recursive(),
            matches = hits.len(),
            "evaluated query"
        );

        let matches = hits.iter().map(|hit| hit.shape(mode)).collect();
        let paths = hits
            .iter()
            .map(|hit| hit.path.iter().map(|k| k.to_string()).collect())
            .collect();
        XPathResult::from_matches(self.as_str(), matches, paths)
    }
}

fn check_shape(tree: &ConfigTree) -> Result<&TokenMap, QueryError> {
    match tree {
        ConfigTree::Lines(_) => Err(QueryError::UnsupportedShape(
            "got a line-keyed tree".to_string(),
        )),
        ConfigTree::Tokens(map) => match map.find_unsplit_key() {
            Some(key) => Err(QueryError::UnsupportedShape(format!(
                "key '{}' is not a single token",
                key
            ))),
            None => Ok(map),
        },
    }
}
