//! Hierarchy builder
//!
//! Rebuilds parent/child structure from indentation alone. A stack of open
//! `(indent, node)` pairs is kept; every line pops entries whose indent is
//! greater than or equal to its own, then attaches to whatever is left on top
//! (or to the top level when the stack is empty).

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::tree::line::{config_lines, BuildOptions, ConfigLine};

/// A node of the line-keyed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineNode {
    /// No children
    Leaf,
    /// Ordered children
    Branch(LineTree),
}

impl LineNode {
    pub fn children(&self) -> Option<&LineTree> {
        match self {
            LineNode::Leaf => None,
            LineNode::Branch(tree) => Some(tree),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, LineNode::Leaf)
    }
}

/// Line-keyed tree: each key is a whole trimmed input line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTree {
    nodes: IndexMap<String, LineNode>,
}

impl LineTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LineNode> {
        self.nodes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LineNode)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert a node, replacing any existing node with the same key in place
    pub fn insert(&mut self, key: impl Into<String>, node: LineNode) {
        self.nodes.insert(key.into(), node);
    }

    /// Number of key levels (0 for an empty tree)
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((tree, level)) = pending.pop() {
            if tree.is_empty() {
                continue;
            }
            max = max.max(level);
            for node in tree.nodes.values() {
                if let LineNode::Branch(child) = node {
                    pending.push((child, level + 1));
                }
            }
        }
        max
    }

    /// Total number of nodes at every level
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(tree) = pending.pop() {
            count += tree.len();
            pending.extend(tree.nodes.values().filter_map(LineNode::children));
        }
        count
    }

    /// Re-render as indented text, `indent` spaces per level
    pub fn to_text(&self, indent: usize) -> String {
        let mut out = String::new();
        let mut pending: Vec<(&str, &LineNode, usize)> = self
            .nodes
            .iter()
            .rev()
            .map(|(k, v)| (k.as_str(), v, 0))
            .collect();

        while let Some((key, node, level)) = pending.pop() {
            out.push_str(&" ".repeat(level * indent));
            out.push_str(key);
            out.push('\n');
            if let LineNode::Branch(children) = node {
                pending.extend(
                    children
                        .nodes
                        .iter()
                        .rev()
                        .map(|(k, v)| (k.as_str(), v, level + 1)),
                );
            }
        }
        out
    }
}

impl Drop for LineTree {
    fn drop(&mut self) {
        if self.nodes.values().all(LineNode::is_leaf) {
            return;
        }
        let mut pending = vec![std::mem::take(&mut self.nodes)];
        while let Some(nodes) = pending.pop() {
            for (_, node) in nodes {
                if let LineNode::Branch(mut child) = node {
                    pending.push(std::mem::take(&mut child.nodes));
                }
            }
        }
    }
}

impl Serialize for LineTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.nodes.len()))?;
        for (key, node) in &self.nodes {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

impl Serialize for LineNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LineNode::Leaf => serializer.serialize_str(""),
            LineNode::Branch(tree) => tree.serialize(serializer),
        }
    }
}

/// Arena slot used while building; children hold slot indexes
#[derive(Default)]
struct Slot {
    children: IndexMap<String, usize>,
}

const ROOT: usize = 0;

/// Build a line-keyed tree from raw text lines
pub fn build_tree<I, S>(lines: I, options: &BuildOptions) -> LineTree
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    build_from_lines(&config_lines(lines, options))
}

/// Build a line-keyed tree from measured lines. Never fails.
pub fn build_from_lines(lines: &[ConfigLine]) -> LineTree {
    let mut slots = vec![Slot::default()];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut merged = 0usize;

    for line in lines {
        while stack.last().is_some_and(|&(indent, _)| indent >= line.indent) {
            stack.pop();
        }
        let parent = stack.last().map_or(ROOT, |&(_, slot)| slot);

        let next = slots.len();
        let slot = *slots[parent]
            .children
            .entry(line.text.clone())
            .or_insert(next);
        if slot == next {
            slots.push(Slot::default());
        } else {
            merged += 1;
            debug!(line = line.position, text = %line.text, "merged duplicate sibling");
        }

        stack.push((line.indent, slot));
    }

    debug!(
        lines = lines.len(),
        nodes = slots.len() - 1,
        merged,
        "built line tree"
    );
    assemble(slots)
}

/// Children are always allocated after their parent, so walking the arena
/// backwards finishes every subtree before its parent needs it.
fn assemble(slots: Vec<Slot>) -> LineTree {
    let mut built: Vec<LineTree> = (0..slots.len()).map(|_| LineTree::new()).collect();

    for (idx, slot) in slots.into_iter().enumerate().rev() {
        let mut tree = LineTree::new();
        for (key, child) in slot.children {
            let subtree = std::mem::take(&mut built[child]);
            let node = if subtree.is_empty() {
                LineNode::Leaf
            } else {
                LineNode::Branch(subtree)
            };
            tree.insert(key, node);
        }
        built[idx] = tree;
    }

    std::mem::take(&mut built[ROOT])
}
