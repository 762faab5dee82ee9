//! Regex search over line-keyed tree keys
//!
//! Patterns are matched from the start of each key, so `interface` finds
//! `interface FastEthernet0/0` but `Ethernet` does not.

use regex::Regex;

use crate::tree::builder::{LineNode, LineTree};

/// Compile a search pattern, ignoring surrounding whitespace
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern.trim())
}

fn matches_at_start(re: &Regex, key: &str) -> bool {
    re.find(key).is_some_and(|m| m.start() == 0)
}

/// First top-level key matching `re`
pub fn search_in_tree<'t>(re: &Regex, tree: &'t LineTree) -> Option<&'t str> {
    tree.keys().find(|key| matches_at_start(re, key))
}

/// Every top-level key matching `re`, in tree order
pub fn search_all_in_tree<'t>(re: &Regex, tree: &'t LineTree) -> Vec<&'t str> {
    tree.keys().filter(|key| matches_at_start(re, key)).collect()
}

/// First key matching `re`, searching depth-first at most `level` levels
/// below the top
pub fn search_in_tree_level<'t>(re: &Regex, tree: &'t LineTree, level: usize) -> Option<&'t str> {
    let mut pending: Vec<(&str, &LineNode, usize)> = Vec::new();
    push_children(&mut pending, tree, level);

    while let Some((key, node, remaining)) = pending.pop() {
        if matches_at_start(re, key) {
            return Some(key);
        }
        if let (LineNode::Branch(children), Some(below)) = (node, remaining.checked_sub(1)) {
            push_children(&mut pending, children, below);
        }
    }
    None
}

fn push_children<'t>(pending: &mut Vec<(&'t str, &'t LineNode, usize)>, tree: &'t LineTree, level: usize) {
    let start = pending.len();
    pending.extend(tree.iter().map(|(k, v)| (k, v, level)));
    pending[start..].reverse();
}
