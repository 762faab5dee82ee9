//! Token normalizer
//!
//! Re-keys a line-keyed tree by whitespace-delimited tokens:
//!
//! - a line with children turns every token into a key level and hangs the
//!   normalized children under the last one
//!   (`interface Fa0/0 {..}` → `interface: {Fa0/0: {..}}`)
//! - a childless line turns all but its last token into key levels and keeps
//!   the last token as the value (`hostname R1` → `hostname: R1`); a single
//!   token becomes a key with [`Value::Present`]
//!
//! Siblings that share leading tokens are merged into one branch, splitting at
//! the first token where they differ. When one path would need to be both a
//! scalar and a mapping the [`ConflictPolicy`] decides, and the loser is kept
//! as an [`Anomaly`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::tree::builder::{LineNode, LineTree};
use crate::tree::value::{TokenMap, Value, ValueKind};

/// What to keep when two sources disagree about the shape of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Mapping beats scalar beats present; the later one wins a tie
    #[default]
    Richer,
    /// Keep whatever arrived first
    First,
    /// Keep whatever arrived last
    Last,
}

impl ConflictPolicy {
    fn rank(kind: ValueKind) -> u8 {
        match kind {
            ValueKind::Present => 0,
            ValueKind::Scalar => 1,
            ValueKind::Map => 2,
        }
    }

    fn prefers_incoming(&self, existing: ValueKind, incoming: ValueKind) -> bool {
        match self {
            ConflictPolicy::Richer => Self::rank(incoming) >= Self::rank(existing),
            ConflictPolicy::First => false,
            ConflictPolicy::Last => true,
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "richer" => Ok(ConflictPolicy::Richer),
            "first" => Ok(ConflictPolicy::First),
            "last" => Ok(ConflictPolicy::Last),
            _ => Err(format!("Unknown conflict policy: {}", s)),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictPolicy::Richer => "richer",
            ConflictPolicy::First => "first",
            ConflictPolicy::Last => "last",
        };
        write!(f, "{}", name)
    }
}

/// Normalizer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizeOptions {
    pub conflict: ConflictPolicy,

    /// Cap on key levels taken from a childless line. `None` splits every
    /// token but the last; `Some(2)` turns `ip address 1.1.1.1 255.0.0.0` into
    /// `ip: {address: "1.1.1.1 255.0.0.0"}`.
    pub leaf_depth: Option<usize>,
}

/// A shape conflict resolved during normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    /// Key path where the conflict happened
    pub path: Vec<String>,
    pub kept: ValueKind,
    pub discarded: ValueKind,
    /// Text of the discarded value when it was a scalar
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discarded_value: Option<String>,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: kept {}, discarded {}",
            self.path.join(" "),
            self.kept,
            self.discarded
        )?;
        if let Some(value) = &self.discarded_value {
            write!(f, " '{}'", value)?;
        }
        Ok(())
    }
}

/// Token-keyed tree plus the conflicts resolved while building it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub map: TokenMap,
    pub anomalies: Vec<Anomaly>,
}

/// Anything that can be re-expressed as a token-keyed tree
pub trait Normalize {
    fn normalize(&self, options: &NormalizeOptions) -> Normalized;
}

impl Normalize for LineTree {
    fn normalize(&self, options: &NormalizeOptions) -> Normalized {
        let roots = self.iter().map(|(text, node)| Source::Line(text, node)).collect();
        Normalizer::new(options).run(roots)
    }
}

/// Normalizing a normalized tree returns it unchanged; keys that still
/// contain whitespace are split and merged like line text.
impl Normalize for TokenMap {
    fn normalize(&self, options: &NormalizeOptions) -> Normalized {
        let roots = self.iter().map(|(key, value)| Source::Token(key, value)).collect();
        Normalizer::new(options).run(roots)
    }
}

/// One entry of the input tree still to be placed
#[derive(Clone, Copy)]
enum Source<'s> {
    Line(&'s str, &'s LineNode),
    Token(&'s str, &'s Value),
}

/// What an entry contributes below its key path
enum Content<'s> {
    Leaf(Value),
    Lines(&'s LineTree),
    Tokens(&'s TokenMap),
}

struct Pending<'s> {
    source: Source<'s>,
    /// Output map the entry is placed under
    dest: usize,
    /// Key count of the path leading to `dest`
    depth: usize,
}

/// Output slot: a leaf value or a nested map in the arena
enum Slot {
    Leaf(Value),
    Map(usize),
}

impl Slot {
    fn kind(&self) -> ValueKind {
        match self {
            Slot::Leaf(value) => value.kind(),
            Slot::Map(_) => ValueKind::Map,
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            Slot::Leaf(value) => value.as_str().map(str::to_string),
            Slot::Map(_) => None,
        }
    }
}

#[derive(Default)]
struct MapNode {
    entries: IndexMap<String, Slot>,
}

const ROOT: usize = 0;

/// Places entries in document order with an explicit worklist. Output maps
/// live in an arena and are linked by index, so nesting depth never turns
/// into call depth.
struct Normalizer<'o> {
    options: &'o NormalizeOptions,
    anomalies: Vec<Anomaly>,
    arena: Vec<MapNode>,
    /// Keys from the root to the slot being placed
    trail: Vec<String>,
}

impl<'o> Normalizer<'o> {
    fn new(options: &'o NormalizeOptions) -> Self {
        Self {
            options,
            anomalies: Vec::new(),
            arena: vec![MapNode::default()],
            trail: Vec::new(),
        }
    }

    fn run<'s>(mut self, roots: Vec<Source<'s>>) -> Normalized {
        let mut pending: Vec<Pending<'s>> = roots
            .into_iter()
            .rev()
            .map(|source| Pending {
                source,
                dest: ROOT,
                depth: 0,
            })
            .collect();

        while let Some(item) = pending.pop() {
            self.trail.truncate(item.depth);
            let (path, content) = self.split(item.source);
            let children: Vec<Source<'s>> = match content {
                Content::Leaf(value) => {
                    self.place_leaf(item.dest, &path, value);
                    continue;
                }
                Content::Lines(tree) => tree.iter().map(|(t, n)| Source::Line(t, n)).collect(),
                Content::Tokens(map) => map.iter().map(|(k, v)| Source::Token(k, v)).collect(),
            };
            // A branch that lost a conflict takes its children with it.
            let Some(dest) = self.descend(item.dest, &path) else {
                continue;
            };
            let depth = self.trail.len();
            pending.extend(
                children
                    .into_iter()
                    .rev()
                    .map(|source| Pending { source, dest, depth }),
            );
        }

        debug!(
            maps = self.arena.len(),
            anomalies = self.anomalies.len(),
            "normalized tree"
        );
        Normalized {
            map: assemble(self.arena),
            anomalies: self.anomalies,
        }
    }

    /// Key path of an entry and what hangs below it
    fn split<'s>(&self, source: Source<'s>) -> (Vec<String>, Content<'s>) {
        match source {
            Source::Line(text, LineNode::Leaf) => {
                let tokens: Vec<&str> = text.split_whitespace().collect();
                let (path, value) = self.split_leaf(&tokens);
                (path, Content::Leaf(value))
            }
            Source::Line(text, LineNode::Branch(children)) => {
                (text.split_whitespace().map(str::to_string).collect(), Content::Lines(children))
            }
            Source::Token(key, value) => {
                let mut path: Vec<String> = key.split_whitespace().map(str::to_string).collect();
                if path.is_empty() {
                    path.push(key.to_string());
                }
                let content = match value {
                    Value::Map(child) => Content::Tokens(child),
                    Value::Scalar(_) | Value::Present => Content::Leaf(value.clone()),
                };
                (path, content)
            }
        }
    }

    fn split_leaf(&self, tokens: &[&str]) -> (Vec<String>, Value) {
        match tokens {
            [] => (Vec::new(), Value::Present),
            [only] => (vec![only.to_string()], Value::Present),
            _ => {
                let max_keys = tokens.len() - 1;
                let keys = self
                    .options
                    .leaf_depth
                    .map_or(max_keys, |depth| depth.clamp(1, max_keys));
                let value = tokens[keys..].join(" ");
                (owned(&tokens[..keys]), Value::Scalar(value))
            }
        }
    }

    /// Follow `keys` down from `node`, creating maps on the way. `None` when
    /// a conflict kept a non-map value somewhere on the path.
    fn descend(&mut self, mut node: usize, keys: &[String]) -> Option<usize> {
        for key in keys {
            node = self.child_map(node, key)?;
        }
        Some(node)
    }

    fn child_map(&mut self, node: usize, key: &str) -> Option<usize> {
        self.trail.push(key.to_string());
        let existing = self.arena[node].entries.get(key).map(|slot| match slot {
            Slot::Map(child) => Ok(*child),
            Slot::Leaf(value) => Err(value.kind()),
        });
        match existing {
            Some(Ok(child)) => return Some(child),
            Some(Err(kind)) if !self.options.conflict.prefers_incoming(kind, ValueKind::Map) => {
                self.record(kind, ValueKind::Map, None);
                return None;
            }
            Some(Err(_)) | None => {}
        }

        let child = self.arena.len();
        self.arena.push(MapNode::default());
        if let Some(old) = self.arena[node].entries.insert(key.to_string(), Slot::Map(child)) {
            self.record(ValueKind::Map, old.kind(), old.text());
        }
        Some(child)
    }

    fn place_leaf(&mut self, dest: usize, path: &[String], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let Some(node) = self.descend(dest, parents) else {
            return;
        };
        self.trail.push(last.clone());

        let existing = self.arena[node]
            .entries
            .get(last.as_str())
            .map(|slot| (slot.kind(), matches!(slot, Slot::Leaf(v) if *v == value)));
        match existing {
            None => {
                self.arena[node].entries.insert(last.clone(), Slot::Leaf(value));
            }
            Some((_, true)) => {}
            Some((kind, false)) => {
                let incoming = value.kind();
                if self.options.conflict.prefers_incoming(kind, incoming) {
                    if let Some(old) = self.arena[node].entries.insert(last.clone(), Slot::Leaf(value)) {
                        self.record(incoming, old.kind(), old.text());
                    }
                } else {
                    self.record(kind, incoming, value.as_str().map(str::to_string));
                }
            }
        }
    }

    fn record(&mut self, kept: ValueKind, discarded: ValueKind, discarded_value: Option<String>) {
        let anomaly = Anomaly {
            path: self.trail.clone(),
            kept,
            discarded,
            discarded_value,
        };
        warn!(anomaly = %anomaly, "conflicting shapes for one key");
        self.anomalies.push(anomaly);
    }
}

/// Child maps are always allocated after their parent, so walking the arena
/// backwards finishes every map before its parent takes it. Maps orphaned by
/// a conflict are built and dropped.
fn assemble(arena: Vec<MapNode>) -> TokenMap {
    let mut built: Vec<TokenMap> = (0..arena.len()).map(|_| TokenMap::new()).collect();

    for (idx, node) in arena.into_iter().enumerate().rev() {
        let map: TokenMap = node
            .entries
            .into_iter()
            .map(|(key, slot)| {
                let value = match slot {
                    Slot::Leaf(value) => value,
                    Slot::Map(child) => Value::Map(std::mem::take(&mut built[child])),
                };
                (key, value)
            })
            .collect();
        built[idx] = map;
    }

    std::mem::take(&mut built[ROOT])
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::builder::{build_from_lines, build_tree};
    use crate::tree::line::{BuildOptions, ConfigLine};

    /// Deep enough to overflow a test thread's stack if any step recursed per level
    const DEEP: usize = 20_000;

    fn normalize_lines(lines: &[&str]) -> Normalized {
        normalize_with(lines, NormalizeOptions::default())
    }

    fn normalize_with(lines: &[&str], options: NormalizeOptions) -> Normalized {
        build_tree(lines.iter().copied(), &BuildOptions::default()).normalize(&options)
    }

    fn json(map: &TokenMap) -> String {
        serde_json::to_string(map).unwrap()
    }

    #[test]
    fn test_leaf_last_token_is_value() {
        let out = normalize_lines(&["hostname R1", "ip routing", "shutdown"]);
        assert_eq!(
            json(&out.map),
            r#"{"hostname":"R1","ip":"routing","shutdown":null}"#
        );
    }

    #[test]
    fn test_container_tokens_all_become_keys() {
        let out = normalize_lines(&[
            "interface FastEthernet0/0",
            " duplex auto",
            "interface FastEthernet0/1",
            " duplex auto",
        ]);
        assert_eq!(
            json(&out.map),
            r#"{"interface":{"FastEthernet0/0":{"duplex":"auto"},"FastEthernet0/1":{"duplex":"auto"}}}"#
        );
        assert!(out.anomalies.is_empty());
    }

    #[test]
    fn test_slash_stays_inside_token() {
        let out = normalize_lines(&["interface GigabitEthernet0/0/1", " shutdown"]);
        let interface = out.map.get("interface").and_then(Value::as_map).unwrap();
        assert!(interface.contains_key("GigabitEthernet0/0/1"));
    }

    #[test]
    fn test_merge_at_longest_common_prefix() {
        let out = normalize_lines(&[
            "ip domain lookup source-interface Lo0",
            "ip domain name example.com",
            "ip route 0.0.0.0 0.0.0.0 10.0.0.1",
        ]);
        assert_eq!(
            json(&out.map),
            concat!(
                r#"{"ip":{"domain":{"lookup":{"source-interface":"Lo0"},"name":"example.com"},"#,
                r#""route":{"0.0.0.0":{"0.0.0.0":"10.0.0.1"}}}}"#
            )
        );
    }

    #[test]
    fn test_first_seen_order_per_level() {
        let out = normalize_lines(&["b one 1", "a two 2", "b three 3"]);
        assert_eq!(out.map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        let b = out.map.get("b").and_then(Value::as_map).unwrap();
        assert_eq!(b.keys().collect::<Vec<_>>(), vec!["one", "three"]);
    }

    #[test]
    fn test_nested_beats_scalar_with_anomaly() {
        let out = normalize_lines(&["mode auto", "mode", " auto extra"]);
        assert_eq!(json(&out.map), r#"{"mode":{"auto":"extra"}}"#);
        assert_eq!(out.anomalies.len(), 1);
        let anomaly = &out.anomalies[0];
        assert_eq!(anomaly.path, vec!["mode".to_string()]);
        assert_eq!(anomaly.kept, ValueKind::Map);
        assert_eq!(anomaly.discarded, ValueKind::Scalar);
        assert_eq!(anomaly.discarded_value.as_deref(), Some("auto"));
    }

    #[test]
    fn test_nested_wins_regardless_of_order() {
        let out = normalize_lines(&["mode auto extra", "mode auto"]);
        assert_eq!(json(&out.map), r#"{"mode":{"auto":"extra"}}"#);
        assert_eq!(out.anomalies.len(), 1);
        assert_eq!(out.anomalies[0].kept, ValueKind::Map);
    }

    #[test]
    fn test_conflict_policy_first() {
        let options = NormalizeOptions {
            conflict: ConflictPolicy::First,
            ..Default::default()
        };
        let out = normalize_with(&["mode auto", "mode auto extra"], options);
        assert_eq!(json(&out.map), r#"{"mode":"auto"}"#);
        assert_eq!(out.anomalies[0].discarded, ValueKind::Map);
    }

    #[test]
    fn test_scalar_tie_keeps_later_value() {
        let out = normalize_lines(&["description uplink", "description core"]);
        assert_eq!(json(&out.map), r#"{"description":"core"}"#);
        assert_eq!(out.anomalies[0].discarded_value.as_deref(), Some("uplink"));
    }

    #[test]
    fn test_identical_lines_are_not_anomalies() {
        let out = normalize_lines(&["vlan 10", " name users", "vlan 10 name users"]);
        assert_eq!(json(&out.map), r#"{"vlan":{"10":{"name":"users"}}}"#);
        assert!(out.anomalies.is_empty());
    }

    #[test]
    fn test_leaf_depth_two() {
        let options = NormalizeOptions {
            leaf_depth: Some(2),
            ..Default::default()
        };
        let out = normalize_with(
            &[
                "hostname R1",
                "interface FastEthernet0/0",
                " ip address 1.1.1.1 255.255.255.0",
            ],
            options,
        );
        assert_eq!(
            json(&out.map),
            r#"{"hostname":"R1","interface":{"FastEthernet0/0":{"ip":{"address":"1.1.1.1 255.255.255.0"}}}}"#
        );
    }

    #[test]
    fn test_idempotent_on_normalized_map() {
        let out = normalize_lines(&[
            "hostname R1",
            "interface FastEthernet0/0",
            " ip address 1.1.1.1 255.255.255.0",
            " duplex auto",
            "line vty 0 4",
            " login",
        ]);
        let again = out.map.normalize(&NormalizeOptions::default());
        assert_eq!(json(&again.map), json(&out.map));
        assert!(again.anomalies.is_empty());
    }

    #[test]
    fn test_token_map_with_spaced_keys_is_split() {
        let legacy: TokenMap = [("hostname R1", Value::Present)].into_iter().collect();
        let out = legacy.normalize(&NormalizeOptions::default());
        assert_eq!(json(&out.map), r#"{"hostname":{"R1":null}}"#);
    }

    #[test]
    fn test_deep_line_tree() {
        let lines: Vec<ConfigLine> = (0..DEEP)
            .map(|i| ConfigLine {
                text: format!("level {}", i),
                indent: i,
                position: i,
            })
            .collect();
        let tree = build_from_lines(&lines);
        assert_eq!(tree.depth(), DEEP);

        let out = tree.normalize(&NormalizeOptions::default());
        assert!(out.anomalies.is_empty());
        assert_eq!(out.map.depth(), 2 * DEEP - 1);

        let mut map = &out.map;
        for i in 0..DEEP - 1 {
            map = map
                .get("level")
                .and_then(Value::as_map)
                .and_then(|levels| levels.get(&i.to_string()))
                .and_then(Value::as_map)
                .unwrap();
        }
        let last = (DEEP - 1).to_string();
        assert_eq!(map.get("level").and_then(Value::as_str), Some(last.as_str()));
    }

    #[test]
    fn test_deep_token_map() {
        let nested = (0..DEEP).fold(Value::from("auto"), |inner, _| inner.nest(["mode x"]));
        let Value::Map(deep) = nested else {
            panic!("expected a map");
        };
        let out = deep.normalize(&NormalizeOptions::default());
        assert_eq!(out.map.depth(), 2 * DEEP);
        assert!(out.anomalies.is_empty());
    }

    #[test]
    fn test_losing_branch_drops_its_children() {
        let options = NormalizeOptions {
            conflict: ConflictPolicy::First,
            ..Default::default()
        };
        let out = normalize_with(&["mode auto", "mode", " auto extra", "hostname R1"], options);
        assert_eq!(json(&out.map), r#"{"mode":"auto","hostname":"R1"}"#);
        assert_eq!(out.anomalies.len(), 1);
        assert_eq!(out.anomalies[0].path, vec!["mode".to_string()]);
        assert_eq!(out.anomalies[0].discarded, ValueKind::Map);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("richer".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Richer);
        assert_eq!("LAST".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Last);
        assert!("other".parse::<ConflictPolicy>().is_err());
    }
}
