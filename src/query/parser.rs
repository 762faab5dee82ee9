//! Path expression parser
//!
//! A query compiles into a flat list of [`Step`]s. Each bracketed or starred
//! pattern is compiled to a regex once here, so matching a key during the walk
//! is a single `is_match`.

use regex::{Regex, RegexBuilder};
use std::fmt;

use super::QueryError;

/// How one step picks keys at the current level
#[derive(Debug, Clone)]
pub enum Selector {
    /// Exact, case-sensitive key
    Key(String),
    /// `*`: every key
    Any,
    /// Glob match, case-insensitive
    Glob(KeyPattern),
}

#[derive(Debug, Clone)]
pub enum Step {
    /// Pick children of the current mapping
    Select(Selector),
    /// Continue from the current mapping and every mapping below it
    Descend,
}

/// A `*` glob compiled to an anchored regex
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Result<Self, QueryError> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = RegexBuilder::new(&format!("^{}$", body))
            .case_insensitive(true)
            .build()
            .map_err(|source| QueryError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// A parsed, reusable path expression
#[derive(Debug, Clone)]
pub struct XPath {
    source: String,
    steps: Vec<Step>,
}

impl XPath {
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::Empty);
        }
        let Some(rest) = query.strip_prefix('/') else {
            return Err(QueryError::MissingLeadingSlash(query.to_string()));
        };

        let mut steps = Vec::new();
        if rest.is_empty() {
            return Ok(Self {
                source: query.to_string(),
                steps,
            });
        }

        let mut pieces = split_segments(rest)?;
        if pieces.len() > 1 && pieces.last().is_some_and(|p| p.is_empty()) {
            pieces.pop();
        }

        for piece in pieces {
            if piece.is_empty() {
                if !matches!(steps.last(), Some(Step::Descend)) {
                    steps.push(Step::Descend);
                }
                continue;
            }
            parse_segment(piece.trim(), &mut steps)?;
        }
        if matches!(steps.last(), Some(Step::Descend)) {
            return Err(QueryError::EmptyRecursive);
        }

        Ok(Self {
            source: query.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Whether the path searches from every depth
    pub fn is_recursive(&self) -> bool {
        self.steps.iter().any(|step| matches!(step, Step::Descend))
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::str::FromStr for XPath {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split on `/`, leaving slashes inside `[...]` alone
fn split_segments(rest: &str) -> Result<Vec<&str>, QueryError> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut open: Option<usize> = None;

    for (i, c) in rest.char_indices() {
        match c {
            '[' if open.is_none() => open = Some(i),
            ']' if open.is_some() => open = None,
            '[' | ']' => return Err(QueryError::MalformedPredicate(rest.to_string())),
            '/' if open.is_none() => {
                pieces.push(&rest[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if open.is_some() {
        return Err(QueryError::MalformedPredicate(rest[start..].to_string()));
    }
    pieces.push(&rest[start..]);
    Ok(pieces)
}

fn parse_segment(segment: &str, steps: &mut Vec<Step>) -> Result<(), QueryError> {
    let Some((key, tail)) = segment.split_once('[') else {
        steps.push(Step::Select(parse_selector(segment)?));
        return Ok(());
    };
    let pattern = match tail.strip_suffix(']') {
        Some(pattern) if !pattern.trim().is_empty() => pattern.trim(),
        _ => return Err(QueryError::MalformedPredicate(segment.to_string())),
    };
    if !key.is_empty() {
        steps.push(Step::Select(parse_selector(key)?));
    }
    steps.push(Step::Select(Selector::Glob(KeyPattern::new(pattern)?)));
    Ok(())
}

fn parse_selector(segment: &str) -> Result<Selector, QueryError> {
    Ok(match segment {
        "*" => Selector::Any,
        s if s.contains('*') => Selector::Glob(KeyPattern::new(s)?),
        s => Selector::Key(s.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(query: &str) -> Vec<String> {
        XPath::parse(query)
            .unwrap()
            .steps()
            .iter()
            .map(|step| match step {
                Step::Descend => "//".to_string(),
                Step::Select(Selector::Any) => "*".to_string(),
                Step::Select(Selector::Key(k)) => format!("={}", k),
                Step::Select(Selector::Glob(p)) => format!("~{}", p.as_str()),
            })
            .collect()
    }

    #[test]
    fn test_parse_literal_path() {
        assert_eq!(shape("/interface/Fa0/duplex"), vec!["=interface", "=Fa0", "=duplex"]);
    }

    #[test]
    fn test_parse_root_and_trailing_slash() {
        assert!(shape("/").is_empty());
        assert_eq!(shape("/hostname/"), vec!["=hostname"]);
    }

    #[test]
    fn test_parse_recursive() {
        assert_eq!(shape("//duplex"), vec!["//", "=duplex"]);
        assert_eq!(shape("/interface//duplex"), vec!["=interface", "//", "=duplex"]);
        assert!(XPath::parse("//ip/*").unwrap().is_recursive());
        assert!(!XPath::parse("/ip/*").unwrap().is_recursive());
    }

    #[test]
    fn test_parse_predicate_keeps_slash() {
        assert_eq!(
            shape("/interface[FastEthernet0/0]/duplex"),
            vec!["=interface", "~FastEthernet0/0", "=duplex"]
        );
        assert_eq!(shape("/[*0/0]"), vec!["~*0/0"]);
    }

    #[test]
    fn test_parse_globs() {
        assert_eq!(shape("/interface/*"), vec!["=interface", "*"]);
        assert_eq!(shape("/interface/Fast*"), vec!["=interface", "~Fast*"]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(XPath::parse("").unwrap_err(), QueryError::Empty);
        assert_eq!(XPath::parse("   ").unwrap_err(), QueryError::Empty);
        assert!(matches!(
            XPath::parse("hostname"),
            Err(QueryError::MissingLeadingSlash(_))
        ));
        assert_eq!(XPath::parse("//").unwrap_err(), QueryError::EmptyRecursive);
        assert_eq!(XPath::parse("/a//").unwrap_err(), QueryError::EmptyRecursive);
        for bad in ["/a[", "/a[]", "/a]b", "/a[b]c", "/a[[b]]"] {
            assert!(
                matches!(XPath::parse(bad), Err(QueryError::MalformedPredicate(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_key_pattern_matching() {
        let pattern = KeyPattern::new("fast*").unwrap();
        assert!(pattern.is_match("FastEthernet0/0"));
        assert!(!pattern.is_match("GigabitEthernet0/0"));

        let dotted = KeyPattern::new("1.1.*").unwrap();
        assert!(dotted.is_match("1.1.1.1"));
        assert!(!dotted.is_match("101.1"));

        let exact = KeyPattern::new("FastEthernet0/0").unwrap();
        assert!(exact.is_match("fastethernet0/0"));
        assert!(!exact.is_match("FastEthernet0/01"));
    }
}
