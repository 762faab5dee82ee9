//! Input lines and indentation measurement

use serde::{Deserialize, Serialize};

/// Default number of columns a tab counts for
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Options for turning raw text into a line-keyed tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Columns counted for each leading tab
    pub tab_width: usize,

    /// Lines whose trimmed text equals one of these are skipped like blank lines
    pub skip_markers: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            skip_markers: vec!["!".to_string(), "end".to_string()],
        }
    }
}

impl BuildOptions {
    /// Options with a custom tab width and the default skip markers
    pub fn with_tab_width(tab_width: usize) -> Self {
        Self {
            tab_width,
            ..Default::default()
        }
    }

    /// Options that keep every non-blank line
    pub fn keep_all() -> Self {
        Self {
            skip_markers: Vec::new(),
            ..Default::default()
        }
    }

    fn is_skipped(&self, text: &str) -> bool {
        self.skip_markers.iter().any(|m| m == text)
    }
}

/// One input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLine {
    /// Line text with leading and trailing whitespace removed
    pub text: String,

    /// Leading whitespace width, tabs expanded to `tab_width` columns
    pub indent: usize,

    /// 0-based position in the input sequence
    pub position: usize,
}

impl ConfigLine {
    /// Measure a raw line. Returns `None` for blank or skipped lines.
    pub fn parse(raw: &str, position: usize, options: &BuildOptions) -> Option<Self> {
        let raw = raw.trim_end();
        let text = raw.trim_start();
        if text.is_empty() || options.is_skipped(text) {
            return None;
        }

        Some(Self {
            text: text.to_string(),
            indent: indentation(raw, options.tab_width),
            position,
        })
    }
}

/// Width of the leading whitespace of `line`
pub fn indentation(line: &str, tab_width: usize) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { tab_width } else { 1 })
        .sum()
}

/// Measure every line, dropping blank and skipped ones
pub fn config_lines<I, S>(lines: I, options: &BuildOptions) -> Vec<ConfigLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .enumerate()
        .filter_map(|(i, line)| ConfigLine::parse(line.as_ref(), i, options))
        .collect()
}
