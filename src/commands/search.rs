//! search - Find line-keyed tree keys by regex

use anyhow::{Context, Result};
use std::path::Path;

use crate::commands::{display_path, emit, load_lines};
use crate::core::file_reader::FileReadConfig;
use crate::core::model::{ResultItem, ResultSet};
use crate::core::render::RenderConfig;
use crate::tree::search::{compile_pattern, search_all_in_tree, search_in_tree, search_in_tree_level};
use crate::tree::{build_tree, BuildOptions};

/// Which keys to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// First top-level match
    First,
    /// Every top-level match
    All,
    /// First match within this many levels below the top
    Level(usize),
}

pub fn search_file(
    path: &Path,
    pattern: &str,
    scope: SearchScope,
    section: Option<&str>,
    build: &BuildOptions,
) -> Result<ResultSet> {
    let re = compile_pattern(pattern).context("Invalid search pattern")?;
    let loaded = load_lines(path, section, &FileReadConfig::default())?;
    let tree = build_tree(&loaded.lines, build);

    let keys: Vec<&str> = match scope {
        SearchScope::First => search_in_tree(&re, &tree).into_iter().collect(),
        SearchScope::All => search_all_in_tree(&re, &tree),
        SearchScope::Level(level) => search_in_tree_level(&re, &tree, level).into_iter().collect(),
    };

    let shown = display_path(path);
    Ok(keys
        .into_iter()
        .map(|key| {
            let children = tree.get(key).and_then(|node| node.children());
            let data = serde_json::json!({
                "key": key,
                "children": children,
            });
            ResultItem::match_result(shown.as_str(), key)
                .with_section(section)
                .with_data(data)
                .with_meta(loaded.meta.clone())
        })
        .collect())
}

/// Run the search command
pub fn run_search(
    path: &Path,
    pattern: &str,
    scope: SearchScope,
    section: Option<&str>,
    build: &BuildOptions,
    render_config: RenderConfig,
) -> Result<()> {
    let result_set = search_file(path, pattern, scope, section, build)?;
    emit(&result_set, render_config)
}
