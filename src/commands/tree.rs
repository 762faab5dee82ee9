//! tree - Emit the normalized (or line-keyed) tree of one input

use anyhow::{Context, Result};
use std::path::Path;

use crate::commands::{display_path, emit, load_lines};
use crate::core::file_reader::FileReadConfig;
use crate::core::model::{ResultItem, ResultSet};
use crate::core::render::RenderConfig;
use crate::tree::{build_tree, BuildOptions, Normalize, NormalizeOptions};

/// Spaces per level in raw text output
const TEXT_INDENT: usize = 2;

/// Build the tree item for `path`
pub fn tree_item(
    path: &Path,
    section: Option<&str>,
    legacy: bool,
    build: &BuildOptions,
    normalize: &NormalizeOptions,
) -> Result<ResultItem> {
    let loaded = load_lines(path, section, &FileReadConfig::default())?;
    let tree = build_tree(&loaded.lines, build);
    let mut meta = loaded.meta;

    let item = ResultItem::tree(display_path(path)).with_section(section);
    if legacy {
        meta.depth = Some(tree.depth());
        let data = serde_json::to_value(&tree).context("Failed to serialize tree")?;
        return Ok(item
            .with_data(data)
            .with_excerpt(tree.to_text(TEXT_INDENT))
            .with_meta(meta));
    }

    let normalized = tree.normalize(normalize);
    meta.depth = Some(normalized.map.depth());
    meta.anomalies = normalized.anomalies;
    let data = serde_json::to_value(&normalized.map).context("Failed to serialize tree")?;
    Ok(item
        .with_data(data)
        .with_excerpt(normalized.map.to_text(TEXT_INDENT))
        .with_meta(meta))
}

/// Run the tree command
pub fn run_tree(
    path: &Path,
    section: Option<&str>,
    legacy: bool,
    build: &BuildOptions,
    normalize: &NormalizeOptions,
    render_config: RenderConfig,
) -> Result<()> {
    let mut result_set = ResultSet::new();
    result_set.push(tree_item(path, section, legacy, build, normalize)?);
    emit(&result_set, render_config)
}
