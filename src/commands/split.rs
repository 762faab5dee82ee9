//! split - List the sections of a multi-command capture

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;

use crate::commands::{display_path, emit};
use crate::core::file_reader::{read_lines, FileReadConfig};
use crate::core::model::{Meta, ResultItem, ResultSet};
use crate::core::render::RenderConfig;
use crate::sections::split_sections;

/// One item per section found in `path`
pub fn split_file(path: &Path, pattern: Option<&str>) -> Result<ResultSet> {
    let header = pattern
        .map(Regex::new)
        .transpose()
        .context("Invalid header pattern")?;
    let read = read_lines(path, &FileReadConfig::default())
        .with_context(|| format!("Failed to read input: {}", path.display()))?;

    let sections = split_sections(&read.lines, header.as_ref());
    let shown = display_path(path);
    Ok(sections
        .into_iter()
        .map(|(name, lines)| {
            let data = serde_json::json!({
                "header": lines.first(),
                "lines": lines.len(),
            });
            let meta = Meta {
                lines: Some(lines.len()),
                truncated: read.truncated,
                lossy: read.lossy,
                ..Default::default()
            };
            ResultItem::section(shown.as_str(), name)
                .with_data(data)
                .with_excerpt(lines.join("\n"))
                .with_meta(meta)
        })
        .collect())
}

/// Run the split command
pub fn run_split(path: &Path, pattern: Option<&str>, render_config: RenderConfig) -> Result<()> {
    let result_set = split_file(path, pattern)?;
    emit(&result_set, render_config)
}
