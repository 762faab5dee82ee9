//! Commands module - One handler per subcommand
//!
//! Handlers load input, map what they produce to [`ResultItem`]s and hand the
//! set to the renderer. Query misses are data; only unreadable input fails.

pub mod query;
pub mod search;
pub mod split;
pub mod tree;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

use crate::core::file_reader::{read_lines, FileReadConfig};
use crate::core::model::{Meta, ResultSet};
use crate::core::render::{RenderConfig, Renderer};
use crate::sections::{section_lines, split_sections};

/// Lines of one input, optionally narrowed to a section
pub(crate) struct Loaded {
    pub lines: Vec<String>,
    pub meta: Meta,
}

/// Read `path`; with `section`, keep only that section's body (header dropped)
pub(crate) fn load_lines(path: &Path, section: Option<&str>, read: &FileReadConfig) -> Result<Loaded> {
    let read = read_lines(path, read)
        .with_context(|| format!("Failed to read input: {}", path.display()))?;
    for warning in &read.warnings {
        warn!(path = %path.display(), code = warning.code.as_str(), "{}", warning.message);
    }

    let lines = match section {
        Some(name) => {
            let sections = split_sections(&read.lines, None);
            let body = section_lines(&sections, name)
                .with_context(|| format!("No section '{}' in {}", name, path.display()))?;
            body.iter().skip(1).cloned().collect()
        }
        None => read.lines,
    };

    let meta = Meta {
        lines: Some(lines.len()),
        truncated: read.truncated,
        lossy: read.lossy,
        ..Default::default()
    };
    Ok(Loaded { lines, meta })
}

/// Path as shown in results
pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Render `result_set` to stdout
pub(crate) fn emit(result_set: &ResultSet, render_config: RenderConfig) -> Result<()> {
    let stdout = std::io::stdout();
    Renderer::with_config(render_config)
        .render_to(result_set, stdout.lock())
        .context("Failed to render output")
}
