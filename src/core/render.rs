//! Output formats for shconf results
//!
//! Every command produces a [`ResultSet`] of tree, query, section, match or
//! error items. `jsonl` and `json` carry each item whole, `yaml` is the same
//! sequence for reading, and `raw` keeps only the text view: re-indented
//! trees, bare query values, section bodies and matched keys.

use crate::core::model::ResultSet;
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

/// Output format for a [`ResultSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One item per line
    #[default]
    Jsonl,
    /// All items in one array
    Json,
    Yaml,
    /// Item excerpts only
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format '{}': expected jsonl, json, yaml or raw", s)),
        }
    }
}

/// A result set that could not be written out
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Format plus pretty-printing, as selected on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    /// Indented JSON; ignored by `yaml` and `raw`
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render every item of `result_set` in the configured format
    pub fn render(&self, result_set: &ResultSet) -> Result<String, RenderError> {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.to_json(&result_set.items),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(&result_set.items)?),
            OutputFormat::Raw => Ok(self.render_raw(result_set)),
        }
    }

    /// Render to a writer, with a trailing newline. Nothing is written for
    /// empty output.
    pub fn render_to<W: Write>(&self, result_set: &ResultSet, mut writer: W) -> Result<(), RenderError> {
        let output = self.render(result_set)?;
        if output.is_empty() {
            return Ok(());
        }
        writer.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn render_jsonl(&self, result_set: &ResultSet) -> Result<String, RenderError> {
        let lines = result_set
            .items
            .iter()
            .map(|item| self.to_json(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines.join(if self.config.pretty { "\n\n" } else { "\n" }))
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, RenderError> {
        let json = if self.config.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    /// Render excerpts only; errors go in as `# code: message` lines
    fn render_raw(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if !item.errors.is_empty() {
                    let errors: Vec<String> = item
                        .errors
                        .iter()
                        .map(|e| format!("# {}: {}", e.code, e.message))
                        .collect();
                    return Some(errors.join("\n"));
                }
                item.excerpt.as_ref().map(|e| e.trim_end().to_string())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
