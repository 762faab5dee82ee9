//! query - Evaluate a path expression against one or more inputs
//!
//! Inputs ending in `.json` are taken as previously dumped token-keyed trees;
//! anything else is read as text and normalized first.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::{display_path, emit, load_lines};
use crate::core::error::Error;
use crate::core::file_reader::FileReadConfig;
use crate::core::model::{Meta, ResultItem, ResultSet};
use crate::core::render::RenderConfig;
use crate::query::{ContextMode, QueryError, XPath, XPathResult};
use crate::tree::{build_tree, BuildOptions, ConfigTree, Normalize, NormalizeOptions, TokenMap, Value};

/// Query settings shared by every input
pub struct QueryRequest<'a> {
    pub xpath: &'a str,
    pub context: &'a str,
    pub section: Option<&'a str>,
    pub build: &'a BuildOptions,
    pub normalize: &'a NormalizeOptions,
}

/// Load `path` into a tree the query engine can walk
pub fn load_tree(
    path: &Path,
    section: Option<&str>,
    build: &BuildOptions,
    normalize: &NormalizeOptions,
) -> Result<(ConfigTree, Meta)> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let tree = load_json_tree(path)?;
        let meta = Meta {
            depth: Some(tree.depth()),
            ..Default::default()
        };
        return Ok((ConfigTree::Tokens(tree), meta));
    }

    let loaded = load_lines(path, section, &FileReadConfig::default())?;
    let normalized = build_tree(&loaded.lines, build).normalize(normalize);
    let mut meta = loaded.meta;
    meta.depth = Some(normalized.map.depth());
    meta.anomalies = normalized.anomalies;
    Ok((ConfigTree::Tokens(normalized.map), meta))
}

fn load_json_tree(path: &Path) -> Result<TokenMap> {
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json = serde_json::from_str(&content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = TokenMap::from_json(json).map_err(|source| Error::Shape {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(tree)
}

/// Plain-text form of one match
fn value_text(value: &Value) -> String {
    match value {
        Value::Scalar(s) => s.clone(),
        Value::Present => String::new(),
        Value::Map(map) => map.to_text(2).trim_end().to_string(),
    }
}

fn query_item(
    path: &Path,
    prepared: &std::result::Result<(XPath, ContextMode), QueryError>,
    request: &QueryRequest<'_>,
) -> Result<ResultItem> {
    let (tree, meta) = load_tree(path, request.section, request.build, request.normalize)?;
    let result = match prepared {
        Ok((xpath, mode)) => xpath.evaluate(&tree, *mode),
        Err(err) => XPathResult::failed(request.xpath, err),
    };

    let excerpt = result
        .matches
        .iter()
        .map(value_text)
        .collect::<Vec<_>>()
        .join("\n");
    let data = serde_json::to_value(&result).context("Failed to serialize query result")?;
    Ok(ResultItem::query(display_path(path))
        .with_section(request.section)
        .with_data(data)
        .with_excerpt(excerpt)
        .with_meta(meta))
}

/// Evaluate the query against every file, in input order
pub fn query_files(files: &[PathBuf], request: &QueryRequest<'_>) -> Result<ResultSet> {
    let prepared = XPath::parse(request.xpath)
        .and_then(|xpath| Ok((xpath, request.context.parse::<ContextMode>()?)));

    #[cfg(feature = "parallel")]
    let items: Vec<Result<ResultItem>> = {
        use rayon::prelude::*;
        files
            .par_iter()
            .map(|path| query_item(path, &prepared, request))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let items: Vec<Result<ResultItem>> = files
        .iter()
        .map(|path| query_item(path, &prepared, request))
        .collect();

    let mut result_set = ResultSet::new();
    for item in items {
        result_set.push(item?);
    }
    Ok(result_set)
}

/// Run the query command
pub fn run_query(files: &[PathBuf], request: &QueryRequest<'_>, render_config: RenderConfig) -> Result<()> {
    let result_set = query_files(files, request)?;
    emit(&result_set, render_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request<'a>(xpath: &'a str, context: &'a str, build: &'a BuildOptions, normalize: &'a NormalizeOptions) -> QueryRequest<'a> {
        QueryRequest {
            xpath,
            context,
            section: None,
            build,
            normalize,
        }
    }

    #[test]
    fn test_query_text_and_json_inputs() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("shrun.txt");
        fs::write(&text, "hostname R1\ninterface Fa0/0\n duplex auto\n").unwrap();
        let json = dir.path().join("tree.json");
        fs::write(&json, r#"{"hostname":"R2"}"#).unwrap();

        let build = BuildOptions::default();
        let normalize = NormalizeOptions::default();
        let set = query_files(&[text, json], &request("/hostname", "none", &build, &normalize)).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.items[0].data.as_ref().unwrap()["data"], "R1");
        assert_eq!(set.items[1].data.as_ref().unwrap()["data"], "R2");
        assert_eq!(set.items[1].excerpt.as_deref(), Some("R2"));
    }

    #[test]
    fn test_query_error_is_data() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("shrun.txt");
        fs::write(&text, "hostname R1\n").unwrap();

        let build = BuildOptions::default();
        let normalize = NormalizeOptions::default();
        let set = query_files(&[text], &request("/hostname", "bogus", &build, &normalize)).unwrap();
        let data = set.items[0].data.as_ref().unwrap();
        assert_eq!(data["success"], false);
        assert!(data["error"].as_str().unwrap().contains("Invalid context"));
    }

    #[test]
    fn test_query_legacy_json_dump_is_rejected() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("legacy.json");
        fs::write(&json, r#"{"hostname R1":""}"#).unwrap();

        let build = BuildOptions::default();
        let normalize = NormalizeOptions::default();
        let set = query_files(&[json], &request("/hostname", "none", &build, &normalize)).unwrap();
        let data = set.items[0].data.as_ref().unwrap();
        assert!(data["error"].as_str().unwrap().contains("normalized tree shape"));
    }

    #[test]
    fn test_query_bad_json_fails() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("broken.json");
        fs::write(&json, "{not json").unwrap();

        let build = BuildOptions::default();
        let normalize = NormalizeOptions::default();
        let err = query_files(&[json], &request("/a", "none", &build, &normalize)).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON tree"));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&Value::from("auto")), "auto");
        assert_eq!(value_text(&Value::Present), "");
        let map = Value::from("auto").nest(["duplex"]);
        assert_eq!(value_text(&map), "duplex auto");
    }
}
