//! Error types for reading and loading configuration input.

use std::path::PathBuf;

use crate::tree::ShapeError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Skipped {}: {reason}", .path.display())]
    Skipped { path: PathBuf, reason: String },

    #[error("Invalid JSON tree in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported tree in {}: {source}", .path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: ShapeError,
    },

    #[error("Unknown section '{0}'")]
    UnknownSection(String),
}

pub type Result<T> = std::result::Result<T, Error>;
