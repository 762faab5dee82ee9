//! File reading strategies
//!
//! Provides consistent handling for:
//! - Non-UTF-8 dumps (terminal captures often carry stray bytes)
//! - Oversized files
//! - Binary files

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

use crate::core::error::{Error, Result};

/// Default maximum file size in bytes (64 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Strategy for handling non-UTF-8 content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingStrategy {
    /// Refuse files with invalid UTF-8
    Skip,
    /// Replace invalid bytes with U+FFFD
    #[default]
    Lossy,
}

/// Strategy for handling oversized files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeStrategy {
    /// Refuse files over the limit
    #[default]
    Skip,
    /// Keep whole lines up to the limit and mark the read as truncated
    Truncate,
    /// Read the entire file regardless of size
    Full,
}

/// Configuration for file reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReadConfig {
    /// Maximum file size to process (bytes)
    pub max_file_size: u64,

    /// How to handle non-UTF-8 content
    pub encoding_strategy: EncodingStrategy,

    /// How to handle oversized files
    pub size_strategy: SizeStrategy,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            encoding_strategy: EncodingStrategy::Lossy,
            size_strategy: SizeStrategy::Skip,
        }
    }
}

/// Warning codes for file operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    /// File was truncated due to size
    FileTruncated,
    /// Lossy encoding conversion used
    LossyConversion,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::FileTruncated => "FILE_TRUNCATED",
            WarningCode::LossyConversion => "LOSSY_CONVERSION",
        }
    }
}

/// A structured warning attached to a successful read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWarning {
    pub code: WarningCode,
    pub message: String,
}

impl FileWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Lines read from one file
#[derive(Debug, Clone, Default)]
pub struct ReadLines {
    /// Lines with trailing whitespace stripped
    pub lines: Vec<String>,

    /// Whether the tail of the file was dropped
    pub truncated: bool,

    /// Whether invalid UTF-8 was replaced
    pub lossy: bool,

    pub warnings: Vec<FileWarning>,
}

/// Read `path` into lines according to `config`
pub fn read_lines(path: &Path, config: &FileReadConfig) -> Result<ReadLines> {
    let io_err = |source: std::io::Error| match source.kind() {
        ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => Error::Io {
            path: path.to_path_buf(),
            source,
        },
    };

    let file = fs::File::open(path).map_err(io_err)?;
    let file_size = file.metadata().map_err(io_err)?.len();

    let over_limit = file_size > config.max_file_size;
    if over_limit && config.size_strategy == SizeStrategy::Skip {
        return Err(Error::Skipped {
            path: path.to_path_buf(),
            reason: format!(
                "file size {} exceeds limit {}",
                file_size, config.max_file_size
            ),
        });
    }

    let mut bytes = Vec::new();
    let truncated = over_limit && config.size_strategy == SizeStrategy::Truncate;
    if truncated {
        file.take(config.max_file_size)
            .read_to_end(&mut bytes)
            .map_err(io_err)?;
        // Drop the partial last line.
        match bytes.iter().rposition(|&b| b == b'\n') {
            Some(end) => bytes.truncate(end + 1),
            None => bytes.clear(),
        }
    } else {
        let mut reader = std::io::BufReader::new(file);
        reader.read_to_end(&mut bytes).map_err(io_err)?;
    }

    // Config dumps never contain NUL; a NUL in the first 8KB means binary.
    let check_len = std::cmp::min(8192, bytes.len());
    if bytes[..check_len].contains(&0) {
        return Err(Error::Skipped {
            path: path.to_path_buf(),
            reason: "file appears to be binary (contains null bytes)".to_string(),
        });
    }

    let mut result = ReadLines {
        truncated,
        ..Default::default()
    };
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(err) => match config.encoding_strategy {
            EncodingStrategy::Skip => {
                return Err(Error::Skipped {
                    path: path.to_path_buf(),
                    reason: "file contains invalid UTF-8 sequences".to_string(),
                });
            }
            EncodingStrategy::Lossy => {
                result.lossy = true;
                result.warnings.push(FileWarning::new(
                    WarningCode::LossyConversion,
                    "Lossy UTF-8 conversion applied (some characters replaced)",
                ));
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        },
    };

    if truncated {
        result.warnings.push(FileWarning::new(
            WarningCode::FileTruncated,
            format!(
                "Content truncated from {} to {} bytes",
                file_size,
                content.len()
            ),
        ));
    }

    result.lines = split_lines(&content);
    debug!(path = %path.display(), lines = result.lines.len(), "read input");
    Ok(result)
}

/// Split text into lines, stripping trailing whitespace (including `\r`)
pub fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(|line| line.trim_end().to_string()).collect()
}
