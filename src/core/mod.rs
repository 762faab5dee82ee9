//! Core module - Shared plumbing for every command
//!
//! This module provides:
//! - Unified result model (ResultItem)
//! - Rendering functions for different output formats
//! - File reading strategies
//! - Error types

pub mod error;
pub mod file_reader;
pub mod model;
pub mod render;
