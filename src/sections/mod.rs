//! Sections module - Splitting multi-command captures

pub mod split;

pub use split::{known_sections, section_name, split_sections, SectionMap, DEFAULT_HEADER_RE};

use crate::core::error::{Error, Result};

/// Lines of one section, or an error naming the missing section
pub fn section_lines<'s>(sections: &'s SectionMap, name: &str) -> Result<&'s [String]> {
    sections
        .get(name)
        .map(Vec::as_slice)
        .ok_or_else(|| Error::UnknownSection(name.to_string()))
}
