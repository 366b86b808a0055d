//! Changelog handling
//!
//! The changelog is a markdown file whose first meaningful line is a `# TBD`
//! placeholder collecting unreleased entries, followed by one `# X.Y.Z`
//! section per past release:
//!
//! ```text
//! # TBD
//! ### Breaking Changes
//! * Renamed the `foo` flag
//!
//! # 0.1.0
//! * Initial release
//! ```
//!
//! - [parser] scans the text into a [ChangelogDocument] and enforces the
//!   structural rules a release depends on.
//! - [rewriter] turns the placeholder into a concrete version header and
//!   opens a fresh placeholder above it.

pub mod parser;
pub mod rewriter;

pub use parser::{
    classify, parse, parse_structure, ChangelogDocument, ClassifiedLine, LineKind,
    ReleasedSection, UnreleasedSection,
};
pub use rewriter::rewrite;

use crate::error::{ReleaseError, Result};
use regex::Regex;

/// Character that starts every header and comment line.
pub const SECTION_HEADER_PREFIX: char = '#';

/// Placeholder version string used for the unreleased section.
pub const UNRELEASED_PLACEHOLDER: &str = "TBD";

/// Compiled line patterns that give a changelog its structure.
///
/// Built once per run and handed to the parser; nothing here is global.
#[derive(Debug, Clone)]
pub struct ChangelogPatterns {
    unreleased_header: Regex,
    version_header: Regex,
    breaking_subheader: Regex,
}

impl ChangelogPatterns {
    pub const UNRELEASED_HEADER: &'static str = r"^#\s*TBD\s*$";
    pub const VERSION_HEADER: &'static str = r"^#\s*([0-9]+)\.([0-9]+)\.([0-9]+)\s*$";
    pub const BREAKING_SUBHEADER: &'static str = r"^#{2,}\s*[Bb]reak.*$";

    /// Patterns for the standard `# TBD` / `# X.Y.Z` / `## Breaking` layout.
    pub fn new() -> Result<Self> {
        Self::from_patterns(
            Self::UNRELEASED_HEADER,
            Self::VERSION_HEADER,
            Self::BREAKING_SUBHEADER,
        )
    }

    /// Build from custom patterns.
    ///
    /// `version_header` must capture the major, minor and patch numbers in
    /// groups 1, 2 and 3.
    pub fn from_patterns(
        unreleased_header: &str,
        version_header: &str,
        breaking_subheader: &str,
    ) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                ReleaseError::config(format!("Invalid changelog pattern '{}': {}", pattern, e))
            })
        };

        let version_header = compile(version_header)?;
        if version_header.captures_len() < 4 {
            return Err(ReleaseError::config(format!(
                "Version header pattern '{}' must capture major, minor and patch",
                version_header.as_str()
            )));
        }

        Ok(ChangelogPatterns {
            unreleased_header: compile(unreleased_header)?,
            version_header,
            breaking_subheader: compile(breaking_subheader)?,
        })
    }

    pub fn is_unreleased_header(&self, line: &str) -> bool {
        self.unreleased_header.is_match(line)
    }

    pub fn is_version_header(&self, line: &str) -> bool {
        self.version_header.is_match(line)
    }

    pub fn is_breaking_subheader(&self, line: &str) -> bool {
        self.breaking_subheader.is_match(line)
    }

    /// Major, minor and patch text of a version header line.
    pub(crate) fn version_parts<'t>(&self, line: &'t str) -> Option<[&'t str; 3]> {
        let captures = self.version_header.captures(line)?;
        Some([
            captures.get(1)?.as_str(),
            captures.get(2)?.as_str(),
            captures.get(3)?.as_str(),
        ])
    }
}

/// Header line for a released version, e.g. `# 1.2.3`.
pub fn version_header(version: &crate::domain::Version) -> String {
    format!("{} {}", SECTION_HEADER_PREFIX, version)
}

/// Header line for the unreleased placeholder, `# TBD`.
pub fn unreleased_header() -> String {
    format!("{} {}", SECTION_HEADER_PREFIX, UNRELEASED_PLACEHOLDER)
}
