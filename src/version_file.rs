//! Rewrite a version string embedded in an arbitrary text file
//!
//! The caller describes the line with a format string such as
//! `"version": "%s"`. `%s` stands for the version; the rest of the format is
//! a regular expression. The file must contain exactly one line matching the
//! pattern, otherwise it is left untouched. Only the version inside the match
//! is rewritten.

use regex::{Captures, Regex, RegexBuilder};
use std::fs;
use std::path::Path;

use crate::error::{ReleaseError, Result};

/// Placeholder for the version inside a format string
pub const VERSION_PLACEHOLDER: &str = "%s";

/// What the placeholder matches in the file
pub const VERSION_PATTERN: &str = "[0-9A-Za-z_./-]+";

const VERSION_GROUP: &str = "version";

/// A compiled format string
#[derive(Debug, Clone)]
pub struct VersionPattern {
    search: Regex,
}

impl VersionPattern {
    /// Compile `format`, which must contain `%s` exactly once.
    pub fn new(format: &str) -> Result<Self> {
        let placeholders = format.matches(VERSION_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(ReleaseError::invalid_argument(format!(
                "The format '{}' must contain the placeholder '{}' exactly once, found it {} time(s)",
                format, VERSION_PLACEHOLDER, placeholders
            )));
        }

        let search_pattern = format.replacen(
            VERSION_PLACEHOLDER,
            &format!("(?P<{}>{})", VERSION_GROUP, VERSION_PATTERN),
            1,
        );
        // `^` and `$` anchor at line boundaries, as they do when counting lines.
        let search = RegexBuilder::new(&search_pattern)
            .multi_line(true)
            .crlf(true)
            .build()
            .map_err(|e| {
                ReleaseError::invalid_argument(format!(
                    "Cannot compile pattern '{}': {}",
                    search_pattern, e
                ))
            })?;

        Ok(VersionPattern { search })
    }

    /// The regular expression searched for
    pub fn search_pattern(&self) -> &str {
        self.search.as_str()
    }

    /// Number of lines in `text` containing a match
    pub fn count_matching_lines(&self, text: &str) -> usize {
        text.lines().filter(|line| self.search.is_match(line)).count()
    }

    /// Swap the version inside every match in `text` for `new_version`.
    ///
    /// The rest of each match is kept as found, so regex syntax in the format
    /// never ends up in the file. `new_version` is inserted literally.
    pub fn replace(&self, text: &str, new_version: &str) -> String {
        self.search
            .replace_all(text, |caps: &Captures<'_>| {
                let (Some(whole), Some(version)) = (caps.get(0), caps.name(VERSION_GROUP)) else {
                    return caps.get(0).map_or(String::new(), |m| m.as_str().to_string());
                };
                let matched = whole.as_str();
                let start = version.start() - whole.start();
                let end = version.end() - whole.start();
                format!("{}{}{}", &matched[..start], new_version, &matched[end..])
            })
            .into_owned()
    }
}

/// Check that `new_version` consists only of version characters.
pub fn validate_version(new_version: &str) -> Result<()> {
    let valid = !new_version.is_empty()
        && new_version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-'));

    if !valid {
        return Err(ReleaseError::invalid_argument(format!(
            "The version '{}' does not match the version pattern '{}'",
            new_version, VERSION_PATTERN
        )));
    }
    Ok(())
}

/// Replace the version on the single line of `path` matching `format`.
///
/// # Arguments
/// * `path` - File to update in place
/// * `format` - Format string with one `%s` placeholder
/// * `new_version` - Version to write
///
/// # Returns
/// * `Ok(())` - The file was rewritten
/// * `Err(ReleaseError::PatternMismatch)` - Zero or several lines matched;
///   the file was not modified
/// * `Err` - Invalid format or version, or the file cannot be read/written
pub fn update_version_in_file(path: &Path, format: &str, new_version: &str) -> Result<()> {
    let pattern = VersionPattern::new(format)?;
    validate_version(new_version)?;

    let contents = fs::read_to_string(path).map_err(|e| {
        ReleaseError::invalid_argument(format!("Cannot read '{}': {}", path.display(), e))
    })?;

    let found = pattern.count_matching_lines(&contents);
    if found != 1 {
        return Err(ReleaseError::PatternMismatch {
            path: path.to_path_buf(),
            pattern: pattern.search_pattern().to_string(),
            found,
        });
    }

    let updated = pattern.replace(&contents, new_version);
    // Writing through the existing file keeps its permissions.
    fs::write(path, updated)?;

    log::info!("Updated version in '{}' to '{}'", path.display(), new_version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_needs_exactly_one_placeholder() {
        assert!(VersionPattern::new("version = %s").is_ok());
        assert!(VersionPattern::new("version = ").is_err());
        assert!(VersionPattern::new("%s and %s").is_err());
    }

    #[test]
    fn test_search_pattern() {
        let pattern = VersionPattern::new(r#""version": "%s""#).unwrap();
        assert_eq!(
            pattern.search_pattern(),
            r#""version": "(?P<version>[0-9A-Za-z_./-]+)""#
        );
    }

    #[test]
    fn test_invalid_regex_in_format() {
        assert!(VersionPattern::new("version = (%s").is_err());
    }

    #[test]
    fn test_replace_is_literal() {
        let pattern = VersionPattern::new("tag: %s").unwrap();
        assert_eq!(
            pattern.replace("image\ntag: 1.0.0\n", "$1.2"),
            "image\ntag: $1.2\n"
        );
    }

    #[test]
    fn test_anchors_match_line_boundaries() {
        let pattern = VersionPattern::new("^version = \"%s\"$").unwrap();
        let text = "[package]\nversion = \"0.1.0\"\nedition = \"2021\"\n";
        assert_eq!(pattern.count_matching_lines(text), 1);
        assert_eq!(
            pattern.replace(text, "0.2.0"),
            "[package]\nversion = \"0.2.0\"\nedition = \"2021\"\n"
        );
    }

    #[test]
    fn test_replace_keeps_surrounding_text() {
        let pattern = VersionPattern::new(r#""version": "%s""#).unwrap();
        let text = "{\n  \"version\": \"0.1.0\",\n  \"name\": \"x\"\n}\n";
        assert_eq!(
            pattern.replace(text, "0.2.0"),
            "{\n  \"version\": \"0.2.0\",\n  \"name\": \"x\"\n}\n"
        );
    }

    #[test]
    fn test_validate_version() {
        assert!(validate_version("1.2.3").is_ok());
        assert!(validate_version("feature/x_1-rc.2").is_ok());
        assert!(validate_version("").is_err());
        assert!(validate_version("1.2.3 beta").is_err());
        assert!(validate_version("1.2.3\"").is_err());
    }
}
