use std::ops::Range;

use super::{ChangelogPatterns, SECTION_HEADER_PREFIX};
use crate::domain::Version;
use crate::error::ChangelogError;

/// What a single changelog line means structurally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `# TBD`
    UnreleasedHeader,
    /// `# X.Y.Z`
    VersionHeader,
    /// `## Breaking Changes` and friends
    BreakingSubheader,
    /// Any other `#`-led line
    Comment,
    /// Empty or whitespace only
    Blank,
    /// A change entry
    Entry,
}

/// A changelog line together with its position and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    /// 0-based index into the document's lines
    pub index: usize,
    pub text: &'a str,
    pub kind: LineKind,
}

impl ClassifiedLine<'_> {
    /// 1-based line number for error messages
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Blank lines, comments and sub-headers carry no release content.
    pub fn is_trivial(&self) -> bool {
        matches!(
            self.kind,
            LineKind::Blank | LineKind::Comment | LineKind::BreakingSubheader
        )
    }
}

impl ChangelogPatterns {
    /// Classify one line of a changelog.
    pub fn classify_line(&self, line: &str) -> LineKind {
        if self.is_unreleased_header(line) {
            LineKind::UnreleasedHeader
        } else if self.is_version_header(line) {
            LineKind::VersionHeader
        } else if self.is_breaking_subheader(line) {
            LineKind::BreakingSubheader
        } else if line.trim_start().starts_with(SECTION_HEADER_PREFIX) {
            LineKind::Comment
        } else if line.trim().is_empty() {
            LineKind::Blank
        } else {
            LineKind::Entry
        }
    }
}

/// Lazily classify every line of `text`, top to bottom.
///
/// Lines are split on `\n` only, so a trailing `\r` stays part of the line
/// and joining the texts back with `\n` reproduces the input exactly.
pub fn classify<'a>(
    patterns: &'a ChangelogPatterns,
    text: &'a str,
) -> impl Iterator<Item = ClassifiedLine<'a>> + 'a {
    text.split('\n')
        .enumerate()
        .map(move |(index, line)| ClassifiedLine {
            index,
            text: line,
            kind: patterns.classify_line(line),
        })
}

/// The `# TBD` section at the top of the changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreleasedSection {
    pub header_line_index: usize,
    /// Line indices between the header and the next version header
    pub body: Range<usize>,
    pub has_breaking_change_marker: bool,
    pub is_empty: bool,
}

/// A `# X.Y.Z` section for a past release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasedSection {
    pub header_line_index: usize,
    pub version: Version,
    pub body: Range<usize>,
}

/// A changelog whose structure has been validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogDocument {
    lines: Vec<String>,
    unreleased: UnreleasedSection,
    released: Vec<ReleasedSection>,
}

impl ChangelogDocument {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn unreleased(&self) -> &UnreleasedSection {
        &self.unreleased
    }

    /// Released sections in document order, newest first by convention.
    pub fn released(&self) -> &[ReleasedSection] {
        &self.released
    }

    pub fn has_breaking_change(&self) -> bool {
        self.unreleased.has_breaking_change_marker
    }

    /// Body lines of the unreleased section
    pub fn unreleased_body(&self) -> &[String] {
        self.body_lines(&self.unreleased.body)
    }

    /// Lines covered by a section body range.
    pub fn body_lines(&self, body: &Range<usize>) -> &[String] {
        self.lines.get(body.clone()).unwrap_or(&[])
    }

    /// Newest released version recorded in the changelog, if any
    pub fn latest_recorded_version(&self) -> Option<Version> {
        self.released.first().map(|section| section.version)
    }
}

/// Parse a changelog, enforcing only the placement of the `# TBD` header.
///
/// Succeeds on documents with an empty unreleased section or with no prior
/// releases; [parse] adds those checks on top.
///
/// # Arguments
/// * `text` - Full changelog contents
/// * `patterns` - Compiled header patterns
///
/// # Returns
/// * `Ok(ChangelogDocument)` - Sections and breaking/empty flags
/// * `Err(ChangelogError)` - Missing, duplicated or misplaced `# TBD`, or an
///   unparseable version header
pub fn parse_structure(
    text: &str,
    patterns: &ChangelogPatterns,
) -> Result<ChangelogDocument, ChangelogError> {
    let classified: Vec<ClassifiedLine<'_>> = classify(patterns, text).collect();

    let mut unreleased_header: Option<usize> = None;
    for line in classified
        .iter()
        .filter(|line| line.kind == LineKind::UnreleasedHeader)
    {
        if let Some(first) = unreleased_header {
            return Err(ChangelogError::DuplicateUnreleasedHeader {
                first: first + 1,
                duplicate: line.number(),
            });
        }
        unreleased_header = Some(line.index);
    }

    let first_content = classified.iter().find(|line| !line.is_trivial());
    let header_index = match (first_content, unreleased_header) {
        (Some(line), Some(header)) if line.index == header => header,
        (first, _) => {
            return Err(ChangelogError::MissingUnreleasedHeader {
                line: first.map(ClassifiedLine::number),
            })
        }
    };

    let mut version_headers = Vec::new();
    for line in classified
        .iter()
        .filter(|line| line.kind == LineKind::VersionHeader)
    {
        version_headers.push((line.index, header_version(patterns, line)?));
    }

    let end = classified.len();
    let unreleased_end = version_headers
        .iter()
        .map(|(index, _)| *index)
        .find(|index| *index > header_index)
        .unwrap_or(end);
    let unreleased_span = &classified[header_index + 1..unreleased_end];

    let unreleased = UnreleasedSection {
        header_line_index: header_index,
        body: header_index + 1..unreleased_end,
        has_breaking_change_marker: unreleased_span
            .iter()
            .any(|line| line.kind == LineKind::BreakingSubheader),
        is_empty: unreleased_span.iter().all(ClassifiedLine::is_trivial),
    };

    let released = version_headers
        .iter()
        .enumerate()
        .map(|(position, (index, version))| {
            let body_end = version_headers
                .get(position + 1)
                .map_or(end, |(next, _)| *next);
            ReleasedSection {
                header_line_index: *index,
                version: *version,
                body: index + 1..body_end,
            }
        })
        .collect();

    Ok(ChangelogDocument {
        lines: classified.iter().map(|line| line.text.to_string()).collect(),
        unreleased,
        released,
    })
}

/// Parse a changelog that is ready to be released.
///
/// On top of [parse_structure], requires at least one released section and
/// a non-empty unreleased section.
///
/// # Example
/// ```
/// use releaser::changelog::{parse, ChangelogPatterns};
///
/// let patterns = ChangelogPatterns::new().unwrap();
/// let doc = parse("# TBD\n### Breaking\n* Dropped foo\n\n# 0.1.0\n* Initial", &patterns).unwrap();
/// assert!(doc.has_breaking_change());
/// assert_eq!(doc.released().len(), 1);
/// ```
pub fn parse(text: &str, patterns: &ChangelogPatterns) -> Result<ChangelogDocument, ChangelogError> {
    let document = parse_structure(text, patterns)?;

    if document.released.is_empty() {
        return Err(ChangelogError::NoPriorReleases);
    }

    if document.unreleased.is_empty {
        return Err(ChangelogError::EmptyUnreleasedSection {
            line: document.unreleased.header_line_index + 1,
        });
    }

    log::debug!(
        "Changelog parsed: {} released section(s), breaking change marker: {}",
        document.released.len(),
        document.unreleased.has_breaking_change_marker
    );

    Ok(document)
}

fn header_version(
    patterns: &ChangelogPatterns,
    line: &ClassifiedLine<'_>,
) -> Result<Version, ChangelogError> {
    let invalid = || ChangelogError::InvalidVersionHeader {
        line: line.number(),
        text: line.text.to_string(),
    };

    let [major, minor, patch] = patterns.version_parts(line.text).ok_or_else(invalid)?;
    let number = |part: &str| part.parse::<u64>().map_err(|_| invalid());

    Ok(Version::new(number(major)?, number(minor)?, number(patch)?))
}
