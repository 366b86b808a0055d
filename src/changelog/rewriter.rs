use super::parser::ChangelogDocument;
use super::{unreleased_header, version_header};
use crate::domain::Version;
use crate::error::ChangelogError;

/// Retitle the unreleased section as `new_version` and open a fresh `# TBD`
/// section above it.
///
/// Only the `# TBD` line is replaced; every other line is emitted exactly as
/// it was read, so the resulting diff is three added lines and one removed. The added
/// lines end the way the replaced header did (`\r\n` or `\n`).
///
/// # Arguments
/// * `document` - A changelog returned by the parser
/// * `new_version` - Version the unreleased entries are released under
///
/// # Returns
/// * `Ok(String)` - The rewritten changelog text
/// * `Err(ChangelogError::MalformedDocument)` - The document's header index
///   does not point at an unreleased header line
pub fn rewrite(document: &ChangelogDocument, new_version: &Version) -> Result<String, ChangelogError> {
    let lines = document.lines();
    let header_index = document.unreleased().header_line_index;

    let line_end = match lines.get(header_index) {
        Some(line) if line.trim_start().starts_with(super::SECTION_HEADER_PREFIX) => {
            if line.ends_with('\r') {
                "\r"
            } else {
                ""
            }
        }
        Some(line) => {
            return Err(ChangelogError::MalformedDocument(format!(
                "line {} is not a section header: '{}'",
                header_index + 1,
                line
            )))
        }
        None => {
            return Err(ChangelogError::MalformedDocument(format!(
                "unreleased header index {} is past the end of the document ({} lines)",
                header_index,
                lines.len()
            )))
        }
    };

    let mut output: Vec<&str> = Vec::with_capacity(lines.len() + 2);
    output.extend(lines[..header_index].iter().map(String::as_str));

    // Inserted lines take the header's line ending.
    let placeholder = format!("{}{}", unreleased_header(), line_end);
    let released_header = format!("{}{}", version_header(new_version), line_end);
    output.push(&placeholder);
    output.push(line_end);
    output.push(&released_header);

    output.extend(lines[header_index + 1..].iter().map(String::as_str));

    Ok(output.join("\n"))
}
