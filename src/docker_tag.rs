//! Docker image tag for the current checkout
//!
//! The tag is the greatest `X.Y.Z` release tag on HEAD, or the abbreviated
//! HEAD hash when HEAD is not a release. A dirty working tree appends
//! `-dirty`. The result is then made safe for docker: every character
//! outside `[a-zA-Z0-9._-]`, and a leading `.` or `-`, becomes `_`.

use crate::domain::Version;
use crate::error::Result;
use crate::git::Repository;

/// Suffix appended when the working tree has changes
pub const DIRTY_SUFFIX: &str = "-dirty";

/// Hex characters of the commit hash used when HEAD has no release tag
pub const ABBREVIATED_HASH_LEN: usize = 6;

/// Compute the docker tag for the repository's current state.
///
/// # Arguments
/// * `repo` - Repository to inspect
///
/// # Returns
/// * `Ok(String)` - Sanitized docker tag
/// * `Err` - If HEAD, tags or status cannot be read
pub fn compute_docker_tag<R: Repository + ?Sized>(repo: &R) -> Result<String> {
    let head = repo.head_oid()?;

    let release = repo
        .tags_at(head)?
        .iter()
        .filter(|tag| Version::is_strict(tag))
        .filter_map(|tag| Version::parse_strict(tag).ok())
        .max();

    let mut tag = match release {
        Some(version) => version.to_string(),
        None => head.to_string().chars().take(ABBREVIATED_HASH_LEN).collect(),
    };

    let status = repo.status()?;
    if !status.is_empty() {
        log::debug!("Working tree has {} changed path(s)", status.len());
        tag.push_str(DIRTY_SUFFIX);
    }

    Ok(sanitize_docker_tag(&tag))
}

/// Replace characters docker does not allow in a tag with `_`.
pub fn sanitize_docker_tag(raw: &str) -> String {
    raw.chars()
        .enumerate()
        .map(|(i, c)| {
            let allowed = c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
            let leading_separator = i == 0 && matches!(c, '.' | '-');
            if allowed && !leading_separator {
                c
            } else {
                '_'
            }
        })
        .collect()
}
