use crate::error::{ReleaseError, Result};
use std::fmt;

/// Semantic version representation
///
/// Only the `major.minor.patch` triple is modelled; pre-release and build
/// metadata never appear in release tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Version assumed when the repository has no release tags yet.
    pub const ZERO: Version = Version::new(0, 0, 0);

    /// Create a new version
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Returns true if `candidate` has the shape of a release tag: three
    /// dot-separated runs of ASCII digits and nothing else.
    pub fn is_strict(candidate: &str) -> bool {
        let parts: Vec<&str> = candidate.split('.').collect();
        parts.len() == 3
            && parts
                .iter()
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Parse a strict `X.Y.Z` string.
    ///
    /// Rejects prefixes (`v1.2.3`), suffixes (`1.2.3-rc`) and leading zeros
    /// (`01.2.3`).
    pub fn parse_strict(candidate: &str) -> Result<Self> {
        if !Self::is_strict(candidate) {
            return Err(ReleaseError::version(format!(
                "Invalid version format: '{}' - expected X.Y.Z",
                candidate
            )));
        }

        let parsed = semver::Version::parse(candidate).map_err(|e| {
            ReleaseError::version(format!(
                "An error occurred parsing '{}' into a semver object: {}",
                candidate, e
            ))
        })?;

        Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Bump version according to bump type
    pub fn bump(&self, bump_type: VersionBump) -> Self {
        match bump_type {
            VersionBump::Major => Version::new(self.major + 1, 0, 0),
            VersionBump::Minor => Version::new(self.major, self.minor + 1, 0),
            VersionBump::Patch => Version::new(self.major, self.minor, self.patch + 1),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl VersionBump {
    /// Pick the bump for the next release.
    ///
    /// An explicit major bump wins over anything the changelog says. A
    /// breaking-change marker only bumps the minor component.
    pub fn decide(has_breaking_change: bool, explicit_major_bump: bool) -> Self {
        if explicit_major_bump {
            VersionBump::Major
        } else if has_breaking_change {
            VersionBump::Minor
        } else {
            VersionBump::Patch
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionBump::Major => "major",
            VersionBump::Minor => "minor",
            VersionBump::Patch => "patch",
        };
        f.write_str(name)
    }
}

/// Find the latest released version among the repository's tag names.
///
/// Tags that are not strict `X.Y.Z` (e.g. `v1.2.3`, `2.0.0-rc`) are ignored.
/// Returns `baseline` when no tag qualifies.
///
/// # Example
/// ```
/// use releaser::domain::version::{latest_released, Version};
///
/// let tags = ["0.1.0", "0.1.1", "v2.0.0-rc"];
/// assert_eq!(latest_released(tags, Version::ZERO).unwrap(), Version::new(0, 1, 1));
/// ```
pub fn latest_released<I, S>(tags: I, baseline: Version) -> Result<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut latest: Option<Version> = None;

    for tag in tags {
        let tag = tag.as_ref();
        if !Version::is_strict(tag) {
            continue;
        }
        let version = Version::parse_strict(tag)?;
        if latest.map_or(true, |current| version > current) {
            latest = Some(version);
        }
    }

    Ok(latest.unwrap_or(baseline))
}

/// Compute the version to release after `latest`.
pub fn next_version(latest: Version, has_breaking_change: bool, explicit_major_bump: bool) -> Version {
    latest.bump(VersionBump::decide(has_breaking_change, explicit_major_bump))
}
