use crate::domain::Version;
use std::fmt;

/// Which of the two per-release tag names this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFlavor {
    /// `X.Y.Z`; pushing it is what triggers release automation.
    Bare,
    /// `vX.Y.Z`; cosmetic, for ecosystems that expect the prefix.
    VPrefixed,
}

/// A release tag name derived from a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    pub name: String,
    pub flavor: TagFlavor,
}

impl ReleaseTag {
    pub fn bare(version: &Version) -> Self {
        ReleaseTag {
            name: version.to_string(),
            flavor: TagFlavor::Bare,
        }
    }

    pub fn v_prefixed(version: &Version) -> Self {
        ReleaseTag {
            name: format!("v{}", version),
            flavor: TagFlavor::VPrefixed,
        }
    }

    /// Both tags for a release, bare first.
    pub fn pair(version: &Version) -> (Self, Self) {
        (Self::bare(version), Self::v_prefixed(version))
    }

    /// Full reference name, e.g. `refs/tags/1.2.3`
    pub fn ref_name(&self) -> String {
        format!("refs/tags/{}", self.name)
    }

    /// Refspec pushing the local tag to the same name on the remote
    pub fn push_refspec(&self) -> String {
        format!("refs/tags/{}:refs/tags/{}", self.name, self.name)
    }

    /// Refspec deleting the tag on the remote (`git push origin :refs/tags/x`)
    pub fn delete_refspec(&self) -> String {
        format!(":refs/tags/{}", self.name)
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_pair_names() {
        let (bare, prefixed) = ReleaseTag::pair(&Version::new(1, 2, 3));
        assert_eq!(bare.name, "1.2.3");
        assert_eq!(bare.flavor, TagFlavor::Bare);
        assert_eq!(prefixed.name, "v1.2.3");
        assert_eq!(prefixed.flavor, TagFlavor::VPrefixed);
    }

    #[test]
    fn test_refspecs() {
        let tag = ReleaseTag::v_prefixed(&Version::new(0, 1, 1));
        assert_eq!(tag.ref_name(), "refs/tags/v0.1.1");
        assert_eq!(tag.push_refspec(), "refs/tags/v0.1.1:refs/tags/v0.1.1");
        assert_eq!(tag.delete_refspec(), ":refs/tags/v0.1.1");
    }
}
