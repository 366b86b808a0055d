use std::fmt;
use std::path::PathBuf;

/// Warnings raised while cutting a release.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The `v`-prefixed tag could not be pushed; the release carries on
    VPrefixedTagPushFailed {
        tag: String,
        remote: String,
        reason: String,
    },
    /// A configured release path does not exist and was not staged
    ReleasePathMissing { path: PathBuf },
    /// The remote was fetched recently enough that fetching again was skipped
    FetchSkipped { seconds_since_last: u64 },
    /// No pre-release script manifest was found
    PreReleaseManifestMissing { path: PathBuf },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::VPrefixedTagPushFailed {
                tag,
                remote,
                reason,
            } => {
                write!(
                    f,
                    "Pushing tag '{}' to '{}' failed, continuing with the release: {}",
                    tag, remote, reason
                )
            }
            BoundaryWarning::ReleasePathMissing { path } => {
                write!(
                    f,
                    "Release path '{}' does not exist and will not be committed",
                    path.display()
                )
            }
            BoundaryWarning::FetchSkipped { seconds_since_last } => {
                write!(
                    f,
                    "Skipping fetch, the last one was {}s ago",
                    seconds_since_last
                )
            }
            BoundaryWarning::PreReleaseManifestMissing { path } => {
                write!(
                    f,
                    "No pre-release script manifest at '{}', no scripts will run",
                    path.display()
                )
            }
        }
    }
}
