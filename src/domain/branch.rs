use std::fmt;

/// The local release branch and the remote branch it must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingBranch {
    pub remote: String,
    pub branch: String,
}

impl TrackingBranch {
    pub fn new(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        TrackingBranch {
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    /// `refs/heads/<branch>`
    pub fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    /// `refs/remotes/<remote>/<branch>`
    pub fn remote_ref(&self) -> String {
        format!("refs/remotes/{}/{}", self.remote, self.branch)
    }

    /// Refspec pushing the local branch to the same branch on the remote
    pub fn push_refspec(&self) -> String {
        format!("refs/heads/{}:refs/heads/{}", self.branch, self.branch)
    }
}

impl fmt::Display for TrackingBranch {
    /// Formats as `origin/master`, the way git shows remote branches.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote, self.branch)
    }
}
