//! Git operations abstraction layer
//!
//! The release workflow and the docker tag command only talk to git through
//! the [Repository] trait. Two implementations exist:
//!
//! - [repository::Git2Repository]: the real thing, backed by the `git2` crate
//! - [mock::MockRepository]: an in-memory repository that records every
//!   operation and can be told to fail specific ones
//!
//! ```rust
//! # use releaser::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> releaser::Result<()> {
//! let head = repo.head_oid()?;
//! for tag in repo.tags_at(head)? {
//!     println!("HEAD is tagged {}", tag);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::{ReleaseError, Result};
use git2::Oid;
use std::fmt;
use std::path::PathBuf;

/// Author and tagger identity used for release commits and tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Build an identity, rejecting empty name or email.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(ReleaseError::MissingIdentity { name, email });
        }
        Ok(Identity { name, email })
    }

    /// Signature stamped with the current time
    pub fn signature(&self) -> Result<git2::Signature<'static>> {
        Ok(git2::Signature::now(&self.name, &self.email)?)
    }
}

/// One path that differs from HEAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    /// Human readable state, e.g. `modified` or `untracked`
    pub state: String,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, state: impl Into<String>) -> Self {
        StatusEntry {
            path: path.into(),
            state: state.into(),
        }
    }
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {}", self.state, self.path)
    }
}

/// Render status entries one per line for error messages.
pub fn describe_status(entries: &[StatusEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Version-control operations needed to cut a release
///
/// Implementations map underlying failures (like `git2::Error`) onto
/// [crate::error::ReleaseError] variants. Mutating methods act on the
/// repository the implementation was opened on; nothing is cached between
/// calls.
pub trait Repository {
    /// Root of the working tree
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Absolute path of the working tree
    /// * `Err` - If the repository is bare
    fn workdir(&self) -> Result<PathBuf>;

    /// The repository metadata directory (`.git`)
    fn git_dir(&self) -> PathBuf;

    /// Paths with staged, unstaged or untracked changes. Ignored files are
    /// not reported.
    fn status(&self) -> Result<Vec<StatusEntry>>;

    /// Resolve a full reference name (e.g. `refs/remotes/origin/master`) to
    /// the commit it points at.
    ///
    /// # Arguments
    /// * `reference` - Full reference name
    ///
    /// # Returns
    /// * `Ok(Oid)` - Commit the reference peels to
    /// * `Err(ReleaseError::Reference)` - If the reference does not exist
    fn resolve_reference(&self, reference: &str) -> Result<Oid>;

    /// Commit currently checked out
    fn head_oid(&self) -> Result<Oid>;

    /// Names of all tags in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Names of the tags that peel to `commit`
    fn tags_at(&self, commit: Oid) -> Result<Vec<String>>;

    /// `user.name` and `user.email` from git configuration
    ///
    /// # Returns
    /// * `Ok(Identity)` - Both values are set and non-empty
    /// * `Err(ReleaseError::MissingIdentity)` - Either value is missing or empty
    fn author_identity(&self) -> Result<Identity>;

    /// Fetch all branches into `refs/remotes/<remote>/*` and all tags.
    fn fetch(&self, remote: &str) -> Result<()>;

    /// Check out a local branch and point HEAD at it.
    fn checkout_branch(&self, branch: &str) -> Result<()>;

    /// Stage paths, relative to the working tree. Directories are staged
    /// recursively and deleted tracked files are removed from the index.
    fn stage_paths(&self, paths: &[PathBuf]) -> Result<()>;

    /// Commit the index on top of HEAD.
    ///
    /// # Returns
    /// * `Ok(Oid)` - The new commit
    fn commit(&self, message: &str, identity: &Identity) -> Result<Oid>;

    /// Create an annotated tag.
    ///
    /// # Arguments
    /// * `name` - Tag name, without `refs/tags/`
    /// * `target` - Commit to tag
    /// * `message` - Annotation message
    /// * `identity` - Tagger
    ///
    /// # Returns
    /// * `Err(ReleaseError::Tag)` - If the tag already exists or cannot be written
    fn create_tag(&self, name: &str, target: Oid, message: &str, identity: &Identity)
        -> Result<()>;

    /// Delete a local tag.
    fn delete_tag(&self, name: &str) -> Result<()>;

    /// Push refspecs to a remote. A refspec with an empty source
    /// (`:refs/tags/x`) deletes the destination on the remote.
    ///
    /// # Returns
    /// * `Err(ReleaseError::Remote)` - If the remote rejects any reference
    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()>;

    /// Point the current branch at `target` and reset index and working tree
    /// to match it.
    fn reset_hard(&self, target: Oid) -> Result<()>;
}
