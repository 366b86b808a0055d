use crate::error::{ReleaseError, Result};
use crate::git::{Identity, StatusEntry};
use git2::{
    build::CheckoutBuilder, CredentialType, ErrorClass, ErrorCode, IndexAddOption, Oid, PushOptions,
    RemoteCallbacks, Repository as Git2Repo, ResetType, Status, StatusOptions,
};
use std::path::{Path, PathBuf};

/// Credential callbacks give up after this many offers so a rejected
/// credential does not loop forever.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    token: Option<String>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo, token: None })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo, token: None }
    }

    /// Offer `token` as the HTTPS password (user `git`) when a remote asks
    /// for plaintext credentials.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Remote callbacks with the credential chain: token, SSH keys from
    /// `~/.ssh`, SSH agent, then libgit2 defaults.
    fn remote_callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        let token = self.token.as_deref();
        let mut attempts = 0;

        callbacks.credentials(move |url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str(&format!(
                    "Authentication to '{}' failed after {} attempts",
                    url, MAX_CREDENTIAL_ATTEMPTS
                )));
            }

            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(token) = token {
                    return git2::Cred::userpass_plaintext("git", token);
                }
            }

            if allowed_types.contains(CredentialType::SSH_KEY) {
                let user = username_from_url.unwrap_or("git");
                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = git2::Cred::ssh_key(user, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }

                if let Ok(cred) = git2::Cred::ssh_key_from_agent(user) {
                    return Ok(cred);
                }
            }

            git2::Cred::default()
        });

        callbacks
    }

    fn find_remote(&self, remote: &str) -> Result<git2::Remote<'_>> {
        self.repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote '{}': {}", remote, e)))
    }
}

/// Human readable name for a libgit2 status, the way `git status` words it.
fn describe(status: Status) -> &'static str {
    if status.is_conflicted() {
        "conflicted"
    } else if status.is_index_new() {
        "new file"
    } else if status.is_index_renamed() || status.is_wt_renamed() {
        "renamed"
    } else if status.is_index_deleted() || status.is_wt_deleted() {
        "deleted"
    } else if status.is_index_typechange() || status.is_wt_typechange() {
        "typechange"
    } else if status.is_wt_new() {
        "untracked"
    } else {
        "modified"
    }
}

impl super::Repository for Git2Repository {
    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReleaseError::config("Repository has no working tree (bare repository)"))
    }

    fn git_dir(&self) -> PathBuf {
        self.repo.path().to_path_buf()
    }

    fn status(&self) -> Result<Vec<StatusEntry>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;

        Ok(statuses
            .iter()
            .filter(|entry| entry.status() != Status::CURRENT)
            .map(|entry| {
                StatusEntry::new(
                    entry.path().unwrap_or("(non UTF-8 path)"),
                    describe(entry.status()),
                )
            })
            .collect())
    }

    fn resolve_reference(&self, reference: &str) -> Result<Oid> {
        let found = self.repo.find_reference(reference).map_err(|e| {
            ReleaseError::reference(format!("Cannot find reference '{}': {}", reference, e))
        })?;

        let commit = found.peel_to_commit().map_err(|e| {
            ReleaseError::reference(format!("'{}' does not point at a commit: {}", reference, e))
        })?;

        Ok(commit.id())
    }

    fn head_oid(&self) -> Result<Oid> {
        let head = self.repo.head()?;
        Ok(head.peel_to_commit()?.id())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn tags_at(&self, commit: Oid) -> Result<Vec<String>> {
        let mut tags = Vec::new();

        for name in self.list_tags()? {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            // Tags on trees or blobs never match a commit.
            if let Ok(target) = reference.peel_to_commit() {
                if target.id() == commit {
                    tags.push(name);
                }
            }
        }

        Ok(tags)
    }

    fn author_identity(&self) -> Result<Identity> {
        let config = self.repo.config()?.snapshot()?;
        let read = |key: &str| match config.get_string(key) {
            Ok(value) => Ok(value),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(String::new()),
            Err(e) => Err(ReleaseError::from(e)),
        };

        Identity::new(read("user.name")?, read("user.email")?)
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        let mut git_remote = self.find_remote(remote)?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(self.remote_callbacks());

        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", remote);
        let refspecs = [refspec_heads.as_str(), "+refs/tags/*:refs/tags/*"];

        git_remote
            .fetch(&refspecs, Some(&mut fetch_options), None)
            .map_err(|e| {
                ReleaseError::remote(format!("Failed to fetch from remote '{}': {}", remote, e))
            })?;

        Ok(())
    }

    fn checkout_branch(&self, branch: &str) -> Result<()> {
        let reference = format!("refs/heads/{}", branch);
        let target = self.repo.revparse_single(&reference).map_err(|e| {
            ReleaseError::reference(format!("Cannot find branch '{}': {}", branch, e))
        })?;

        self.repo
            .checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&reference)?;

        Ok(())
    }

    fn stage_paths(&self, paths: &[PathBuf]) -> Result<()> {
        // Pathspecs expand directories; the update pass records deletions.
        let mut index = self.repo.index()?;
        index.add_all(paths.iter().map(PathBuf::as_path), IndexAddOption::DEFAULT, None)?;
        index.update_all(paths.iter().map(PathBuf::as_path), None)?;
        index.write()?;

        Ok(())
    }

    fn commit(&self, message: &str, identity: &Identity) -> Result<Oid> {
        let signature = identity.signature()?;

        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;

        Ok(oid)
    }

    fn create_tag(
        &self,
        name: &str,
        target: Oid,
        message: &str,
        identity: &Identity,
    ) -> Result<()> {
        let object = self
            .repo
            .find_object(target, None)
            .map_err(|e| ReleaseError::tag(format!("Cannot find object {}: {}", target, e)))?;

        self.repo
            .tag(name, &object, &identity.signature()?, message, false)
            .map_err(|e| ReleaseError::tag(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.repo
            .tag_delete(name)
            .map_err(|e| ReleaseError::tag(format!("Cannot delete tag '{}': {}", name, e)))
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut git_remote = self.find_remote(remote)?;

        let mut callbacks = self.remote_callbacks();
        // libgit2 reports per-reference rejections here rather than failing push().
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        git_remote
            .push(refspecs, Some(&mut push_options))
            .map_err(|e| {
                let what = refspecs.join(" ");
                if e.class() == ErrorClass::Net {
                    ReleaseError::remote(format!("Network error pushing '{}': {}", what, e))
                } else if e.class() == ErrorClass::Reference {
                    ReleaseError::remote(format!("Reference error pushing '{}': {}", what, e))
                } else {
                    ReleaseError::remote(format!(
                        "Failed to push '{}' to '{}': {}",
                        what, remote, e
                    ))
                }
            })
    }

    fn reset_hard(&self, target: Oid) -> Result<()> {
        let object = self.repo.find_object(target, None)?;
        self.repo.reset(&object, ResetType::Hard, None)?;

        Ok(())
    }
}
