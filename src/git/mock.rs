use crate::error::{ReleaseError, Result};
use crate::git::{Identity, Repository, StatusEntry};
use git2::Oid;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Mock repository for testing without actual git operations
///
/// Local references (`refs/heads/*`, `refs/remotes/*`, `refs/tags/*`) and the
/// references held by a single simulated remote are kept in two maps. Every
/// trait call is appended to an operation log such as `push origin
/// refs/tags/1.0.0:refs/tags/1.0.0`; [MockRepository::fail_on] makes the call
/// with that exact log entry fail instead of taking effect.
pub struct MockRepository {
    workdir: PathBuf,
    state: RefCell<MockState>,
}

#[derive(Default)]
struct MockState {
    head_branch: Option<String>,
    local_refs: BTreeMap<String, Oid>,
    remote_refs: BTreeMap<String, Oid>,
    status: Vec<StatusEntry>,
    identity: Option<Identity>,
    staged: Vec<PathBuf>,
    operations: Vec<String>,
    failures: HashSet<String>,
    commits: u8,
}

impl MockRepository {
    /// Create an empty mock whose working tree is `workdir`; the metadata
    /// directory is `workdir/.git`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        MockRepository {
            workdir: workdir.into(),
            state: RefCell::new(MockState {
                identity: Some(Identity {
                    name: "Test User".to_string(),
                    email: "test@example.com".to_string(),
                }),
                ..MockState::default()
            }),
        }
    }

    /// Deterministic object id for tests
    pub fn oid(seed: u8) -> Oid {
        Oid::from_bytes(&[seed; 20]).unwrap_or_else(|_| Oid::zero())
    }

    /// Put `branch` at `oid` locally, in `refs/remotes/<remote>/<branch>` and
    /// on the remote itself.
    pub fn with_branch(self, remote: &str, branch: &str, oid: Oid) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.local_refs.insert(format!("refs/heads/{}", branch), oid);
            state
                .local_refs
                .insert(format!("refs/remotes/{}/{}", remote, branch), oid);
            state.remote_refs.insert(format!("refs/heads/{}", branch), oid);
            state.head_branch.get_or_insert_with(|| branch.to_string());
        }
        self
    }

    /// A tag present both locally and on the remote
    pub fn with_tag(self, name: &str, oid: Oid) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.local_refs.insert(format!("refs/tags/{}", name), oid);
            state.remote_refs.insert(format!("refs/tags/{}", name), oid);
        }
        self
    }

    /// Report `path` as changed
    pub fn with_status(self, path: &str, state: &str) -> Self {
        self.state
            .borrow_mut()
            .status
            .push(StatusEntry::new(path, state));
        self
    }

    /// Replace the configured identity; `None` means `user.name` and
    /// `user.email` are unset.
    pub fn with_identity(self, identity: Option<Identity>) -> Self {
        self.state.borrow_mut().identity = identity;
        self
    }

    /// Make the operation with this log entry fail.
    pub fn fail_on(self, operation: &str) -> Self {
        self.state
            .borrow_mut()
            .failures
            .insert(operation.to_string());
        self
    }

    /// Move a reference on the simulated remote
    pub fn set_remote_ref(&self, reference: &str, oid: Oid) {
        self.state
            .borrow_mut()
            .remote_refs
            .insert(reference.to_string(), oid);
    }

    /// Move a local reference
    pub fn set_local_ref(&self, reference: &str, oid: Oid) {
        self.state
            .borrow_mut()
            .local_refs
            .insert(reference.to_string(), oid);
    }

    /// Every operation attempted so far, in order
    pub fn operations(&self) -> Vec<String> {
        self.state.borrow().operations.clone()
    }

    pub fn local_ref(&self, reference: &str) -> Option<Oid> {
        self.state.borrow().local_refs.get(reference).copied()
    }

    pub fn remote_ref(&self, reference: &str) -> Option<Oid> {
        self.state.borrow().remote_refs.get(reference).copied()
    }

    /// Local tag names, sorted
    pub fn local_tags(&self) -> Vec<String> {
        Self::tag_names(&self.state.borrow().local_refs)
    }

    /// Tag names on the simulated remote, sorted
    pub fn remote_tags(&self) -> Vec<String> {
        Self::tag_names(&self.state.borrow().remote_refs)
    }

    /// Path inside the mock working tree
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.workdir.join(relative)
    }

    /// Paths passed to `stage_paths`
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.state.borrow().staged.clone()
    }

    fn tag_names(refs: &BTreeMap<String, Oid>) -> Vec<String> {
        refs.keys()
            .filter_map(|name| name.strip_prefix("refs/tags/"))
            .map(str::to_string)
            .collect()
    }

    /// Log `operation` and fail if it was marked with `fail_on`.
    fn record(&self, operation: String) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let fails = state.failures.contains(&operation);
        state.operations.push(operation.clone());
        if fails {
            return Err(ReleaseError::Git(git2::Error::from_str(&format!(
                "injected failure: {}",
                operation
            ))));
        }
        Ok(())
    }

    fn head_ref(state: &MockState) -> Result<String> {
        state
            .head_branch
            .as_ref()
            .map(|branch| format!("refs/heads/{}", branch))
            .ok_or_else(|| ReleaseError::reference("HEAD does not point at a branch"))
    }
}

impl Repository for MockRepository {
    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn git_dir(&self) -> PathBuf {
        self.workdir.join(".git")
    }

    fn status(&self) -> Result<Vec<StatusEntry>> {
        Ok(self.state.borrow().status.clone())
    }

    fn resolve_reference(&self, reference: &str) -> Result<Oid> {
        self.local_ref(reference)
            .ok_or_else(|| ReleaseError::reference(format!("Cannot find reference '{}'", reference)))
    }

    fn head_oid(&self) -> Result<Oid> {
        let head = Self::head_ref(&self.state.borrow())?;
        self.resolve_reference(&head)
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.local_tags())
    }

    fn tags_at(&self, commit: Oid) -> Result<Vec<String>> {
        let state = self.state.borrow();
        Ok(state
            .local_refs
            .iter()
            .filter(|(_, oid)| **oid == commit)
            .filter_map(|(name, _)| name.strip_prefix("refs/tags/"))
            .map(str::to_string)
            .collect())
    }

    fn author_identity(&self) -> Result<Identity> {
        match &self.state.borrow().identity {
            Some(identity) => Identity::new(identity.name.clone(), identity.email.clone()),
            None => Err(ReleaseError::MissingIdentity {
                name: String::new(),
                email: String::new(),
            }),
        }
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.record(format!("fetch {}", remote))?;

        let mut state = self.state.borrow_mut();
        let fetched: Vec<(String, Oid)> = state
            .remote_refs
            .iter()
            .map(|(name, oid)| match name.strip_prefix("refs/heads/") {
                Some(branch) => (format!("refs/remotes/{}/{}", remote, branch), *oid),
                None => (name.clone(), *oid),
            })
            .collect();
        state.local_refs.extend(fetched);

        Ok(())
    }

    fn checkout_branch(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout {}", branch))?;

        let reference = format!("refs/heads/{}", branch);
        self.resolve_reference(&reference)?;
        self.state.borrow_mut().head_branch = Some(branch.to_string());

        Ok(())
    }

    fn stage_paths(&self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            self.record(format!("stage {}", path.display()))?;
            self.state.borrow_mut().staged.push(path.clone());
        }
        Ok(())
    }

    fn commit(&self, message: &str, identity: &Identity) -> Result<Oid> {
        self.record("commit".to_string())?;
        log::debug!("mock commit by {} <{}>: {}", identity.name, identity.email, message);

        let mut state = self.state.borrow_mut();
        let head = Self::head_ref(&state)?;
        state.commits = state.commits.wrapping_add(1);
        let oid = Self::oid(0xc0_u8.wrapping_add(state.commits));
        state.local_refs.insert(head, oid);
        state.staged.clear();

        Ok(oid)
    }

    fn create_tag(
        &self,
        name: &str,
        target: Oid,
        _message: &str,
        _identity: &Identity,
    ) -> Result<()> {
        self.record(format!("tag {}", name))?;

        let reference = format!("refs/tags/{}", name);
        let mut state = self.state.borrow_mut();
        if state.local_refs.contains_key(&reference) {
            return Err(ReleaseError::tag(format!("Tag '{}' already exists", name)));
        }
        state.local_refs.insert(reference, target);

        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.record(format!("delete-tag {}", name))?;

        let reference = format!("refs/tags/{}", name);
        match self.state.borrow_mut().local_refs.remove(&reference) {
            Some(_) => Ok(()),
            None => Err(ReleaseError::tag(format!("Tag '{}' does not exist", name))),
        }
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        for refspec in refspecs {
            self.record(format!("push {} {}", remote, refspec))?;

            let (source, destination) = refspec
                .split_once(':')
                .ok_or_else(|| ReleaseError::remote(format!("Invalid refspec '{}'", refspec)))?;

            let mut state = self.state.borrow_mut();
            if source.is_empty() {
                state.remote_refs.remove(destination);
                continue;
            }

            let oid = state.local_refs.get(source).copied().ok_or_else(|| {
                ReleaseError::remote(format!("src refspec '{}' does not match any", source))
            })?;
            state.remote_refs.insert(destination.to_string(), oid);
            if let Some(branch) = destination.strip_prefix("refs/heads/") {
                state
                    .local_refs
                    .insert(format!("refs/remotes/{}/{}", remote, branch), oid);
            }
        }
        Ok(())
    }

    fn reset_hard(&self, target: Oid) -> Result<()> {
        self.record(format!("reset {}", target))?;

        let mut state = self.state.borrow_mut();
        let head = Self::head_ref(&state)?;
        state.local_refs.insert(head, target);

        Ok(())
    }
}
