//! Undo log for the mutating half of a release
//!
//! Every mutation that succeeds pushes a [Compensation] onto a
//! [RollbackStack]. When a later step fails the stack is unwound newest
//! first; when the release completes it is disarmed and nothing runs.

use git2::Oid;
use std::fmt;

use crate::domain::{ReleaseTag, TrackingBranch};
use crate::git::Repository;

/// The action that undoes one completed release step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Hard reset the release branch to the commit it had before the release
    ResetBranch {
        target: Oid,
        tracking: TrackingBranch,
    },
    /// Delete a tag created locally
    DeleteLocalTag { tag: ReleaseTag },
    /// Delete a tag that was pushed
    DeleteRemoteTag { remote: String, tag: ReleaseTag },
    /// Pushed commits are never rewritten automatically; the step that
    /// failed after the push carries the recovery instructions
    PushedCommitsRecovery { tracking: TrackingBranch },
}

/// Result of running one compensation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompensationOutcome {
    Reverted,
    ManualActionRequired(String),
    LeftInPlace,
}

impl Compensation {
    /// The git command that does the same thing by hand
    pub fn manual_command(&self) -> String {
        match self {
            Compensation::ResetBranch { tracking, .. } => {
                format!("git reset --hard {}", tracking)
            }
            Compensation::DeleteLocalTag { tag } => format!("git tag -d {}", tag),
            Compensation::DeleteRemoteTag { remote, tag } => {
                format!("git push --delete {} {}", remote, tag)
            }
            Compensation::PushedCommitsRecovery { tracking } => {
                format!("git push -f {} {}", tracking.remote, tracking.branch)
            }
        }
    }

    /// Run the compensation against `repo`.
    ///
    /// Failures are logged with an `ACTION REQUIRED` marker and the manual
    /// command; they are never returned, so the error that triggered the
    /// rollback stays the one reported.
    pub fn apply<R: Repository + ?Sized>(&self, repo: &R) -> CompensationOutcome {
        let result = match self {
            Compensation::ResetBranch { target, .. } => repo.reset_hard(*target),
            Compensation::DeleteLocalTag { tag } => repo.delete_tag(&tag.name),
            Compensation::DeleteRemoteTag { remote, tag } => {
                repo.push(remote, &[tag.delete_refspec()])
            }
            Compensation::PushedCommitsRecovery { tracking } => {
                log::warn!("Leaving the release commit on '{}' in place", tracking);
                return CompensationOutcome::LeftInPlace;
            }
        };

        match result {
            Ok(()) => {
                log::info!("Rolled back: {}", self);
                CompensationOutcome::Reverted
            }
            Err(e) => {
                log::error!(
                    "ACTION REQUIRED: An error occurred attempting to {}: {}. Please run '{}' to undo it manually.",
                    self,
                    e,
                    self.manual_command()
                );
                CompensationOutcome::ManualActionRequired(self.manual_command())
            }
        }
    }
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compensation::ResetBranch { target, tracking } => {
                write!(f, "reset '{}' to {} ({})", tracking.branch, tracking, target)
            }
            Compensation::DeleteLocalTag { tag } => write!(f, "delete local tag '{}'", tag),
            Compensation::DeleteRemoteTag { remote, tag } => {
                write!(f, "delete tag '{}' from '{}'", tag, remote)
            }
            Compensation::PushedCommitsRecovery { tracking } => {
                write!(f, "undo the release commit pushed to '{}'", tracking)
            }
        }
    }
}

/// Steps for undoing a release commit that already reached the remote.
pub fn pushed_commits_recovery_steps(tracking: &TrackingBranch) -> Vec<String> {
    vec![
        format!("Run 'git fetch {}' to pull down the latest changes", tracking.remote),
        format!(
            "Verify that '{}' has no new commits that a force push would destroy",
            tracking
        ),
        format!(
            "Ensure the local '{}' branch has no leftover release changes and is on the commit before the release",
            tracking.branch
        ),
        format!(
            "Run 'git push -f {} {}' from the local branch",
            tracking.remote, tracking.branch
        ),
    ]
}

/// What unwinding a [RollbackStack] achieved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnwindReport {
    /// Compensations that ran successfully, in execution order
    pub reverted: Vec<String>,
    /// Commands the operator still has to run
    pub manual: Vec<String>,
    /// Steps that were deliberately not undone
    pub left_in_place: Vec<String>,
}

impl UnwindReport {
    pub fn is_clean(&self) -> bool {
        self.manual.is_empty()
    }
}

/// An armed compensation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackGuard {
    compensation: Compensation,
}

impl RollbackGuard {
    pub fn compensation(&self) -> &Compensation {
        &self.compensation
    }
}

/// Compensations armed so far, oldest first
#[derive(Debug, Default)]
pub struct RollbackStack {
    guards: Vec<RollbackGuard>,
}

impl RollbackStack {
    pub fn new() -> Self {
        RollbackStack { guards: Vec::new() }
    }

    /// Arm a compensation for a step that just succeeded.
    pub fn arm(&mut self, compensation: Compensation) {
        log::debug!("Armed rollback: {}", compensation);
        self.guards.push(RollbackGuard { compensation });
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Armed compensations, oldest first
    pub fn guards(&self) -> &[RollbackGuard] {
        &self.guards
    }

    /// The release committed; drop every compensation without running it.
    pub fn disarm(self) {
        log::debug!("Disarmed {} rollback guard(s)", self.guards.len());
    }

    /// Run every compensation, newest first.
    pub fn unwind<R: Repository + ?Sized>(self, repo: &R) -> UnwindReport {
        let mut report = UnwindReport::default();

        if !self.guards.is_empty() {
            log::warn!("Rolling back {} release step(s)", self.guards.len());
        }

        for guard in self.guards.into_iter().rev() {
            match guard.compensation.apply(repo) {
                CompensationOutcome::Reverted => {
                    report.reverted.push(guard.compensation.to_string())
                }
                CompensationOutcome::ManualActionRequired(command) => report.manual.push(command),
                CompensationOutcome::LeftInPlace => {
                    report.left_in_place.push(guard.compensation.to_string())
                }
            }
        }

        report
    }
}
