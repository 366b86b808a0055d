//! Release orchestration
//!
//! [ReleaseWorkflow] walks a fixed sequence of checkpoints:
//!
//! ```text
//! Start → CleanTreeVerified → Fetched → SyncVerified → BranchCheckedOut
//!   → ChangelogValidated → VersionComputed → UserConfirmed → ScriptsRun
//!   → ChangelogRewritten → CommittedLocally → TaggedLocally(bare)
//!   → TaggedLocally(v-prefixed) → PushedVTagRemote → PushedCommits
//!   → PushedBareTagRemote → Done
//! ```
//!
//! Nothing is modified before the operator confirms. From then on each
//! mutation arms a [rollback::Compensation]; any failure unwinds them newest
//! first. Pushes go from easiest to hardest to reverse: the `v` tag, the
//! release commit, and finally the bare tag that kicks off release automation.

pub mod fetch;
pub mod rollback;

pub use fetch::{FetchDecision, FetchThrottle};
pub use rollback::{Compensation, RollbackGuard, RollbackStack, UnwindReport};

use git2::Oid;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::boundary::BoundaryWarning;
use crate::changelog::{self, ChangelogDocument, ChangelogPatterns};
use crate::config::Config;
use crate::domain::{latest_released, ReleaseTag, TagFlavor, TrackingBranch, Version, VersionBump};
use crate::error::{ReleaseError, Result};
use crate::git::{describe_status, Identity, Repository};
use crate::hooks::{run_pre_release_scripts, HookContext, PreReleaseManifest, ScriptRunner};
use crate::ui::{self, Prompter};

/// Checkpoints of a release, in the order they are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStage {
    Start,
    CleanTreeVerified,
    Fetched,
    SyncVerified,
    BranchCheckedOut,
    ChangelogValidated,
    VersionComputed,
    UserConfirmed,
    ScriptsRun,
    ChangelogRewritten,
    CommittedLocally,
    TaggedLocally(TagFlavor),
    PushedVTagRemote,
    PushedCommits,
    PushedBareTagRemote,
    Done,
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReleaseStage::Start => "starting release",
            ReleaseStage::CleanTreeVerified => "working tree is clean",
            ReleaseStage::Fetched => "remote is up to date",
            ReleaseStage::SyncVerified => "local branch is in sync with the remote",
            ReleaseStage::BranchCheckedOut => "release branch checked out",
            ReleaseStage::ChangelogValidated => "changelog is valid",
            ReleaseStage::VersionComputed => "next version computed",
            ReleaseStage::UserConfirmed => "release confirmed",
            ReleaseStage::ScriptsRun => "pre-release scripts finished",
            ReleaseStage::ChangelogRewritten => "changelog updated",
            ReleaseStage::CommittedLocally => "release commit created",
            ReleaseStage::TaggedLocally(TagFlavor::Bare) => "release tag created",
            ReleaseStage::TaggedLocally(TagFlavor::VPrefixed) => "v-prefixed release tag created",
            ReleaseStage::PushedVTagRemote => "v-prefixed tag pushed",
            ReleaseStage::PushedCommits => "release commit pushed",
            ReleaseStage::PushedBareTagRemote => "release tag pushed",
            ReleaseStage::Done => "release complete",
        };
        f.write_str(text)
    }
}

/// Everything a release run needs to know besides its collaborators
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseSettings {
    pub tracking: TrackingBranch,
    /// Changelog path relative to the repository root
    pub changelog_path: PathBuf,
    /// Pre-release script manifest relative to the repository root
    pub scripts_manifest: PathBuf,
    /// Additional paths committed with the changelog
    pub extra_paths: Vec<PathBuf>,
    pub fetch_grace_period: Duration,
    /// `--bump-major`: release a new major version whatever the changelog says
    pub explicit_major_bump: bool,
}

impl ReleaseSettings {
    pub fn from_config(config: &Config, explicit_major_bump: bool) -> Self {
        ReleaseSettings {
            tracking: TrackingBranch::new(
                config.repository.remote.clone(),
                config.repository.branch.clone(),
            ),
            changelog_path: config.changelog.path.clone(),
            scripts_manifest: config.release.scripts_manifest.clone(),
            extra_paths: config.release.extra_paths.clone(),
            fetch_grace_period: Duration::from_secs(config.release.fetch_grace_period_secs),
            explicit_major_bump,
        }
    }
}

/// A release that made it to the remote
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseSummary {
    pub previous: Version,
    pub version: Version,
    pub bump: VersionBump,
    pub commit: Oid,
    pub warnings: Vec<BoundaryWarning>,
}

/// How a release run ended without error
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    Released(ReleaseSummary),
    /// The operator declined; nothing was changed
    Cancelled { version: Version },
}

/// Commit message for the release commit
pub fn release_commit_message(version: &Version) -> String {
    format!("Finalize changes for release version '{}'", version)
}

/// Values computed before the operator is asked to confirm
struct ReleasePlan {
    identity: Identity,
    workdir: PathBuf,
    remote_tip: Oid,
    document: ChangelogDocument,
    previous: Version,
    version: Version,
    bump: VersionBump,
}

/// Drives one release against a repository
pub struct ReleaseWorkflow<'a, R: Repository + ?Sized> {
    repo: &'a R,
    runner: &'a dyn ScriptRunner,
    prompter: &'a dyn Prompter,
    patterns: &'a ChangelogPatterns,
    settings: ReleaseSettings,
}

impl<'a, R: Repository + ?Sized> ReleaseWorkflow<'a, R> {
    pub fn new(
        repo: &'a R,
        runner: &'a dyn ScriptRunner,
        prompter: &'a dyn Prompter,
        patterns: &'a ChangelogPatterns,
        settings: ReleaseSettings,
    ) -> Self {
        ReleaseWorkflow {
            repo,
            runner,
            prompter,
            patterns,
            settings,
        }
    }

    fn enter(&self, stage: ReleaseStage) {
        log::info!("{}", stage);
    }

    /// Run the release.
    ///
    /// # Returns
    /// * `Ok(ReleaseOutcome::Released)` - Commit and both tags are on the remote
    /// * `Ok(ReleaseOutcome::Cancelled)` - The operator declined at the prompt
    /// * `Err` - A check or step failed; every armed compensation has been run
    pub fn run(&self) -> Result<ReleaseOutcome> {
        let mut warnings = Vec::new();
        let plan = self.prepare(&mut warnings)?;

        ui::display_proposed_release(&plan.previous, &plan.version, plan.bump);
        if !self.prompter.confirm_release(&plan.version) {
            log::info!("Release of {} cancelled, nothing was changed", plan.version);
            return Ok(ReleaseOutcome::Cancelled {
                version: plan.version,
            });
        }
        self.enter(ReleaseStage::UserConfirmed);

        let mut rollback = RollbackStack::new();
        rollback.arm(Compensation::ResetBranch {
            target: plan.remote_tip,
            tracking: self.settings.tracking.clone(),
        });

        match self.publish(&plan, &mut rollback, &mut warnings) {
            Ok(commit) => {
                rollback.disarm();
                self.enter(ReleaseStage::Done);
                Ok(ReleaseOutcome::Released(ReleaseSummary {
                    previous: plan.previous,
                    version: plan.version,
                    bump: plan.bump,
                    commit,
                    warnings,
                }))
            }
            Err(e) => {
                log::error!("Release of {} failed: {}", plan.version, e);
                let report = rollback.unwind(self.repo);
                if !report.is_clean() {
                    ui::display_manual_recovery(&report.manual);
                }
                Err(e)
            }
        }
    }

    /// Read-only checks and the version decision.
    fn prepare(&self, warnings: &mut Vec<BoundaryWarning>) -> Result<ReleasePlan> {
        self.enter(ReleaseStage::Start);
        let identity = self.repo.author_identity()?;

        let status = self.repo.status()?;
        if !status.is_empty() {
            return Err(ReleaseError::DirtyWorkingTree {
                status: describe_status(&status),
            });
        }
        self.enter(ReleaseStage::CleanTreeVerified);

        self.fetch_if_stale(warnings)?;
        self.enter(ReleaseStage::Fetched);

        let remote_tip = self.verify_in_sync()?;
        self.enter(ReleaseStage::SyncVerified);

        let tracking = &self.settings.tracking;
        self.repo.checkout_branch(&tracking.branch).map_err(|e| {
            ReleaseError::reference(format!(
                "Missing required '{}' branch locally. Please run 'git checkout {}': {}",
                tracking.branch, tracking.branch, e
            ))
        })?;
        self.enter(ReleaseStage::BranchCheckedOut);

        let workdir = self.repo.workdir()?;
        let changelog_path = workdir.join(&self.settings.changelog_path);
        let text = fs::read_to_string(&changelog_path).map_err(|e| {
            ReleaseError::config(format!(
                "Cannot read changelog '{}': {}",
                changelog_path.display(),
                e
            ))
        })?;
        let document = changelog::parse(&text, self.patterns)?;
        self.enter(ReleaseStage::ChangelogValidated);

        let previous = latest_released(self.repo.list_tags()?, Version::ZERO)?;
        let bump = VersionBump::decide(
            document.has_breaking_change(),
            self.settings.explicit_major_bump,
        );
        let version = previous.bump(bump);
        log::info!(
            "Latest release is {}, next release is {} ({} bump)",
            previous,
            version,
            bump
        );
        self.enter(ReleaseStage::VersionComputed);

        Ok(ReleasePlan {
            identity,
            workdir,
            remote_tip,
            document,
            previous,
            version,
            bump,
        })
    }

    fn fetch_if_stale(&self, warnings: &mut Vec<BoundaryWarning>) -> Result<()> {
        let throttle = FetchThrottle::new(&self.repo.git_dir(), self.settings.fetch_grace_period);
        let now = fetch::unix_now()?;

        match throttle.decide(now)? {
            FetchDecision::Fetch => {
                log::info!("Fetching '{}'", self.settings.tracking.remote);
                self.repo.fetch(&self.settings.tracking.remote)?;
                throttle.record(now)?;
            }
            FetchDecision::Skip { seconds_since_last } => {
                self.warn(warnings, BoundaryWarning::FetchSkipped { seconds_since_last });
            }
        }

        Ok(())
    }

    /// Local and remote tracking branch must point at the same commit.
    fn verify_in_sync(&self) -> Result<Oid> {
        let tracking = &self.settings.tracking;
        let local = self.repo.resolve_reference(&tracking.local_ref()).map_err(|e| {
            ReleaseError::reference(format!(
                "Missing required '{}' branch locally. Please run 'git checkout {}': {}",
                tracking.branch, tracking.branch, e
            ))
        })?;
        let remote = self.repo.resolve_reference(&tracking.remote_ref())?;

        if local != remote {
            return Err(ReleaseError::BranchesDiverged {
                branch: tracking.branch.clone(),
                remote_branch: tracking.to_string(),
                local: local.to_string(),
                remote: remote.to_string(),
            });
        }

        Ok(remote)
    }

    /// Every mutating step, arming a compensation after each one.
    fn publish(
        &self,
        plan: &ReleasePlan,
        rollback: &mut RollbackStack,
        warnings: &mut Vec<BoundaryWarning>,
    ) -> Result<Oid> {
        let tracking = &self.settings.tracking;

        self.run_scripts(plan, warnings)?;
        self.enter(ReleaseStage::ScriptsRun);

        let rewritten = changelog::rewrite(&plan.document, &plan.version)?;
        fs::write(plan.workdir.join(&self.settings.changelog_path), rewritten)?;
        self.enter(ReleaseStage::ChangelogRewritten);

        let paths = self.release_paths(&plan.workdir, warnings);
        self.repo.stage_paths(&paths)?;
        let commit = self
            .repo
            .commit(&release_commit_message(&plan.version), &plan.identity)?;
        self.enter(ReleaseStage::CommittedLocally);

        let (bare, prefixed) = ReleaseTag::pair(&plan.version);
        for tag in [&bare, &prefixed] {
            self.repo
                .create_tag(&tag.name, commit, &tag.name, &plan.identity)?;
            rollback.arm(Compensation::DeleteLocalTag { tag: tag.clone() });
            self.enter(ReleaseStage::TaggedLocally(tag.flavor));
        }

        match self.repo.push(&tracking.remote, &[prefixed.push_refspec()]) {
            Ok(()) => {
                rollback.arm(Compensation::DeleteRemoteTag {
                    remote: tracking.remote.clone(),
                    tag: prefixed.clone(),
                });
                self.enter(ReleaseStage::PushedVTagRemote);
            }
            Err(e) => self.warn(
                warnings,
                BoundaryWarning::VPrefixedTagPushFailed {
                    tag: prefixed.name.clone(),
                    remote: tracking.remote.clone(),
                    reason: e.to_string(),
                },
            ),
        }

        self.repo
            .push(&tracking.remote, &[tracking.push_refspec()])?;
        rollback.arm(Compensation::PushedCommitsRecovery {
            tracking: tracking.clone(),
        });
        self.enter(ReleaseStage::PushedCommits);

        self.repo
            .push(&tracking.remote, &[bare.push_refspec()])
            .map_err(|e| ReleaseError::ReleaseTagPush {
                tag: bare.name.clone(),
                remote: tracking.remote.clone(),
                reason: e.to_string(),
                recovery: rollback::pushed_commits_recovery_steps(tracking).join("\n"),
            })?;
        self.enter(ReleaseStage::PushedBareTagRemote);

        Ok(commit)
    }

    fn run_scripts(&self, plan: &ReleasePlan, warnings: &mut Vec<BoundaryWarning>) -> Result<()> {
        let manifest_path = plan.workdir.join(&self.settings.scripts_manifest);
        let Some(manifest) = PreReleaseManifest::load(&manifest_path, &plan.workdir)? else {
            self.warn(
                warnings,
                BoundaryWarning::PreReleaseManifestMissing {
                    path: manifest_path,
                },
            );
            return Ok(());
        };
        if manifest.is_empty() {
            log::info!("'{}' lists no pre-release scripts", manifest_path.display());
            return Ok(());
        }

        let context = HookContext {
            version: plan.version,
            remote: self.settings.tracking.remote.clone(),
            branch: self.settings.tracking.branch.clone(),
            repo_root: plan.workdir.clone(),
        };
        run_pre_release_scripts(self.runner, manifest.scripts(), &context)
    }

    /// The changelog plus every configured extra path that exists.
    fn release_paths(&self, workdir: &Path, warnings: &mut Vec<BoundaryWarning>) -> Vec<PathBuf> {
        let mut paths = vec![self.settings.changelog_path.clone()];

        for path in &self.settings.extra_paths {
            if workdir.join(path).exists() {
                paths.push(path.clone());
            } else {
                self.warn(
                    warnings,
                    BoundaryWarning::ReleasePathMissing { path: path.clone() },
                );
            }
        }

        paths
    }

    fn warn(&self, warnings: &mut Vec<BoundaryWarning>, warning: BoundaryWarning) {
        ui::display_boundary_warning(&warning);
        warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_commit_message() {
        assert_eq!(
            release_commit_message(&Version::new(0, 1, 2)),
            "Finalize changes for release version '0.1.2'"
        );
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.repository.branch = "main".to_string();
        config.release.fetch_grace_period_secs = 5;

        let settings = ReleaseSettings::from_config(&config, true);

        assert_eq!(settings.tracking, TrackingBranch::new("origin", "main"));
        assert_eq!(settings.changelog_path, PathBuf::from("docs/changelog.md"));
        assert_eq!(settings.fetch_grace_period, Duration::from_secs(5));
        assert!(settings.explicit_major_bump);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(
            ReleaseStage::TaggedLocally(TagFlavor::VPrefixed).to_string(),
            "v-prefixed release tag created"
        );
        assert_eq!(ReleaseStage::Done.to_string(), "release complete");
    }
}
