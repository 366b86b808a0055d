use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use releaser::boundary::BoundaryWarning;
use releaser::changelog::ChangelogPatterns;
use releaser::config::Config;
use releaser::domain::{Version, VersionBump};
use releaser::git::MockRepository;
use releaser::hooks::{HookContext, ScriptOutput, ScriptRunner};
use releaser::release::{fetch, ReleaseOutcome, ReleaseSettings, ReleaseWorkflow};
use releaser::ui::Prompter;
use releaser::{ChangelogError, ReleaseError, Result};
use tempfile::TempDir;

const CHANGELOG: &str = "# TBD\n\n* Fixed the frobnicator\n\n# 0.1.0\n\n* Initial release\n";

const BREAKING_CHANGELOG: &str =
    "# TBD\n\n## Breaking changes\n\n* Renamed the config file\n\n# 0.1.0\n\n* Initial release\n";

const TAG_PUSH: &str = "push origin refs/tags/0.1.1:refs/tags/0.1.1";
const V_TAG_PUSH: &str = "push origin refs/tags/v0.1.1:refs/tags/v0.1.1";
const BRANCH_PUSH: &str = "push origin refs/heads/master:refs/heads/master";

struct ScriptedPrompter {
    answer: bool,
    asked: RefCell<Vec<Version>>,
}

impl ScriptedPrompter {
    fn answering(answer: bool) -> Self {
        ScriptedPrompter {
            answer,
            asked: RefCell::new(Vec::new()),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm_release(&self, version: &Version) -> bool {
        self.asked.borrow_mut().push(*version);
        self.answer
    }
}

#[derive(Default)]
struct RecordingRunner {
    failing: Option<String>,
    calls: RefCell<Vec<(PathBuf, String)>>,
}

impl RecordingRunner {
    fn failing_on(script: &str) -> Self {
        RecordingRunner {
            failing: Some(script.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ScriptRunner for RecordingRunner {
    fn run_script(&self, script: &Path, context: &HookContext) -> Result<ScriptOutput> {
        self.calls
            .borrow_mut()
            .push((script.to_path_buf(), context.version.to_string()));

        let fails = self
            .failing
            .as_deref()
            .map_or(false, |name| script.ends_with(name));
        Ok(ScriptOutput {
            code: Some(if fails { 1 } else { 0 }),
            stderr: if fails { "boom".to_string() } else { String::new() },
        })
    }
}

/// A scratch working tree with a changelog and a mock repository over it.
fn setup(changelog: &str) -> (TempDir, MockRepository) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs/changelog.md"), changelog).unwrap();

    let repo = MockRepository::new(dir.path())
        .with_branch("origin", "master", MockRepository::oid(1))
        .with_tag("0.1.0", MockRepository::oid(0x10))
        .with_tag("v0.1.0", MockRepository::oid(0x10));

    (dir, repo)
}

fn write_manifest(dir: &TempDir, scripts: &[&str]) {
    fs::write(
        dir.path().join(".pre-release-scripts.txt"),
        scripts.join("\n"),
    )
    .unwrap();
}

fn settings() -> ReleaseSettings {
    ReleaseSettings::from_config(&Config::default(), false)
}

fn run(
    repo: &MockRepository,
    runner: &RecordingRunner,
    prompter: &ScriptedPrompter,
    settings: ReleaseSettings,
) -> Result<ReleaseOutcome> {
    let patterns = ChangelogPatterns::new().unwrap();
    ReleaseWorkflow::new(repo, runner, prompter, &patterns, settings).run()
}

fn changelog(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join("docs/changelog.md")).unwrap()
}

#[test]
fn test_successful_release() {
    let (dir, repo) = setup(CHANGELOG);
    write_manifest(&dir, &["# bump versions", "scripts/bump.sh", "", "scripts/build.sh"]);
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let outcome = run(&repo, &runner, &prompter, settings()).unwrap();

    let ReleaseOutcome::Released(summary) = outcome else {
        panic!("expected a release, got {:?}", outcome);
    };
    assert_eq!(summary.previous, Version::new(0, 1, 0));
    assert_eq!(summary.version, Version::new(0, 1, 1));
    assert_eq!(summary.bump, VersionBump::Patch);
    assert!(summary.warnings.is_empty());
    assert_eq!(*prompter.asked.borrow(), vec![Version::new(0, 1, 1)]);

    assert_eq!(
        *runner.calls.borrow(),
        vec![
            (dir.path().join("scripts/bump.sh"), "0.1.1".to_string()),
            (dir.path().join("scripts/build.sh"), "0.1.1".to_string()),
        ]
    );

    assert_eq!(
        changelog(&dir),
        "# TBD\n\n# 0.1.1\n\n* Fixed the frobnicator\n\n# 0.1.0\n\n* Initial release\n"
    );

    assert_eq!(
        repo.operations(),
        vec![
            "fetch origin".to_string(),
            "checkout master".to_string(),
            "stage docs/changelog.md".to_string(),
            "commit".to_string(),
            "tag 0.1.1".to_string(),
            "tag v0.1.1".to_string(),
            V_TAG_PUSH.to_string(),
            BRANCH_PUSH.to_string(),
            TAG_PUSH.to_string(),
        ]
    );
    assert_eq!(repo.remote_ref("refs/heads/master"), Some(summary.commit));
    assert_eq!(
        repo.remote_tags(),
        vec!["0.1.0", "0.1.1", "v0.1.0", "v0.1.1"]
    );
    assert!(dir.path().join(".git/last-fetch.txt").exists());
}

#[test]
fn test_breaking_change_bumps_minor() {
    let (_dir, repo) = setup(BREAKING_CHANGELOG);
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let outcome = run(&repo, &runner, &prompter, settings()).unwrap();

    let ReleaseOutcome::Released(summary) = outcome else {
        panic!("expected a release, got {:?}", outcome);
    };
    assert_eq!(summary.version, Version::new(0, 2, 0));
    assert_eq!(summary.bump, VersionBump::Minor);
}

#[test]
fn test_explicit_major_bump_overrides_changelog() {
    let (_dir, repo) = setup(CHANGELOG);
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);
    let settings = ReleaseSettings::from_config(&Config::default(), true);

    let outcome = run(&repo, &runner, &prompter, settings).unwrap();

    let ReleaseOutcome::Released(summary) = outcome else {
        panic!("expected a release, got {:?}", outcome);
    };
    assert_eq!(summary.version, Version::new(1, 0, 0));
    assert_eq!(repo.local_tags(), vec!["0.1.0", "1.0.0", "v0.1.0", "v1.0.0"]);
}

#[test]
fn test_declined_confirmation_changes_nothing() {
    let (dir, repo) = setup(CHANGELOG);
    write_manifest(&dir, &["scripts/bump.sh"]);
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(false);

    let outcome = run(&repo, &runner, &prompter, settings()).unwrap();

    assert_eq!(
        outcome,
        ReleaseOutcome::Cancelled {
            version: Version::new(0, 1, 1)
        }
    );
    assert!(runner.calls.borrow().is_empty());
    assert_eq!(changelog(&dir), CHANGELOG);
    assert_eq!(
        repo.operations(),
        vec!["fetch origin".to_string(), "checkout master".to_string()]
    );
}

#[test]
fn test_dirty_tree_is_rejected_before_fetching() {
    let (_dir, repo) = setup(CHANGELOG);
    let repo = repo.with_status("src/lib.rs", "modified");
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let err = run(&repo, &runner, &prompter, settings()).unwrap_err();

    match err {
        ReleaseError::DirtyWorkingTree { status } => assert!(status.contains("src/lib.rs")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(repo.operations().is_empty());
    assert!(prompter.asked.borrow().is_empty());
}

#[test]
fn test_missing_identity_is_rejected() {
    let (_dir, repo) = setup(CHANGELOG);
    let repo = repo.with_identity(None);
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let err = run(&repo, &runner, &prompter, settings()).unwrap_err();

    assert!(matches!(err, ReleaseError::MissingIdentity { .. }));
    assert!(repo.operations().is_empty());
}

#[test]
fn test_diverged_branches_are_rejected() {
    let (_dir, repo) = setup(CHANGELOG);
    repo.set_remote_ref("refs/heads/master", MockRepository::oid(9));
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let err = run(&repo, &runner, &prompter, settings()).unwrap_err();

    match err {
        ReleaseError::BranchesDiverged {
            local,
            remote,
            remote_branch,
            ..
        } => {
            assert_eq!(local, MockRepository::oid(1).to_string());
            assert_eq!(remote, MockRepository::oid(9).to_string());
            assert_eq!(remote_branch, "origin/master");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(repo.operations(), vec!["fetch origin".to_string()]);
}

#[test]
fn test_invalid_changelog_is_rejected_before_confirmation() {
    let (_dir, repo) = setup("# 0.1.0\n\n* Initial release\n");
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let err = run(&repo, &runner, &prompter, settings()).unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Changelog(ChangelogError::MissingUnreleasedHeader { line: Some(1) })
    ));
    assert!(prompter.asked.borrow().is_empty());
}

#[test]
fn test_empty_unreleased_section_is_rejected() {
    let (_dir, repo) = setup("# TBD\n\n# 0.1.0\n\n* Initial release\n");
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let err = run(&repo, &runner, &prompter, settings()).unwrap_err();

    assert!(matches!(
        err,
        ReleaseError::Changelog(ChangelogError::EmptyUnreleasedSection { .. })
    ));
}

#[test]
fn test_script_failure_resets_branch() {
    let (dir, repo) = setup(CHANGELOG);
    write_manifest(&dir, &["scripts/bump.sh", "scripts/build.sh", "scripts/never.sh"]);
    let runner = RecordingRunner::failing_on("build.sh");
    let prompter = ScriptedPrompter::answering(true);

    let err = run(&repo, &runner, &prompter, settings()).unwrap_err();

    match err {
        ReleaseError::Script {
            script,
            version,
            code,
            stderr,
        } => {
            assert!(script.ends_with("scripts/build.sh"));
            assert_eq!(version, "0.1.1");
            assert_eq!(code, Some(1));
            assert_eq!(stderr, "boom");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(runner.calls.borrow().len(), 2);
    assert_eq!(changelog(&dir), CHANGELOG);
    assert_eq!(
        repo.operations().last(),
        Some(&format!("reset {}", MockRepository::oid(1)))
    );
    assert_eq!(repo.local_tags(), vec!["0.1.0", "v0.1.0"]);
}

#[test]
fn test_branch_push_failure_unwinds_everything() {
    let (_dir, repo) = setup(CHANGELOG);
    let repo = repo.fail_on(BRANCH_PUSH);
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let err = run(&repo, &runner, &prompter, settings()).unwrap_err();

    assert!(matches!(err, ReleaseError::Git(_)));
    let operations = repo.operations();
    let failed_at = operations
        .iter()
        .position(|op| op == BRANCH_PUSH)
        .unwrap();
    assert_eq!(
        operations[failed_at + 1..],
        [
            "push origin :refs/tags/v0.1.1".to_string(),
            "delete-tag v0.1.1".to_string(),
            "delete-tag 0.1.1".to_string(),
            format!("reset {}", MockRepository::oid(1)),
        ]
    );
    assert_eq!(repo.local_tags(), vec!["0.1.0", "v0.1.0"]);
    assert_eq!(repo.remote_tags(), vec!["0.1.0", "v0.1.0"]);
    assert_eq!(repo.local_ref("refs/heads/master"), Some(MockRepository::oid(1)));
    assert_eq!(repo.remote_ref("refs/heads/master"), Some(MockRepository::oid(1)));
}

#[test]
fn test_v_tag_push_failure_is_only_a_warning() {
    let (_dir, repo) = setup(CHANGELOG);
    let repo = repo.fail_on(V_TAG_PUSH);
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let outcome = run(&repo, &runner, &prompter, settings()).unwrap();

    let ReleaseOutcome::Released(summary) = outcome else {
        panic!("expected a release, got {:?}", outcome);
    };
    assert!(summary.warnings.iter().any(|warning| matches!(
        warning,
        BoundaryWarning::VPrefixedTagPushFailed { tag, .. } if tag == "v0.1.1"
    )));
    assert_eq!(repo.remote_tags(), vec!["0.1.0", "0.1.1", "v0.1.0"]);
}

#[test]
fn test_release_tag_push_failure_requires_manual_recovery() {
    let (_dir, repo) = setup(CHANGELOG);
    let repo = repo.fail_on(TAG_PUSH);
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);

    let err = run(&repo, &runner, &prompter, settings()).unwrap_err();

    match &err {
        ReleaseError::ReleaseTagPush { tag, recovery, .. } => {
            assert_eq!(tag, "0.1.1");
            assert!(recovery.contains("git push -f origin master"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.to_string().matches("git push -f origin master").count(), 1);

    // The pushed commit stays on the remote; everything else is undone.
    assert_ne!(repo.remote_ref("refs/heads/master"), Some(MockRepository::oid(1)));
    assert_eq!(repo.remote_tags(), vec!["0.1.0", "v0.1.0"]);
    assert_eq!(repo.local_tags(), vec!["0.1.0", "v0.1.0"]);
    assert_eq!(repo.local_ref("refs/heads/master"), Some(MockRepository::oid(1)));
}

#[test]
fn test_recent_fetch_is_skipped() {
    let (dir, repo) = setup(CHANGELOG);
    let now = fetch::unix_now().unwrap();
    fs::write(dir.path().join(".git/last-fetch.txt"), now.to_string()).unwrap();
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(false);

    run(&repo, &runner, &prompter, settings()).unwrap();

    assert!(!repo.operations().contains(&"fetch origin".to_string()));
}

#[test]
fn test_extra_paths_are_staged_when_present() {
    let (dir, repo) = setup(CHANGELOG);
    fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();
    let runner = RecordingRunner::default();
    let prompter = ScriptedPrompter::answering(true);
    let mut settings = settings();
    settings.extra_paths = vec![PathBuf::from("Cargo.toml"), PathBuf::from("missing.txt")];

    let outcome = run(&repo, &runner, &prompter, settings).unwrap();

    let ReleaseOutcome::Released(summary) = outcome else {
        panic!("expected a release, got {:?}", outcome);
    };
    assert_eq!(
        summary.warnings,
        vec![
            BoundaryWarning::PreReleaseManifestMissing {
                path: dir.path().join(".pre-release-scripts.txt")
            },
            BoundaryWarning::ReleasePathMissing {
                path: PathBuf::from("missing.txt")
            },
        ]
    );
    let operations = repo.operations();
    assert!(operations.contains(&"stage docs/changelog.md".to_string()));
    assert!(operations.contains(&"stage Cargo.toml".to_string()));
    assert!(!operations.contains(&"stage missing.txt".to_string()));
}
