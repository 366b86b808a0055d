//! Command dispatch
//!
//! Builds the collaborators each command needs from the parsed arguments and
//! hands them to the library. Errors get `anyhow` context here; nothing below
//! this layer knows about the command line.

use anyhow::{Context, Result};
use std::path::Path;

use crate::changelog::ChangelogPatterns;
use crate::cli::{Args, Command};
use crate::config;
use crate::docker_tag;
use crate::git::{Git2Repository, Repository};
use crate::hooks::ProcessScriptRunner;
use crate::release::{ReleaseOutcome, ReleaseSettings, ReleaseWorkflow};
use crate::ui::{self, StdinPrompter};
use crate::version_file;

/// Run the command selected on the command line.
pub fn execute_command(args: &Args) -> Result<()> {
    match &args.command {
        Command::Release { token, bump_major } => {
            run_release(args.config.as_deref(), token.clone(), *bump_major)
        }
        Command::GetDockerTag => run_get_docker_tag(),
        Command::UpdateVersionInFile {
            filepath,
            pattern_format,
            new_version,
        } => version_file::update_version_in_file(filepath, pattern_format, new_version)
            .with_context(|| format!("Failed to update the version in '{}'", filepath.display())),
    }
}

fn run_release(config_path: Option<&Path>, token: Option<String>, bump_major: bool) -> Result<()> {
    let repo = Git2Repository::open(".")
        .context("Failed to open the git repository")?
        .with_token(token);
    let workdir = repo.workdir()?;

    let config = config::load_config(config_path, &workdir)
        .context("Failed to load configuration")?;
    let patterns = ChangelogPatterns::new()?;
    let settings = ReleaseSettings::from_config(&config, bump_major);

    let runner = ProcessScriptRunner;
    let prompter = StdinPrompter::stdin();
    let workflow = ReleaseWorkflow::new(&repo, &runner, &prompter, &patterns, settings);

    match workflow.run().context("Release failed")? {
        ReleaseOutcome::Released(summary) => {
            for warning in &summary.warnings {
                log::warn!("Completed with warning: {}", warning);
            }
            ui::display_success(&format!(
                "Released {} (previous {}) at commit {}",
                summary.version, summary.previous, summary.commit
            ));
        }
        ReleaseOutcome::Cancelled { version } => {
            ui::display_status(&format!("Release of {} cancelled", version));
        }
    }

    Ok(())
}

fn run_get_docker_tag() -> Result<()> {
    let repo = Git2Repository::open(".").context("Failed to open the git repository")?;
    let tag = docker_tag::compute_docker_tag(&repo).context("Failed to compute the docker tag")?;
    println!("{}", tag);
    Ok(())
}
