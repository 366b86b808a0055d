use crate::error::{ReleaseError, Result};
use crate::hooks::{HookContext, ScriptOutput, ScriptRunner};
use std::path::Path;
use std::process::Command;

/// Runs pre-release scripts as child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessScriptRunner;

impl ScriptRunner for ProcessScriptRunner {
    /// Execute a script with the release version as its argument
    ///
    /// The script runs in the repository root with environment variables set
    /// from the context. Stdout is inherited so script progress stays
    /// visible; stderr is captured for the error report.
    ///
    /// # Arguments
    /// * `script` - Path to the script (must be executable)
    /// * `context` - Release context
    ///
    /// # Returns
    /// * `Ok(ScriptOutput)` - The script ran; check its exit code
    /// * `Err` - If the script is missing, not a file, or cannot be spawned
    fn run_script(&self, script: &Path, context: &HookContext) -> Result<ScriptOutput> {
        if !script.exists() {
            return Err(ReleaseError::config(format!(
                "Pre-release script not found: {}",
                script.display()
            )));
        }

        if !script.is_file() {
            return Err(ReleaseError::config(format!(
                "Pre-release script path is not a file: {}",
                script.display()
            )));
        }

        let mut cmd = Command::new(script);
        cmd.arg(context.version.to_string())
            .current_dir(&context.repo_root)
            .stdout(std::process::Stdio::inherit());

        for (key, value) in context.to_env_vars() {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|e| {
            ReleaseError::config(format!(
                "Failed to execute pre-release script {}: {}",
                script.display(),
                e
            ))
        })?;

        Ok(ScriptOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run every script in order, stopping at the first failure.
///
/// # Returns
/// * `Ok(())` - All scripts exited with code 0
/// * `Err(ReleaseError::Script)` - The first script that failed, with its
///   exit code and captured stderr
pub fn run_pre_release_scripts(
    runner: &dyn ScriptRunner,
    scripts: &[impl AsRef<Path>],
    context: &HookContext,
) -> Result<()> {
    for script in scripts {
        let script = script.as_ref();
        log::info!("Running pre-release script '{} {}'", script.display(), context.version);

        let output = runner.run_script(script, context)?;
        if !output.success() {
            return Err(ReleaseError::Script {
                script: script.to_path_buf(),
                version: context.version.to_string(),
                code: output.code,
                stderr: output.stderr,
            });
        }
    }

    Ok(())
}
