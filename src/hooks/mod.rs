//! Pre-release scripts
//!
//! Repositories list scripts in a manifest (`.pre-release-scripts.txt` by
//! default), one path per line relative to the repository root. Before the
//! changelog is rewritten each script runs in order with the new version as
//! its only argument; the first non-zero exit aborts the release.
//!
//! - [manifest]: reading the manifest
//! - [executor]: running scripts as child processes
//! - [lifecycle]: the environment handed to every script

pub mod executor;
pub mod lifecycle;
pub mod manifest;

pub use executor::{run_pre_release_scripts, ProcessScriptRunner};
pub use lifecycle::HookContext;
pub use manifest::PreReleaseManifest;

use crate::error::Result;
use std::path::Path;

/// What a finished script reported back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stderr: String,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one pre-release script to completion
///
/// Implementations return `Err` only when the script could not be started;
/// a script that ran and failed is reported through [ScriptOutput].
pub trait ScriptRunner {
    fn run_script(&self, script: &Path, context: &HookContext) -> Result<ScriptOutput>;
}
