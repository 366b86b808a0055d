use crate::domain::Version;
use std::collections::HashMap;
use std::path::PathBuf;

/// Context information passed to a pre-release script
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Version being released; also the script's only argument
    pub version: Version,
    /// Remote the release is pushed to
    pub remote: String,
    /// Branch being released
    pub branch: String,
    /// Repository root, also the script's working directory
    pub repo_root: PathBuf,
}

impl HookContext {
    /// Convert context to environment variables for the script
    ///
    /// Maps context fields to RELEASER_* environment variables
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();

        env.insert("RELEASER_VERSION".to_string(), self.version.to_string());
        env.insert("RELEASER_REMOTE".to_string(), self.remote.clone());
        env.insert("RELEASER_BRANCH".to_string(), self.branch.clone());
        env.insert(
            "RELEASER_REPO_ROOT".to_string(),
            self.repo_root.display().to_string(),
        );

        env
    }
}
