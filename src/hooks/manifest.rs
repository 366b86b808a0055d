use crate::error::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ordered list of pre-release scripts read from the manifest file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreReleaseManifest {
    scripts: Vec<PathBuf>,
}

impl PreReleaseManifest {
    /// Parse manifest text. Blank lines and lines starting with `#` are
    /// skipped; every other line is a script path relative to `repo_root`.
    pub fn parse(contents: &str, repo_root: &Path) -> Self {
        let scripts = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| repo_root.join(line))
            .collect();

        PreReleaseManifest { scripts }
    }

    /// Load the manifest at `manifest_path`.
    ///
    /// # Returns
    /// * `Ok(None)` - The manifest does not exist
    /// * `Ok(Some(manifest))` - Parsed manifest, possibly empty
    /// * `Err` - The manifest exists but could not be read
    pub fn load(manifest_path: &Path, repo_root: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(manifest_path) {
            Ok(contents) => Ok(Some(Self::parse(&contents, repo_root))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn scripts(&self) -> &[PathBuf] {
        &self.scripts
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
