use std::path::PathBuf;

use thiserror::Error;

/// Structural problems found while parsing a changelog.
///
/// Line numbers are 1-based so they can be pasted straight into an editor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChangelogError {
    #[error("TBD header is either missing or is not the first non empty line in the changelog{}", at_line(.line))]
    MissingUnreleasedHeader { line: Option<usize> },

    #[error("Found more than 1 TBD headers in the changelog (line {first} and line {duplicate})")]
    DuplicateUnreleasedHeader { first: usize, duplicate: usize },

    #[error("No previous release versions were detected in this changelog. Are you sure that the changelog is in sync with the release tags on this branch?")]
    NoPriorReleases,

    #[error("The changelog is empty for the current release (TBD section starting at line {line})")]
    EmptyUnreleasedSection { line: usize },

    #[error("Version header on line {line} is not a valid version: '{text}'")]
    InvalidVersionHeader { line: usize, text: String },

    #[error("Malformed changelog document: {0}")]
    MalformedDocument(String),
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (first content is on line {})", line),
        None => String::new(),
    }
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

/// Unified error type for releaser operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Changelog error: {0}")]
    Changelog(#[from] ChangelogError),

    #[error("The branch contains modified files. Please ensure the working tree is clean before attempting to release. Currently the status is:\n{status}")]
    DirtyWorkingTree { status: String },

    #[error("The local '{branch}' branch ({local}) is not in sync with '{remote_branch}' ({remote}). Must be in sync to conduct release process.")]
    BranchesDiverged {
        branch: String,
        remote_branch: String,
        local: String,
        remote: String,
    },

    #[error("Empty name '{name}' or email '{email}' detected in git config. Make sure user.name and user.email are set for annotating release commits.")]
    MissingIdentity { name: String, email: String },

    #[error("Pre-release script '{} {version}' failed with exit code {}:\n{stderr}", .script.display(), exit_code(.code))]
    Script {
        script: PathBuf,
        version: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Reference error: {0}")]
    Reference(String),

    #[error("Could not parse last-fetch Unix time '{value}' in '{}'", .path.display())]
    InvalidTimestamp { path: PathBuf, value: String },

    #[error("An incorrect amount, '{found}' of lines matching '{pattern}' was found in '{}'. '1' matching line was expected.", .path.display())]
    PatternMismatch {
        path: PathBuf,
        pattern: String,
        found: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Pushing release tag '{tag}' to '{remote}' failed: {reason}\n{recovery}")]
    ReleaseTagPush {
        tag: String,
        remote: String,
        reason: String,
        recovery: String,
    },
}

/// Convenience type alias for Results in releaser
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ReleaseError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Create a reference lookup error with context
    pub fn reference(msg: impl Into<String>) -> Self {
        ReleaseError::Reference(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ReleaseError::InvalidArgument(msg.into())
    }
}
