pub mod boundary;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod docker_tag;
pub mod domain;
pub mod error;
pub mod git;
pub mod hooks;
pub mod release;
pub mod ui;
pub mod version_file;

pub use error::{ChangelogError, ReleaseError, Result};
