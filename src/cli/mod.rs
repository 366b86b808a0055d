//! Command line interface
//!
//! `args` parsing lives here; [orchestration] wires parsed commands to the
//! library.

pub mod orchestration;

pub use orchestration::execute_command;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable holding the release token
pub const TOKEN_ENV_VAR: &str = "RELEASER_TOKEN";

#[derive(Parser, Debug)]
#[command(
    name = "releaser",
    version,
    about = "Cut changelog-driven releases of a git repository"
)]
pub struct Args {
    /// Log level written to stderr
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value_t = log::LevelFilter::Info
    )]
    pub cli_log_level: log::LevelFilter,

    /// Custom configuration file path
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Release the unreleased changelog section as the next version
    Release {
        /// Token used as the HTTPS password when talking to the remote
        #[arg(env = TOKEN_ENV_VAR, hide_env_values = true)]
        token: Option<String>,

        /// Release a new major version regardless of the changelog
        #[arg(long)]
        bump_major: bool,
    },

    /// Print a docker image tag for the current checkout
    GetDockerTag,

    /// Replace the version on the single line of a file matching a format
    UpdateVersionInFile {
        /// File to update in place
        filepath: PathBuf,

        /// Regular expression with one `%s` placeholder for the version
        pattern_format: String,

        /// Version to write
        new_version: String,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
