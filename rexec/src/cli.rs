//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rexec")]
#[command(
    author,
    version,
    about = "rexec - run a command in a mirrored project directory on a remote host"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level: phases and remote commands
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log at trace level; takes precedence over --verbose
    #[arg(long, global = true)]
    pub debug: bool,

    /// Read configuration from this file instead of the user and project files
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Remote host (overrides remote.host)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Project directory on the remote host (overrides remote.remote_path)
    #[arg(long, global = true, value_name = "DIR")]
    pub remote_path: Option<String>,
}

impl Cli {
    /// Log level forced by the command line, if any.
    pub fn log_level(&self) -> Option<&'static str> {
        if self.debug {
            Some("trace")
        } else if self.verbose {
            Some("debug")
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command in the remote project directory
    Run {
        /// Sync local changes before running
        #[arg(long, conflicts_with = "no_sync")]
        sync: bool,

        /// Do not sync, even when sync.sync_on is set
        #[arg(long)]
        no_sync: bool,

        #[command(flatten)]
        sync_args: SyncArgs,

        /// Command to run, passed to the remote shell as one line
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Bootstrap the remote directory and push local changes
    Sync {
        #[command(flatten)]
        sync_args: SyncArgs,

        /// Print the sync report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the remote and local repository state
    Probe {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags shared by every command that can sync.
#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Skip files that also changed in the remote checkout
    #[arg(long)]
    pub no_clobber: bool,

    /// Username injected into the clone URL
    #[arg(long, value_name = "USER")]
    pub git_username: Option<String>,

    /// Password injected into the clone URL
    #[arg(long, value_name = "PASSWORD")]
    pub git_password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the merged configuration, password masked
    Show,
    /// List the configuration files considered
    Path,
}
