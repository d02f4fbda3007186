//! Shared core for rexec.
//!
//! Everything needed to mirror a local project onto a remote host and run a
//! command there lives in this crate:
//!
//! - [`executor`]: one shell command per call over a [`RemoteTransport`]
//! - [`probe`]: directory / git-repository state, local and remote
//! - [`planner`]: bootstrap decision table (clone, bulk copy, skip)
//! - [`sync`]: change sets, transfer-set resolution and per-file transfer
//! - [`runner`]: top-level orchestration for one invocation
//!
//! The binary crate only parses arguments, loads configuration, opens the SSH
//! session and turns the returned values into a process exit code.

pub mod config;
pub mod credentials;
pub mod error;
pub mod errors;
pub mod executor;
pub mod logging;
pub mod mock;
pub mod planner;
pub mod probe;
pub mod runner;
#[cfg(unix)]
pub mod ssh;
pub mod sync;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;
pub mod types;
pub mod util;
pub mod vcs;

pub use config::{
    ConfigError, ConfigPaths, ConfigSource, ConfigWarning, LoadedConfig, RexecConfig, Severity,
    Sourced, load_config, validate_config,
};
pub use credentials::{CloneUrl, CredentialError, GitCredentials, Secret, resolve_credentials};
pub use error::SyncError;
pub use errors::{ErrorCategory, ErrorCode, ErrorEntry};
pub use executor::RemoteExecutor;
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use planner::{PlanKind, SyncPlan, SyncPlanner};
pub use probe::{ProbeError, decode_probe_output, local_is_git, probe_command, probe_remote};
pub use runner::{CommandRunner, Invocation, Phase, RunOutcome, Terminal};
#[cfg(unix)]
pub use ssh::{KnownHostsPolicy, SshClient, SshEndpoint, SshOptions};
pub use sync::{SyncEngine, SyncOptions, SyncReport, resolve_transfer_set};
pub use transport::{CommandOutput, RemoteTransport, TransportError};
pub use types::{ChangeSet, CommandResult, RemoteTarget, RepoState};
pub use vcs::{GitWorkspace, LocalRepo};
