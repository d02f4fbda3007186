//! One SSH session per invocation, wrapped in a [`CommandRunner`].

use crate::error::CliError;
use rexec_common::{
    CommandRunner, GitCredentials, GitWorkspace, RemoteExecutor, RemoteTarget, RexecConfig,
    SshClient, SshEndpoint, SshOptions, SyncError,
};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub type Runner = CommandRunner<SshClient, GitWorkspace>;

pub fn endpoint(config: &RexecConfig) -> Result<SshEndpoint, CliError> {
    let mut endpoint = SshEndpoint::new(config.host()?);
    endpoint.user = config.remote.user.clone();
    endpoint.port = config.remote.port;
    endpoint.identity_file = config.remote.identity_file.clone();
    Ok(endpoint)
}

pub fn options(config: &RexecConfig) -> SshOptions {
    SshOptions {
        connect_timeout: Duration::from_secs(config.remote.connect_timeout_secs),
        known_hosts: config.remote.known_hosts,
        ..SshOptions::default()
    }
}

/// Connect and build the runner for the project rooted at `local_root`.
pub async fn open(
    config: &RexecConfig,
    local_root: &Path,
    credentials: GitCredentials,
) -> Result<Runner, CliError> {
    let target = RemoteTarget::new(config.host()?, config.remote_path()?).with_credentials(credentials);

    let mut client = SshClient::new(endpoint(config)?, options(config));
    client.connect().await.map_err(SyncError::from)?;

    Ok(CommandRunner::new(
        RemoteExecutor::new(client),
        GitWorkspace::open(local_root),
        target,
        config.sync_options(),
    ))
}

/// Close the master connection; failures here never change the outcome.
pub async fn close(runner: Runner) {
    let mut client = runner.into_transport();
    if let Err(e) = client.disconnect().await {
        warn!("Failed to close SSH session: {}", e);
    }
}
