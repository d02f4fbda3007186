//! OpenSSH-backed transport.
//!
//! A single multiplexed master connection is opened per invocation. Remote
//! commands go through it directly and file copies reuse it by pointing `scp`
//! at the master's control socket, so probe, clone, diff, transfer and the
//! final command all share one authenticated channel.

use crate::transport::{CommandOutput, RemoteTransport, TransportError, describe_sources};
use openssh::{KnownHosts, Session, SessionBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Exit code reported when the remote process ended without one (signal).
const EXIT_NO_STATUS: i32 = 255;

/// Host key checking policy for new connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownHostsPolicy {
    /// Refuse hosts that are not already in known_hosts.
    Strict,
    /// Add unknown hosts, refuse changed keys.
    #[default]
    Add,
    /// Accept any host key.
    Accept,
}

impl From<KnownHostsPolicy> for KnownHosts {
    fn from(policy: KnownHostsPolicy) -> Self {
        match policy {
            KnownHostsPolicy::Strict => KnownHosts::Strict,
            KnownHostsPolicy::Add => KnownHosts::Add,
            KnownHostsPolicy::Accept => KnownHosts::Accept,
        }
    }
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct SshOptions {
    pub connect_timeout: Duration,
    pub known_hosts: KnownHostsPolicy,
    /// Directory for the master's control socket (defaults to openssh's choice).
    pub control_directory: Option<PathBuf>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            known_hosts: KnownHostsPolicy::Add,
            control_directory: None,
        }
    }
}

/// Where to connect and as whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshEndpoint {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<String>,
}

impl SshEndpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: None,
            identity_file: None,
        }
    }

    /// `user@host` (or just `host`) as understood by scp.
    fn scp_destination(&self) -> String {
        match &self.user {
            Some(user) if !self.host.contains('@') => format!("{}@{}", user, self.host),
            _ => self.host.clone(),
        }
    }
}

/// Transport over one OpenSSH master connection.
pub struct SshClient {
    endpoint: SshEndpoint,
    options: SshOptions,
    session: Option<Session>,
}

impl SshClient {
    pub fn new(endpoint: SshEndpoint, options: SshOptions) -> Self {
        Self {
            endpoint,
            options,
            session: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Open the master connection. Calling it twice is a no-op.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        if self.session.is_some() {
            return Ok(());
        }

        let mut builder = SessionBuilder::default();
        builder
            .known_hosts_check(self.options.known_hosts.into())
            .connect_timeout(self.options.connect_timeout);
        if let Some(user) = &self.endpoint.user {
            builder.user(user.clone());
        }
        if let Some(port) = self.endpoint.port {
            builder.port(port);
        }
        if let Some(identity) = &self.endpoint.identity_file {
            builder.keyfile(shellexpand::tilde(identity).into_owned());
        }
        if let Some(dir) = &self.options.control_directory {
            builder.control_directory(dir);
        }

        debug!(host = %self.endpoint.host, "Opening SSH master connection");
        let session = builder
            .connect(&self.endpoint.host)
            .await
            .map_err(|e| TransportError::Connect {
                host: self.endpoint.host.clone(),
                reason: e.to_string(),
            })?;
        info!(host = %self.endpoint.host, "SSH connection established");
        self.session = Some(session);
        Ok(())
    }

    /// Close the master connection if one is open.
    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        if let Some(session) = self.session.take() {
            session.close().await.map_err(|e| TransportError::Command {
                reason: format!("closing session: {}", e),
            })?;
            debug!(host = %self.endpoint.host, "SSH connection closed");
        }
        Ok(())
    }

    fn session(&self) -> Result<&Session, TransportError> {
        self.session
            .as_ref()
            .ok_or_else(|| TransportError::NotConnected {
                host: self.endpoint.host.clone(),
            })
    }
}

impl RemoteTransport for SshClient {
    fn host(&self) -> &str {
        &self.endpoint.host
    }

    async fn run(&mut self, script: &str) -> Result<CommandOutput, TransportError> {
        let session = self.session()?;
        let output = session
            .raw_command(script)
            .output()
            .await
            .map_err(|e| TransportError::Command {
                reason: e.to_string(),
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(EXIT_NO_STATUS),
        })
    }

    async fn upload(
        &mut self,
        sources: &[PathBuf],
        destination: &str,
        recursive: bool,
    ) -> Result<(), TransportError> {
        if sources.is_empty() {
            return Ok(());
        }
        let control_socket = self.session()?.control_socket().to_path_buf();

        let mut cmd = Command::new("scp");
        cmd.arg("-q")
            .arg("-p")
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg(format!("ControlPath={}", control_socket.display()));
        if recursive {
            cmd.arg("-r");
        }
        if let Some(port) = self.endpoint.port {
            cmd.arg("-P").arg(port.to_string());
        }
        cmd.args(sources)
            .arg(format!("{}:{}", self.endpoint.scp_destination(), destination))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(TransportError::Copy {
                sources: describe_sources(sources),
                destination: destination.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scp_destination() {
        let mut endpoint = SshEndpoint::new("build-box");
        assert_eq!(endpoint.scp_destination(), "build-box");

        endpoint.user = Some("deploy".to_string());
        assert_eq!(endpoint.scp_destination(), "deploy@build-box");

        let endpoint = SshEndpoint {
            user: Some("ignored".to_string()),
            ..SshEndpoint::new("ops@build-box")
        };
        assert_eq!(endpoint.scp_destination(), "ops@build-box");
    }

    #[test]
    fn test_known_hosts_policy_default_and_serde() {
        assert_eq!(KnownHostsPolicy::default(), KnownHostsPolicy::Add);
        let parsed: KnownHostsPolicy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(parsed, KnownHostsPolicy::Strict);
    }

    #[tokio::test]
    async fn test_run_without_connect_is_an_error() {
        let mut client = SshClient::new(SshEndpoint::new("nowhere"), SshOptions::default());
        assert!(!client.is_connected());
        let err = client.run("true").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected { .. }));
        assert!(client.disconnect().await.is_ok());
    }
}
