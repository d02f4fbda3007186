//! The seam between rexec and the authenticated session it runs over.
//!
//! A transport runs one shell script per call and copies local files to a
//! remote path. [`crate::ssh::SshClient`] is the real implementation;
//! [`crate::mock::MockTransport`] scripts responses for tests.

use std::path::PathBuf;
use thiserror::Error;

/// Raw output of one remote process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit status taken from the remote process, never inferred from output.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(0, stdout, "")
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Failures of the session itself, as opposed to a command exiting non-zero.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("not connected to {host}")]
    NotConnected { host: String },

    #[error("remote command could not be run: {reason}")]
    Command { reason: String },

    #[error("copy of {sources} to {destination} failed: {reason}")]
    Copy {
        sources: String,
        destination: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One authenticated session to the remote host.
///
/// Calls are strictly sequential: every method resolves only after the remote
/// side has reported completion.
#[allow(async_fn_in_trait)]
pub trait RemoteTransport {
    /// Destination this transport talks to, for log context.
    fn host(&self) -> &str;

    /// Run `script` through the remote login shell and wait for it to exit.
    async fn run(&mut self, script: &str) -> Result<CommandOutput, TransportError>;

    /// Copy local `sources` to `destination` on the remote host.
    ///
    /// With one file source, `destination` is the target file path. With
    /// several sources or `recursive`, `destination` must be an existing
    /// directory that receives each source by name.
    async fn upload(
        &mut self,
        sources: &[PathBuf],
        destination: &str,
        recursive: bool,
    ) -> Result<(), TransportError>;
}

/// Render a source list for error messages.
pub(crate) fn describe_sources(sources: &[PathBuf]) -> String {
    match sources {
        [single] => single.display().to_string(),
        many => format!("{} paths", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output_success() {
        assert!(CommandOutput::ok("hi").success());
        assert!(!CommandOutput::new(3, "", "boom").success());
    }

    #[test]
    fn test_describe_sources() {
        assert_eq!(describe_sources(&[PathBuf::from("a/b.txt")]), "a/b.txt");
        assert_eq!(
            describe_sources(&[PathBuf::from("a"), PathBuf::from("b")]),
            "2 paths"
        );
    }
}
