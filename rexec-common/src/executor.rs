//! Remote command invocation.
//!
//! Every command is wrapped in a `cd <dir>;` preamble so it runs relative to
//! a directory on the remote host. Two call styles exist:
//!
//! - [`RemoteExecutor::call`] for internal plumbing (probe, mkdir, clone,
//!   diff). A non-zero exit is logged and turned into `None`; callers branch
//!   on that sentinel.
//! - [`RemoteExecutor::call_streamed`] for the user's command, which hands
//!   back stdout, stderr and the exit code unconditionally.

use crate::transport::{CommandOutput, RemoteTransport, TransportError};
use crate::types::CommandResult;
use crate::util::{quote_remote_path, to_forward_slashes};
use std::borrow::Cow;
use tracing::{debug, error};

/// Build the full script sent for `command` in `dir`.
pub fn envelope(dir: &str, command: &str) -> String {
    let dir = to_forward_slashes(dir);
    format!("cd {};\n\n{}", quote_remote_path(&dir), command)
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim().to_string()).collect()
}

pub struct RemoteExecutor<T> {
    transport: T,
    redactions: Vec<String>,
}

impl<T: RemoteTransport> RemoteExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            redactions: Vec::new(),
        }
    }

    /// Mask `secret` in everything this executor logs from now on.
    ///
    /// The shell-quoted spelling is masked too, since secrets reach command
    /// lines through `shell_escape`.
    pub fn redact(&mut self, secret: impl Into<String>) {
        let secret = secret.into();
        if secret.is_empty() {
            return;
        }
        let escaped = shell_escape::unix::escape(Cow::Borrowed(secret.as_str())).into_owned();
        let escaped = escaped
            .strip_prefix('\'')
            .and_then(|e| e.strip_suffix('\''))
            .map(str::to_string)
            .unwrap_or(escaped);
        for candidate in [escaped, secret] {
            if !candidate.is_empty() && !self.redactions.contains(&candidate) {
                self.redactions.push(candidate);
            }
        }
        // Longest first, so a spelling that contains another is masked whole.
        self.redactions.sort_by_key(|r| std::cmp::Reverse(r.len()));
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub(crate) fn scrub(&self, text: &str) -> String {
        self.redactions
            .iter()
            .fold(text.to_string(), |acc, secret| {
                acc.replace(secret.as_str(), crate::credentials::REDACTED)
            })
    }

    async fn dispatch(
        &mut self,
        dir: &str,
        command: &str,
        display: &str,
    ) -> Result<CommandOutput, TransportError> {
        let script = envelope(dir, command);
        let scrubbed = self.scrub(display);
        debug!(
            host = %self.transport.host(),
            dir = %to_forward_slashes(dir),
            command = %scrubbed,
            "Running remote command"
        );
        self.transport.run(&script).await
    }

    /// Run `command` in `dir`; `None` means it exited non-zero.
    ///
    /// A command that succeeds without printing anything yields
    /// `Some(vec![])`, which is not the failure sentinel.
    pub async fn call(
        &mut self,
        dir: &str,
        command: &str,
    ) -> Result<Option<Vec<String>>, TransportError> {
        self.call_displayed(dir, command, command).await
    }

    /// [`call`](Self::call), logging `display` in place of `command`.
    ///
    /// For commands that embed credentials: `display` is the same command
    /// built from already-redacted parts.
    pub async fn call_displayed(
        &mut self,
        dir: &str,
        command: &str,
        display: &str,
    ) -> Result<Option<Vec<String>>, TransportError> {
        let output = self.dispatch(dir, command, display).await?;
        if output.success() {
            return Ok(Some(
                split_lines(&output.stdout)
                    .into_iter()
                    .filter(|line| !line.is_empty())
                    .collect(),
            ));
        }

        let stderr = if output.stderr.trim().is_empty() {
            "None".to_string()
        } else {
            self.scrub(output.stderr.trim())
        };
        error!(
            exit_code = output.exit_code,
            "Remote command failed with error {}: {}", output.exit_code, stderr
        );
        Ok(None)
    }

    /// Run `command` in `dir` and return its full result, whatever the exit code.
    pub async fn call_streamed(
        &mut self,
        dir: &str,
        command: &str,
    ) -> Result<CommandResult, TransportError> {
        let output = self.dispatch(dir, command, command).await?;
        debug!(exit_code = output.exit_code, "Remote command finished");
        Ok(CommandResult {
            stdout: split_lines(&output.stdout),
            stderr: split_lines(&output.stderr),
            exit_code: output.exit_code,
        })
    }
}
