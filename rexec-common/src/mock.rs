//! Scripted transport for tests.
//!
//! Responses are chosen by substring match against the full script sent to
//! the remote side (envelope included), first rule wins. Every command and
//! upload is recorded so tests can assert on the exact remote traffic.

use crate::transport::{CommandOutput, RemoteTransport, TransportError, describe_sources};
use std::path::PathBuf;

#[derive(Debug, Clone)]
struct MockRule {
    pattern: String,
    output: CommandOutput,
}

/// A recorded `upload` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUpload {
    pub sources: Vec<PathBuf>,
    pub destination: String,
    pub recursive: bool,
}

#[derive(Debug, Clone)]
pub struct MockTransport {
    host: String,
    rules: Vec<MockRule>,
    default_output: CommandOutput,
    failing_uploads: Vec<String>,
    offline: bool,
    commands: Vec<String>,
    uploads: Vec<MockUpload>,
}

impl MockTransport {
    /// A transport where every command succeeds with empty output.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            rules: Vec::new(),
            default_output: CommandOutput::ok(""),
            failing_uploads: Vec::new(),
            offline: false,
            commands: Vec::new(),
            uploads: Vec::new(),
        }
    }

    /// Answer scripts containing `pattern` with `output`.
    pub fn respond(mut self, pattern: impl Into<String>, output: CommandOutput) -> Self {
        self.rules.push(MockRule {
            pattern: pattern.into(),
            output,
        });
        self
    }

    /// Output for scripts no rule matches.
    pub fn default_output(mut self, output: CommandOutput) -> Self {
        self.default_output = output;
        self
    }

    /// Fail uploads whose destination contains `pattern`.
    pub fn fail_upload(mut self, pattern: impl Into<String>) -> Self {
        self.failing_uploads.push(pattern.into());
        self
    }

    /// Every call fails at the transport level.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Scripts sent so far, in order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Uploads performed so far, in order.
    pub fn uploads(&self) -> &[MockUpload] {
        &self.uploads
    }

    /// Number of scripts containing `pattern`.
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.commands.iter().filter(|c| c.contains(pattern)).count()
    }

    /// Destinations of all uploads, in order.
    pub fn upload_destinations(&self) -> Vec<&str> {
        self.uploads.iter().map(|u| u.destination.as_str()).collect()
    }
}

impl RemoteTransport for MockTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&mut self, script: &str) -> Result<CommandOutput, TransportError> {
        self.commands.push(script.to_string());
        if self.offline {
            return Err(TransportError::Command {
                reason: "mock transport is offline".to_string(),
            });
        }
        let output = self
            .rules
            .iter()
            .find(|rule| script.contains(&rule.pattern))
            .map(|rule| rule.output.clone())
            .unwrap_or_else(|| self.default_output.clone());
        Ok(output)
    }

    async fn upload(
        &mut self,
        sources: &[PathBuf],
        destination: &str,
        recursive: bool,
    ) -> Result<(), TransportError> {
        if self.offline || self.failing_uploads.iter().any(|p| destination.contains(p)) {
            return Err(TransportError::Copy {
                sources: describe_sources(sources),
                destination: destination.to_string(),
                reason: "mock upload failure".to_string(),
            });
        }
        self.uploads.push(MockUpload {
            sources: sources.to_vec(),
            destination: destination.to_string(),
            recursive,
        });
        Ok(())
    }
}
