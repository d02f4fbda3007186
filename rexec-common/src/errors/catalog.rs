//! Error catalog entries.
//!
//! Each [`ErrorCode`] maps to a unique `REXEC-Exxx` string, a category, a
//! message and a list of remediation steps.
//!
//! # Example
//!
//! ```rust
//! use rexec_common::errors::catalog::ErrorCode;
//!
//! let entry = ErrorCode::SshConnectionFailed.entry();
//! println!("Error {}: {}", entry.code, entry.message);
//! for step in entry.remediation {
//!     println!("  - {}", step);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code enumeration covering every rexec abort path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Config Errors (E001-E099)
    // =========================================================================
    /// A required setting (host, remote path) is missing
    ConfigMissing,
    /// A configuration file could not be read or parsed
    ConfigParseError,
    /// Configuration contains invalid values
    ConfigInvalid,

    // =========================================================================
    // Network Errors (E100-E199)
    // =========================================================================
    /// SSH master connection could not be established
    SshConnectionFailed,
    /// A remote command or copy could not be carried over the session
    RemoteTransportFailed,

    // =========================================================================
    // Sync Errors (E200-E299)
    // =========================================================================
    /// Remote directory state could not be determined
    ProbeFailed,
    /// Bootstrap `git clone` failed on the remote host
    CloneFailed,
    /// Bootstrap directory creation or bulk copy failed
    BootstrapCopyFailed,
    /// Remote change listing failed
    RemoteDiffFailed,
    /// A per-file transfer failed
    TransferFailed,
    /// Git credentials are unusable
    CredentialInvalid,
    /// A local git command failed
    LocalGitFailed,
}

impl ErrorCode {
    /// Returns the numeric error code (without prefix).
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            Self::ConfigMissing => 1,
            Self::ConfigParseError => 2,
            Self::ConfigInvalid => 3,

            Self::SshConnectionFailed => 101,
            Self::RemoteTransportFailed => 102,

            Self::ProbeFailed => 201,
            Self::CloneFailed => 202,
            Self::BootstrapCopyFailed => 203,
            Self::RemoteDiffFailed => 204,
            Self::TransferFailed => 205,
            Self::CredentialInvalid => 206,
            Self::LocalGitFailed => 207,
        }
    }

    /// Returns the formatted error code string (e.g., "REXEC-E001").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("REXEC-E{:03}", self.code_number())
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.code_number() {
            1..=99 => ErrorCategory::Config,
            100..=199 => ErrorCategory::Network,
            _ => ErrorCategory::Sync,
        }
    }

    /// Returns the full error entry with all metadata.
    #[must_use]
    pub fn entry(&self) -> ErrorEntry {
        ErrorEntry {
            code: self.code_string(),
            category: self.category(),
            message: self.message().to_string(),
            remediation: self
                .remediation()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigParseError => "Configuration file could not be parsed",
            Self::ConfigInvalid => "Configuration contains invalid values",
            Self::SshConnectionFailed => "Failed to connect to the remote host",
            Self::RemoteTransportFailed => "Remote session failed while running a command",
            Self::ProbeFailed => "Could not determine the state of the remote directory",
            Self::CloneFailed => "Cloning the repository on the remote host failed",
            Self::BootstrapCopyFailed => "Copying the project to the remote host failed",
            Self::RemoteDiffFailed => "Listing remote changes failed",
            Self::TransferFailed => "Transferring a changed file failed",
            Self::CredentialInvalid => "Git credentials are incomplete",
            Self::LocalGitFailed => "A local git command failed",
        }
    }

    #[must_use]
    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::ConfigMissing => &[
                "Set remote.host and remote.remote_path in .rexec.toml",
                "Or pass --host and --remote-path on the command line",
                "Run 'rexec config path' to see which files are read",
            ],
            Self::ConfigParseError => &[
                "Check the TOML syntax of the file named in the message",
                "Run 'rexec config show' after fixing it to confirm the merged result",
            ],
            Self::ConfigInvalid => &[
                "Check REXEC_* environment variables for typos and value types",
                "Run 'rexec config show' to inspect the merged configuration",
            ],
            Self::SshConnectionFailed => &[
                "Check that the host is reachable: ssh <host> true",
                "Verify remote.user, remote.port and remote.identity_file",
                "Increase remote.connect_timeout_secs for slow links",
            ],
            Self::RemoteTransportFailed => &[
                "The SSH session dropped or the command could not be started",
                "Retry the command; check the remote host's load and network",
            ],
            Self::ProbeFailed => &[
                "Verify that the remote login shell is POSIX compatible",
                "Check that 'git' is installed on the remote host",
                "Run 'rexec probe' with --debug to see the raw probe output",
            ],
            Self::CloneFailed => &[
                "Check that the remote host can reach the origin URL",
                "Provide --git-username/--git-password for private http(s) origins",
                "Make sure the target directory's parent is writable",
            ],
            Self::BootstrapCopyFailed => &[
                "Make sure the remote path is writable by the SSH user",
                "Check free disk space on the remote host",
            ],
            Self::RemoteDiffFailed => &[
                "Check that the remote directory is a healthy git checkout",
                "Run 'git status' in the remote directory to see the problem",
            ],
            Self::TransferFailed => &[
                "Make sure the remote project directory is writable",
                "Re-run with --debug to see which file failed",
            ],
            Self::CredentialInvalid => &[
                "A git password needs a git username",
                "Set --git-username, git_username or REXEC_GIT_USERNAME",
            ],
            Self::LocalGitFailed => &[
                "Run the command from inside the project working tree",
                "Check that the local repository has a commit and an origin remote",
            ],
        }
    }

    #[must_use]
    pub const fn all() -> &'static [ErrorCode] {
        &[
            Self::ConfigMissing,
            Self::ConfigParseError,
            Self::ConfigInvalid,
            Self::SshConnectionFailed,
            Self::RemoteTransportFailed,
            Self::ProbeFailed,
            Self::CloneFailed,
            Self::BootstrapCopyFailed,
            Self::RemoteDiffFailed,
            Self::TransferFailed,
            Self::CredentialInvalid,
            Self::LocalGitFailed,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.message())
    }
}

/// Error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Configuration errors (E001-E099)
    Config,
    /// SSH session and transport errors (E100-E199)
    Network,
    /// Probe, bootstrap, diff and transfer errors (E200-E299)
    Sync,
}

impl ErrorCategory {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config => "Configuration",
            Self::Network => "Network",
            Self::Sync => "Sync",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Complete error entry with all metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Error code string (e.g., "REXEC-E001")
    pub code: String,
    pub category: ErrorCategory,
    pub message: String,
    /// Steps to remediate the error
    pub remediation: Vec<String>,
}

impl ErrorEntry {
    /// Formats the error for display with full remediation steps.
    #[must_use]
    pub fn format_full(&self) -> String {
        let mut output = format!("[{}] {}\n", self.code, self.message);

        if !self.remediation.is_empty() {
            output.push_str("\nRemediation steps:\n");
            for (i, step) in self.remediation.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, step));
            }
        }

        output
    }

    /// Formats the error as a single line.
    #[must_use]
    pub fn format_brief(&self) -> String {
        format!("[{}] {}", self.code, self.message)
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_brief())
    }
}
