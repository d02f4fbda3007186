//! Fatal sync and bootstrap errors.
//!
//! A failing remote *command* is not an error: its exit code travels back in
//! [`crate::types::CommandResult`]. Everything here aborts the invocation
//! with exit code 1.

use crate::credentials::CredentialError;
use crate::errors::ErrorCode;
use crate::probe::ProbeError;
use crate::transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// `url` is already redacted.
    #[error("git clone of {url} into {directory} failed")]
    Clone { url: String, directory: String },

    #[error("bootstrap copy into {directory} failed: {reason}")]
    BootstrapCopy { directory: String, reason: String },

    #[error("listing remote changes in {directory} failed")]
    Diff { directory: String },

    #[error("transfer of {path} failed: {reason}")]
    Transfer { path: String, reason: String },

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("local git command `{command}` failed: {reason}")]
    LocalGit { command: String, reason: String },
}

impl SyncError {
    /// Process exit code for this abort.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Catalog entry describing this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Probe(ProbeError::Transport(_)) => ErrorCode::RemoteTransportFailed,
            Self::Probe(_) => ErrorCode::ProbeFailed,
            Self::Clone { .. } => ErrorCode::CloneFailed,
            Self::BootstrapCopy { .. } => ErrorCode::BootstrapCopyFailed,
            Self::Diff { .. } => ErrorCode::RemoteDiffFailed,
            Self::Transfer { .. } => ErrorCode::TransferFailed,
            Self::Credential(_) => ErrorCode::CredentialInvalid,
            Self::Transport(TransportError::Connect { .. }) => ErrorCode::SshConnectionFailed,
            Self::Transport(_) => ErrorCode::RemoteTransportFailed,
            Self::LocalGit { .. } => ErrorCode::LocalGitFailed,
        }
    }
}
