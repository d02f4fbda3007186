//! Errors that end an invocation before or instead of the remote command.

use rexec_common::{ConfigError, CredentialError, ErrorCode, SyncError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("cannot determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("failed to render output: {0}")]
    Render(String),

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl From<CredentialError> for CliError {
    fn from(err: CredentialError) -> Self {
        CliError::Sync(SyncError::Credential(err))
    }
}

impl CliError {
    /// Catalog code, when the error has one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            CliError::Config(e) => Some(e.code()),
            CliError::Sync(e) => Some(e.code()),
            CliError::Output(_)
            | CliError::CurrentDir(_)
            | CliError::Render(_) | CliError::Unsupported(_) => None,
        }
    }
}
