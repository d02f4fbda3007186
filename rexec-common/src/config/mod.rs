//! Configuration for rexec.
//!
//! Values are layered, later layers winning:
//! built-in defaults, the user file, the project `.rexec.toml`, `REXEC_*`
//! environment variables, then command-line flags (applied by the binary).
//! Every value that did not come from the defaults is recorded with its
//! source so `rexec config show` can explain the merged result.

pub mod env;
pub mod file;
pub mod source;
pub mod validate;

pub use env::{EnvError, EnvParser};
pub use file::{ConfigPaths, LoadedConfig, load_config};
pub use source::{ConfigSource, Sourced};
pub use validate::{ConfigWarning, Severity, validate_config};

use crate::credentials::{GitCredentials, REDACTED};
use crate::errors::ErrorCode;
use crate::sync::{DEFAULT_FRESHNESS_WINDOW, SyncOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[cfg(unix)]
use crate::ssh::KnownHostsPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid environment: {}", join_env_errors(.0))]
    Env(Vec<EnvError>),

    #[error("{field} is not set")]
    Missing { field: &'static str },

    #[error("{0}")]
    Invalid(String),
}

fn join_env_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Missing { .. } => ErrorCode::ConfigMissing,
            ConfigError::Read { .. } | ConfigError::Parse { .. } => ErrorCode::ConfigParseError,
            ConfigError::Env(_) | ConfigError::Invalid(_) => ErrorCode::ConfigInvalid,
        }
    }
}

/// Where and how to reach the remote host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    /// SSH destination: hostname, `user@host` or an ssh_config alias.
    pub host: Option<String>,
    /// Project directory on the remote host.
    pub remote_path: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<String>,
    pub connect_timeout_secs: u64,
    #[cfg(unix)]
    pub known_hosts: KnownHostsPolicy,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            host: None,
            remote_path: None,
            user: None,
            port: None,
            identity_file: None,
            connect_timeout_secs: 10,
            #[cfg(unix)]
            known_hosts: KnownHostsPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Sync before every `rexec run`.
    pub sync_on: bool,
    /// Do not overwrite files that also changed on the remote side.
    pub sync_no_clobber: bool,
    /// Non-repository projects: files modified within this many seconds are pushed.
    pub freshness_window_secs: u64,
    /// Extra file names never pushed by the freshness scan or bulk copy.
    pub exclude: Vec<String>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            sync_on: false,
            sync_no_clobber: false,
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW.as_secs(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSection {
    pub git_username: Option<String>,
    pub git_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    pub log_level: String,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RexecConfig {
    pub remote: RemoteSection,
    pub sync: SyncSection,
    pub git: GitSection,
    pub general: GeneralSection,
}

impl RexecConfig {
    /// Remote host, or the error the CLI reports when it is missing.
    pub fn host(&self) -> Result<&str, ConfigError> {
        self.remote
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or(ConfigError::Missing {
                field: "remote.host",
            })
    }

    pub fn remote_path(&self) -> Result<&str, ConfigError> {
        self.remote
            .remote_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::Missing {
                field: "remote.remote_path",
            })
    }

    /// Credentials persisted in configuration (lowest precedence).
    pub fn git_credentials(&self) -> GitCredentials {
        GitCredentials::new(self.git.git_username.clone(), self.git.git_password.clone())
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            no_clobber: self.sync.sync_no_clobber,
            freshness_window: Duration::from_secs(self.sync.freshness_window_secs),
            ..SyncOptions::default()
        }
        .with_exclusions(self.sync.exclude.iter().cloned())
    }

    /// Copy with the git password masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.git.git_password.is_some() {
            copy.git.git_password = Some(REDACTED.to_string());
        }
        copy
    }
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RexecConfig::default();
        assert!(!config.sync.sync_on);
        assert_eq!(config.sync.freshness_window_secs, 300);
        assert_eq!(config.general.log_level, "info");
        assert!(matches!(
            config.host(),
            Err(ConfigError::Missing { field: "remote.host" })
        ));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RexecConfig = toml::from_str(
            r#"
            [remote]
            host = "build-box"
            remote_path = "/srv/app"

            [sync]
            sync_on = true
            exclude = ["secrets.env"]
            "#,
        )
        .unwrap();
        assert_eq!(config.host().unwrap(), "build-box");
        assert_eq!(config.remote.connect_timeout_secs, 10);
        assert!(config.sync.sync_on);

        let options = config.sync_options();
        assert!(options.exclude.contains(&"sftp-config.json".to_string()));
        assert!(options.exclude.contains(&"secrets.env".to_string()));
        assert_eq!(options.freshness_window, Duration::from_secs(300));
    }

    #[test]
    fn test_redacted_masks_password() {
        let mut config = RexecConfig::default();
        config.git.git_username = Some("alice".to_string());
        config.git.git_password = Some("secret123".to_string());
        let shown = toml::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("secret123"));
        assert!(shown.contains(REDACTED));
        assert_eq!(
            config.git_credentials().password.map(|p| p.expose().to_string()),
            Some("secret123".to_string())
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ConfigError::Missing { field: "remote.host" }.code(),
            ErrorCode::ConfigMissing
        );
        assert_eq!(
            ConfigError::Parse {
                path: PathBuf::from("x.toml"),
                message: "bad".to_string()
            }
            .code(),
            ErrorCode::ConfigParseError
        );
        let env = ConfigError::Env(vec![EnvError::InvalidLogLevel {
            var: "REXEC_LOG_LEVEL".to_string(),
            value: "loud".to_string(),
        }]);
        assert_eq!(env.code(), ErrorCode::ConfigInvalid);
        assert!(env.to_string().contains("REXEC_LOG_LEVEL"));
    }
}
