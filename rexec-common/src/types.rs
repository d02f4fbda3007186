//! Common types used across rexec components.

use crate::credentials::GitCredentials;
use crate::util::to_forward_slashes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a command is run: a host plus the project directory on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// SSH destination (`host`, `user@host` or an ssh_config alias).
    pub host: String,
    /// Project directory on the remote host, always `/`-separated.
    pub directory: String,
    /// Credentials injected into the clone URL during bootstrap.
    pub credentials: GitCredentials,
}

impl RemoteTarget {
    pub fn new(host: impl Into<String>, directory: impl AsRef<str>) -> Self {
        Self {
            host: host.into(),
            directory: to_forward_slashes(directory.as_ref()),
            credentials: GitCredentials::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: GitCredentials) -> Self {
        self.credentials = credentials;
        self
    }
}

impl std::fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.directory)
    }
}

/// Result of probing a directory.
///
/// Produced fresh for every invocation and never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    /// The directory exists.
    pub exists: bool,
    /// The directory is the root of (or inside) a git working tree.
    pub is_git: bool,
}

impl RepoState {
    pub const MISSING: Self = Self {
        exists: false,
        is_git: false,
    };

    pub fn new(exists: bool, is_git: bool) -> Self {
        Self { exists, is_git }
    }
}

impl std::fmt::Display for RepoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.exists, self.is_git) {
            (true, true) => write!(f, "exists (git repository)"),
            (true, false) => write!(f, "exists"),
            (false, _) => write!(f, "missing"),
        }
    }
}

/// Files reported as changed on one side of the sync.
///
/// Paths are relative to the project root and `/`-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Tracked files that differ from HEAD (deletions excluded), or files
    /// picked by the freshness heuristic when there is no repository.
    pub modified: BTreeSet<String>,
    /// Untracked files that are not ignored.
    pub untracked: BTreeSet<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of modified and untracked paths.
    pub fn all(&self) -> BTreeSet<String> {
        self.modified.union(&self.untracked).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.untracked.is_empty()
    }
}

/// Output of a command whose caller inspects the exit code itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Trimmed stdout lines, in order.
    pub stdout: Vec<String>,
    /// Trimmed stderr lines, in order.
    pub stderr: Vec<String>,
    /// Exit status reported by the remote process.
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
