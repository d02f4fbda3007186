//! Local working tree access.
//!
//! The sync engine only needs three facts about the local project: whether
//! it is a git repository, its origin URL, and which files changed. They sit
//! behind [`LocalRepo`] so orchestration can be tested without a real
//! checkout; [`GitWorkspace`] shells out to the system `git`.

use crate::error::SyncError;
use crate::probe::local_is_git;
use crate::types::ChangeSet;
use crate::util::to_forward_slashes;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Lists tracked changes against HEAD, one `<status>\t<path>` per line.
pub const CHANGED_FILES_CMD: &str = "git diff-index HEAD --name-status";
/// Succeeds only once the repository has a commit.
pub const HEAD_CMD: &str = "git rev-parse --verify -q HEAD";
/// Lists untracked, non-ignored files.
pub const UNTRACKED_FILES_CMD: &str = "git ls-files --others --exclude-standard";
/// Prints the fetch URL of `origin`.
pub const ORIGIN_URL_CMD: &str = "git config --get remote.origin.url";

#[allow(async_fn_in_trait)]
pub trait LocalRepo {
    /// Project root whose contents are mirrored.
    fn root(&self) -> &Path;

    fn is_git(&self) -> bool;

    /// Origin URL as configured, without credentials.
    async fn origin_url(&self) -> Result<String, SyncError>;

    /// Modified (deletions excluded) and untracked files relative to the root.
    async fn git_changes(&self) -> Result<ChangeSet, SyncError>;
}

/// Parse `git diff-index --name-status` output, dropping deletions.
///
/// Renames and copies carry two paths; the destination (last field) is the
/// file that exists in the working tree.
pub fn parse_name_status(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.trim().split('\t');
            let status = fields.next()?.trim();
            if status.is_empty() || status.starts_with('D') {
                return None;
            }
            let path = fields.last()?.trim();
            (!path.is_empty()).then(|| to_forward_slashes(path))
        })
        .collect()
}

/// Parse one-path-per-line output such as `git ls-files`.
pub fn parse_path_list(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(to_forward_slashes)
        .collect()
}

/// The local project, backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitWorkspace {
    root: PathBuf,
    is_git: bool,
}

impl GitWorkspace {
    /// Open `root`; its repository status is probed once, here.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let is_git = local_is_git(&root);
        debug!(root = %root.display(), is_git, "Local probe");
        Self { root, is_git }
    }

    async fn git(&self, command_line: &str) -> Result<String, SyncError> {
        let failed = |reason: String| SyncError::LocalGit {
            command: command_line.to_string(),
            reason,
        };

        let mut words = command_line.split_whitespace();
        let program = words.next().unwrap_or("git");
        let output = Command::new(program)
            .args(words)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!(
                "status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl LocalRepo for GitWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    fn is_git(&self) -> bool {
        self.is_git
    }

    async fn origin_url(&self) -> Result<String, SyncError> {
        let url = self.git(ORIGIN_URL_CMD).await?.trim().to_string();
        if url.is_empty() {
            return Err(SyncError::LocalGit {
                command: ORIGIN_URL_CMD.to_string(),
                reason: "no origin remote configured".to_string(),
            });
        }
        Ok(url)
    }

    async fn git_changes(&self) -> Result<ChangeSet, SyncError> {
        // Without a commit there is nothing to diff against; every file is untracked.
        let modified = if self.git(HEAD_CMD).await.is_ok() {
            parse_name_status(&self.git(CHANGED_FILES_CMD).await?)
        } else {
            debug!(root = %self.root.display(), "Repository has no commits yet");
            BTreeSet::new()
        };
        let untracked = parse_path_list(&self.git(UNTRACKED_FILES_CMD).await?);
        debug!(
            modified = modified.len(),
            untracked = untracked.len(),
            "Local git changes"
        );
        Ok(ChangeSet {
            modified,
            untracked,
        })
    }
}
