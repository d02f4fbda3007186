//! Differential file sync.
//!
//! After bootstrap the engine works out which local files the remote copy
//! is missing and pushes them one by one:
//!
//! 1. local change set: git status when the project is a repository,
//!    otherwise every file touched inside the freshness window;
//! 2. remote change set, only when the remote directory is a repository;
//! 3. transfer set: local, minus remote changes under no-clobber;
//! 4. sequential per-file copy, stopping at the first failure.

use crate::error::SyncError;
use crate::executor::RemoteExecutor;
use crate::planner::PlanKind;
use crate::transport::RemoteTransport;
use crate::types::{ChangeSet, RemoteTarget};
use crate::util::{normalize_remote_path, quote_remote_path, remote_parent, to_forward_slashes};
use crate::vcs::{CHANGED_FILES_CMD, LocalRepo, UNTRACKED_FILES_CMD, parse_path_list};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Files never picked up by the freshness scan.
pub const DEFAULT_EXCLUSIONS: [&str; 2] = ["sftp-config.json", ".rexec.toml"];

/// Default freshness window for projects that are not repositories.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(300);

/// Remote change listing, deletions dropped.
pub fn remote_changes_command() -> String {
    format!(
        "{} | awk '$1 != \"D\" {{print $2}}' && {}",
        CHANGED_FILES_CMD, UNTRACKED_FILES_CMD
    )
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Leave files alone that also changed on the remote side.
    pub no_clobber: bool,
    pub freshness_window: Duration,
    /// File names skipped by the freshness scan and the bulk copy.
    pub exclude: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            no_clobber: false,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            exclude: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SyncOptions {
    /// Add extra excluded file names on top of the defaults.
    pub fn with_exclusions<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in extra {
            let name = name.into();
            if !self.exclude.contains(&name) {
                self.exclude.push(name);
            }
        }
        self
    }
}

/// What one sync did, for logging and `rexec sync` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub plan: PlanKind,
    pub local_changes: usize,
    /// `None` when the remote directory is not a repository.
    pub remote_changes: Option<usize>,
    /// Remote paths written, in transfer order.
    pub transferred: Vec<String>,
}

/// Pick the files to push.
///
/// `remote` is `None` when the remote directory is not a repository, in
/// which case every local change is sent.
pub fn resolve_transfer_set(
    local: &BTreeSet<String>,
    remote: Option<&BTreeSet<String>>,
    no_clobber: bool,
) -> BTreeSet<String> {
    match remote {
        Some(remote) if no_clobber => local.difference(remote).cloned().collect(),
        _ => local.clone(),
    }
}

/// Files under `root` modified within `window` of `now`, relative and
/// `/`-separated. Excluded names are matched against the file name only.
pub fn fresh_files(
    root: &Path,
    window: Duration,
    exclude: &[String],
    now: SystemTime,
) -> BTreeSet<String> {
    let mut fresh = BTreeSet::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable path during freshness scan");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if exclude.iter().any(|x| x.as_str() == name) {
            continue;
        }
        let modified = match entry
            .metadata()
            .map_err(std::io::Error::from)
            .and_then(|m| m.modified())
        {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "No mtime, skipping");
                continue;
            }
        };
        // A timestamp ahead of the local clock counts as fresh.
        let age = now.duration_since(modified).unwrap_or_default();
        if age >= window {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            fresh.insert(to_forward_slashes(&relative.to_string_lossy()));
        }
    }
    fresh
}

pub struct SyncEngine<'a> {
    target: &'a RemoteTarget,
    options: &'a SyncOptions,
}

impl<'a> SyncEngine<'a> {
    pub fn new(target: &'a RemoteTarget, options: &'a SyncOptions) -> Self {
        Self { target, options }
    }

    /// Local change set, evaluated at `now`.
    pub async fn local_changes<L: LocalRepo>(
        &self,
        local: &L,
        now: SystemTime,
    ) -> Result<ChangeSet, SyncError> {
        if local.is_git() {
            return local.git_changes().await;
        }
        let modified = fresh_files(
            local.root(),
            self.options.freshness_window,
            &self.options.exclude,
            now,
        );
        debug!(
            fresh = modified.len(),
            window_secs = self.options.freshness_window.as_secs(),
            "Freshness scan"
        );
        Ok(ChangeSet {
            modified,
            untracked: BTreeSet::new(),
        })
    }

    /// Files changed in the remote repository. Any failure is fatal.
    pub async fn remote_changes<T: RemoteTransport>(
        &self,
        executor: &mut RemoteExecutor<T>,
    ) -> Result<BTreeSet<String>, SyncError> {
        let directory = self.target.directory.as_str();
        let lines = executor
            .call(directory, &remote_changes_command())
            .await?
            .ok_or_else(|| SyncError::Diff {
                directory: directory.to_string(),
            })?;
        Ok(parse_path_list(&lines.join("\n")))
    }

    /// Copy `paths` (relative to the local root) one at a time.
    ///
    /// Stops at the first failure; files after it are not attempted.
    pub async fn transfer<T: RemoteTransport>(
        &self,
        executor: &mut RemoteExecutor<T>,
        local_root: &Path,
        paths: &BTreeSet<String>,
    ) -> Result<Vec<String>, SyncError> {
        let root = self.target.directory.as_str();
        let root_normalized = normalize_remote_path(root, "");
        let mut created: BTreeSet<String> = BTreeSet::new();
        let mut transferred = Vec::with_capacity(paths.len());

        if !paths.is_empty() {
            info!(count = paths.len(), "Performing sync to {} ...", root);
        }

        for relative in paths {
            let relative = to_forward_slashes(relative.trim());
            let remote_path = normalize_remote_path(root, &relative);
            let parent = remote_parent(&remote_path);

            if parent != root_normalized && !created.contains(&parent) {
                let mkdir = format!("mkdir -p {}", quote_remote_path(&parent));
                if executor.call("/", &mkdir).await?.is_none() {
                    return Err(SyncError::Transfer {
                        path: remote_path,
                        reason: format!("could not create {}", parent),
                    });
                }
                created.insert(parent);
            }

            debug!("Syncing {} to remote {}", relative, remote_path);
            let source = local_root.join(&relative);
            executor
                .transport_mut()
                .upload(&[source], &remote_path, false)
                .await
                .map_err(|e| SyncError::Transfer {
                    path: remote_path.clone(),
                    reason: e.to_string(),
                })?;
            transferred.push(remote_path);
        }
        Ok(transferred)
    }
}
