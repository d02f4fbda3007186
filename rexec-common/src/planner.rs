//! Bootstrap decision and execution.
//!
//! The remote copy of the project is created at most once. What happens is
//! decided from three booleans:
//!
//! | remote exists | remote is git | local is git | plan         |
//! |---------------|---------------|--------------|--------------|
//! | yes           | yes           | any          | Skip         |
//! | yes           | no            | any          | Skip         |
//! | no            | any           | yes          | CloneFromGit |
//! | no            | any           | no           | BulkCopy     |

use crate::credentials::CloneUrl;
use crate::error::SyncError;
use crate::executor::RemoteExecutor;
use crate::probe::probe_remote;
use crate::transport::RemoteTransport;
use crate::types::{RemoteTarget, RepoState};
use crate::util::{quote_remote_path, remote_parent};
use crate::vcs::LocalRepo;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::{debug, info};

/// The plan without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Skip,
    CloneFromGit,
    BulkCopy,
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanKind::Skip => write!(f, "skip"),
            PlanKind::CloneFromGit => write!(f, "clone"),
            PlanKind::BulkCopy => write!(f, "bulk copy"),
        }
    }
}

/// Bootstrap strategy chosen once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    /// The remote directory already exists.
    Skip { remote_is_git: bool },
    /// Clone the local origin into the missing remote directory.
    CloneFromGit { url: CloneUrl },
    /// Create the remote directory and copy the whole local tree into it.
    BulkCopy,
}

impl SyncPlan {
    pub fn kind(&self) -> PlanKind {
        match self {
            SyncPlan::Skip { .. } => PlanKind::Skip,
            SyncPlan::CloneFromGit { .. } => PlanKind::CloneFromGit,
            SyncPlan::BulkCopy => PlanKind::BulkCopy,
        }
    }
}

pub struct SyncPlanner<'a> {
    target: &'a RemoteTarget,
    exclude: &'a [String],
}

impl<'a> SyncPlanner<'a> {
    /// `exclude` names top-level entries kept out of a bulk copy.
    pub fn new(target: &'a RemoteTarget, exclude: &'a [String]) -> Self {
        Self { target, exclude }
    }

    /// The decision table. Pure.
    pub fn plan(local_is_git: bool, remote: RepoState) -> PlanKind {
        match (remote.exists, local_is_git) {
            (true, _) => PlanKind::Skip,
            (false, true) => PlanKind::CloneFromGit,
            (false, false) => PlanKind::BulkCopy,
        }
    }

    /// Attach what the chosen plan needs to run, i.e. the credentialed clone URL.
    pub async fn resolve<L: LocalRepo>(
        &self,
        kind: PlanKind,
        remote: RepoState,
        local: &L,
    ) -> Result<SyncPlan, SyncError> {
        Ok(match kind {
            PlanKind::Skip => SyncPlan::Skip {
                remote_is_git: remote.is_git,
            },
            PlanKind::CloneFromGit => {
                let origin = local.origin_url().await?;
                let url = CloneUrl::with_credentials(&origin, &self.target.credentials)?;
                SyncPlan::CloneFromGit { url }
            }
            PlanKind::BulkCopy => SyncPlan::BulkCopy,
        })
    }

    /// Carry out `plan` against the remote host.
    pub async fn bootstrap<T, L>(
        &self,
        executor: &mut RemoteExecutor<T>,
        local: &L,
        plan: &SyncPlan,
    ) -> Result<(), SyncError>
    where
        T: RemoteTransport,
        L: LocalRepo,
    {
        match plan {
            SyncPlan::Skip { remote_is_git } => {
                if *remote_is_git {
                    info!(
                        directory = %self.target.directory,
                        "Remote directory exists and is a git repository"
                    );
                } else {
                    info!(
                        directory = %self.target.directory,
                        "Remote directory exists but is not a git repository"
                    );
                }
                Ok(())
            }
            SyncPlan::CloneFromGit { url } => self.clone_from_git(executor, url).await,
            SyncPlan::BulkCopy => self.bulk_copy(executor, local).await,
        }
    }

    async fn clone_from_git<T: RemoteTransport>(
        &self,
        executor: &mut RemoteExecutor<T>,
        url: &CloneUrl,
    ) -> Result<(), SyncError> {
        let directory = self.target.directory.as_str();
        if let Some(password) = &self.target.credentials.password {
            executor.redact(password.expose());
        }

        let parent = remote_parent(directory);
        let parent_state = probe_remote(executor, &parent).await?;
        if !parent_state.exists {
            debug!(%parent, "Creating remote parent directory");
            let mkdir = format!("mkdir -p {}", quote_remote_path(&parent));
            if executor.call("/", &mkdir).await?.is_none() {
                return Err(SyncError::BootstrapCopy {
                    directory: parent,
                    reason: "mkdir -p failed".to_string(),
                });
            }
        }

        info!("Performing git clone from {} to {} ...", url, directory);
        let clone_command = |url: &str| {
            format!(
                "git clone {} {}",
                shell_escape::unix::escape(Cow::Borrowed(url)),
                quote_remote_path(directory)
            )
        };
        let clone = clone_command(url.expose());
        let display = clone_command(&url.redacted());
        match executor.call_displayed("/", &clone, &display).await? {
            Some(_) => {
                info!(%directory, "Clone complete");
                Ok(())
            }
            None => Err(SyncError::Clone {
                url: url.redacted(),
                directory: directory.to_string(),
            }),
        }
    }

    async fn bulk_copy<T, L>(
        &self,
        executor: &mut RemoteExecutor<T>,
        local: &L,
    ) -> Result<(), SyncError>
    where
        T: RemoteTransport,
        L: LocalRepo,
    {
        let directory = self.target.directory.as_str();
        let failed = |reason: String| SyncError::BootstrapCopy {
            directory: directory.to_string(),
            reason,
        };

        let mkdir = format!("mkdir -p {}", quote_remote_path(directory));
        if executor.call("/", &mkdir).await?.is_none() {
            return Err(failed("mkdir -p failed".to_string()));
        }

        let entries = self
            .top_level_entries(local)
            .map_err(|e| failed(e.to_string()))?;
        if entries.is_empty() {
            info!(%directory, "Local tree is empty, nothing to copy");
            return Ok(());
        }

        info!(
            entries = entries.len(),
            from = %local.root().display(),
            to = %directory,
            "Copying project tree"
        );
        executor
            .transport_mut()
            .upload(&entries, directory, true)
            .await
            .map_err(|e| failed(e.to_string()))
    }

    fn top_level_entries<L: LocalRepo>(&self, local: &L) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(local.root())? {
            let entry = entry?;
            let name = entry.file_name();
            if self.exclude.iter().any(|x| name.to_str() == Some(x.as_str())) {
                continue;
            }
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }
}
