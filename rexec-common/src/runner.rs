//! One rexec invocation, end to end.
//!
//! `Init → Probe → {Clone | BulkCopy | Skip} → Diff → Transfer → Execute → Report`
//!
//! The sync phases only run when the invocation asks for them. A sync error
//! aborts before the command is executed; the command's own exit code is
//! carried back untouched.

use crate::error::SyncError;
use crate::executor::RemoteExecutor;
use crate::planner::{PlanKind, SyncPlanner};
use crate::probe::probe_remote;
use crate::sync::{SyncEngine, SyncOptions, SyncReport, resolve_transfer_set};
use crate::transport::RemoteTransport;
use crate::types::{CommandResult, RemoteTarget, RepoState};
use crate::util::mask_sensitive_command;
use crate::vcs::LocalRepo;
use std::fmt;
use std::time::SystemTime;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Probe,
    Clone,
    BulkCopy,
    Skip,
    Diff,
    Transfer,
    Execute,
    Report,
}

impl From<PlanKind> for Phase {
    fn from(kind: PlanKind) -> Self {
        match kind {
            PlanKind::Skip => Phase::Skip,
            PlanKind::CloneFromGit => Phase::Clone,
            PlanKind::BulkCopy => Phase::BulkCopy,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Probe => "probe",
            Phase::Clone => "clone",
            Phase::BulkCopy => "bulk_copy",
            Phase::Skip => "skip",
            Phase::Diff => "diff",
            Phase::Transfer => "transfer",
            Phase::Execute => "execute",
            Phase::Report => "report",
        };
        f.write_str(name)
    }
}

/// What to run and whether to sync first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub sync: bool,
}

impl Invocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            sync: false,
        }
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub result: CommandResult,
    pub sync: Option<SyncReport>,
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Success,
    /// The command ran and exited with this non-zero code.
    Failure(i32),
    /// Sync or bootstrap failed before the command ran.
    Abort,
}

impl Terminal {
    pub fn of(outcome: &Result<RunOutcome, SyncError>) -> Self {
        match outcome {
            Ok(outcome) if outcome.result.success() => Terminal::Success,
            Ok(outcome) => Terminal::Failure(outcome.result.exit_code),
            Err(_) => Terminal::Abort,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Terminal::Success => 0,
            Terminal::Failure(code) => *code,
            Terminal::Abort => 1,
        }
    }
}

pub struct CommandRunner<T, L> {
    executor: RemoteExecutor<T>,
    local: L,
    target: RemoteTarget,
    options: SyncOptions,
}

impl<T, L> CommandRunner<T, L>
where
    T: RemoteTransport,
    L: LocalRepo,
{
    pub fn new(
        mut executor: RemoteExecutor<T>,
        local: L,
        target: RemoteTarget,
        options: SyncOptions,
    ) -> Self {
        if let Some(password) = &target.credentials.password {
            executor.redact(password.expose());
        }
        Self {
            executor,
            local,
            target,
            options,
        }
    }

    pub fn target(&self) -> &RemoteTarget {
        &self.target
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn executor(&self) -> &RemoteExecutor<T> {
        &self.executor
    }

    pub fn into_transport(self) -> T {
        self.executor.into_transport()
    }

    fn enter(&self, phase: Phase) {
        debug!(%phase, target = %self.target, "Invocation phase");
    }

    /// Sync if asked to, then run the command in the remote directory.
    pub async fn run(&mut self, invocation: &Invocation) -> Result<RunOutcome, SyncError> {
        self.enter(Phase::Init);
        let sync = if invocation.sync {
            Some(self.sync_at(SystemTime::now()).await?)
        } else {
            None
        };

        self.enter(Phase::Execute);
        info!(
            command = %mask_sensitive_command(&invocation.command),
            directory = %self.target.directory,
            "Executing remote command"
        );
        let result = self
            .executor
            .call_streamed(&self.target.directory, &invocation.command)
            .await?;

        self.enter(Phase::Report);
        Ok(RunOutcome { result, sync })
    }

    /// Bootstrap and push changes without running anything.
    pub async fn sync(&mut self) -> Result<SyncReport, SyncError> {
        self.enter(Phase::Init);
        self.sync_at(SystemTime::now()).await
    }

    /// Remote state of the target directory.
    pub async fn probe(&mut self) -> Result<RepoState, SyncError> {
        self.enter(Phase::Probe);
        Ok(probe_remote(&mut self.executor, &self.target.directory).await?)
    }

    /// The sync phases, with `now` anchoring the freshness window.
    pub async fn sync_at(&mut self, now: SystemTime) -> Result<SyncReport, SyncError> {
        let remote = self.probe().await?;
        let local_is_git = self.local.is_git();

        let planner = SyncPlanner::new(&self.target, &self.options.exclude);
        let kind = SyncPlanner::plan(local_is_git, remote);
        self.enter(kind.into());
        let plan = planner.resolve(kind, remote, &self.local).await?;
        planner
            .bootstrap(&mut self.executor, &self.local, &plan)
            .await?;

        // A fresh clone still counts as "not git" for this run: every local
        // change is pushed on top of it.
        let remote_is_git = remote.is_git;

        self.enter(Phase::Diff);
        info!("Checking for locally changed files ...");
        let engine = SyncEngine::new(&self.target, &self.options);
        let local_changes = engine.local_changes(&self.local, now).await?.all();

        let remote_changes = if remote_is_git {
            info!("Checking for remotely changed files ...");
            Some(engine.remote_changes(&mut self.executor).await?)
        } else {
            None
        };

        self.enter(Phase::Transfer);
        let to_send = resolve_transfer_set(
            &local_changes,
            remote_changes.as_ref(),
            self.options.no_clobber,
        );
        let transferred = engine
            .transfer(&mut self.executor, self.local.root(), &to_send)
            .await?;

        let report = SyncReport {
            plan: kind,
            local_changes: local_changes.len(),
            remote_changes: remote_changes.map(|r| r.len()),
            transferred,
        };
        info!(
            plan = %report.plan,
            local = report.local_changes,
            remote = ?report.remote_changes,
            transferred = report.transferred.len(),
            "Sync complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandResult;

    #[test]
    fn test_phase_from_plan_kind() {
        assert_eq!(Phase::from(PlanKind::Skip), Phase::Skip);
        assert_eq!(Phase::from(PlanKind::CloneFromGit), Phase::Clone);
        assert_eq!(Phase::from(PlanKind::BulkCopy), Phase::BulkCopy);
        assert_eq!(Phase::BulkCopy.to_string(), "bulk_copy");
    }

    #[test]
    fn test_terminal_states() {
        let ok = |code: i32| -> Result<RunOutcome, SyncError> {
            Ok(RunOutcome {
                result: CommandResult {
                    exit_code: code,
                    ..Default::default()
                },
                sync: None,
            })
        };
        assert_eq!(Terminal::of(&ok(0)), Terminal::Success);
        assert_eq!(Terminal::of(&ok(2)), Terminal::Failure(2));
        assert_eq!(Terminal::of(&ok(2)).exit_code(), 2);

        let aborted: Result<RunOutcome, SyncError> = Err(SyncError::Diff {
            directory: "/srv/app".to_string(),
        });
        assert_eq!(Terminal::of(&aborted), Terminal::Abort);
        assert_eq!(Terminal::Abort.exit_code(), 1);
    }

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("make test").with_sync(true);
        assert!(inv.sync);
        assert_eq!(inv.command, "make test");
    }
}
