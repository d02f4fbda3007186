//! `rexec probe`: remote and local repository state.

use crate::error::CliError;
use crate::session;
use rexec_common::{GitCredentials, LocalRepo, RepoState, RexecConfig};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ProbeReport {
    target: String,
    remote: RepoState,
    local_root: String,
    local_is_git: bool,
}

pub async fn execute(config: &RexecConfig, cwd: &Path, json: bool) -> Result<i32, CliError> {
    let mut runner = session::open(config, cwd, GitCredentials::default()).await?;
    let remote = runner.probe().await;
    let report = remote.map(|remote| ProbeReport {
        target: runner.target().to_string(),
        remote,
        local_root: runner.local().root().display().to_string(),
        local_is_git: runner.local().is_git(),
    });
    session::close(runner).await;
    let report = report?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::Render(e.to_string()))?;
        writeln!(out, "{}", text)?;
    } else {
        writeln!(out, "remote {}: {}", report.target, report.remote)?;
        let local = if report.local_is_git {
            "git repository"
        } else {
            "not a repository"
        };
        writeln!(out, "local {}: {}", report.local_root, local)?;
    }
    Ok(0)
}
