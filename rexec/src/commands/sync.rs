//! `rexec sync`: bootstrap and push without running anything.

use crate::error::CliError;
use crate::session;
use rexec_common::{GitCredentials, RexecConfig, SyncReport};
use std::io::Write;
use std::path::Path;

pub async fn execute(
    config: &RexecConfig,
    cwd: &Path,
    credentials: GitCredentials,
    json: bool,
) -> Result<i32, CliError> {
    let mut runner = session::open(config, cwd, credentials).await?;
    let report = runner.sync().await;
    session::close(runner).await;
    let report = report?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::Render(e.to_string()))?;
        writeln!(out, "{}", text)?;
    } else {
        write_summary(&report, &mut out)?;
    }
    Ok(0)
}

fn write_summary<W: Write>(report: &SyncReport, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Plan: {}", report.plan)?;
    writeln!(out, "Local changes: {}", report.local_changes)?;
    match report.remote_changes {
        Some(count) => writeln!(out, "Remote changes: {}", count)?,
        None => writeln!(out, "Remote changes: n/a (not a repository)")?,
    }
    writeln!(out, "Transferred: {}", report.transferred.len())?;
    for path in &report.transferred {
        writeln!(out, "  {}", path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rexec_common::PlanKind;

    #[test]
    fn test_summary_lists_transferred_files() {
        let report = SyncReport {
            plan: PlanKind::Skip,
            local_changes: 2,
            remote_changes: Some(1),
            transferred: vec!["/srv/app/a.rs".to_string()],
        };
        let mut out = Vec::new();
        write_summary(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Plan: skip\nLocal changes: 2\nRemote changes: 1\nTransferred: 1\n  /srv/app/a.rs\n"
        );
    }

    #[test]
    fn test_summary_without_remote_repository() {
        let report = SyncReport {
            plan: PlanKind::BulkCopy,
            local_changes: 0,
            remote_changes: None,
            transferred: Vec::new(),
        };
        let mut out = Vec::new();
        write_summary(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Plan: bulk copy\n"));
        assert!(text.contains("n/a"));
    }
}
