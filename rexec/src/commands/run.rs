//! `rexec run`: optional sync, then the command itself.

use crate::error::CliError;
use crate::report;
use crate::session;
use rexec_common::{GitCredentials, Invocation, RexecConfig, Terminal};
use std::path::Path;
use tracing::{debug, info};

pub async fn execute(
    config: &RexecConfig,
    cwd: &Path,
    credentials: GitCredentials,
    command: String,
) -> Result<i32, CliError> {
    let invocation = Invocation::new(command).with_sync(config.sync.sync_on);

    let mut runner = session::open(config, cwd, credentials).await?;
    let outcome = runner.run(&invocation).await;
    session::close(runner).await;

    let terminal = Terminal::of(&outcome);
    debug!(?terminal, "Invocation finished");
    let outcome = outcome?;

    if let Some(sync) = &outcome.sync {
        info!(
            plan = %sync.plan,
            transferred = sync.transferred.len(),
            "Sync complete"
        );
    }

    let stdout = std::io::stdout();
    report::write_result(&outcome.result, &mut stdout.lock())?;
    Ok(terminal.exit_code())
}
