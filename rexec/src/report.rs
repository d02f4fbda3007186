//! Turning results into process output and an exit status.

use crate::error::CliError;
use rexec_common::CommandResult;
use std::io::{self, Write};
use std::process::ExitCode;

/// Print the remote command's output.
///
/// A failing command with nothing on stdout shows its stderr instead; in
/// every other case stdout is shown. Both go to our stdout.
pub fn write_result<W: Write>(result: &CommandResult, out: &mut W) -> io::Result<()> {
    let lines = if !result.success() && result.stdout.is_empty() {
        &result.stderr
    } else {
        &result.stdout
    };
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

/// Process exit byte for `code`; anything outside `0..=255` becomes 1.
pub fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

/// `[REXEC-Exxx] message`, the underlying cause and remediation steps.
pub fn render_error(err: &CliError) -> String {
    match err.code() {
        Some(code) => {
            let entry = code.entry();
            let full = entry.format_full();
            let (headline, remediation) = full.split_once('\n').unwrap_or((full.as_str(), ""));
            format!("{}\n  {}\n{}", headline, err, remediation)
        }
        None => format!("error: {}\n", err),
    }
}

/// The single place an invocation's result becomes an exit status.
pub fn finish(outcome: Result<i32, CliError>) -> ExitCode {
    match outcome {
        Ok(code) => ExitCode::from(exit_byte(code)),
        Err(err) => {
            tracing::debug!(error = ?err, "Invocation aborted");
            eprint!("{}", render_error(&err));
            ExitCode::from(1)
        }
    }
}
