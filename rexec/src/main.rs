//! rexec - run a command in a mirrored project directory on a remote host.
//!
//! Before running, rexec can bring the remote directory up to date: clone or
//! copy the project if it is missing, then push the files changed locally.

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod error;
mod report;
#[cfg(unix)]
mod session;

use clap::Parser;
use cli::Cli;
use commands::Context;
use error::CliError;
use rexec_common::{ConfigPaths, LogConfig, init_logging, load_config};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => return report::finish(Err(CliError::CurrentDir(e))),
    };
    let paths = ConfigPaths::discover(cli.config.clone(), &cwd);
    let loaded = load_config(&paths);

    let default_level = loaded
        .as_ref()
        .map(|l| l.config.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    let mut log_config = LogConfig::from_env(&default_level).with_stderr();
    if let Some(level) = cli.log_level() {
        log_config = log_config.with_level(level);
    }
    let _logging_guards = match init_logging(&log_config) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    let ctx = Context { cwd, paths, loaded };
    report::finish(commands::dispatch(cli, ctx).await)
}
