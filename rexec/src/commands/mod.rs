//! Subcommand implementations.
//!
//! Each returns the process exit code on success; [`crate::report::finish`]
//! is the only place that code (or an error) becomes the exit status.

mod config;
#[cfg(unix)]
mod probe;
#[cfg(unix)]
mod run;
#[cfg(unix)]
mod sync;

use crate::cli::{Cli, Commands, ConfigAction, SyncArgs};
use crate::error::CliError;
use rexec_common::{
    ConfigError, ConfigPaths, GitCredentials, LoadedConfig, RexecConfig, resolve_credentials,
    validate_config,
};
use std::path::{Path, PathBuf};
use tracing::warn;

const CREDENTIAL_FIELD: &str = "git.git_password";

/// Everything resolved before a subcommand runs.
pub struct Context {
    pub cwd: PathBuf,
    pub paths: ConfigPaths,
    pub loaded: Result<LoadedConfig, ConfigError>,
}

/// Merged configuration with the global command-line overrides applied.
fn with_overrides(
    loaded: Result<LoadedConfig, ConfigError>,
    cli: &Cli,
) -> Result<LoadedConfig, CliError> {
    let mut loaded = loaded?;
    if let Some(host) = &cli.host {
        loaded.config.remote.host = Some(host.clone());
        loaded.mark_cli("remote.host");
    }
    if let Some(path) = &cli.remote_path {
        loaded.config.remote.remote_path = Some(path.clone());
        loaded.mark_cli("remote.remote_path");
    }
    Ok(loaded)
}

pub async fn dispatch(cli: Cli, ctx: Context) -> Result<i32, CliError> {
    match &cli.command {
        Commands::Config {
            action: ConfigAction::Path,
        } => config::path(&ctx.paths),
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            let loaded = with_overrides(ctx.loaded, &cli)?;
            config::show(&loaded)
        }
        Commands::Run {
            sync,
            no_sync,
            sync_args,
            command,
        } => {
            let mut loaded = with_overrides(ctx.loaded, &cli)?;
            apply_sync_args(&mut loaded, sync_args);
            if *sync {
                loaded.config.sync.sync_on = true;
                loaded.mark_cli("sync.sync_on");
            } else if *no_sync {
                loaded.config.sync.sync_on = false;
                loaded.mark_cli("sync.sync_on");
            }
            check_runnable(&loaded.config)?;
            let credentials = credentials(&loaded.config, sync_args)?;
            run_command(&loaded.config, &ctx.cwd, credentials, command.join(" ")).await
        }
        Commands::Sync { sync_args, json } => {
            let mut loaded = with_overrides(ctx.loaded, &cli)?;
            apply_sync_args(&mut loaded, sync_args);
            check_runnable(&loaded.config)?;
            let credentials = credentials(&loaded.config, sync_args)?;
            sync_command(&loaded.config, &ctx.cwd, credentials, *json).await
        }
        Commands::Probe { json } => {
            let loaded = with_overrides(ctx.loaded, &cli)?;
            check_runnable(&loaded.config)?;
            probe_command(&loaded.config, &ctx.cwd, *json).await
        }
    }
}

#[cfg(unix)]
async fn run_command(
    config: &RexecConfig,
    cwd: &Path,
    credentials: GitCredentials,
    command: String,
) -> Result<i32, CliError> {
    run::execute(config, cwd, credentials, command).await
}

#[cfg(unix)]
async fn sync_command(
    config: &RexecConfig,
    cwd: &Path,
    credentials: GitCredentials,
    json: bool,
) -> Result<i32, CliError> {
    sync::execute(config, cwd, credentials, json).await
}

#[cfg(unix)]
async fn probe_command(config: &RexecConfig, cwd: &Path, json: bool) -> Result<i32, CliError> {
    probe::execute(config, cwd, json).await
}

#[cfg(not(unix))]
async fn run_command(
    _config: &RexecConfig,
    _cwd: &Path,
    _credentials: GitCredentials,
    _command: String,
) -> Result<i32, CliError> {
    Err(CliError::Unsupported("rexec run"))
}

#[cfg(not(unix))]
async fn sync_command(
    _config: &RexecConfig,
    _cwd: &Path,
    _credentials: GitCredentials,
    _json: bool,
) -> Result<i32, CliError> {
    Err(CliError::Unsupported("rexec sync"))
}

#[cfg(not(unix))]
async fn probe_command(_config: &RexecConfig, _cwd: &Path, _json: bool) -> Result<i32, CliError> {
    Err(CliError::Unsupported("rexec probe"))
}

fn apply_sync_args(loaded: &mut LoadedConfig, args: &SyncArgs) {
    if args.no_clobber {
        loaded.config.sync.sync_no_clobber = true;
        loaded.mark_cli("sync.sync_no_clobber");
    }
}

/// Host and remote path are required; other validation errors abort too.
///
/// Credentials are checked after resolution instead, since flags and
/// environment can complete what the files leave half set.
fn check_runnable(config: &RexecConfig) -> Result<(), CliError> {
    config.host()?;
    config.remote_path()?;

    let findings: Vec<_> = validate_config(config)
        .into_iter()
        .filter(|f| f.field != CREDENTIAL_FIELD)
        .collect();
    for finding in findings.iter().filter(|f| !f.is_error()) {
        warn!("{}", finding);
    }
    if let Some(error) = findings.iter().find(|f| f.is_error()) {
        return Err(ConfigError::Invalid(error.to_string()).into());
    }
    Ok(())
}

/// Flags, then environment, then configuration.
fn credentials(config: &RexecConfig, args: &SyncArgs) -> Result<GitCredentials, CliError> {
    let explicit = GitCredentials::new(args.git_username.clone(), args.git_password.clone());
    let resolved = resolve_credentials(
        &explicit,
        |name| std::env::var(name).ok(),
        &config.git_credentials(),
    );
    resolved.validate()?;
    Ok(resolved)
}
