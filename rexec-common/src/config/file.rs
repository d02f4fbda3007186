//! Layered loading of TOML files and `REXEC_*` overrides.

use super::env::EnvParser;
use super::source::{ConfigSource, Sourced};
use super::{ConfigError, RexecConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-project configuration file.
pub const PROJECT_CONFIG_FILE: &str = ".rexec.toml";

/// Files considered when loading, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPaths {
    /// `<config_dir>/config.toml` from the platform's project directories.
    pub user: Option<PathBuf>,
    /// `.rexec.toml` in the invocation directory.
    pub project: Option<PathBuf>,
    /// `--config <path>`: replaces both files above and must exist.
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn discover(explicit: Option<PathBuf>, cwd: &Path) -> Self {
        Self {
            user: user_config_file(),
            project: Some(cwd.join(PROJECT_CONFIG_FILE)),
            explicit,
        }
    }

    /// `(path, required)` pairs in load order.
    pub fn candidates(&self) -> Vec<(PathBuf, bool)> {
        match &self.explicit {
            Some(path) => vec![(path.clone(), true)],
            None => self
                .user
                .iter()
                .chain(self.project.iter())
                .map(|p| (p.clone(), false))
                .collect(),
        }
    }
}

pub fn user_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "rexec", "rexec")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Merged configuration plus provenance.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: RexecConfig,
    /// `section.key` to source, for every value not left at its default.
    pub sources: BTreeMap<String, ConfigSource>,
    /// Files actually read.
    pub files: Vec<PathBuf>,
}

impl LoadedConfig {
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.sources
            .get(key)
            .cloned()
            .unwrap_or(ConfigSource::Default)
    }

    /// Record a value set from a command-line flag.
    pub fn mark_cli(&mut self, key: &str) {
        self.sources.insert(key.to_string(), ConfigSource::CommandLine);
    }
}

/// Recursively merge `overlay` into `base`; tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn record_keys(table: &toml::Table, prefix: &str, source: &ConfigSource, out: &mut BTreeMap<String, ConfigSource>) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => record_keys(inner, &full, source, out),
            _ => {
                out.insert(full, source.clone());
            }
        }
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<toml::Table>(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load files and environment. Command-line flags are applied by the caller.
pub fn load_config(paths: &ConfigPaths) -> Result<LoadedConfig, ConfigError> {
    let mut merged = toml::Table::new();
    let mut loaded = LoadedConfig::default();

    for (path, required) in paths.candidates() {
        if !required && !path.exists() {
            continue;
        }
        let table = read_table(&path)?;
        debug!(path = %path.display(), "Loaded config file");
        record_keys(&table, "", &ConfigSource::File(path.clone()), &mut loaded.sources);
        merge_tables(&mut merged, table);
        loaded.files.push(path);
    }

    loaded.config = merged.try_into().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: loaded.files.last().cloned().unwrap_or_default(),
        message: e.to_string(),
    })?;

    let mut parser = EnvParser::new();
    apply_env_overrides(&mut loaded, &mut parser);
    if parser.has_errors() {
        return Err(ConfigError::Env(parser.take_errors()));
    }
    Ok(loaded)
}

fn overlay<T>(slot: &mut T, sourced: Sourced<T>, key: &str, sources: &mut BTreeMap<String, ConfigSource>) {
    if sourced.is_from_env() {
        *slot = sourced.value;
        sources.insert(key.to_string(), sourced.source);
    }
}

/// Apply `REXEC_*` variables on top of the file layers.
pub fn apply_env_overrides(loaded: &mut LoadedConfig, parser: &mut EnvParser) {
    let config = &mut loaded.config;
    let sources = &mut loaded.sources;

    overlay(&mut config.remote.host, parser.get_optional_string("HOST"), "remote.host", sources);
    overlay(
        &mut config.remote.remote_path,
        parser.get_optional_string("REMOTE_PATH"),
        "remote.remote_path",
        sources,
    );
    overlay(&mut config.remote.user, parser.get_optional_string("SSH_USER"), "remote.user", sources);
    overlay(&mut config.remote.port, parser.get_port("SSH_PORT"), "remote.port", sources);
    overlay(
        &mut config.remote.identity_file,
        parser.get_optional_string("IDENTITY_FILE"),
        "remote.identity_file",
        sources,
    );
    let timeout = config.remote.connect_timeout_secs;
    overlay(
        &mut config.remote.connect_timeout_secs,
        parser.get_u64_range("CONNECT_TIMEOUT_SECS", timeout, 1, 600),
        "remote.connect_timeout_secs",
        sources,
    );

    let sync_on = config.sync.sync_on;
    overlay(&mut config.sync.sync_on, parser.get_bool("SYNC_ON", sync_on), "sync.sync_on", sources);
    let no_clobber = config.sync.sync_no_clobber;
    overlay(
        &mut config.sync.sync_no_clobber,
        parser.get_bool("SYNC_NO_CLOBBER", no_clobber),
        "sync.sync_no_clobber",
        sources,
    );
    let window = config.sync.freshness_window_secs;
    overlay(
        &mut config.sync.freshness_window_secs,
        parser.get_u64_range("FRESHNESS_WINDOW_SECS", window, 1, 86_400),
        "sync.freshness_window_secs",
        sources,
    );
    let exclude = config.sync.exclude.clone();
    overlay(
        &mut config.sync.exclude,
        parser.get_string_list("SYNC_EXCLUDE", exclude),
        "sync.exclude",
        sources,
    );

    let level = config.general.log_level.clone();
    overlay(
        &mut config.general.log_level,
        parser.get_log_level("LOG_LEVEL", &level),
        "general.log_level",
        sources,
    );
}
