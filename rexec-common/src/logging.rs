//! Tracing setup shared by the rexec binaries.
//!
//! Diagnostics go to stderr so the remote command's stdout, which rexec
//! prints on its own stdout, stays clean. An optional log file receives a
//! plain-text copy through a non-blocking writer.

use crate::config::EnvParser;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level or full filter directive (`debug`, `rexec_common=trace`).
    pub level: String,
    pub format: LogFormat,
    /// Write console output to stderr instead of stdout.
    pub stderr: bool,
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Defaults overridden by `REXEC_LOG_LEVEL`, `REXEC_LOG_FORMAT` and
    /// `REXEC_LOG_FILE`. Invalid values fall back to the defaults.
    pub fn from_env(default_level: &str) -> Self {
        let mut parser = EnvParser::new();
        let level = parser.get_log_level("LOG_LEVEL", default_level).value;
        let format = parser
            .get_string("LOG_FORMAT", "compact")
            .value
            .parse()
            .unwrap_or_default();
        let file = parser.get_optional_path("LOG_FILE", false).value;
        Self {
            level,
            format,
            stderr: false,
            file,
        }
    }

    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// `RUST_LOG` wins when set; otherwise `level` applies to rexec crates
    /// and everything else stays at `warn`.
    fn filter(&self) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
        let directive = if self.level.contains('=') {
            self.level.clone()
        } else {
            format!("warn,rexec={0},rexec_common={0}", self.level)
        };
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn,rexec=info,rexec_common=info"))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            stderr: true,
            file: None,
        }
    }
}

/// Keeps background log writers alive; drop at process exit.
#[must_use = "dropping the guards stops file logging"]
pub struct LoggingGuards {
    _file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn console_layer(config: &LogConfig) -> BoxedLayer {
    let layer = fmt::layer().with_target(false);
    match (config.format, config.stderr) {
        (LogFormat::Pretty, true) => layer.pretty().with_writer(std::io::stderr).boxed(),
        (LogFormat::Pretty, false) => layer.pretty().with_writer(std::io::stdout).boxed(),
        (LogFormat::Compact, true) => layer.compact().with_writer(std::io::stderr).boxed(),
        (LogFormat::Compact, false) => layer.compact().with_writer(std::io::stdout).boxed(),
        (LogFormat::Json, true) => layer.json().with_writer(std::io::stderr).boxed(),
        (LogFormat::Json, false) => layer.json().with_writer(std::io::stdout).boxed(),
    }
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<LoggingGuards> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(config)];
    let mut file_guard = None;

    if let Some(path) = &config.file {
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;
        std::fs::create_dir_all(&directory)?;

        let appender = tracing_appender::rolling::never(&directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(config.filter())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(LoggingGuards { _file: file_guard })
}
