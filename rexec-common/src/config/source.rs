//! Where a configuration value came from.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// A TOML file (user, project or `--config`).
    File(PathBuf),
    /// An environment variable, by name.
    Environment(String),
    /// A command-line flag.
    CommandLine,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File(path) => write!(f, "file {}", path.display()),
            ConfigSource::Environment(var) => write!(f, "env {}", var),
            ConfigSource::CommandLine => write!(f, "command line"),
        }
    }
}

/// A value tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> Sourced<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    pub fn default_value(value: T) -> Self {
        Self::new(value, ConfigSource::Default)
    }

    pub fn from_env(value: T, var: impl Into<String>) -> Self {
        Self::new(value, ConfigSource::Environment(var.into()))
    }

    pub fn is_from_env(&self) -> bool {
        matches!(self.source, ConfigSource::Environment(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ConfigSource::Default.to_string(), "default");
        assert_eq!(
            ConfigSource::Environment("REXEC_HOST".to_string()).to_string(),
            "env REXEC_HOST"
        );
        assert_eq!(
            ConfigSource::File(PathBuf::from(".rexec.toml")).to_string(),
            "file .rexec.toml"
        );
    }

    #[test]
    fn test_sourced_constructors() {
        assert!(Sourced::from_env(1, "REXEC_X").is_from_env());
        assert!(!Sourced::default_value(1).is_from_env());
    }
}
