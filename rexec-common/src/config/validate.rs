//! Startup validation of the merged configuration.

use super::RexecConfig;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub severity: Severity,
    /// `section.key` the finding is about.
    pub field: &'static str,
    pub message: String,
}

impl ConfigWarning {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field,
            message: message.into(),
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", label, self.field, self.message)
    }
}

/// Findings for `config`, errors first.
pub fn validate_config(config: &RexecConfig) -> Vec<ConfigWarning> {
    let mut findings = Vec::new();

    if config.host().is_err() {
        findings.push(ConfigWarning::error(
            "remote.host",
            "no remote host configured",
        ));
    }

    match config.remote_path() {
        Err(_) => findings.push(ConfigWarning::error(
            "remote.remote_path",
            "no remote path configured",
        )),
        Ok(path) => {
            let path = path.trim();
            if !path.starts_with('/') && !path.starts_with('~') {
                findings.push(ConfigWarning::warning(
                    "remote.remote_path",
                    format!("'{}' is relative; it resolves against the remote login directory", path),
                ));
            }
        }
    }

    if config.git_credentials().validate().is_err() {
        findings.push(ConfigWarning::error(
            "git.git_password",
            "a git password is set without git.git_username",
        ));
    }

    if config.sync.freshness_window_secs == 0 {
        findings.push(ConfigWarning::warning(
            "sync.freshness_window_secs",
            "a zero window never selects any file",
        ));
    }

    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RexecConfig {
        let mut config = RexecConfig::default();
        config.remote.host = Some("build-box".to_string());
        config.remote.remote_path = Some("/srv/app".to_string());
        config
    }

    #[test]
    fn test_valid_config_has_no_findings() {
        assert!(validate_config(&valid()).is_empty());
    }

    #[test]
    fn test_missing_host_and_path_are_errors() {
        let findings = validate_config(&RexecConfig::default());
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(ConfigWarning::is_error));
    }

    #[test]
    fn test_relative_path_is_warning() {
        let mut config = valid();
        config.remote.remote_path = Some("work/app".to_string());
        let findings = validate_config(&config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);

        config.remote.remote_path = Some("~/app".to_string());
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_password_without_username_is_error() {
        let mut config = valid();
        config.git.git_password = Some("secret123".to_string());
        let findings = validate_config(&config);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_error());
        assert!(!findings[0].to_string().contains("secret123"));
    }

    #[test]
    fn test_errors_sort_first() {
        let mut config = valid();
        config.remote.remote_path = Some("rel".to_string());
        config.git.git_password = Some("p".to_string());
        let findings = validate_config(&config);
        assert!(findings[0].is_error());
        assert_eq!(findings[1].severity, Severity::Warning);
    }
}
