use crate::common::{TestProject, assert_contains, assert_not_contains, init_test_logging};
use std::process::Command;

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_rexec_help_includes_description() {
    init_test_logging();
    crate::test_log!("TEST START: test_rexec_help_includes_description");

    let output = Command::new(env!("CARGO_BIN_EXE_rexec"))
        .arg("--help")
        .output()
        .expect("Failed to run rexec --help");

    assert!(output.status.success(), "rexec --help failed");
    let stdout = stdout(&output);
    assert_contains(&stdout, "mirrored project directory");
    for subcommand in ["run", "sync", "probe", "config"] {
        assert_contains(&stdout, subcommand);
    }
    crate::test_log!("TEST PASS: test_rexec_help_includes_description");
}

#[test]
fn test_run_without_config_exits_one_with_code() {
    init_test_logging();
    crate::test_log!("TEST START: test_run_without_config_exits_one_with_code");

    let project = TestProject::new();
    let output = project.rexec(&["run", "--", "make", "test"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert_contains(&stderr, "[REXEC-E001]");
    assert_contains(&stderr, "remote.host is not set");
    assert_contains(&stderr, "Remediation steps:");
    assert!(stdout(&output).is_empty());
    crate::test_log!("TEST PASS: test_run_without_config_exits_one_with_code");
}

#[test]
fn test_missing_remote_path_is_reported() {
    init_test_logging();
    crate::test_log!("TEST START: test_missing_remote_path_is_reported");

    let project = TestProject::with_config("[remote]\nhost = \"build-box\"\n");
    let output = project.rexec(&["probe"]);

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&stderr(&output), "remote.remote_path is not set");
    crate::test_log!("TEST PASS: test_missing_remote_path_is_reported");
}

#[test]
fn test_password_without_username_aborts_before_connecting() {
    init_test_logging();
    crate::test_log!("TEST START: test_password_without_username_aborts_before_connecting");

    let project = TestProject::with_config(
        "[remote]\nhost = \"build-box.invalid\"\nremote_path = \"/srv/app\"\n\n[git]\ngit_password = \"secret123\"\n",
    );
    let output = project.rexec(&["sync"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert_contains(&stderr, "[REXEC-E206]");
    assert_not_contains(&stderr, "secret123");
    crate::test_log!("TEST PASS: test_password_without_username_aborts_before_connecting");
}

#[test]
fn test_malformed_project_config_is_parse_error() {
    init_test_logging();
    crate::test_log!("TEST START: test_malformed_project_config_is_parse_error");

    let project = TestProject::with_config("[remote\nhost = ");
    let output = project.rexec(&["config", "show"]);

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&stderr(&output), "[REXEC-E002]");
    crate::test_log!("TEST PASS: test_malformed_project_config_is_parse_error");
}

#[test]
fn test_explicit_config_must_exist() {
    init_test_logging();
    crate::test_log!("TEST START: test_explicit_config_must_exist");

    let project = TestProject::new();
    let missing = project.path().join("nope.toml");
    let output = project.rexec(&["--config", missing.to_str().unwrap(), "config", "show"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert_contains(&stderr, "[REXEC-E002]");
    assert_contains(&stderr, "nope.toml");
    crate::test_log!("TEST PASS: test_explicit_config_must_exist");
}

#[test]
fn test_invalid_environment_is_config_invalid() {
    init_test_logging();
    crate::test_log!("TEST START: test_invalid_environment_is_config_invalid");

    let project = TestProject::new();
    let output = project.rexec_with_env(&["config", "show"], &[("REXEC_SSH_PORT", "not-a-port")]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert_contains(&stderr, "[REXEC-E003]");
    assert_contains(&stderr, "REXEC_SSH_PORT");
    crate::test_log!("TEST PASS: test_invalid_environment_is_config_invalid");
}

#[test]
fn test_run_requires_command_argument() {
    init_test_logging();
    crate::test_log!("TEST START: test_run_requires_command_argument");

    let project = TestProject::new();
    let output = project.rexec(&["run"]);

    assert!(!output.status.success());
    assert_contains(&stderr(&output), "Usage");
    crate::test_log!("TEST PASS: test_run_requires_command_argument");
}
