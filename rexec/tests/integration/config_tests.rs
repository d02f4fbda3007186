use crate::common::{TestProject, assert_contains, assert_not_contains, assert_path_exists, init_test_logging};
use rexec_common::{ConfigPaths, ConfigSource, load_config, validate_config};
use serial_test::serial;

const PROJECT_CONFIG: &str = r#"
[remote]
host = "build-box"
remote_path = "/srv/app"
port = 2222

[sync]
sync_on = true
exclude = ["local.env"]

[git]
git_username = "alice"
git_password = "secret123"
"#;

#[test]
#[serial]
fn test_project_file_is_loaded_with_sources() {
    init_test_logging();
    crate::test_log!("TEST START: test_project_file_is_loaded_with_sources");

    let project = TestProject::with_config(PROJECT_CONFIG);
    assert_path_exists(&project.config_file);
    let paths = ConfigPaths {
        user: None,
        project: Some(project.config_file.clone()),
        explicit: None,
    };
    let loaded = load_config(&paths).expect("config should load");

    assert_eq!(loaded.config.remote.port, Some(2222));
    assert!(loaded.config.sync.sync_on);
    assert_eq!(loaded.files, vec![project.config_file.clone()]);
    assert_eq!(
        loaded.source_of("sync.sync_on"),
        ConfigSource::File(project.config_file.clone())
    );
    assert_eq!(loaded.source_of("sync.sync_no_clobber"), ConfigSource::Default);
    assert!(validate_config(&loaded.config).is_empty());

    let options = loaded.config.sync_options();
    assert!(options.exclude.iter().any(|name| name == "local.env"));
    assert!(options.exclude.iter().any(|name| name == ".rexec.toml"));
    crate::test_log!("TEST PASS: test_project_file_is_loaded_with_sources");
}

#[test]
#[serial]
fn test_explicit_file_replaces_discovered_files() {
    init_test_logging();
    crate::test_log!("TEST START: test_explicit_file_replaces_discovered_files");

    let project = TestProject::with_config(PROJECT_CONFIG);
    let explicit = project.path().join("ci.toml");
    std::fs::write(&explicit, "[remote]\nhost = \"ci-box\"\n").unwrap();

    let paths = ConfigPaths::discover(Some(explicit.clone()), project.path());
    let loaded = load_config(&paths).expect("config should load");

    assert_eq!(loaded.config.remote.host.as_deref(), Some("ci-box"));
    assert_eq!(loaded.config.remote.remote_path, None);
    assert_eq!(loaded.files, vec![explicit]);
    crate::test_log!("TEST PASS: test_explicit_file_replaces_discovered_files");
}

#[test]
fn test_config_show_masks_password_and_names_sources() {
    init_test_logging();
    crate::test_log!("TEST START: test_config_show_masks_password_and_names_sources");

    let project = TestProject::with_config(PROJECT_CONFIG);
    let output = project.rexec_with_env(
        &["--remote-path", "/srv/other", "config", "show"],
        &[("REXEC_HOST", "env-box")],
    );

    assert!(output.status.success(), "config show failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_not_contains(&stdout, "secret123");
    assert_contains(&stdout, "git_password = \"******\"");
    assert_contains(&stdout, "host = \"env-box\"");
    assert_contains(&stdout, "remote_path = \"/srv/other\"");
    assert_contains(&stdout, "remote.host = env REXEC_HOST");
    assert_contains(&stdout, "remote.remote_path = command line");
    assert_contains(&stdout, "sync.sync_on = file ");
    crate::test_log!("TEST PASS: test_config_show_masks_password_and_names_sources");
}

#[test]
fn test_config_path_lists_project_file() {
    init_test_logging();
    crate::test_log!("TEST START: test_config_path_lists_project_file");

    let project = TestProject::with_config(PROJECT_CONFIG);
    let output = project.rexec(&["config", "path"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, ".rexec.toml (found)");
    crate::test_log!("TEST PASS: test_config_path_lists_project_file");
}

#[test]
fn test_config_path_works_with_broken_config() {
    init_test_logging();
    crate::test_log!("TEST START: test_config_path_works_with_broken_config");

    let project = TestProject::with_config("not = [valid");
    let output = project.rexec(&["config", "path"]);

    assert!(output.status.success());
    assert_contains(&String::from_utf8_lossy(&output.stdout), ".rexec.toml (found)");
    crate::test_log!("TEST PASS: test_config_path_works_with_broken_config");
}
