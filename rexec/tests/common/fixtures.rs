use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch project directory with an optional `.rexec.toml`.
pub struct TestProject {
    pub dir: TempDir,
    pub config_file: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating test project");

        let dir = TempDir::new().expect("Failed to create temp dir");
        let config_file = dir.path().join(".rexec.toml");
        fs::write(dir.path().join("main.c"), "int main(void) { return 0; }\n")
            .expect("Failed to write main.c");

        Self { dir, config_file }
    }

    /// Project with a `.rexec.toml` holding `contents`.
    pub fn with_config(contents: &str) -> Self {
        let project = Self::new();
        fs::write(&project.config_file, contents).expect("Failed to write .rexec.toml");
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run the rexec binary inside the project, isolated from the caller's
    /// user config and `REXEC_*` environment.
    pub fn rexec(&self, args: &[&str]) -> Output {
        self.rexec_with_env(args, &[])
    }

    pub fn rexec_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let home = self.dir.path().join("home");
        fs::create_dir_all(&home).expect("Failed to create fake home");

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rexec"));
        for (key, _) in std::env::vars() {
            if key.starts_with("REXEC_") || key.starts_with("git_") {
                cmd.env_remove(&key);
            }
        }
        cmd.current_dir(self.dir.path())
            .env("HOME", &home)
            .env("XDG_CONFIG_HOME", home.join(".config"))
            .env_remove("RUST_LOG")
            .envs(env.iter().copied())
            .args(args)
            .output()
            .expect("Failed to run rexec")
    }
}
