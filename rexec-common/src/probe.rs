//! Directory and repository state, local and remote.
//!
//! The remote side is probed with a single shell command that prints two
//! flags, `<exists>,<is_git>`. Decoding sums the digits:
//!
//! | output | sum | state              |
//! |--------|-----|--------------------|
//! | `1,1`  | 2   | exists, git        |
//! | `1,0`  | 1   | exists, not git    |
//! | `0,0`  | 0   | missing            |
//!
//! `0,1` cannot happen on a sane host and is rejected along with anything
//! else that is not a pair of binary digits.

use crate::executor::RemoteExecutor;
use crate::transport::{RemoteTransport, TransportError};
use crate::types::RepoState;
use crate::util::{quote_remote_path, to_forward_slashes};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unexpected probe output for {directory}: {output:?}")]
    Malformed { directory: String, output: String },

    #[error("probe command failed for {directory}")]
    CommandFailed { directory: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The combined existence / git check for `directory`.
pub fn probe_command(directory: &str) -> String {
    let dir = to_forward_slashes(directory);
    let dir = quote_remote_path(&dir);
    format!(
        "echo $(test -d {dir} && echo 1 || echo 0),$(cd {dir} 2>/dev/null && git status 1>/dev/null 2>/dev/null && echo 1 || echo 0)"
    )
}

fn flag(digit: &str) -> Option<u8> {
    match digit.trim() {
        "0" => Some(0),
        "1" => Some(1),
        _ => None,
    }
}

/// Turn the probe's `<d>,<d>` line into a [`RepoState`].
pub fn decode_probe_output(directory: &str, output: &str) -> Result<RepoState, ProbeError> {
    let malformed = || ProbeError::Malformed {
        directory: directory.to_string(),
        output: output.to_string(),
    };

    let (exists, is_git) = output.trim().split_once(',').ok_or_else(malformed)?;
    let exists = flag(exists).ok_or_else(malformed)?;
    let is_git = flag(is_git).ok_or_else(malformed)?;

    match (exists + is_git, exists) {
        (2, _) => Ok(RepoState::new(true, true)),
        (1, 1) => Ok(RepoState::new(true, false)),
        (0, _) => Ok(RepoState::MISSING),
        _ => Err(malformed()),
    }
}

/// Probe `directory` on the remote host with exactly one command.
pub async fn probe_remote<T: RemoteTransport>(
    executor: &mut RemoteExecutor<T>,
    directory: &str,
) -> Result<RepoState, ProbeError> {
    let lines = executor
        .call(directory, &probe_command(directory))
        .await?
        .ok_or_else(|| ProbeError::CommandFailed {
            directory: to_forward_slashes(directory),
        })?;

    let output = lines.first().map(String::as_str).unwrap_or_default();
    let state = decode_probe_output(directory, output)?;
    debug!(directory = %to_forward_slashes(directory), %state, "Remote probe");
    Ok(state)
}

/// A local project root is a repository when `.git` is a directory in it.
pub fn local_is_git(root: &Path) -> bool {
    root.join(".git").is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::transport::CommandOutput;

    #[test]
    fn test_probe_command_exact() {
        assert_eq!(
            probe_command("/srv/app"),
            "echo $(test -d /srv/app && echo 1 || echo 0),$(cd /srv/app 2>/dev/null && git status 1>/dev/null 2>/dev/null && echo 1 || echo 0)"
        );
    }

    #[test]
    fn test_probe_command_quotes_and_normalizes() {
        let cmd = probe_command(r"C:\my work");
        assert!(cmd.starts_with("echo $(test -d 'C:/my work' && "));
    }

    #[test]
    fn test_decode_valid_pairs() {
        assert_eq!(decode_probe_output("/d", "1,1").unwrap(), RepoState::new(true, true));
        assert_eq!(decode_probe_output("/d", "1,0").unwrap(), RepoState::new(true, false));
        assert_eq!(decode_probe_output("/d", "0,0").unwrap(), RepoState::MISSING);
        assert_eq!(decode_probe_output("/d", " 1,1\n").unwrap(), RepoState::new(true, true));
    }

    #[test]
    fn test_decode_rejects_everything_else() {
        for output in ["0,1", "", "1", "2,0", "1,1,1", "yes,no", "11"] {
            let err = decode_probe_output("/d", output).unwrap_err();
            assert!(
                matches!(err, ProbeError::Malformed { .. }),
                "{output:?} should be malformed"
            );
        }
    }

    #[tokio::test]
    async fn test_probe_remote_runs_one_command_in_target_dir() {
        let mock = MockTransport::new("box").respond("echo $(test -d", CommandOutput::ok("1,0\n"));
        let mut exec = RemoteExecutor::new(mock);

        let state = probe_remote(&mut exec, "/srv/app").await.unwrap();
        assert_eq!(state, RepoState::new(true, false));

        let commands = exec.transport().commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with("cd /srv/app;\n\necho $(test -d /srv/app"));
    }

    #[tokio::test]
    async fn test_probe_remote_failure_sentinel_is_error() {
        let mock = MockTransport::new("box").default_output(CommandOutput::new(127, "", "sh: not found"));
        let mut exec = RemoteExecutor::new(mock);
        let err = probe_remote(&mut exec, "/srv/app").await.unwrap_err();
        assert!(matches!(err, ProbeError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_probe_remote_empty_output_is_malformed() {
        let mut exec = RemoteExecutor::new(MockTransport::new("box"));
        let err = probe_remote(&mut exec, "/srv/app").await.unwrap_err();
        assert!(matches!(err, ProbeError::Malformed { .. }));
    }

    #[test]
    fn test_local_is_git() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!local_is_git(dir.path()));
        std::fs::write(dir.path().join(".git"), "gitdir: elsewhere").unwrap();
        assert!(!local_is_git(dir.path()));
        std::fs::remove_file(dir.path().join(".git")).unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(local_is_git(dir.path()));
    }

    mod proptest_decode {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_decode_never_panics(output in ".{0,12}") {
                let _ = decode_probe_output("/d", &output);
            }

            #[test]
            fn test_decoded_state_is_consistent(output in "[0-2],[0-2]") {
                if let Ok(state) = decode_probe_output("/d", &output) {
                    prop_assert!(state.exists || !state.is_git);
                }
            }
        }
    }
}
