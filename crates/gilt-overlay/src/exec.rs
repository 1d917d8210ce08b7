//! External command execution.

use std::io;
use std::path::Path;
use std::process::Command;

/// Runs external programs. Implemented over `std::process` in production and
/// by recording fakes in tests.
pub trait ExecManager: Send + Sync {
    /// Run `name` with `args` in the current directory, returning combined output.
    fn run_cmd(&self, name: &str, args: &[String]) -> Result<String, ExecError>;

    /// Run `name` with `args` inside `dir`, returning combined output.
    fn run_cmd_in_dir(&self, name: &str, args: &[String], dir: &Path) -> Result<String, ExecError>;
}

/// Errors that can occur when running a command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {}: {output}", exit_status(.status))]
    Failed {
        command: String,
        status: Option<i32>,
        output: String,
    },
}

/// Executes commands as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExec;

impl CommandExec {
    /// Create a new command executor.
    pub fn new() -> Self {
        Self
    }

    fn run(&self, name: &str, args: &[String], dir: Option<&Path>) -> Result<String, ExecError> {
        let mut cmd = Command::new(name);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        let command = command_line(name, args);
        let cwd = dir.map(|d| d.display().to_string()).unwrap_or_default();
        tracing::debug!("exec: {} (cwd: {})", command, cwd);

        let output = cmd.output().map_err(|source| ExecError::Spawn {
            command: command.clone(),
            source,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        tracing::debug!("result: {}", combined.trim_end());

        if !output.status.success() {
            return Err(ExecError::Failed {
                command,
                status: output.status.code(),
                output: combined,
            });
        }

        Ok(combined)
    }
}

impl ExecManager for CommandExec {
    fn run_cmd(&self, name: &str, args: &[String]) -> Result<String, ExecError> {
        self.run(name, args, None)
    }

    fn run_cmd_in_dir(
        &self,
        name: &str,
        args: &[String],
        dir: &Path,
    ) -> Result<String, ExecError> {
        self.run(name, args, Some(dir))
    }
}

/// Create a temporary directory under `dir`, run `f` with its path, then
/// remove the directory whether or not `f` succeeded.
pub fn with_temp_dir<T, E, F>(dir: &Path, prefix: &str, f: F) -> Result<T, E>
where
    F: FnOnce(&Path) -> Result<T, E>,
    E: From<io::Error>,
{
    let tmp = tempfile::Builder::new().prefix(prefix).tempdir_in(dir)?;
    tracing::debug!("created tempdir {}", tmp.path().display());

    let result = f(tmp.path());

    tracing::debug!("removing tempdir {}", tmp.path().display());
    if let Err(e) = tmp.close() {
        tracing::warn!("Failed to remove tempdir: {}", e);
    }

    result
}

fn exit_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

fn command_line(name: &str, args: &[String]) -> String {
    std::iter::once(name)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn runs_command() {
        let output = CommandExec::new()
            .run_cmd("echo", &args(&["-n", "foo"]))
            .unwrap();

        assert_eq!(output, "foo");
    }

    #[test]
    fn errors_when_program_is_missing() {
        let result = CommandExec::new().run_cmd("gilt-no-such-program", &args(&["foo"]));

        assert!(matches!(result, Err(ExecError::Spawn { .. })));
    }

    #[test]
    fn errors_on_non_zero_exit() {
        let result = CommandExec::new().run_cmd("sh", &args(&["-c", "echo oops >&2; exit 3"]));

        match result {
            Err(ExecError::Failed { status, output, .. }) => {
                assert_eq!(status, Some(3));
                assert_eq!(output.trim(), "oops");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn runs_command_in_dir() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();

        let output = CommandExec::new()
            .run_cmd_in_dir("ls", &[], temp.path())
            .unwrap();

        assert!(output.contains("marker.txt"));
    }

    #[test]
    fn temp_dir_is_removed_after_use() {
        let temp = tempdir().unwrap();
        let mut seen = None;

        let result: Result<(), io::Error> = with_temp_dir(temp.path(), "gilt", |dir| {
            assert!(dir.is_dir());
            assert!(dir.starts_with(temp.path()));
            seen = Some(dir.to_path_buf());
            Ok(())
        });

        assert!(result.is_ok());
        assert!(!seen.unwrap().exists());
    }

    #[test]
    fn temp_dir_is_removed_on_error() {
        let temp = tempdir().unwrap();
        let mut seen = None;

        let result: Result<(), io::Error> = with_temp_dir(temp.path(), "gilt", |dir| {
            seen = Some(dir.to_path_buf());
            Err(io::Error::other("tests error"))
        });

        assert!(result.is_err());
        assert!(!seen.unwrap().exists());
    }

    #[test]
    fn temp_dir_errors_when_parent_is_missing() {
        let temp = tempdir().unwrap();

        let result: Result<(), io::Error> =
            with_temp_dir(&temp.path().join("missing"), "gilt", |_| Ok(()));

        assert!(result.is_err());
    }
}
