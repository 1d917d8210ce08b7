//! Git operations, run through the `git` command line.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::exec::{ExecError, ExecManager};

/// Git operations needed to maintain the clone cache and extract checkouts.
pub trait GitManager: Send + Sync {
    /// Bare, blob-less clone of `url` into `clone_dir`, naming the remote `origin`.
    fn clone_repo(&self, url: &str, origin: &str, clone_dir: &Path) -> Result<(), GitError>;

    /// Fetch branches and tags from `origin` into the bare clone.
    fn update(&self, origin: &str, clone_dir: &Path) -> Result<(), GitError>;

    /// Whether the clone has a remote named `origin`.
    fn remote_exists(&self, clone_dir: &Path, origin: &str) -> Result<bool, GitError>;

    /// Check the clone out at `version` into `dst_dir`. Missing objects are
    /// fetched into the cache on demand.
    fn worktree(&self, clone_dir: &Path, version: &str, dst_dir: &Path) -> Result<(), GitError>;
}

/// Errors that can occur running git.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("Failed to resolve {path}: {source}")]
    Path {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// [`GitManager`] backed by the `git` binary.
#[derive(Clone)]
pub struct Git {
    exec: Arc<dyn ExecManager>,
}

impl Git {
    /// Create a git manager that runs commands through `exec`.
    pub fn new(exec: Arc<dyn ExecManager>) -> Self {
        Self { exec }
    }

    fn git(&self, args: &[&str]) -> Result<String, GitError> {
        Ok(self.exec.run_cmd("git", &to_args(args))?)
    }

    fn git_in_dir(&self, args: &[&str], dir: &Path) -> Result<String, GitError> {
        Ok(self.exec.run_cmd_in_dir("git", &to_args(args), dir)?)
    }
}

impl GitManager for Git {
    fn clone_repo(&self, url: &str, origin: &str, clone_dir: &Path) -> Result<(), GitError> {
        let remote_name = format!("clone.defaultRemoteName={origin}");
        let dir = clone_dir.to_string_lossy().into_owned();

        self.git(&[
            "-c",
            remote_name.as_str(),
            "clone",
            "--bare",
            "--filter=blob:none",
            url,
            dir.as_str(),
        ])?;

        Ok(())
    }

    fn update(&self, origin: &str, clone_dir: &Path) -> Result<(), GitError> {
        self.git_in_dir(
            &[
                "fetch",
                "--tags",
                "--force",
                origin,
                "+refs/heads/*:refs/heads/*",
            ],
            clone_dir,
        )?;

        Ok(())
    }

    fn remote_exists(&self, clone_dir: &Path, origin: &str) -> Result<bool, GitError> {
        let output = self.git_in_dir(&["remote"], clone_dir)?;

        Ok(output.lines().any(|line| line.trim() == origin))
    }

    fn worktree(&self, clone_dir: &Path, version: &str, dst_dir: &Path) -> Result<(), GitError> {
        let dst = std::path::absolute(dst_dir).map_err(|source| GitError::Path {
            path: dst_dir.display().to_string(),
            source,
        })?;

        tracing::info!(
            "extracting {} at {} to {}",
            clone_dir.display(),
            version,
            dst.display()
        );

        let dst_arg = dst.to_string_lossy().into_owned();
        self.git_in_dir(
            &["worktree", "add", "--force", dst_arg.as_str(), version],
            clone_dir,
        )?;

        // The worktree's .git file points back into the cache; it is not
        // wanted in the overlaid directory.
        let git_file = dst.join(".git");
        if let Err(e) = fs::remove_file(&git_file) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::debug!("failed to remove {}: {}", git_file.display(), e);
            }
        }

        self.git_in_dir(&["worktree", "prune", "--verbose"], clone_dir)?;

        Ok(())
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ExecCall, RecordingExec};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const URL: &str = "https://example.com/user/repo.git";

    fn git_with(exec: &Arc<RecordingExec>) -> Git {
        Git::new(Arc::clone(exec) as Arc<dyn ExecManager>)
    }

    #[test]
    fn clones_bare_without_blobs() {
        let exec = Arc::new(RecordingExec::new());

        git_with(&exec)
            .clone_repo(URL, "gilt", Path::new("/cloneDir"))
            .unwrap();

        assert_eq!(
            exec.calls(),
            vec![ExecCall::new(
                "git",
                &[
                    "-c",
                    "clone.defaultRemoteName=gilt",
                    "clone",
                    "--bare",
                    "--filter=blob:none",
                    URL,
                    "/cloneDir",
                ],
                None,
            )]
        );
    }

    #[test]
    fn clone_returns_error() {
        let exec = Arc::new(RecordingExec::new());
        exec.push_err("tests error");

        let result = git_with(&exec).clone_repo(URL, "gilt", Path::new("/cloneDir"));

        assert!(matches!(result, Err(GitError::Exec(_))));
    }

    #[test]
    fn update_fetches_heads_and_tags() {
        let exec = Arc::new(RecordingExec::new());

        git_with(&exec)
            .update("gilt", Path::new("/cloneDir"))
            .unwrap();

        assert_eq!(
            exec.calls(),
            vec![ExecCall::new(
                "git",
                &["fetch", "--tags", "--force", "gilt", "+refs/heads/*:refs/heads/*"],
                Some(Path::new("/cloneDir")),
            )]
        );
    }

    #[test]
    fn remote_exists_matches_whole_lines() {
        let exec = Arc::new(RecordingExec::new());
        exec.push_ok("upstream\ngilt\n");
        exec.push_ok("giltish\n");

        let git = git_with(&exec);

        assert!(git.remote_exists(Path::new("/cloneDir"), "gilt").unwrap());
        assert!(!git.remote_exists(Path::new("/cloneDir"), "gilt").unwrap());
    }

    #[test]
    fn worktree_adds_then_prunes() {
        let temp = tempdir().unwrap();
        let dst = temp.path().join("dstDir");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join(".git"), "gitdir: /cloneDir/worktrees/dstDir").unwrap();

        let exec = Arc::new(RecordingExec::new());
        let clone_dir = Path::new("/cloneDir");

        git_with(&exec).worktree(clone_dir, "abc123", &dst).unwrap();

        assert_eq!(
            exec.calls(),
            vec![
                ExecCall::new(
                    "git",
                    &["worktree", "add", "--force", dst.to_str().unwrap(), "abc123"],
                    Some(clone_dir),
                ),
                ExecCall::new("git", &["worktree", "prune", "--verbose"], Some(clone_dir)),
            ]
        );
        assert!(!dst.join(".git").exists());
    }

    #[test]
    fn worktree_tolerates_unremovable_git_entry() {
        let temp = tempdir().unwrap();
        let dst = temp.path().join("dstDir");
        fs::create_dir_all(dst.join(".git")).unwrap();

        let exec = Arc::new(RecordingExec::new());

        git_with(&exec)
            .worktree(Path::new("/cloneDir"), "abc123", &dst)
            .unwrap();

        assert_eq!(exec.calls().len(), 2);
        assert!(dst.join(".git").is_dir());
    }

    #[test]
    fn worktree_error_skips_prune() {
        let exec = Arc::new(RecordingExec::new());
        exec.push_err("tests error");

        let result = git_with(&exec).worktree(Path::new("/cloneDir"), "abc123", Path::new("/dstDir"));

        assert!(result.is_err());
        assert_eq!(exec.calls().len(), 1);
    }
}
