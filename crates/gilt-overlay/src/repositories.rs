//! Overlay of every repository in a Giltfile.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gilt_config::{expand_user_with, PathError, Repository};
use rayon::prelude::*;

use crate::copy::FsCopy;
use crate::exec::{with_temp_dir, CommandExec, ExecError, ExecManager};
use crate::git::Git;
use crate::lock::OverlayLock;
use crate::repository::{GitRepository, RepositoryError, RepositoryManager};

const LOCK_FILE: &str = "gilt.lock";
const CACHE_DIR: &str = "cache";

type HomeDir = Box<dyn Fn() -> Option<PathBuf> + Send + Sync>;

/// Errors that can occur during an overlay.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("{}: {source}", .path.display())]
    Fs {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create temporary directory: {0}")]
    TempDir(#[from] io::Error),

    #[error("could not acquire lock on {}", .0.display())]
    LockHeld(PathBuf),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Runs an overlay for a loaded Giltfile.
pub struct Repositories {
    config: gilt_config::Repositories,
    repo_manager: Arc<dyn RepositoryManager>,
    exec: Arc<dyn ExecManager>,
    home_dir: HomeDir,
}

impl Repositories {
    pub fn new(
        config: gilt_config::Repositories,
        repo_manager: Arc<dyn RepositoryManager>,
        exec: Arc<dyn ExecManager>,
    ) -> Self {
        Self {
            config,
            repo_manager,
            exec,
            home_dir: Box::new(std::env::home_dir),
        }
    }

    /// Wire up the production git, copy and exec managers.
    pub fn from_config(config: gilt_config::Repositories) -> Self {
        let exec: Arc<dyn ExecManager> = Arc::new(CommandExec::new());
        let git = Arc::new(Git::new(Arc::clone(&exec)));
        let repo_manager = Arc::new(GitRepository::new(Arc::new(FsCopy::new()), git));

        Self::new(config, repo_manager, exec)
    }

    /// Replace the home directory lookup used to expand `~` in `giltDir`.
    pub fn with_home_dir<F>(mut self, home_dir: F) -> Self
    where
        F: Fn() -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.home_dir = Box::new(home_dir);
        self
    }

    pub fn config(&self) -> &gilt_config::Repositories {
        &self.config
    }

    /// Expanded `giltDir`, created if absent.
    pub fn gilt_dir(&self) -> Result<PathBuf, OverlayError> {
        let dir = expand_user_with(&self.config.gilt_dir, || (self.home_dir)())?;
        create_dir_all(&dir)?;
        Ok(dir)
    }

    /// `giltDir/cache`, created if absent.
    pub fn cache_dir(&self, gilt_dir: &Path) -> Result<PathBuf, OverlayError> {
        let dir = gilt_dir.join(CACHE_DIR);
        create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Clone or update every distinct repository URL once, returning the
    /// clone directory for each URL.
    pub fn populate_clone_cache(
        &self,
        cache_dir: &Path,
    ) -> Result<HashMap<String, PathBuf>, OverlayError> {
        let mut seen = HashSet::new();
        let unique: Vec<&Repository> = self
            .config
            .repositories
            .iter()
            .filter(|repo| seen.insert(repo.git.as_str()))
            .collect();

        let fetch = |repo: &&Repository| -> Result<(String, PathBuf), OverlayError> {
            let clone_dir = self.repo_manager.clone_or_update(repo, cache_dir)?;
            Ok((repo.git.clone(), clone_dir))
        };

        if self.config.parallel {
            unique.par_iter().map(fetch).collect()
        } else {
            unique.iter().map(fetch).collect()
        }
    }

    /// Check `repo` out into a temporary directory under `gilt_dir` and copy
    /// its sources from there.
    pub fn overlay_subtrees(
        &self,
        gilt_dir: &Path,
        repo: &Repository,
        clone_dir: &Path,
    ) -> Result<(), OverlayError> {
        with_temp_dir(gilt_dir, "gilt", |checkout| -> Result<(), OverlayError> {
            self.repo_manager.worktree(repo, clone_dir, checkout)?;
            self.repo_manager.copy_sources(repo, checkout)?;
            Ok(())
        })
    }

    /// Run the post-overlay commands of `repo` in the working directory.
    pub fn run_commands(&self, repo: &Repository) -> Result<(), OverlayError> {
        for command in &repo.commands {
            tracing::info!("executing command: {} {}", command.cmd, command.args.join(" "));
            self.exec.run_cmd(&command.cmd, &command.args)?;
        }
        Ok(())
    }

    /// Overlay every configured repository, in order.
    pub fn overlay(&self) -> Result<(), OverlayError> {
        let result = self.run_overlay();
        if let Err(e) = &result {
            tracing::error!("error overlaying repositories: {}", e);
        }
        result
    }

    fn run_overlay(&self) -> Result<(), OverlayError> {
        let gilt_dir = self.gilt_dir()?;

        let lock_path = gilt_dir.join(LOCK_FILE);
        tracing::info!("acquiring lock {}", lock_path.display());
        let _lock = OverlayLock::try_acquire(&lock_path)
            .map_err(|source| OverlayError::Fs {
                path: lock_path.clone(),
                source,
            })?
            .ok_or_else(|| OverlayError::LockHeld(lock_path.clone()))?;

        tracing::debug!("current configuration: {:?}", self.config);

        let cache_dir = self.cache_dir(&gilt_dir)?;
        let clones = self.populate_clone_cache(&cache_dir)?;

        for repo in &self.config.repositories {
            let clone_dir = match clones.get(&repo.git) {
                Some(dir) => dir.clone(),
                None => self.repo_manager.clone_or_update(repo, &cache_dir)?,
            };

            if let Some(dst_dir) = &repo.dst_dir {
                // Stale files from a previous version must not survive.
                if dst_dir.is_dir() {
                    fs::remove_dir_all(dst_dir).map_err(|source| OverlayError::Fs {
                        path: dst_dir.clone(),
                        source,
                    })?;
                }
                self.repo_manager.worktree(repo, &clone_dir, dst_dir)?;
            } else {
                self.overlay_subtrees(&gilt_dir, repo, &clone_dir)?;
            }

            if self.config.skip_commands {
                tracing::debug!("skipping commands for {}", repo.git);
                continue;
            }
            self.run_commands(repo)?;
        }

        Ok(())
    }
}

fn create_dir_all(dir: &Path) -> Result<(), OverlayError> {
    fs::create_dir_all(dir).map_err(|source| OverlayError::Fs {
        path: dir.to_path_buf(),
        source,
    })
}
