//! A single repository: its clone cache entry, worktree and copied sources.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gilt_config::Repository;

use crate::copy::{CopyError, CopyManager};
use crate::git::{GitError, GitManager};

/// Remote name used in every cached clone.
pub const ORIGIN: &str = "gilt";

/// Directory name of a repository's clone under the cache dir.
///
/// `https://example.com/user/repo.git` becomes
/// `https---example.com-user-repo.git`.
pub fn clone_dir_name(git: &str) -> String {
    git.replace(['/', ':'], "-")
}

/// Operations on one configured repository.
pub trait RepositoryManager: Send + Sync {
    /// Clone the repository into `cache_dir`, or update the existing clone.
    /// Returns the clone directory.
    fn clone_or_update(&self, repo: &Repository, cache_dir: &Path) -> Result<PathBuf, RepositoryError>;

    /// Check the repository out at its version into `dst_dir`.
    fn worktree(&self, repo: &Repository, clone_dir: &Path, dst_dir: &Path) -> Result<(), RepositoryError>;

    /// Copy the repository's sources out of the checkout at `checkout_dir`.
    fn copy_sources(&self, repo: &Repository, checkout_dir: &Path) -> Result<(), RepositoryError>;
}

/// Errors that can occur overlaying a repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Copy(#[from] CopyError),

    #[error("Invalid source pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to read glob match: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Failed to prepare {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8(PathBuf),

    #[error("Source {} is a directory and needs dstDir", .0.display())]
    DirectoryNeedsDstDir(PathBuf),
}

/// [`RepositoryManager`] that drives git and the filesystem.
#[derive(Clone)]
pub struct GitRepository {
    copy: Arc<dyn CopyManager>,
    git: Arc<dyn GitManager>,
}

impl GitRepository {
    pub fn new(copy: Arc<dyn CopyManager>, git: Arc<dyn GitManager>) -> Self {
        Self { copy, git }
    }

    /// Whether `clone_dir` holds a usable clone with the gilt remote.
    fn has_origin(&self, clone_dir: &Path) -> bool {
        match self.git.remote_exists(clone_dir, ORIGIN) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!("unable to list remotes in {}: {}", clone_dir.display(), e);
                false
            }
        }
    }
}

impl RepositoryManager for GitRepository {
    fn clone_or_update(&self, repo: &Repository, cache_dir: &Path) -> Result<PathBuf, RepositoryError> {
        let target = cache_dir.join(clone_dir_name(&repo.git));

        if target.exists() {
            if self.has_origin(&target) {
                tracing::info!("clone already exists: {}", target.display());
                self.git.update(ORIGIN, &target)?;
                return Ok(target);
            }

            tracing::info!(
                "remote {} does not exist in clone, invalidating cache: {}",
                ORIGIN,
                target.display()
            );
            remove_dir_all(&target)?;
        }

        tracing::info!("cloning {} to {}", repo.git, target.display());
        self.git.clone_repo(&repo.git, ORIGIN, &target)?;

        Ok(target)
    }

    fn worktree(&self, repo: &Repository, clone_dir: &Path, dst_dir: &Path) -> Result<(), RepositoryError> {
        self.git.worktree(clone_dir, &repo.version, dst_dir)?;
        Ok(())
    }

    fn copy_sources(&self, repo: &Repository, checkout_dir: &Path) -> Result<(), RepositoryError> {
        tracing::debug!("copy from {}", checkout_dir.display());

        for source in &repo.sources {
            let joined = checkout_dir.join(&source.src);
            let pattern = joined
                .to_str()
                .ok_or_else(|| RepositoryError::NonUtf8(joined.clone()))?;

            let paths = glob::glob(pattern).map_err(|source| RepositoryError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;

            let mut matched = false;
            for path in paths {
                let src = path?;
                matched = true;

                if src.is_dir() {
                    let Some(dst_dir) = &source.dst_dir else {
                        return Err(RepositoryError::DirectoryNeedsDstDir(src));
                    };
                    if dst_dir.is_dir() {
                        remove_dir_all(dst_dir)?;
                    }
                    self.copy.copy_dir(&src, dst_dir)?;
                } else if let Some(dst_file) = &source.dst_file {
                    self.copy.copy_file(&src, dst_file)?;
                } else if let Some(dst_dir) = &source.dst_dir {
                    fs::create_dir_all(dst_dir).map_err(|e| RepositoryError::Io {
                        path: dst_dir.clone(),
                        source: e,
                    })?;
                    let name = src.file_name().unwrap_or_default();
                    self.copy.copy_file(&src, &dst_dir.join(name))?;
                }
            }

            if !matched {
                tracing::warn!("source {} matched nothing in {}", source.src, repo.git);
            }
        }

        Ok(())
    }
}

fn remove_dir_all(path: &Path) -> Result<(), RepositoryError> {
    fs::remove_dir_all(path).map_err(|source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}
