//! Clone, pin and overlay git repositories into local directories.
//!
//! Every distinct git URL is cloned once, bare and blob-less, into a cache
//! under the gilt directory. Each configured repository is then checked out
//! at its pinned version, either wholesale into `dstDir` or through a
//! temporary worktree from which selected sources are copied.

pub mod copy;
pub mod exec;
pub mod git;
pub mod lock;
pub mod repositories;
pub mod repository;

#[cfg(test)]
mod testing;

pub use copy::{CopyError, CopyManager, FsCopy};
pub use exec::{with_temp_dir, CommandExec, ExecError, ExecManager};
pub use git::{Git, GitError, GitManager};
pub use lock::OverlayLock;
pub use repositories::{OverlayError, Repositories};
pub use repository::{clone_dir_name, GitRepository, RepositoryError, RepositoryManager, ORIGIN};
