//! File and directory copies out of a checkout.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Copies files and directory trees.
pub trait CopyManager: Send + Sync {
    /// Copy `src` to `dst`, replacing any existing file and keeping the
    /// source permissions.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), CopyError>;

    /// Recursively copy the directory `src` to `dst`, which must not exist.
    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<(), CopyError>;
}

/// Errors that can occur when copying.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("Source is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Failed to copy {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// [`CopyManager`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopy;

impl FsCopy {
    /// Create a new filesystem copier.
    pub fn new() -> Self {
        Self
    }
}

impl CopyManager for FsCopy {
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), CopyError> {
        tracing::info!("copying file {} to {}", file_name(src), dst.display());

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CopyError::Io { path, source }
        };

        let mut input = File::open(src).map_err(io_err(src))?;
        let permissions = input.metadata().map_err(io_err(src))?.permissions();

        let mut output = File::create(dst).map_err(io_err(dst))?;
        restrict_to_owner(dst).map_err(io_err(dst))?;

        io::copy(&mut input, &mut output).map_err(io_err(dst))?;
        output.sync_all().map_err(io_err(dst))?;

        fs::set_permissions(dst, permissions).map_err(io_err(dst))?;

        Ok(())
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<(), CopyError> {
        tracing::info!("copying dir {} to {}", file_name(src), dst.display());

        let metadata = fs::metadata(src).map_err(|source| CopyError::Io {
            path: src.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(CopyError::NotADirectory(src.to_path_buf()));
        }

        match fs::symlink_metadata(dst) {
            Ok(_) => return Err(CopyError::DestinationExists(dst.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CopyError::Io {
                    path: dst.to_path_buf(),
                    source,
                })
            }
        }

        // follow_links dereferences symlinks so their targets are copied.
        for entry in WalkDir::new(src).follow_links(true) {
            let entry = entry?;
            let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
            let target = dst.join(relative);

            if entry.file_type().is_dir() {
                create_dir_like(entry.path(), &target)?;
            } else {
                self.copy_file(entry.path(), &target)?;
            }
        }

        Ok(())
    }
}

/// Create `dst` with the permissions of the directory `src`.
fn create_dir_like(src: &Path, dst: &Path) -> Result<(), CopyError> {
    let io_err = |source| CopyError::Io {
        path: dst.to_path_buf(),
        source,
    };

    fs::create_dir_all(dst).map_err(io_err)?;
    let permissions = fs::metadata(src).map_err(io_err)?.permissions();
    fs::set_permissions(dst, permissions).map_err(io_err)?;

    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
