//! Home directory expansion for configured paths.

use std::path::{Path, PathBuf};

/// Errors that can occur when expanding a path.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Cannot expand {}: home directory not found", .0.display())]
    HomeNotFound(PathBuf),

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8(PathBuf),
}

/// Expand a leading `~` to the current user's home directory.
pub fn expand_user(path: &Path) -> Result<PathBuf, PathError> {
    expand_user_with(path, std::env::home_dir)
}

/// Expand a leading `~` using `home` to look up the home directory.
///
/// Only `~` and `~/...` are expanded. Other paths, `~user` forms included,
/// are returned unchanged and `home` is never called.
pub fn expand_user_with<F>(path: &Path, home: F) -> Result<PathBuf, PathError>
where
    F: FnOnce() -> Option<PathBuf>,
{
    let Some(raw) = path.to_str() else {
        return Err(PathError::NonUtf8(path.to_path_buf()));
    };

    if raw != "~" && !raw.starts_with("~/") {
        return Ok(path.to_path_buf());
    }

    let home = home()
        .and_then(|h| h.to_str().map(str::to_string))
        .ok_or_else(|| PathError::HomeNotFound(path.to_path_buf()))?;

    let expanded = shellexpand::tilde_with_context(raw, || Some(home));
    Ok(PathBuf::from(expanded.as_ref()))
}
