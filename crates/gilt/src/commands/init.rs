//! Write a starter Giltfile.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use gilt_config::Repositories;

/// Run the init command.
pub fn run(gilt_file: &Path) -> Result<()> {
    if gilt_file.exists() {
        bail!("file already exists: {}", gilt_file.display());
    }

    fs::write(gilt_file, Repositories::default_giltfile())
        .with_context(|| format!("Failed to write {}", gilt_file.display()))?;

    println!("wrote {}", gilt_file.display());

    Ok(())
}
