//! Overlay the repositories of a Giltfile.

use anyhow::{Context, Result};
use gilt_config::Repositories;
use gilt_overlay::Repositories as Overlay;

use crate::GlobalArgs;

/// Run the overlay command.
pub fn run(global: &GlobalArgs, parallel: bool, skip_commands: bool) -> Result<()> {
    let config = gilt_config::load(&global.gilt_file)
        .with_context(|| format!("Failed to load {}", global.gilt_file.display()))?;
    let config = apply_flags(config, global, parallel, skip_commands);

    gilt_config::validate(&config).context("Invalid Giltfile")?;

    Overlay::from_config(config).overlay()?;

    Ok(())
}

/// Flags given on the command line override the Giltfile.
fn apply_flags(
    mut config: Repositories,
    global: &GlobalArgs,
    parallel: bool,
    skip_commands: bool,
) -> Repositories {
    config.debug |= global.debug;
    config.parallel |= parallel;
    config.skip_commands |= skip_commands;
    if let Some(dir) = &global.gilt_dir {
        config.gilt_dir = dir.clone();
    }
    config
}
