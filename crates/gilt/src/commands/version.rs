//! Print build information.

use anyhow::Result;
use serde::Serialize;

const WEBSITE: &str = "https://github.com/retr0h/gilt";

/// Build metadata. The git and build fields are stamped in by the release
/// pipeline through compile-time environment variables.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub website: &'static str,
    pub git_version: &'static str,
    pub git_commit: &'static str,
    pub git_tree_state: &'static str,
    pub build_date: &'static str,
    pub built_by: &'static str,
    pub rust_version: &'static str,
    pub platform: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            website: WEBSITE,
            git_version: option_env!("GILT_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
            git_commit: option_env!("GILT_COMMIT").unwrap_or("unknown"),
            git_tree_state: option_env!("GILT_TREE_STATE").unwrap_or("unknown"),
            build_date: option_env!("GILT_BUILD_DATE").unwrap_or("unknown"),
            built_by: option_env!("GILT_BUILT_BY").unwrap_or("unknown"),
            rust_version: option_env!("GILT_RUSTC_VERSION").unwrap_or(env!("CARGO_PKG_RUST_VERSION")),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

/// Run the version command.
pub fn run() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&BuildInfo::current())?);
    Ok(())
}
