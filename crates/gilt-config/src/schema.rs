//! Giltfile types and loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

/// Default name of the config file, relative to the working directory.
pub const DEFAULT_GILT_FILE: &str = "Giltfile.yaml";

/// Default clone directory.
pub const DEFAULT_GILT_DIR: &str = "~/.gilt/clone";

/// A complete overlay run: global options plus the repositories to overlay.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Repositories {
    /// Log the commands being executed
    #[serde(default)]
    pub debug: bool,

    /// Fetch clones concurrently
    #[serde(default)]
    pub parallel: bool,

    /// Skip post-overlay commands
    #[serde(default)]
    pub skip_commands: bool,

    /// Path to the Giltfile this configuration came from
    #[serde(default = "default_gilt_file")]
    pub gilt_file: PathBuf,

    /// Clone cache location (may start with `~`)
    #[serde(default = "default_gilt_dir")]
    pub gilt_dir: PathBuf,

    /// Repositories to overlay, in order
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

fn default_gilt_file() -> PathBuf {
    PathBuf::from(DEFAULT_GILT_FILE)
}

fn default_gilt_dir() -> PathBuf {
    PathBuf::from(DEFAULT_GILT_DIR)
}

impl Repositories {
    /// Giltfile template written by `gilt init`.
    pub fn default_giltfile() -> &'static str {
        DEFAULT_GILTFILE
    }
}

impl Default for Repositories {
    fn default() -> Self {
        Self {
            debug: false,
            parallel: false,
            skip_commands: false,
            gilt_file: default_gilt_file(),
            gilt_dir: default_gilt_dir(),
            repositories: Vec::new(),
        }
    }
}

/// A git repository pinned to a version.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// URL of the repository to clone
    #[serde(default)]
    pub git: String,

    /// Commit SHA or tag to check out
    #[serde(default)]
    pub version: String,

    /// Check the whole tree out here
    #[serde(default, deserialize_with = "empty_as_none")]
    pub dst_dir: Option<PathBuf>,

    /// Copy selected files or directories instead of the whole tree
    #[serde(default)]
    pub sources: Vec<Source>,

    /// Commands run after the repository is overlaid
    #[serde(default)]
    pub commands: Vec<Command>,
}

/// A file or directory (or glob of them) copied out of a checkout.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Path or glob relative to the checkout root
    #[serde(default)]
    pub src: String,

    /// Copy a single file to this path
    #[serde(default, deserialize_with = "empty_as_none")]
    pub dst_file: Option<PathBuf>,

    /// Copy into this directory
    #[serde(default, deserialize_with = "empty_as_none")]
    pub dst_dir: Option<PathBuf>,
}

/// A post-overlay command.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Command {
    #[serde(default)]
    pub cmd: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Empty strings in the Giltfile mean "unset".
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()).map(PathBuf::from))
}

/// Load a Giltfile.
///
/// The returned configuration remembers `path` as its `gilt_file`.
pub fn load(path: &Path) -> Result<Repositories, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let mut config = parse(&content)?;
    config.gilt_file = path.to_path_buf();

    Ok(config)
}

/// Parse Giltfile content. An empty document yields the defaults.
pub fn parse(content: &str) -> Result<Repositories, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Repositories::default());
    }

    Ok(serde_yaml::from_str(content)?)
}

/// Template written by `gilt init`.
pub const DEFAULT_GILTFILE: &str = r#"giltDir: ~/.gilt/clone
repositories:
  - git: ""
    version: ""
    dstDir: ""
"#;

/// Errors that can occur when loading a Giltfile.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Giltfile not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read Giltfile: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse Giltfile: {0}")]
    Parse(#[from] serde_yaml::Error),
}
