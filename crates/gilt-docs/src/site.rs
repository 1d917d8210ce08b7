//! Site manifest: the configuration record of the documentation site.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur loading or checking the documentation site.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid site manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid front matter in {}: {message}", .path.display())]
    FrontMatter { path: PathBuf, message: String },

    #[error("Failed to walk docs directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Default locale {0} is not one of the configured locales")]
    DefaultLocaleMissing(String),

    #[error("Found {0} broken link(s)")]
    BrokenLinks(usize),
}

/// What to do when a broken link is found.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BrokenLinkPolicy {
    /// Fail the check
    #[default]
    Throw,
    /// Log at warn level
    Warn,
    /// Log at info level
    Log,
    /// Say nothing
    Ignore,
}

/// Top-level site configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub title: String,

    #[serde(default)]
    pub tagline: String,

    #[serde(default)]
    pub favicon: Option<String>,

    /// Production URL of the site
    pub url: String,

    /// Path the site is served under
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub trailing_slash: Option<bool>,

    #[serde(default)]
    pub organization_name: Option<String>,

    #[serde(default)]
    pub project_name: Option<String>,

    #[serde(default)]
    pub on_broken_links: BrokenLinkPolicy,

    #[serde(default = "default_markdown_link_policy")]
    pub on_broken_markdown_links: BrokenLinkPolicy,

    #[serde(default)]
    pub i18n: I18n,

    #[serde(default)]
    pub docs: DocsPreset,

    #[serde(default)]
    pub theme_config: ThemeConfig,
}

fn default_base_url() -> String {
    "/".to_string()
}

fn default_markdown_link_policy() -> BrokenLinkPolicy {
    BrokenLinkPolicy::Warn
}

impl SiteConfig {
    /// Load a site manifest from a YAML file.
    pub fn load(path: &Path) -> Result<Self, SiteError> {
        let content = fs::read_to_string(path).map_err(|source| SiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_yaml::from_str(&content)?)
    }

    /// Directory holding the markdown pages, resolved against the
    /// directory of the manifest at `manifest_path`.
    pub fn docs_dir(&self, manifest_path: &Path) -> PathBuf {
        let root = manifest_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        match &self.docs.path {
            Some(path) => root.join(path),
            None => root.to_path_buf(),
        }
    }

    pub fn is_default_locale_listed(&self) -> bool {
        self.i18n
            .locales
            .iter()
            .any(|locale| *locale == self.i18n.default_locale)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct I18n {
    #[serde(default = "default_locale")]
    pub default_locale: String,

    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_locales() -> Vec<String> {
    vec![default_locale()]
}

impl Default for I18n {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            locales: default_locales(),
        }
    }
}

/// Options of the docs plugin.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocsPreset {
    /// Docs directory relative to the manifest
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_route_base_path")]
    pub route_base_path: String,

    #[serde(default)]
    pub sidebar_path: Option<PathBuf>,

    /// Version segment of every permalink
    #[serde(default)]
    pub version: Option<String>,
}

fn default_route_base_path() -> String {
    "/".to_string()
}

impl Default for DocsPreset {
    fn default() -> Self {
        Self {
            path: None,
            route_base_path: default_route_base_path(),
            sidebar_path: None,
            version: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    #[serde(default)]
    pub navbar: Navbar,

    #[serde(default)]
    pub footer: Option<Footer>,

    #[serde(default)]
    pub prism: Option<Prism>,

    #[serde(default)]
    pub color_mode: Option<ColorMode>,

    #[serde(default)]
    pub announcement_bar: Option<AnnouncementBar>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Navbar {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub logo: Option<Logo>,

    #[serde(default)]
    pub items: Vec<NavbarItem>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Logo {
    pub alt: String,
    pub src: String,
}

/// Side of the navbar an item sits on.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Left,
    Right,
}

/// An entry in the navbar.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(try_from = "RawNavbarItem")]
pub enum NavbarItem {
    /// Link to a documentation page by id
    Doc {
        doc_id: String,
        position: Position,
        label: Option<String>,
    },
    DocsVersionDropdown { position: Position },
    /// External link
    Link {
        href: String,
        position: Position,
        label: Option<String>,
        class_name: Option<String>,
        aria_label: Option<String>,
    },
}

impl NavbarItem {
    pub fn doc_id(&self) -> Option<&str> {
        match self {
            Self::Doc { doc_id, .. } => Some(doc_id.as_str()),
            _ => None,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Self::Doc { position, .. }
            | Self::DocsVersionDropdown { position }
            | Self::Link { position, .. } => *position,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Doc { label, .. } | Self::Link { label, .. } => label.as_deref(),
            Self::DocsVersionDropdown { .. } => None,
        }
    }
}

/// Navbar item as written in the manifest. Items without a `type` are
/// external links.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNavbarItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    doc_id: Option<String>,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    class_name: Option<String>,
    #[serde(rename = "aria-label", default)]
    aria_label: Option<String>,
}

impl TryFrom<RawNavbarItem> for NavbarItem {
    type Error = String;

    fn try_from(raw: RawNavbarItem) -> Result<Self, Self::Error> {
        match raw.kind.as_deref().unwrap_or("default") {
            "doc" => Ok(Self::Doc {
                doc_id: raw.doc_id.ok_or("doc navbar item needs a docId")?,
                position: raw.position,
                label: raw.label,
            }),
            "docsVersionDropdown" => Ok(Self::DocsVersionDropdown {
                position: raw.position,
            }),
            "default" => Ok(Self::Link {
                href: raw.href.ok_or("navbar link needs an href")?,
                position: raw.position,
                label: raw.label,
                class_name: raw.class_name,
                aria_label: raw.aria_label,
            }),
            other => Err(format!("unknown navbar item type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Footer {
    #[serde(default)]
    pub style: String,

    #[serde(default)]
    pub links: Vec<FooterLinkGroup>,

    #[serde(default)]
    pub copyright: Option<String>,
}

/// A titled column of footer links.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FooterLinkGroup {
    pub title: String,

    #[serde(default)]
    pub items: Vec<FooterLink>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FooterLink {
    pub label: String,
    pub href: String,
}

/// Code highlighting themes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prism {
    #[serde(default)]
    pub theme: Option<String>,

    #[serde(default)]
    pub dark_theme: Option<String>,

    #[serde(default)]
    pub additional_languages: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColorMode {
    #[serde(default)]
    pub default_mode: ColorScheme,

    #[serde(default)]
    pub disable_switch: bool,

    #[serde(default)]
    pub respect_prefers_color_scheme: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnnouncementBar {
    pub id: String,
    pub content: String,
}
