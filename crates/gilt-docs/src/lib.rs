//! Documentation site model for gilt.
//!
//! Loads the site manifest, compiles page metadata from the markdown pages
//! and checks the two against each other: navbar doc links must resolve and
//! every previous/next pointer must land on a known page.

pub mod check;
pub mod merge;
pub mod page;
pub mod site;

pub use check::{check_site, Direction, Issue, SiteReport};
pub use merge::{merge_components, ComponentMap, Overrides};
pub use page::{discover_pages, link_pages, NavLink, PageMetadata, PermalinkBase, TocEntry};
pub use site::{
    BrokenLinkPolicy, ColorMode, ColorScheme, DocsPreset, FooterLink, FooterLinkGroup, I18n,
    NavbarItem, Position, SiteConfig, SiteError, ThemeConfig,
};
