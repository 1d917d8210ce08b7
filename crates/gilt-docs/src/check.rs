//! Integrity checks over the site manifest and its pages.

use std::collections::HashSet;
use std::fmt;

use crate::page::{NavLink, PageMetadata};
use crate::site::{BrokenLinkPolicy, SiteConfig, SiteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Previous => f.write_str("previous"),
            Self::Next => f.write_str("next"),
        }
    }
}

/// A problem found by [`check_site`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A doc navbar item names a page that does not exist
    UnknownDocId { label: String, doc_id: String },
    DefaultLocaleMissing { default_locale: String },
    /// A previous/next pointer that matches no other page
    DanglingNavLink {
        page: String,
        direction: Direction,
        title: String,
        permalink: String,
    },
    /// A relative link to a markdown file that is not a page
    BrokenMarkdownLink { page: String, target: String },
}

impl Issue {
    fn is_markdown_link(&self) -> bool {
        matches!(self, Self::BrokenMarkdownLink { .. })
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDocId { label, doc_id } => {
                write!(f, "navbar item {label:?} links to unknown doc {doc_id:?}")
            }
            Self::DefaultLocaleMissing { default_locale } => {
                write!(f, "default locale {default_locale:?} is not in locales")
            }
            Self::DanglingNavLink {
                page,
                direction,
                title,
                permalink,
            } => write!(
                f,
                "page {page:?} has a {direction} link to {title:?} ({permalink}) that matches no page"
            ),
            Self::BrokenMarkdownLink { page, target } => {
                write!(f, "page {page:?} links to missing markdown file {target:?}")
            }
        }
    }
}

/// Outcome of a site check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteReport {
    pub issues: Vec<Issue>,
}

impl SiteReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Apply the broken-link policies to the report: `links` covers navbar
    /// and neighbour links, `markdown_links` covers links between markdown
    /// files.
    ///
    /// A missing default locale fails under every policy.
    pub fn enforce(
        &self,
        links: BrokenLinkPolicy,
        markdown_links: BrokenLinkPolicy,
    ) -> Result<(), SiteError> {
        for issue in &self.issues {
            if let Issue::DefaultLocaleMissing { default_locale } = issue {
                return Err(SiteError::DefaultLocaleMissing(default_locale.clone()));
            }
        }

        let mut failed = 0;
        for issue in &self.issues {
            let policy = if issue.is_markdown_link() {
                markdown_links
            } else {
                links
            };
            match policy {
                BrokenLinkPolicy::Throw => {
                    tracing::error!("{}", issue);
                    failed += 1;
                }
                BrokenLinkPolicy::Warn => tracing::warn!("{}", issue),
                BrokenLinkPolicy::Log => tracing::info!("{}", issue),
                BrokenLinkPolicy::Ignore => {}
            }
        }

        if failed > 0 {
            return Err(SiteError::BrokenLinks(failed));
        }

        Ok(())
    }
}

/// Check navbar doc references, the locale setup and page neighbour links.
pub fn check_site(site: &SiteConfig, pages: &[PageMetadata]) -> SiteReport {
    let mut issues = Vec::new();
    let ids: HashSet<&str> = pages.iter().map(|p| p.id.as_str()).collect();

    for item in &site.theme_config.navbar.items {
        let Some(doc_id) = item.doc_id() else {
            continue;
        };
        if !ids.contains(doc_id) {
            issues.push(Issue::UnknownDocId {
                label: item.label().unwrap_or(doc_id).to_string(),
                doc_id: doc_id.to_string(),
            });
        }
    }

    if !site.is_default_locale_listed() {
        issues.push(Issue::DefaultLocaleMissing {
            default_locale: site.i18n.default_locale.clone(),
        });
    }

    for page in pages {
        let links = [
            (Direction::Previous, &page.previous),
            (Direction::Next, &page.next),
        ];
        for (direction, link) in links {
            let Some(link) = link else {
                continue;
            };
            if !points_at_other_page(page, link, pages) {
                issues.push(Issue::DanglingNavLink {
                    page: page.id.clone(),
                    direction,
                    title: link.title.clone(),
                    permalink: link.permalink.clone(),
                });
            }
        }
    }

    let sources: HashSet<&str> = pages.iter().map(|p| p.source.as_str()).collect();
    for page in pages {
        for target in &page.markdown_links {
            if !sources.contains(target.as_str()) {
                issues.push(Issue::BrokenMarkdownLink {
                    page: page.id.clone(),
                    target: target.clone(),
                });
            }
        }
    }

    SiteReport { issues }
}

fn points_at_other_page(page: &PageMetadata, link: &NavLink, pages: &[PageMetadata]) -> bool {
    pages.iter().any(|other| {
        other.id != page.id && other.title == link.title && other.permalink == link.permalink
    })
}
