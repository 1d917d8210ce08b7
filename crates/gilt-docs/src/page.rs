//! Page metadata compiled from markdown sources.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path};

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::site::{SiteConfig, SiteError};

/// Link to a neighbouring page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub title: String,
    pub permalink: String,
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading text
    pub value: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (2 or 3)
    pub level: u8,
}

/// Everything the site knows about one page once it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Source file, relative to the docs directory
    pub source: String,
    pub slug: String,
    pub permalink: String,
    pub version: Option<String>,
    pub sidebar_position: Option<i32>,
    pub previous: Option<NavLink>,
    pub next: Option<NavLink>,
    pub toc: Vec<TocEntry>,
    /// Relative links to other markdown files, resolved against the docs
    /// directory (`guides/setup.md`)
    pub markdown_links: Vec<String>,
}

/// The URL prefix shared by every page permalink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermalinkBase {
    pub base_url: String,
    pub route_base_path: String,
    pub version: Option<String>,
}

impl PermalinkBase {
    pub fn from_site(site: &SiteConfig) -> Self {
        Self {
            base_url: site.base_url.clone(),
            route_base_path: site.docs.route_base_path.clone(),
            version: site.docs.version.clone(),
        }
    }

    /// Permalink of the page at `slug`.
    pub fn permalink(&self, slug: &str) -> String {
        let joined = [
            self.base_url.as_str(),
            self.route_base_path.as_str(),
            self.version.as_deref().unwrap_or_default(),
            slug,
        ]
        .join("/");

        collapse_slashes(&joined)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    sidebar_position: Option<i32>,
}

impl PageMetadata {
    /// Build the metadata of the page at `source_path` (relative to the docs
    /// directory) from its markdown `content`.
    pub fn from_markdown(
        source_path: &Path,
        content: &str,
        base: &PermalinkBase,
    ) -> Result<Self, SiteError> {
        let (front_matter, body) =
            split_front_matter(content).map_err(|message| SiteError::FrontMatter {
                path: source_path.to_path_buf(),
                message,
            })?;

        let id = front_matter.id.unwrap_or_else(|| path_id(source_path));
        let (heading, toc) = scan_headings(body);
        let markdown_links = scan_markdown_links(source_path, body);
        let description = front_matter
            .description
            .unwrap_or_else(|| first_block_line(body, heading.is_some()));
        let title = front_matter
            .title
            .or(heading)
            .unwrap_or_else(|| id.clone());

        let slug = match front_matter.slug {
            Some(slug) if slug.starts_with('/') => slug,
            Some(slug) => format!("/{slug}"),
            None => format!("/{id}"),
        };
        let permalink = base.permalink(&slug);

        Ok(Self {
            id,
            title,
            description,
            source: path_id(source_path) + &extension(source_path),
            slug,
            permalink,
            version: base.version.clone(),
            sidebar_position: front_matter.sidebar_position,
            previous: None,
            next: None,
            toc,
            markdown_links,
        })
    }

    fn nav_link(&self) -> NavLink {
        NavLink {
            title: self.title.clone(),
            permalink: self.permalink.clone(),
        }
    }
}

/// Sort pages into sidebar order and point each at its neighbours.
///
/// Pages without a sidebar position come last; ties are broken by id.
pub fn link_pages(pages: &mut [PageMetadata]) {
    pages.sort_by(|a, b| {
        (a.sidebar_position.is_none(), a.sidebar_position, &a.id).cmp(&(
            b.sidebar_position.is_none(),
            b.sidebar_position,
            &b.id,
        ))
    });

    let links: Vec<NavLink> = pages.iter().map(PageMetadata::nav_link).collect();
    for (i, page) in pages.iter_mut().enumerate() {
        page.previous = i.checked_sub(1).map(|j| links[j].clone());
        page.next = links.get(i + 1).cloned();
    }
}

/// Read every markdown page under `docs_dir` and link them in sidebar order.
///
/// Files whose name starts with `_` are partials and are skipped.
pub fn discover_pages(docs_dir: &Path, base: &PermalinkBase) -> Result<Vec<PageMetadata>, SiteError> {
    let mut pages = Vec::new();

    for entry in WalkDir::new(docs_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type().is_file() || !is_markdown(path) {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('_') {
            continue;
        }

        let content = fs::read_to_string(path).map_err(|source| SiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let relative = path.strip_prefix(docs_dir).unwrap_or(path);
        pages.push(PageMetadata::from_markdown(relative, &content, base)?);
    }

    link_pages(&mut pages);
    tracing::debug!("discovered {} pages in {}", pages.len(), docs_dir.display());

    Ok(pages)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "md" || ext == "mdx")
}

/// Split off a YAML front matter block delimited by `---` lines.
fn split_front_matter(source: &str) -> Result<(FrontMatter, &str), String> {
    let trimmed = source.trim_start();

    let Some(after_open) = trimmed.strip_prefix("---") else {
        return Ok((FrontMatter::default(), source));
    };

    let Some(close_pos) = after_open.find("\n---") else {
        return Err("unclosed front matter block, missing closing ---".to_string());
    };

    let yaml = after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    if yaml.is_empty() {
        return Ok((FrontMatter::default(), remaining.trim_start()));
    }

    let front_matter = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    Ok((front_matter, remaining.trim_start()))
}

/// Text of the first level-1 heading, and the level 2-3 headings as a
/// table of contents.
fn scan_headings(body: &str) -> (Option<String>, Vec<TocEntry>) {
    let mut title = None;
    let mut toc = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<(HeadingLevel, String)> = None;

    for event in Parser::new(body) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((level, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut value)) = current {
                    value.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some((level, value)) = current.take() else {
                    continue;
                };
                match level {
                    HeadingLevel::H1 => {
                        title.get_or_insert(value);
                    }
                    HeadingLevel::H2 | HeadingLevel::H3 => {
                        let id = unique_id(&mut seen, slugify(&value));
                        toc.push(TocEntry {
                            value,
                            id,
                            level: level as u8,
                        });
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    (title, toc)
}

/// Targets of relative links to `.md`/`.mdx` files, resolved against the
/// directory of `source_path`. Anchors are dropped.
fn scan_markdown_links(source_path: &Path, body: &str) -> Vec<String> {
    let dir = source_path.parent().unwrap_or(Path::new(""));
    let mut links = Vec::new();

    for event in Parser::new(body) {
        let Event::Start(Tag::Link { dest_url, .. }) = event else {
            continue;
        };
        if dest_url.contains("://") || dest_url.starts_with('/') {
            continue;
        }
        let target = dest_url.split('#').next().unwrap_or_default();
        if !is_markdown(Path::new(target)) {
            continue;
        }
        // Targets outside the docs directory are kept as written so the
        // link check still reports them.
        links.push(normalize(&dir.join(target)).unwrap_or_else(|| target.to_string()));
    }

    links
}

/// Fold `.` and `..` out of a relative path. `None` when it climbs out of
/// the docs directory.
fn normalize(path: &Path) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop()?;
            }
            _ => {}
        }
    }
    Some(parts.join("/"))
}

/// First line of the first block after the level-1 heading, or of the
/// first block when `after_title` is false. Code blocks are skipped.
fn first_block_line(body: &str, after_title: bool) -> String {
    let mut waiting = after_title;
    let mut in_code = false;
    let mut line: Option<String> = None;

    for event in Parser::new(body) {
        match event {
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if waiting => waiting = false,
            _ if waiting => {}
            Event::Start(Tag::CodeBlock(_)) => in_code = true,
            Event::End(TagEnd::CodeBlock) => in_code = false,
            _ if in_code => {}
            Event::Start(Tag::Paragraph | Tag::Heading { .. } | Tag::Item) => {
                line.get_or_insert_with(String::new);
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(ref mut value) = line {
                    value.push_str(&text);
                }
            }
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => {
                if let Some(value) = line.as_deref().map(str::trim) {
                    if !value.is_empty() {
                        return value.to_string();
                    }
                }
            }
            _ => {}
        }
    }

    String::new()
}

/// Number repeated anchors: `overlay`, `overlay-1`, `overlay-2`. A suffixed
/// id that collides with a heading's own slug is bumped again.
fn unique_id(seen: &mut HashMap<String, usize>, id: String) -> String {
    let mut unique = id.clone();
    while seen.contains_key(&unique) {
        let count = seen.entry(id.clone()).or_insert(0);
        *count += 1;
        unique = format!("{id}-{count}");
    }
    seen.insert(unique.clone(), 0);
    unique
}

/// Convert a heading to a URL-safe slug.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Document id from a relative path: `guides/setup.md` becomes `guides/setup`.
fn path_id(path: &Path) -> String {
    path.with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const USAGE: &str = r#"---
sidebar_position: 4
---

# Usage

## CLI

### Init Configuration

### Overlay Repository

```bash
gilt overlay
```

### Debug

## Package

### Overlay Repository
"#;

    fn base() -> PermalinkBase {
        PermalinkBase {
            base_url: "/gilt/".to_string(),
            route_base_path: "/".to_string(),
            version: Some("2.1.1".to_string()),
        }
    }

    fn page(id: &str, position: Option<i32>) -> PageMetadata {
        PageMetadata {
            id: id.to_string(),
            title: id.to_uppercase(),
            description: String::new(),
            source: format!("{id}.md"),
            slug: format!("/{id}"),
            permalink: format!("/{id}"),
            version: None,
            sidebar_position: position,
            previous: None,
            next: None,
            toc: Vec::new(),
            markdown_links: Vec::new(),
        }
    }

    #[test]
    fn builds_usage_page() {
        let page = PageMetadata::from_markdown(Path::new("usage.md"), USAGE, &base()).unwrap();

        assert_eq!(page.id, "usage");
        assert_eq!(page.title, "Usage");
        assert_eq!(page.description, "CLI");
        assert_eq!(page.source, "usage.md");
        assert_eq!(page.slug, "/usage");
        assert_eq!(page.permalink, "/gilt/2.1.1/usage");
        assert_eq!(page.version.as_deref(), Some("2.1.1"));
        assert_eq!(page.sidebar_position, Some(4));
    }

    #[test]
    fn toc_numbers_repeated_headings() {
        let page = PageMetadata::from_markdown(Path::new("usage.md"), USAGE, &base()).unwrap();

        let toc: Vec<(&str, &str, u8)> = page
            .toc
            .iter()
            .map(|e| (e.value.as_str(), e.id.as_str(), e.level))
            .collect();
        assert_eq!(
            toc,
            vec![
                ("CLI", "cli", 2),
                ("Init Configuration", "init-configuration", 3),
                ("Overlay Repository", "overlay-repository", 3),
                ("Debug", "debug", 3),
                ("Package", "package", 2),
                ("Overlay Repository", "overlay-repository-1", 3),
            ]
        );
    }

    #[test]
    fn front_matter_overrides_derived_fields() {
        let source = r#"---
id: getting-started
title: Getting Started
description: Start here
slug: start
---

# Ignored

Body text.
"#;

        let page = PageMetadata::from_markdown(Path::new("intro.md"), source, &base()).unwrap();

        assert_eq!(page.id, "getting-started");
        assert_eq!(page.title, "Getting Started");
        assert_eq!(page.description, "Start here");
        assert_eq!(page.slug, "/start");
        assert_eq!(page.permalink, "/gilt/2.1.1/start");
    }

    #[test]
    fn falls_back_to_path_id() {
        let page =
            PageMetadata::from_markdown(Path::new("guides/setup.mdx"), "Plain text.\n", &base())
                .unwrap();

        assert_eq!(page.id, "guides/setup");
        assert_eq!(page.title, "guides/setup");
        assert_eq!(page.description, "Plain text.");
        assert_eq!(page.source, "guides/setup.mdx");
        assert_eq!(page.permalink, "/gilt/2.1.1/guides/setup");
    }

    #[test]
    fn description_skips_code_fences() {
        let source = "# Install\n\n```bash\n# comment\ncargo install gilt\n```\n\nThen run it.\n";

        let page = PageMetadata::from_markdown(Path::new("install.md"), source, &base()).unwrap();

        assert_eq!(page.title, "Install");
        assert_eq!(page.description, "Then run it.");
    }

    #[test]
    fn fenced_hash_is_not_a_title() {
        let source = "~~~sh\n# not a title\n~~~\nIntro line.\n";

        let page = PageMetadata::from_markdown(Path::new("notes.md"), source, &base()).unwrap();

        assert_eq!(page.title, "notes");
        assert_eq!(page.description, "Intro line.");
    }

    #[test]
    fn collects_relative_markdown_links() {
        let source = "# Guide\n\nSee [config](../configuration.md#giltfile), [setup](setup.mdx), \
                      [site](https://example.com/a.md) and [root](/usage).\n";

        let page =
            PageMetadata::from_markdown(Path::new("guides/guide.md"), source, &base()).unwrap();

        assert_eq!(
            page.markdown_links,
            vec!["configuration.md".to_string(), "guides/setup.mdx".to_string()]
        );
    }

    #[test]
    fn setext_title_is_not_the_description() {
        let page = PageMetadata::from_markdown(
            Path::new("usage.md"),
            "Usage\n=====\n\nFirst para.\nSecond line.\n",
            &base(),
        )
        .unwrap();

        assert_eq!(page.title, "Usage");
        assert_eq!(page.description, "First para.");
    }

    #[test]
    fn toc_ids_never_repeat() {
        let page = PageMetadata::from_markdown(
            Path::new("overlay.md"),
            "## Overlay\n\n## Overlay\n\n## Overlay 1\n",
            &base(),
        )
        .unwrap();

        let ids: Vec<&str> = page.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["overlay", "overlay-1", "overlay-1-1"]);
    }

    #[test]
    fn keeps_links_outside_docs_dir() {
        let page = PageMetadata::from_markdown(
            Path::new("usage.md"),
            "# Usage\n\nSee [x](../missing.md).\n",
            &base(),
        )
        .unwrap();

        assert_eq!(page.markdown_links, vec!["../missing.md".to_string()]);
    }

    #[test]
    fn unclosed_front_matter_is_an_error() {
        let result =
            PageMetadata::from_markdown(Path::new("bad.md"), "---\ntitle: Bad\n# No closing", &base());

        assert!(matches!(result, Err(SiteError::FrontMatter { .. })));
    }

    #[test]
    fn permalink_without_version() {
        let base = PermalinkBase {
            base_url: "/".to_string(),
            route_base_path: "/docs/".to_string(),
            version: None,
        };

        assert_eq!(base.permalink("/usage"), "/docs/usage");
        assert_eq!(base.permalink("/"), "/docs");
    }

    #[test]
    fn links_pages_in_sidebar_order() {
        let mut pages = vec![
            page("zeta", None),
            page("usage", Some(4)),
            page("alpha", None),
            page("configuration", Some(3)),
        ];

        link_pages(&mut pages);

        let order: Vec<&str> = pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["configuration", "usage", "alpha", "zeta"]);
        assert_eq!(pages[0].previous, None);
        assert_eq!(
            pages[1].previous,
            Some(NavLink {
                title: "CONFIGURATION".to_string(),
                permalink: "/configuration".to_string(),
            })
        );
        assert_eq!(pages[1].next.as_ref().map(|l| l.title.as_str()), Some("ALPHA"));
        assert_eq!(pages[3].next, None);
    }

    #[test]
    fn discovers_markdown_and_skips_partials() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "---\nsidebar_position: 2\n---\n# A\n").unwrap();
        fs::write(temp.path().join("b.mdx"), "---\nsidebar_position: 1\n---\n# B\n").unwrap();
        fs::write(temp.path().join("_partial.md"), "# Partial\n").unwrap();
        fs::write(temp.path().join("site.yaml"), "title: x\n").unwrap();

        let pages = discover_pages(temp.path(), &base()).unwrap();

        let ids: Vec<&str> = pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(pages[1].previous.as_ref().map(|l| l.title.as_str()), Some("B"));
    }

    #[test]
    fn repository_usage_page_links_neighbours() {
        let docs = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../docs");

        let pages = discover_pages(&docs, &base()).unwrap();
        let usage = pages.iter().find(|p| p.id == "usage").unwrap();

        assert_eq!(usage.description, "CLI");
        assert_eq!(usage.permalink, "/gilt/2.1.1/usage");
        assert_eq!(usage.toc[1].id, "init-configuration");
        let configuration = pages.iter().find(|p| p.id == "configuration").unwrap();
        assert_eq!(configuration.markdown_links, vec!["usage.md".to_string()]);
        assert_eq!(
            usage.previous,
            Some(NavLink {
                title: "Configuration".to_string(),
                permalink: "/gilt/2.1.1/configuration".to_string(),
            })
        );
        assert_eq!(
            usage.next,
            Some(NavLink {
                title: "Testing".to_string(),
                permalink: "/gilt/2.1.1/testing".to_string(),
            })
        );
    }
}
