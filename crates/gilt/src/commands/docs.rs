//! Documentation site commands.

use std::path::Path;

use anyhow::{Context, Result};
use gilt_docs::{check_site, discover_pages, PermalinkBase, SiteConfig};

/// Check the site manifest at `manifest` against its pages.
pub fn check(manifest: &Path) -> Result<()> {
    let site = SiteConfig::load(manifest)
        .with_context(|| format!("Failed to load {}", manifest.display()))?;

    let docs_dir = site.docs_dir(manifest);
    let pages = discover_pages(&docs_dir, &PermalinkBase::from_site(&site))
        .with_context(|| format!("Failed to read pages in {}", docs_dir.display()))?;

    let report = check_site(&site, &pages);
    report.enforce(site.on_broken_links, site.on_broken_markdown_links)?;

    tracing::info!(
        "checked {} pages: {} issue(s)",
        pages.len(),
        report.issues.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn repository_docs_pass() {
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../docs/site.yaml");

        check(&manifest).unwrap();
    }

    #[test]
    fn broken_navbar_link_fails_under_throw() {
        let temp = tempdir().unwrap();
        let manifest = temp.path().join("site.yaml");
        fs::write(
            &manifest,
            r#"
title: Gilt
url: https://example.com/
onBrokenLinks: throw
themeConfig:
  navbar:
    items:
      - type: doc
        docId: missing
"#,
        )
        .unwrap();
        fs::write(temp.path().join("intro.md"), "# Intro\n").unwrap();

        let err = check(&manifest).unwrap_err();

        assert!(err.to_string().contains("broken link"));
    }
}
