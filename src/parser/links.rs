//! Mod list parser
//!
//! Extracts Modrinth project references from a text or markdown file.
//!
//! Format examples:
//! - Markdown link: `[Sodium](https://modrinth.com/mod/sodium)`
//! - Bare URL: `https://modrinth.com/mod/lithium`

use std::path::Path;

use regex::Regex;
use tracing::warn;

use crate::config::SITE_MOD_URL;
use crate::parser::types::PackageRef;

/// Parser for mod list files
pub struct LinkParser {
    /// Regex for markdown links: `[Name](https://modrinth.com/mod/slug)`
    markdown_link_re: Regex,
    /// Regex for bare project URLs: `https://modrinth.com/mod/slug`
    bare_url_re: Regex,
}

impl LinkParser {
    pub fn new() -> Self {
        Self {
            markdown_link_re: Regex::new(
                r"\[([^\]]+)\]\((https://modrinth\.com/mod/([^/\s)]+)[^)\s]*)\)",
            )
            .unwrap(),
            bare_url_re: Regex::new(r"https://modrinth\.com/mod/([^/\s)\]]+)").unwrap(),
        }
    }

    /// Extract package references in order of first appearance.
    ///
    /// Markdown links are collected first so their link text becomes the
    /// display name; bare URLs only add slugs not seen in a link.
    pub fn parse(&self, content: &str) -> Vec<PackageRef> {
        let mut packages: Vec<PackageRef> = Vec::new();

        for caps in self.markdown_link_re.captures_iter(content) {
            let name = caps[1].trim();
            let slug = &caps[3];
            if packages.iter().any(|p| p.slug == slug) {
                continue;
            }
            packages.push(PackageRef::new(name, slug, &caps[2]));
        }

        for caps in self.bare_url_re.captures_iter(content) {
            let slug = &caps[1];
            if packages.iter().any(|p| p.slug == slug) {
                continue;
            }
            packages.push(PackageRef::new(
                slug,
                slug,
                format!("{}/{}", SITE_MOD_URL, slug),
            ));
        }

        if packages.is_empty() {
            warn!(
                "No Modrinth mod links found; expected markdown links like \
                 [Mod Name](https://modrinth.com/mod/mod-slug) or bare project URLs"
            );
        }

        packages
    }

    /// Read a mod list file and extract its package references
    pub fn parse_file(&self, path: &Path) -> std::io::Result<Vec<PackageRef>> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.parse(&content))
    }
}

impl Default for LinkParser {
    fn default() -> Self {
        Self::new()
    }
}
