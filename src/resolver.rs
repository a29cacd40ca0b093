//! Mapping of hrefs found in a page to canonical file paths under the root.

use percent_encoding::percent_decode_str;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

const DIRECTORY_INDEX: &str = "index.html";

/// Strips the fragment and query from an href and percent-decodes the rest.
/// Returns `None` when nothing is left.
pub fn clean_href(raw: &str) -> Option<String> {
    let without_fragment = raw.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let decoded = percent_decode_str(without_query.trim())
        .decode_utf8_lossy()
        .into_owned();

    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// True for hrefs that carry a scheme (`https:`, `mailto:`, ...) or are
/// protocol-relative.
pub fn is_external(href: &str) -> bool {
    href.starts_with("//") || Url::parse(href).is_ok()
}

/// Resolves links relative to the page they appear on, or to the site root
/// for `/`-prefixed links.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    root: PathBuf,
}

impl LinkResolver {
    /// `root` should already be canonical; resolved paths are compared
    /// against it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the canonical path of an existing regular file under the root,
    /// or `None` for external, dangling or escaping links.
    pub fn resolve(&self, from_page: &Path, raw_link: &str) -> Option<PathBuf> {
        if is_external(raw_link) {
            return None;
        }

        let link = raw_link.strip_prefix("./").unwrap_or(raw_link);
        let mut candidate = match link.strip_prefix('/') {
            Some(rooted) => self.root.join(rooted.trim_start_matches('/')),
            None => from_page.parent().unwrap_or(&self.root).join(link),
        };

        if raw_link.ends_with('/') {
            candidate.push(DIRECTORY_INDEX);
        }

        self.existing_file(&candidate).or_else(|| {
            debug!("Dead link \"{}\" on {}", raw_link, from_page.display());
            None
        })
    }

    /// Falls back to the directory index when `path` names a directory.
    pub fn resolve_page_path(&self, path: &Path) -> Option<PathBuf> {
        if path.is_dir() {
            return self.existing_file(&path.join(DIRECTORY_INDEX));
        }
        None
    }

    fn existing_file(&self, candidate: &Path) -> Option<PathBuf> {
        let canonical = fs::canonicalize(candidate).ok()?;
        if canonical.is_file() && canonical.starts_with(&self.root) {
            Some(canonical)
        } else {
            None
        }
    }
}
