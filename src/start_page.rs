use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::INDEX_NAMES;
use crate::page::{PageRecord, Registry};

/// Picks the entry page of the site.
///
/// In order: a well-known index name directly under `root`, the registered
/// page named like `*index*` with the shortest path, the shallowest page.
/// Ties go to the page indexed first.
pub fn select_start(registry: &Registry, root: &Path) -> Option<PathBuf> {
    for name in INDEX_NAMES {
        let candidate = root.join(name);
        if candidate.is_file() {
            info!("Found start page: {}", name);
            return Some(fs::canonicalize(&candidate).unwrap_or(candidate));
        }
    }

    let shortest_index = first_min_by_key(
        registry
            .pages()
            .filter(|page| file_name(page).to_lowercase().contains("index")),
        |page| page.path.to_string_lossy().chars().count(),
    );
    if let Some(page) = shortest_index {
        info!("Using start page: {}", page.relative_path.display());
        return Some(page.path.clone());
    }

    let shallowest = first_min_by_key(registry.pages(), |page| page.depth);
    if let Some(page) = shallowest {
        info!("Using start page: {}", page.relative_path.display());
        return Some(page.path.clone());
    }

    None
}

fn file_name(page: &PageRecord) -> String {
    page.path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Like `Iterator::min_by_key`, but keeps the first of equal minimums.
fn first_min_by_key<'a, K: Ord>(
    pages: impl Iterator<Item = &'a PageRecord>,
    key: impl Fn(&PageRecord) -> K,
) -> Option<&'a PageRecord> {
    pages.fold(None, |best, page| match best {
        Some(current) if key(current) <= key(page) => Some(current),
        _ => Some(page),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SiteFixture;

    #[test]
    fn prefers_root_index_names_in_priority_order() {
        let site = SiteFixture::new()
            .page("home.html", "")
            .page("index.htm", "")
            .page("a/index.html", "");
        let registry = site.index();

        assert_eq!(select_start(&registry, site.root()), Some(site.path("index.htm")));
    }

    #[test]
    fn falls_back_to_shortest_index_path() {
        let site = SiteFixture::new()
            .page("about.html", "")
            .page("guide/index.html", "")
            .page("guide/deeper/index.html", "");
        let registry = site.index();

        assert_eq!(
            select_start(&registry, site.root()),
            Some(site.path("guide/index.html"))
        );
    }

    #[test]
    fn index_path_length_counts_characters() {
        // "é" is two bytes but one character; "ab" is indexed first.
        let site = SiteFixture::new()
            .page("ab/index.html", "")
            .page("é/index.html", "");
        let registry = site.index();

        assert_eq!(select_start(&registry, site.root()), Some(site.path("é/index.html")));
    }

    #[test]
    fn index_match_is_case_insensitive() {
        let site = SiteFixture::new()
            .page("zzz/page.html", "")
            .page("docs/Index.HTML", "");
        let registry = site.index();

        assert_eq!(select_start(&registry, site.root()), Some(site.path("docs/Index.HTML")));
    }

    #[test]
    fn falls_back_to_shallowest_page_first_encountered() {
        let site = SiteFixture::new()
            .page("b/deep/page.html", "")
            .page("c/about.html", "")
            .page("d/contact.html", "");
        let registry = site.index();

        assert_eq!(select_start(&registry, site.root()), Some(site.path("c/about.html")));
    }

    #[test]
    fn empty_registry_has_no_start() {
        let site = SiteFixture::new();
        let registry = site.index();

        assert_eq!(select_start(&registry, site.root()), None);
    }
}
