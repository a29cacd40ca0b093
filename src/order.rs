//! Linear page order for PDF assembly.
//!
//! The declared sidebar order of the start page wins when there is one.
//! Otherwise pages are visited breadth-first from the start page along the
//! link graph. Pages reached by neither are appended in indexing order.

use colored::*;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::{NAV_CONTAINER_SELECTORS, NAV_LINK_SELECTOR};
use crate::page::Registry;
use crate::resolver::{clean_href, is_external, LinkResolver};

static NAV_CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    NAV_CONTAINER_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static NAV_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse(NAV_LINK_SELECTOR).unwrap());

/// One slot in the rendering sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum OrderEntry {
    /// The generated contents page.
    TableOfContents,
    Page(PathBuf),
}

/// Fully materialized rendering sequence without duplicate pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageOrder {
    entries: Vec<OrderEntry>,
}

impl PageOrder {
    pub fn from_pages(pages: Vec<PathBuf>) -> Self {
        Self {
            entries: pages.into_iter().map(OrderEntry::Page).collect(),
        }
    }

    /// Puts the contents page in front, once.
    pub fn with_toc(mut self) -> Self {
        if !self.has_toc() {
            self.entries.insert(0, OrderEntry::TableOfContents);
        }
        self
    }

    pub fn has_toc(&self) -> bool {
        self.entries.first() == Some(&OrderEntry::TableOfContents)
    }

    pub fn entries(&self) -> &[OrderEntry] {
        &self.entries
    }

    pub fn pages(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().filter_map(|entry| match entry {
            OrderEntry::Page(path) => Some(path),
            OrderEntry::TableOfContents => None,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the page order for `registry` starting at `start`.
///
/// `max_pages` bounds the breadth-first walk and every append, but never
/// cuts the declared navigation sequence. Without a start page the registry
/// is returned in indexing order.
pub fn build_order(
    registry: &Registry,
    start: Option<&Path>,
    max_pages: Option<usize>,
) -> PageOrder {
    let Some(start) = start else {
        warn!("No start page found, using indexing order");
        let pages = registry
            .paths()
            .take(max_pages.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        return PageOrder::from_pages(pages);
    };

    let resolver = LinkResolver::new(registry.root());

    let mut ordered = match navigation_order(start, &resolver) {
        Some(pages) => {
            info!("Using sidebar order, found {} pages", pages.len().to_string().green());
            pages
        }
        None => {
            info!("Using breadth-first traversal");
            breadth_first(registry, start, &resolver, max_pages)
        }
    };

    append_unvisited(registry, &mut ordered, max_pages);

    info!("Page order built with {} pages", ordered.len().to_string().green());
    PageOrder::from_pages(ordered)
}

/// Start page followed by the sidebar targets in document order.
///
/// `None` when the start page has no navigation container. A container whose
/// links all fail to resolve still counts: the order is just the start page.
fn navigation_order(start: &Path, resolver: &LinkResolver) -> Option<Vec<PathBuf>> {
    let content = match fs::read(start) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Unable to read sidebar from {}: {}", start.display(), e);
            return None;
        }
    };
    let document = Html::parse_document(&content);

    let container = NAV_CONTAINERS
        .iter()
        .find_map(|selector| document.select(selector).next())?;

    let mut ordered = vec![start.to_path_buf()];
    for anchor in container.select(&NAV_LINK) {
        let Some(raw) = anchor.value().attr("href") else {
            continue;
        };
        if raw.starts_with('#') || is_external(raw) {
            continue;
        }
        let Some(target) = clean_href(raw).and_then(|href| resolver.resolve(start, &href)) else {
            continue;
        };
        if !ordered.contains(&target) {
            ordered.push(target);
        }
    }

    if ordered.len() == 1 {
        debug!("Sidebar on {} has no usable links", start.display());
    }
    Some(ordered)
}

fn breadth_first(
    registry: &Registry,
    start: &Path,
    resolver: &LinkResolver,
    max_pages: Option<usize>,
) -> Vec<PathBuf> {
    let mut ordered = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start.to_path_buf()]);

    while let Some(mut current) = queue.pop_front() {
        if at_capacity(ordered.len(), max_pages) {
            break;
        }
        if visited.contains(&current) {
            continue;
        }

        if !current.is_file() {
            match resolver.resolve_page_path(&current) {
                Some(index) if !visited.contains(&index) => current = index,
                _ => {
                    debug!("Skipping unreachable page {}", current.display());
                    continue;
                }
            }
        }

        visited.insert(current.clone());
        ordered.push(current.clone());

        if let Some(record) = registry.get(&current) {
            for link in &record.links {
                if !visited.contains(link) && registry.contains(link) {
                    queue.push_back(link.clone());
                }
            }
        }
    }

    ordered
}

fn append_unvisited(registry: &Registry, ordered: &mut Vec<PathBuf>, max_pages: Option<usize>) {
    let mut present: HashSet<PathBuf> = ordered.iter().cloned().collect();

    for path in registry.paths() {
        if at_capacity(ordered.len(), max_pages) {
            break;
        }
        if present.insert(path.clone()) {
            debug!("Appending unlinked page {}", path.display());
            ordered.push(path.clone());
        }
    }
}

fn at_capacity(len: usize, max_pages: Option<usize>) -> bool {
    max_pages.is_some_and(|max| len >= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::start_page::select_start;
    use crate::test_helpers::SiteFixture;

    fn order_of(site: &SiteFixture, max_pages: Option<usize>) -> Vec<String> {
        let registry = site.index();
        let start = select_start(&registry, site.root());
        let order = build_order(&registry, start.as_deref(), max_pages);
        let pages: Vec<PathBuf> = order.pages().cloned().collect();
        site.relative(&pages)
    }

    fn linked_site() -> SiteFixture {
        SiteFixture::new()
            .page("index.html", r#"<a href="a.html">A</a><a href="b.html">B</a>"#)
            .page("a.html", r#"<a href="c.html">C</a><a href="index.html">Home</a>"#)
            .page("b.html", r#"<a href="a.html">A</a>"#)
            .page("c.html", "")
    }

    #[test]
    fn breadth_first_follows_link_order() {
        assert_eq!(
            order_of(&linked_site(), None),
            vec!["index.html", "a.html", "b.html", "c.html"]
        );
    }

    #[test]
    fn unlinked_pages_are_appended_in_indexing_order() {
        let site = linked_site().page("orphans/y.html", "").page("orphan.html", "");
        assert_eq!(
            order_of(&site, None),
            vec!["index.html", "a.html", "b.html", "c.html", "orphan.html", "orphans/y.html"]
        );
    }

    #[test]
    fn page_cap_bounds_traversal_and_appends() {
        let site = linked_site().page("orphan.html", "");
        assert_eq!(order_of(&site, Some(2)), vec!["index.html", "a.html"]);
        assert_eq!(order_of(&site, Some(5)).len(), 5);
    }

    #[test]
    fn sidebar_order_is_authoritative() {
        let site = SiteFixture::new()
            .page(
                "index.html",
                r##"<a href="a.html">A first in body</a>
                <aside class="sidebar"><ul>
                    <li><a class="sidebar-link" href="b.html">B</a></li>
                    <li><a class="sidebar-link" href="a.html#intro">A</a></li>
                    <li><a class="sidebar-link" href="b.html">B again</a></li>
                    <li><a class="sidebar-link" href="https://example.com/">Elsewhere</a></li>
                    <li><a class="sidebar-link" href="#top">Top</a></li>
                    <li><a href="c.html">Not a sidebar link</a></li>
                </ul></aside>"##,
            )
            .page("a.html", "")
            .page("b.html", "")
            .page("c.html", "");

        assert_eq!(order_of(&site, None), vec!["index.html", "b.html", "a.html", "c.html"]);
    }

    #[test]
    fn sidebar_links_list_is_recognized() {
        let site = SiteFixture::new()
            .page(
                "index.html",
                r#"<ul class="sidebar-links"><li><a class="sidebar-link" href="./z.html">Z</a></li></ul>"#,
            )
            .page("a.html", "")
            .page("z.html", "");

        assert_eq!(order_of(&site, None), vec!["index.html", "z.html", "a.html"]);
    }

    #[test]
    fn page_cap_does_not_truncate_sidebar_order() {
        let site = SiteFixture::new()
            .page(
                "index.html",
                r#"<aside class="sidebar">
                    <a class="sidebar-link" href="c.html">C</a>
                    <a class="sidebar-link" href="b.html">B</a>
                    <a class="sidebar-link" href="a.html">A</a>
                </aside>"#,
            )
            .page("a.html", "")
            .page("b.html", "")
            .page("c.html", "")
            .page("d.html", "");

        assert_eq!(
            order_of(&site, Some(2)),
            vec!["index.html", "c.html", "b.html", "a.html"]
        );
    }

    #[test]
    fn sidebar_without_resolvable_links_still_wins() {
        let site = SiteFixture::new()
            .page(
                "index.html",
                r#"<aside class="sidebar"><a class="sidebar-link" href="gone.html">Gone</a></aside>
                <a href="b.html">B</a><a href="a.html">A</a>"#,
            )
            .page("a.html", "")
            .page("b.html", "");

        // Body links are ignored; the rest comes in indexing order.
        assert_eq!(order_of(&site, None), vec!["index.html", "a.html", "b.html"]);
    }

    #[test]
    fn sidebar_linking_only_to_itself_still_wins() {
        let site = SiteFixture::new()
            .page(
                "index.html",
                r#"<ul class="sidebar-links"><li><a class="sidebar-link" href="index.html">Home</a></li></ul>
                <a href="c.html">C</a>"#,
            )
            .page("b.html", "")
            .page("c.html", "");

        assert_eq!(order_of(&site, None), vec!["index.html", "b.html", "c.html"]);
    }

    #[test]
    fn order_has_every_registry_page_once_without_cap() {
        let site = linked_site()
            .page("docs/index.html", r#"<a href="../c.html">C</a><a href="../index.html">Up</a>"#)
            .page("docs/x.html", "");
        let registry = site.index();
        let start = select_start(&registry, site.root());
        let order = build_order(&registry, start.as_deref(), None);

        let pages: Vec<_> = order.pages().cloned().collect();
        let unique: HashSet<_> = pages.iter().collect();
        assert_eq!(pages.len(), unique.len());
        assert_eq!(pages.len(), registry.len());
        assert!(pages.iter().all(|p| registry.contains(p)));
    }

    #[test]
    fn directory_start_uses_its_index() {
        let site = SiteFixture::new()
            .page("docs/index.html", r#"<a href="page.html">P</a>"#)
            .page("docs/page.html", "");
        let registry = site.index();
        let order = build_order(&registry, Some(&site.path("docs")), None);

        let pages: Vec<_> = order.pages().cloned().collect();
        assert_eq!(site.relative(&pages), vec!["docs/index.html", "docs/page.html"]);
    }

    #[test]
    fn missing_start_degrades_to_indexing_order() {
        let site = linked_site();
        let registry = site.index();

        let order = build_order(&registry, None, None);
        let pages: Vec<_> = order.pages().cloned().collect();
        assert_eq!(site.relative(&pages), vec!["a.html", "b.html", "c.html", "index.html"]);

        assert_eq!(build_order(&registry, None, Some(1)).page_count(), 1);
    }

    #[test]
    fn toc_is_inserted_once_at_front() {
        let order = PageOrder::from_pages(vec![PathBuf::from("/a.html")])
            .with_toc()
            .with_toc();

        assert_eq!(order.len(), 2);
        assert_eq!(order.entries()[0], OrderEntry::TableOfContents);
        assert_eq!(order.page_count(), 1);
    }
}
