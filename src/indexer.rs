use colored::*;
use rayon::prelude::*;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::IndexerConfig;
use crate::error::{Result, SiteError};
use crate::page::{PageRecord, Registry};
use crate::resolver::{clean_href, LinkResolver};

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Scans `root` for HTML documents and builds the page registry.
///
/// Unreadable files are logged and left out. An empty registry is not an
/// error here; callers decide whether that is fatal.
pub fn index_site(root: &Path, config: &IndexerConfig) -> Result<Registry> {
    let root = fs::canonicalize(root).map_err(|_| SiteError::InvalidRoot(root.to_path_buf()))?;
    if !root.is_dir() {
        return Err(SiteError::InvalidRoot(root));
    }

    info!("Searching for HTML files in {}", root.display().to_string().green());

    let candidates = find_documents(&root, config);
    let registry = index_documents(&root, &candidates, config);

    info!("Found {} HTML files", registry.len().to_string().green());
    Ok(registry)
}

/// Parses `candidates` in parallel and registers them in the given order.
/// A file that fails to scan is logged and skipped.
fn index_documents(root: &Path, candidates: &[PathBuf], config: &IndexerConfig) -> Registry {
    let resolver = LinkResolver::new(root);

    let scanned: Vec<Result<PageRecord>> = candidates
        .par_iter()
        .map(|path| scan_page(root, path, &resolver, config))
        .collect();

    let mut registry = Registry::new(root);
    for result in scanned {
        match result {
            Ok(record) => {
                let path = record.path.clone();
                if !registry.insert(record) {
                    debug!("Skipping duplicate page {}", path.display());
                }
            }
            Err(e) => error!("{}", e),
        }
    }

    registry
}

/// Document files under `root` that survive the exclusion list, in a
/// stable (file-name sorted) order.
fn find_documents(root: &Path, config: &IndexerConfig) -> Vec<PathBuf> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to walk {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if !config.is_document(&name) || !path.is_file() {
            continue;
        }
        if config.is_excluded(&path.to_string_lossy()) {
            debug!("Excluded {}", path.display());
            continue;
        }

        documents.push(path.to_path_buf());
    }

    documents
}

fn scan_page(
    root: &Path,
    path: &Path,
    resolver: &LinkResolver,
    config: &IndexerConfig,
) -> Result<PageRecord> {
    let scan_err = |source| SiteError::Scan {
        path: path.to_path_buf(),
        source,
    };

    let bytes = fs::read(path).map_err(scan_err)?;
    let size_bytes = fs::metadata(path).map_err(scan_err)?.len();
    let canonical = fs::canonicalize(path).map_err(scan_err)?;

    let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let depth = relative_path.components().count().saturating_sub(1);

    let content = String::from_utf8_lossy(&bytes);
    let document = Html::parse_document(&content);

    let title = document
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| file_stem(path));

    let description = document
        .select(&META_DESCRIPTION)
        .next()
        .and_then(|el| el.value().attr("content"))
        .unwrap_or_default()
        .to_string();

    let links = extract_links(&document, &canonical, resolver, config);

    Ok(PageRecord {
        path: canonical,
        title,
        description,
        links,
        depth,
        size_bytes,
        relative_path,
    })
}

fn extract_links(
    document: &Html,
    page: &Path,
    resolver: &LinkResolver,
    config: &IndexerConfig,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href").and_then(clean_href) else {
            continue;
        };
        // Only page and directory references; assets are not part of the graph.
        if !(config.is_document(&href) || href.ends_with('/')) {
            continue;
        }
        if let Some(target) = resolver.resolve(page, &href) {
            if seen.insert(target.clone()) {
                links.push(target);
            }
        }
    }

    links
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
