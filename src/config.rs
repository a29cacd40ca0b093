use std::path::PathBuf;
use std::time::Duration;

/// File extensions treated as documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["html", "htm"];

/// Substrings that exclude a path from indexing when found anywhere in it.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "hts-cache",
    "hts-log",
    "backblue.gif",
    "fade.gif",
    "index.html~",
    "/404",
];

/// Entry page names checked directly under the root, in priority order.
pub const INDEX_NAMES: &[&str] = &[
    "index.html",
    "index.htm",
    "home.html",
    "home.htm",
    "default.html",
    "default.htm",
    "main.html",
    "main.htm",
];

/// Navigation containers, tried in order. The first one present wins.
pub const NAV_CONTAINER_SELECTORS: &[&str] = &["aside.sidebar", "ul.sidebar-links"];

/// Anchors inside the navigation container that make up the declared order.
pub const NAV_LINK_SELECTOR: &str = "a.sidebar-link";

/// What the indexer picks up and what it ignores.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub extensions: Vec<String>,
    pub exclusions: Vec<String>,
}

impl IndexerConfig {
    pub fn is_document(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.iter().any(|pattern| path.contains(pattern.as_str()))
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            extensions: DOCUMENT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub scale: f64,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            scale: 0.85,
            print_background: true,
            prefer_css_page_size: true,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            viewport_width: 2048,
            viewport_height: 1400,
        }
    }
}

/// Options for a full conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    pub max_pages: Option<usize>,
    pub include_toc: bool,
    /// Hides sidebars and navbars in the rendered output. Ordering is unaffected.
    pub hide_navigation: bool,
    /// Keep per-page PDFs here instead of a temporary directory.
    pub pages_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub settle: Duration,
    pub indexer: IndexerConfig,
    pub pdf: PdfOptions,
}

impl ConvertOptions {
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            max_pages: None,
            include_toc: true,
            hide_navigation: true,
            pages_dir: None,
            timeout: Duration::from_secs(60),
            settle: Duration::from_millis(500),
            indexer: IndexerConfig::default(),
            pdf: PdfOptions::default(),
        }
    }
}
