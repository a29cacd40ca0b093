//! Shared fixtures for unit tests.
//!
//! ```text
//! let site = SiteFixture::new()
//!     .page("index.html", r#"<a href="a.html">A</a>"#)
//!     .page("a.html", "<title>A</title>");
//! let registry = site.index();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::IndexerConfig;
use crate::indexer::index_site;
use crate::page::Registry;

/// A throwaway site tree on disk.
pub struct SiteFixture {
    _tmp: TempDir,
    root: PathBuf,
}

impl SiteFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        Self { _tmp: tmp, root }
    }

    /// Writes `content` to `relative`, creating parent directories.
    pub fn page(self, relative: &str, content: &str) -> Self {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn index(&self) -> Registry {
        index_site(&self.root, &IndexerConfig::default()).unwrap()
    }

    /// Root-relative strings for a list of paths, for readable assertions.
    pub fn relative(&self, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(&self.root).unwrap().to_string_lossy().into_owned())
            .collect()
    }
}
