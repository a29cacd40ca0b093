use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Metadata extracted from one HTML document.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    /// Canonical absolute path, unique within a registry.
    pub path: PathBuf,
    /// `<title>` text, or the file stem when the title is missing or blank.
    pub title: String,
    /// `<meta name="description">` content, empty when absent.
    pub description: String,
    /// Resolved outbound targets in first-appearance order, without duplicates.
    pub links: Vec<PathBuf>,
    /// Directory nesting below the root. Root-level files are 0.
    pub depth: usize,
    pub size_bytes: u64,
    pub relative_path: PathBuf,
}

/// All discovered pages keyed by canonical path, in indexing order.
#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    root: PathBuf,
    pages: IndexMap<PathBuf, PageRecord>,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pages: IndexMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Inserts a record unless its path is already registered. Returns
    /// whether the record was added.
    pub fn insert(&mut self, record: PageRecord) -> bool {
        if self.pages.contains_key(&record.path) {
            return false;
        }
        self.pages.insert(record.path.clone(), record);
        true
    }

    pub fn get(&self, path: &Path) -> Option<&PageRecord> {
        self.pages.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.pages.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages in indexing order.
    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.pages.keys()
    }

    /// Display path for any file, registered or not.
    pub fn display_path(&self, path: &Path) -> String {
        match self.get(path) {
            Some(record) => record.relative_path.to_string_lossy().into_owned(),
            None => path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned(),
        }
    }
}
