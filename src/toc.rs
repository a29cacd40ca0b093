use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::path::Path;

use crate::order::PageOrder;
use crate::page::Registry;

/// Deeper pages are indented like this level.
pub const MAX_DISPLAY_DEPTH: usize = 4;

const TOC_CSS: &str = r#"
body { font-family: Arial, sans-serif; max-width: 900px; margin: 40px auto; padding: 20px; }
h1 { color: #333; border-bottom: 3px solid #4CAF50; padding-bottom: 10px; }
.toc-item { margin: 8px 0; padding: 8px 10px; border-left: 3px solid #ddd; page-break-inside: avoid; }
.toc-item.depth-0 { margin-left: 0; border-left-color: #4CAF50; background-color: #f9f9f9; }
.toc-item.depth-1 { margin-left: 20px; border-left-color: #2196F3; }
.toc-item.depth-2 { margin-left: 40px; border-left-color: #FF9800; }
.toc-item.depth-3 { margin-left: 60px; border-left-color: #9C27B0; }
.toc-item.depth-4 { margin-left: 80px; }
.page-number { color: #666; font-weight: bold; margin-right: 10px; min-width: 30px; display: inline-block; }
.page-title { color: #333; font-size: 15px; font-weight: 500; }
.page-path { color: #999; font-size: 11px; margin-top: 4px; font-family: monospace; }
.depth-indicator { color: #bbb; margin-right: 5px; font-size: 12px; }
"#;

/// One row of the contents listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub number: usize,
    pub title: String,
    pub relative_path: String,
    pub depth: usize,
}

impl TocEntry {
    pub fn display_depth(&self) -> usize {
        self.depth.min(MAX_DISPLAY_DEPTH)
    }
}

/// Rows for every page in `order`, numbered from 1.
pub fn toc_entries(order: &PageOrder, registry: &Registry) -> Vec<TocEntry> {
    order
        .pages()
        .enumerate()
        .map(|(i, path)| match registry.get(path) {
            Some(record) => TocEntry {
                number: i + 1,
                title: record.title.clone(),
                relative_path: record.relative_path.to_string_lossy().into_owned(),
                depth: record.depth,
            },
            None => {
                let relative_path = registry.display_path(path);
                TocEntry {
                    number: i + 1,
                    title: file_name(path),
                    depth: Path::new(&relative_path).components().count().saturating_sub(1),
                    relative_path,
                }
            }
        })
        .collect()
}

/// Renders the contents page as a standalone HTML document.
pub fn generate_toc(order: &PageOrder, registry: &Registry) -> String {
    let entries = toc_entries(order, registry);
    render(&entries).into_string()
}

fn render(entries: &[TocEntry]) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8";
                title { "Contents" }
                style { (PreEscaped(TOC_CSS)) }
            }
            body {
                h1 { "Contents" }
                p { strong { (entries.len()) } " pages" }
                hr;
                @for entry in entries {
                    div class={ "toc-item depth-" (entry.display_depth()) } {
                        span.page-number { (entry.number) "." }
                        span.depth-indicator {
                            @if entry.depth > 0 { "└─ " }
                        }
                        span.page-title { (entry.title) }
                        div.page-path { (entry.relative_path) }
                    }
                }
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
