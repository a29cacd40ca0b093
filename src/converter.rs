use anyhow::{anyhow, Result};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{info, warn};

use crate::config::{ConvertOptions, IndexerConfig};
use crate::error::SiteError;
use crate::indexer::index_site;
use crate::order::{build_order, OrderEntry, PageOrder};
use crate::page::Registry;
use crate::renderer::{output_file_name, PdfRenderer};
use crate::start_page::select_start;
use crate::toc::generate_toc;
use crate::PdfMerger;

/// Everything decided before a browser is involved.
#[derive(Debug, Serialize)]
pub struct Plan {
    pub start: Option<PathBuf>,
    pub order: PageOrder,
    pub registry: Registry,
}

/// Indexes `root`, picks the start page and orders the pages.
///
/// Fails only when the root is unusable or holds no documents.
pub fn plan_site(
    root: &Path,
    indexer: &IndexerConfig,
    max_pages: Option<usize>,
    include_toc: bool,
) -> crate::error::Result<Plan> {
    let registry = index_site(root, indexer)?;
    if registry.is_empty() {
        return Err(SiteError::EmptyRegistry(registry.root().to_path_buf()));
    }

    let start = select_start(&registry, registry.root());
    let mut order = build_order(&registry, start.as_deref(), max_pages);
    if include_toc {
        order = order.with_toc();
    }

    Ok(Plan {
        start,
        order,
        registry,
    })
}

#[derive(Debug)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub rendered: usize,
    pub skipped: Vec<String>,
    pub pdf_pages: usize,
    pub size_bytes: u64,
}

pub struct SiteConverter {
    options: ConvertOptions,
}

impl SiteConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub async fn run(&self) -> Result<ConversionSummary> {
        info!("Converting {} into a PDF...", self.options.root.display().to_string().green());

        let plan = plan_site(
            &self.options.root,
            &self.options.indexer,
            self.options.max_pages,
            self.options.include_toc,
        )?;

        info!("Preparing to convert {} pages", plan.order.page_count().to_string().green());

        // Keep the temporary directory alive until the merge is done
        let (pages_dir, _tmp) = match &self.options.pages_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .await
                    .map_err(|e| anyhow!("Failed to create pages directory: {}", e))?;
                (dir.clone(), None)
            }
            None => {
                let tmp = TempDir::new()?;
                (tmp.path().to_path_buf(), Some(tmp))
            }
        };

        let renderer = PdfRenderer::launch(&self.options).await?;
        let (pdf_paths, skipped) = self.render_all(&renderer, &plan, &pages_dir).await;
        renderer.close().await;

        if pdf_paths.is_empty() {
            return Err(SiteError::NoOutput.into());
        }

        info!("Merging {} PDF files...", pdf_paths.len());
        let mut merger = PdfMerger::new();
        for pdf_path in &pdf_paths {
            if let Err(e) = merger.add_pdf(pdf_path).await {
                warn!("Failed to add PDF {}: {}", pdf_path.display(), e);
            }
        }
        if merger.is_empty() {
            return Err(SiteError::NoOutput.into());
        }

        let pdf_pages = merger.save(&self.options.output).await?;
        let size_bytes = fs::metadata(&self.options.output).await?.len();

        info!("PDF saved to: {}", self.options.output.display().to_string().blue());
        info!("File size: {:.2} MB", size_bytes as f64 / (1024.0 * 1024.0));

        Ok(ConversionSummary {
            output: self.options.output.clone(),
            rendered: pdf_paths.len(),
            skipped,
            pdf_pages,
            size_bytes,
        })
    }

    /// Renders every entry in order. Failed entries are reported and left
    /// out; the rest keep their relative order.
    async fn render_all(
        &self,
        renderer: &PdfRenderer,
        plan: &Plan,
        pages_dir: &Path,
    ) -> (Vec<PathBuf>, Vec<String>) {
        let total = plan.order.len();
        let mut pdf_paths = Vec::new();
        let mut skipped = Vec::new();

        for (i, entry) in plan.order.entries().iter().enumerate() {
            let (label, result) = match entry {
                OrderEntry::TableOfContents => {
                    info!("Generating table of contents...");
                    let out_path = pages_dir.join(output_file_name(i, "contents"));
                    let html = generate_toc(&plan.order, &plan.registry);
                    let result = renderer
                        .render_html("table of contents", &html, &out_path)
                        .await
                        .map(|_| out_path);
                    ("table of contents".to_string(), result)
                }
                OrderEntry::Page(path) => {
                    let label = plan.registry.display_path(path);
                    info!("[{}/{}] Converting: {}", i + 1, total, label.green());
                    let out_path = pages_dir.join(output_file_name(i, &label));
                    let result = renderer.render_file(path, &out_path).await.map(|_| out_path);
                    (label, result)
                }
            };

            match result {
                Ok(out_path) => pdf_paths.push(out_path),
                Err(e) => {
                    warn!("Skipping {}: {}", label.yellow(), e);
                    skipped.push(label);
                }
            }
        }

        if !skipped.is_empty() {
            warn!("{} of {} entries could not be rendered", skipped.len(), total);
        }

        (pdf_paths, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SiteFixture;

    #[test]
    fn plan_puts_toc_first_when_enabled() {
        let site = SiteFixture::new()
            .page("index.html", r#"<a href="a.html">A</a>"#)
            .page("a.html", "");

        let plan = plan_site(site.root(), &IndexerConfig::default(), None, true).unwrap();
        assert_eq!(plan.order.entries()[0], OrderEntry::TableOfContents);
        assert_eq!(plan.order.page_count(), 2);
        assert_eq!(plan.start, Some(site.path("index.html")));

        let plan = plan_site(site.root(), &IndexerConfig::default(), None, false).unwrap();
        assert!(!plan.order.has_toc());
    }

    #[test]
    fn empty_site_is_fatal() {
        let site = SiteFixture::new().page("notes.txt", "not html");

        let result = plan_site(site.root(), &IndexerConfig::default(), None, true);
        assert!(matches!(result, Err(SiteError::EmptyRegistry(_))));
    }

    #[test]
    fn plan_serializes_for_diagnostics() {
        let site = SiteFixture::new().page("index.html", "<title>Home</title>");

        let plan = plan_site(site.root(), &IndexerConfig::default(), None, true).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["order"]["entries"][0]["kind"], "table_of_contents");
        assert_eq!(json["order"]["entries"][1]["kind"], "page");
        assert!(json["registry"]["pages"].as_object().unwrap().len() == 1);
    }
}
