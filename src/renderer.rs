use anyhow::{anyhow, Result};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use colored::*;
use futures_util::StreamExt;
use slug::slugify;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use url::Url;

use crate::config::{ConvertOptions, PdfOptions};

const PRINT_RULES: &[&str] = &[
    "@page { size: A4; margin: 10mm 10mm 12mm 10mm; }",
    "* { overflow: visible !important; max-width: none !important; }",
    "html, body { width: auto !important; overflow: visible !important; }",
    "body, .theme-container, main, .page, .theme-default-content, div, section { max-width: none !important; width: auto !important; }",
    "img, svg, video, canvas { max-width: 100% !important; height: auto !important; }",
    ".theme-container { padding-left: 0 !important; padding-right: 0 !important; }",
    "main.page, .page, main { margin: 0 !important; padding: 0 8mm !important; }",
    ".theme-default-content, .content__default { width: 100% !important; padding: 0 !important; }",
    "pre, pre code, code { white-space: pre-wrap !important; word-break: break-all !important; overflow-wrap: break-word !important; }",
    "table { table-layout: auto !important; width: 100% !important; border-collapse: collapse !important; overflow: visible !important; }",
    "table td, table th { white-space: normal !important; overflow-wrap: break-word !important; overflow: visible !important; padding: 6px !important; font-size: 12px !important; line-height: 1.5 !important; }",
    "table td code, table th code { white-space: pre-wrap !important; word-break: break-all !important; }",
    "[style*='position:fixed'], [style*='position: fixed'] { display: none !important; }",
    "tr, pre, code, figure { page-break-inside: avoid !important; }",
];

const HIDE_NAVIGATION_RULE: &str = ".sidebar, aside.sidebar, .sidebar-mask, .navbar, header.navbar, nav, .page-edit, .page-nav, .search-box, .sidebar-button, .global-ui { display: none !important; }";

/// Stylesheet injected into every page before printing.
pub fn print_stylesheet(hide_navigation: bool) -> String {
    let mut rules = PRINT_RULES.to_vec();
    if hide_navigation {
        rules.push(HIDE_NAVIGATION_RULE);
    }
    rules.join("\n")
}

/// `0007_guide-intro.pdf`: sequence position first so a directory listing
/// keeps the render order.
pub fn output_file_name(position: usize, label: &str) -> String {
    let slug = slugify(label);
    let slug = if slug.is_empty() { "page".to_string() } else { slug };
    format!("{:04}_{}.pdf", position, slug)
}

/// A headless Chromium session that prints one document at a time.
pub struct PdfRenderer {
    browser: Browser,
    handle: JoinHandle<()>,
    page: Page,
    pdf_options: PdfOptions,
    stylesheet: String,
    timeout: Duration,
    settle: Duration,
}

impl PdfRenderer {
    pub async fn launch(options: &ConvertOptions) -> Result<Self> {
        let config = BrowserConfig::builder()
            .window_size(options.pdf.viewport_width, options.pdf.viewport_height)
            .build()
            .map_err(|e| anyhow!("Failed to create browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(err) = h {
                    // Only log if it's not a common websocket deserialization error
                    let err_str = err.to_string();
                    if !err_str.contains("data did not match any variant")
                        && !err_str.contains("untagged enum Message")
                    {
                        error!("Browser handler error: {}", err);
                    } else {
                        debug!("Chrome protocol message ignored: {}", err);
                    }
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| anyhow!("Failed to create new page: {}", e))?;

        Ok(Self {
            browser,
            handle,
            page,
            pdf_options: options.pdf.clone(),
            stylesheet: print_stylesheet(options.hide_navigation),
            timeout: options.timeout,
            settle: options.settle,
        })
    }

    /// Prints the local file at `source` into `out_path`.
    pub async fn render_file(&self, source: &Path, out_path: &Path) -> Result<()> {
        let url = Url::from_file_path(source)
            .map_err(|_| anyhow!("Cannot build a file URL for {}", source.display()))?;

        debug!("Rendering \"{}\" into \"{}\"", url.as_str().green(), out_path.display().to_string().blue());

        self.bounded(source.display().to_string(), async {
            self.page
                .goto(url.as_str())
                .await
                .map_err(|e| anyhow!("Failed to navigate to {}: {}", url, e))?;

            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| anyhow!("Failed to wait for navigation: {}", e))?;

            self.print(out_path).await
        })
        .await
    }

    /// Prints generated markup, such as the contents page, into `out_path`.
    pub async fn render_html(&self, label: &str, html: &str, out_path: &Path) -> Result<()> {
        self.bounded(label.to_string(), async {
            self.page
                .set_content(html)
                .await
                .map_err(|e| anyhow!("Failed to set {} content: {}", label, e))?;

            self.print(out_path).await
        })
        .await
    }

    pub async fn close(mut self) {
        self.browser.close().await.ok();
        self.handle.abort();
    }

    async fn bounded<F>(&self, what: String, work: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| anyhow!("Timed out after {:?} rendering {}", self.timeout, what))?
    }

    async fn print(&self, out_path: &Path) -> Result<()> {
        self.inject_stylesheet().await?;
        tokio::time::sleep(self.settle).await;

        let params = PrintToPdfParams {
            scale: Some(self.pdf_options.scale),
            print_background: Some(self.pdf_options.print_background),
            prefer_css_page_size: Some(self.pdf_options.prefer_css_page_size),
            margin_top: Some(self.pdf_options.margin_top),
            margin_right: Some(self.pdf_options.margin_right),
            margin_bottom: Some(self.pdf_options.margin_bottom),
            margin_left: Some(self.pdf_options.margin_left),
            ..Default::default()
        };

        let pdf_data = self
            .page
            .pdf(params)
            .await
            .map_err(|e| anyhow!("Failed to generate PDF: {}", e))?;

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow!("Failed to create directory: {}", e))?;
        }

        fs::write(out_path, pdf_data)
            .await
            .map_err(|e| anyhow!("Failed to write PDF to {}: {}", out_path.display(), e))?;

        Ok(())
    }

    async fn inject_stylesheet(&self) -> Result<()> {
        let css = serde_json::to_string(&self.stylesheet)?;
        let js_code = format!(
            r#"
            (() => {{
                const style = document.createElement('style');
                style.textContent = {};
                (document.head || document.documentElement).appendChild(style);
            }})()
            "#,
            css
        );

        self.page
            .evaluate(js_code.as_str())
            .await
            .map_err(|e| anyhow!("Failed to inject print styles: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_hides_navigation_only_when_asked() {
        let hidden = print_stylesheet(true);
        let kept = print_stylesheet(false);

        assert!(hidden.contains("@page { size: A4;"));
        assert!(hidden.contains("aside.sidebar"));
        assert!(!kept.contains("aside.sidebar"));
        assert!(kept.contains("pre-wrap"));
    }

    #[test]
    fn output_names_sort_in_render_order() {
        assert_eq!(output_file_name(0, "Contents"), "0000_contents.pdf");
        assert_eq!(output_file_name(12, "guide/Intro Page.html"), "0012_guide-intro-page-html.pdf");
        assert_eq!(output_file_name(3, "///"), "0003_page.pdf");

        let mut names = vec![output_file_name(10, "b"), output_file_name(9, "a")];
        names.sort();
        assert_eq!(names, vec!["0009_a.pdf", "0010_b.pdf"]);
    }
}
