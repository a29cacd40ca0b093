use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use site2pdf::{plan_site, ConvertOptions, IndexerConfig, OrderEntry, PdfMerger, Plan, SiteConverter};
use slug::slugify;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tokio::fs;

#[derive(Parser)]
#[command(name = "site2pdf")]
#[command(about = "CLI utility to turn a locally mirrored website into a single ordered PDF")]
#[command(version = "0.1.0")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a mirrored site directory into one PDF
    Convert {
        /// Root directory of the mirrored site
        root: PathBuf,

        /// Output PDF file (defaults to the root directory name)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Maximum number of pages to convert
        #[arg(long = "max-pages", value_parser = parse_max_pages)]
        max_pages: Option<usize>,

        /// Don't generate a table of contents page
        #[arg(long = "no-toc")]
        no_toc: bool,

        /// Keep sidebars and navigation bars in the rendered pages
        #[arg(long = "keep-navigation")]
        keep_navigation: bool,

        /// Keep the per-page PDFs in this directory
        #[arg(short = 'p', long = "pages-dir")]
        pages_dir: Option<PathBuf>,

        /// Per-page render timeout in seconds
        #[arg(short = 't', long = "timeout", default_value = "60.0", value_parser = parse_timeout)]
        timeout: f64,
    },
    /// Print the page order without rendering anything
    Plan {
        /// Root directory of the mirrored site
        root: PathBuf,

        /// Maximum number of pages to include
        #[arg(long = "max-pages", value_parser = parse_max_pages)]
        max_pages: Option<usize>,

        /// Leave the table of contents out of the order
        #[arg(long = "no-toc")]
        no_toc: bool,

        /// Print the start page, order and page registry as JSON
        #[arg(long = "json")]
        json: bool,
    },
    /// Merge existing PDF files into a single document
    Merge {
        /// Directory containing PDF files to merge
        #[arg(short = 'd', long = "dir", default_value = "pages")]
        input_dir: String,

        /// Output file path for the merged PDF
        #[arg(short = 'o', long = "output", default_value = "merged.pdf")]
        output_file: String,
    },
}

fn parse_timeout(s: &str) -> Result<f64, String> {
    let value = s.parse::<f64>().map_err(|_| "Not a number.")?;
    if value <= 0.0 {
        return Err("Must be a positive number.".to_string());
    }
    Ok(value)
}

fn parse_max_pages(s: &str) -> Result<usize, String> {
    let value = s.parse::<usize>().map_err(|_| "Not a whole number.")?;
    if value == 0 {
        return Err("Must be at least 1.".to_string());
    }
    Ok(value)
}

fn default_output(root: &Path) -> PathBuf {
    let name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| slugify(n.to_string_lossy())))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "website".to_string());
    PathBuf::from(format!("{}.pdf", name))
}

fn check_root(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(anyhow::anyhow!("Directory '{}' does not exist", root.display()));
    }
    Ok(())
}

async fn convert(options: ConvertOptions) -> Result<()> {
    check_root(&options.root)?;

    let summary = SiteConverter::new(options).run().await?;

    if !summary.skipped.is_empty() {
        for label in &summary.skipped {
            info!("  skipped: {}", label.yellow());
        }
    }
    info!("Conversion finished: {} entries, {} PDF pages in {}",
          summary.rendered,
          summary.pdf_pages,
          summary.output.display().to_string().green());
    Ok(())
}

fn print_plan(plan: &Plan, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }

    match &plan.start {
        Some(start) => println!("Start page: {}", plan.registry.display_path(start).green()),
        None => println!("Start page: {}", "none".yellow()),
    }
    for (i, entry) in plan.order.entries().iter().enumerate() {
        match entry {
            OrderEntry::TableOfContents => println!("{:>4}. {}", i + 1, "[table of contents]".blue()),
            OrderEntry::Page(path) => {
                let title = plan
                    .registry
                    .get(path)
                    .map(|record| record.title.as_str())
                    .unwrap_or_default();
                println!("{:>4}. {}  {}", i + 1, title, plan.registry.display_path(path).blue());
            }
        }
    }
    Ok(())
}

async fn merge_pdfs(input_dir: &str, output_file: &str) -> Result<()> {
    let input_path = PathBuf::from(input_dir);

    if !input_path.exists() {
        return Err(anyhow::anyhow!("Input directory '{}' does not exist", input_dir));
    }

    info!("Scanning directory: {}", input_dir.green());

    let mut entries = fs::read_dir(&input_path).await?;
    let mut pdf_files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "pdf") {
            pdf_files.push(path);
        }
    }

    if pdf_files.is_empty() {
        return Err(anyhow::anyhow!("No PDF files found in '{}'", input_dir));
    }

    // Page files are numbered in render order
    pdf_files.sort();

    info!("Found {} PDF files to merge", pdf_files.len());

    let mut merger = PdfMerger::new();
    for pdf_path in &pdf_files {
        info!("Adding: {}", pdf_path.display());
        if let Err(e) = merger.add_pdf(pdf_path).await {
            error!("Failed to add PDF {}: {}", pdf_path.display(), e);
        }
    }

    let output_path = PathBuf::from(output_file);
    merger.save(&output_path).await?;

    info!("Successfully merged {} PDFs into: {}",
          merger.len(),
          output_path.display().to_string().green());

    Ok(())
}

#[tokio::main]
async fn main() {
    // Set up logging with chromiumoxide errors suppressed
    let filter = EnvFilter::from_default_env()
        .add_directive("chromiumoxide::conn=off".parse().unwrap())
        .add_directive("chromiumoxide::handler=off".parse().unwrap())
        .add_directive("site2pdf=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Convert { root, output, max_pages, no_toc, keep_navigation, pages_dir, timeout } => {
            let output = output.unwrap_or_else(|| default_output(&root));
            let mut options = ConvertOptions::new(root, output);
            options.max_pages = max_pages;
            options.include_toc = !no_toc;
            options.hide_navigation = !keep_navigation;
            options.pages_dir = pages_dir;
            options.timeout = Duration::from_secs_f64(timeout);
            convert(options).await
        }
        Commands::Plan { root, max_pages, no_toc, json } => {
            check_root(&root)
                .and_then(|_| Ok(plan_site(&root, &IndexerConfig::default(), max_pages, !no_toc)?))
                .and_then(|plan| print_plan(&plan, json))
        }
        Commands::Merge { input_dir, output_file } => {
            merge_pdfs(&input_dir, &output_file).await
        }
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        process::exit(1);
    }
}
