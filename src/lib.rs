//! # site2pdf
//!
//! A CLI utility to convert a locally mirrored website (for example an
//! HTTrack download) into a single ordered PDF.
//!
//! ## How pages are ordered
//!
//! - The start page's sidebar (`aside.sidebar` or `ul.sidebar-links`) gives
//!   the order when it has links
//! - Otherwise pages are visited breadth-first along the link graph
//! - Pages reached by neither are appended in indexing order
//! - An optional table of contents goes first
//!
//! ## Usage
//!
//! ```bash
//! site2pdf convert ./mirror/docs.example.com -o docs.pdf --max-pages 200
//! site2pdf plan ./mirror/docs.example.com --json
//! ```

pub mod config;
pub mod converter;
pub mod error;
pub mod indexer;
pub mod order;
pub mod page;
mod pdf_merger;
mod renderer;
pub mod resolver;
pub mod start_page;
pub mod toc;

#[cfg(test)]
mod test_helpers;

pub use config::{ConvertOptions, IndexerConfig, PdfOptions};
pub use converter::{plan_site, ConversionSummary, Plan, SiteConverter};
pub use error::SiteError;
pub use indexer::index_site;
pub use order::{build_order, OrderEntry, PageOrder};
pub use page::{PageRecord, Registry};
pub use pdf_merger::PdfMerger;
pub use renderer::PdfRenderer;
pub use resolver::LinkResolver;
pub use start_page::select_start;
pub use toc::generate_toc;
