//! sheetbinder - Bind spreadsheets to their matching PDF documents.
//!
//! This library pairs `.pdf` and `.xlsx` files by stem, renders selected
//! sheets of each workbook to PDF through an external spreadsheet host, and
//! merges the document's pages with the rendered sheets into one file per
//! pair. It supports:
//!
//! - Stem pairing over flat or recursive directory scans
//! - Python-style page and sheet ranges
//! - Pluggable spreadsheet hosts with guaranteed workbook cleanup
//! - Per-pair failure isolation
//! - Combining every output, or every document's first pages, into one PDF
//!
//! # Examples
//!
//! ## Batch Run
//!
//! ```no_run
//! use sheetbinder::config::Config;
//! use sheetbinder::convert::CommandRenderer;
//! use sheetbinder::orchestrator::ConversionOrchestrator;
//! use sheetbinder::pairing::PairMatcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let pairs = PairMatcher::from_config(&config)
//!     .match_dir(&config.working_dir)?
//!     .into_pairs();
//!
//! let renderer = CommandRenderer::new("render-sheet", Vec::new());
//! let report = ConversionOrchestrator::new(config)
//!     .run(&renderer, &pairs)
//!     .await?;
//! println!("{} pair(s) merged", report.succeeded());
//! # Ok(())
//! # }
//! ```
//!
//! ## Merging Page Selections
//!
//! ```no_run
//! use sheetbinder::config::PageRange;
//! use sheetbinder::merge::{DocumentMerger, MergePlan};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut plan = MergePlan::new();
//! plan.push_ranges("Jan.pdf", &[PageRange::new(None, Some(3))])
//!     .push_all("Jan_Extracted.pdf");
//!
//! let stats = DocumentMerger::new()
//!     .merge_to_file(&plan, Path::new("Jan_Merged.pdf"))
//!     .await?;
//! println!("Wrote {} pages", stats.total_pages);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod convert;
pub mod error;
pub mod io;
pub mod merge;
pub mod orchestrator;
pub mod output;
pub mod pairing;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, PageRange};
pub use error::{Result, SheetbinderError};
pub use orchestrator::{BatchReport, ConversionOrchestrator};
pub use pairing::{FilePair, PairMatcher};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
