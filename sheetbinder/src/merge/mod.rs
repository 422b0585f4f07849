//! PDF merging operations.
//!
//! This module provides the page-level merge engine:
//! - Merge plans listing sources and their page ranges
//! - Page selection, including repeated pages
//! - Atomic output
//!
//! # Examples
//!
//! ```no_run
//! use sheetbinder::merge::{DocumentMerger, MergePlan};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut plan = MergePlan::new();
//! plan.push_all("a.pdf").push_all("b.pdf");
//!
//! let stats = DocumentMerger::new()
//!     .merge_to_file(&plan, Path::new("merged.pdf"))
//!     .await?;
//! println!("Merged {} pages", stats.total_pages);
//! # Ok(())
//! # }
//! ```

pub mod merger;
pub mod pages;
pub mod plan;

pub use merger::{DocumentMerger, MergeResult, MergeStatistics};
pub use plan::{MergePlan, SourceSelection};
