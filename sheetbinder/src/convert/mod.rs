//! Spreadsheet conversion through an external host.
//!
//! - [`host`]: the host trait, its launcher and structured host faults
//! - [`session`]: drop guards that close workbooks and release hosts
//! - [`converter`]: renders selected sheets and folds them into one PDF
//! - [`command`]: a host that drives an external renderer program
//! - [`workbook`]: sheet listing straight from `.xlsx` files
//!
//! # Examples
//!
//! ```no_run
//! use sheetbinder::config::{Config, PageRange};
//! use sheetbinder::convert::{CommandRenderer, SpreadsheetConverter};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let renderer = CommandRenderer::new("render-sheet", Vec::new());
//! let converter = SpreadsheetConverter::from_config(&config);
//!
//! let artifact = converter
//!     .convert(&renderer, Path::new("Jan.xlsx"), &[PageRange::span(3, 5)])
//!     .await?;
//! println!("{}", artifact.path().display());
//! artifact.discard();
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod converter;
pub mod host;
pub mod session;
pub mod workbook;

pub use command::{CommandHost, CommandRenderer};
pub use converter::{IntermediateArtifact, SpreadsheetConverter, host_sheet_index};
pub use host::{
    ExtendedFaultInfo, HostFault, HostLauncher, HostResult, RenderFormat, SpreadsheetHost,
    WorkbookId,
};
pub use session::{HostLease, WorkbookSession};
pub use workbook::{WorkbookError, sheet_names};
