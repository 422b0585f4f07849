//! PDF reading and loading operations.
//!
//! Every source is checked before parsing so that callers get an error naming
//! the offending path:
//! - Missing files and directories are rejected up front
//! - Parsing runs on the blocking pool
//! - Encrypted documents are refused
//!
//! # Examples
//!
//! ```no_run
//! use sheetbinder::io::reader::PdfReader;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("Jan.pdf")).await?;
//! println!("{} pages", loaded.page_count);
//! # Ok(())
//! # }
//! ```

use futures::future::try_join_all;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{Result, SheetbinderError};

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to load the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

impl LoadedPdf {
    fn new(document: Document, path: PathBuf, load_time: Duration, file_size: u64) -> Self {
        let page_count = document.get_pages().len();

        Self {
            document,
            path,
            page_count,
            load_time,
            file_size,
        }
    }
}

/// PDF reader.
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new PDF reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path does not exist or is not a regular file
    /// - The file is not a valid PDF
    /// - The PDF is encrypted
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let path_buf = path.to_path_buf();

        let metadata = tokio::fs::metadata(&path_buf)
            .await
            .map_err(|_| SheetbinderError::file_not_found(path_buf.clone()))?;

        if !metadata.is_file() {
            return Err(SheetbinderError::not_a_file(path_buf));
        }

        let start = Instant::now();

        let load_path = path_buf.clone();
        let document = task::spawn_blocking(move || Document::load(&load_path))
            .await
            .map_err(|e| SheetbinderError::other(format!("Load task failed: {e}")))?
            .map_err(|e| {
                let err_msg = e.to_string();
                if err_msg.contains("encrypt") || err_msg.contains("password") {
                    SheetbinderError::encrypted_pdf(path_buf.clone())
                } else {
                    SheetbinderError::failed_to_load_pdf(path_buf.clone(), err_msg)
                }
            })?;

        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(SheetbinderError::encrypted_pdf(path_buf));
        }

        if document.catalog().is_err() {
            return Err(SheetbinderError::corrupted_pdf(
                path_buf,
                "Document has no catalog",
            ));
        }

        let load_time = start.elapsed();

        tracing::debug!(path = %path_buf.display(), ?load_time, "loaded pdf");

        Ok(LoadedPdf::new(
            document,
            path_buf,
            load_time,
            metadata.len(),
        ))
    }

    /// Load several documents concurrently.
    ///
    /// Results keep the order of `paths`. The first failure aborts the whole
    /// batch.
    pub async fn load_all(&self, paths: &[&Path]) -> Result<Vec<LoadedPdf>> {
        try_join_all(paths.iter().map(|path| self.load(path))).await
    }
}
