//! PDF writing and saving operations.
//!
//! Writes are always atomic: the document is saved next to its destination
//! under a `.partial` name and renamed into place once fully flushed. A failed
//! write leaves neither the partial file nor a truncated output behind.
//!
//! # Examples
//!
//! ```no_run
//! use sheetbinder::io::writer::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # async fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! writer.save(doc, Path::new("output/Jan_Merged.pdf")).await?;
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::config::CompressionLevel;
use crate::error::{Result, SheetbinderError};
use crate::utils::format_file_size;

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Whether compression was applied.
    pub compressed: bool,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable compression.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    compression: CompressionLevel,
    buffer_size: usize,
}

impl PdfWriter {
    /// Create a new PDF writer with standard compression.
    pub fn new() -> Self {
        Self::with_compression(CompressionLevel::Standard)
    }

    /// Create a writer with the given compression level.
    pub fn with_compression(compression: CompressionLevel) -> Self {
        Self {
            compression,
            buffer_size: 8192,
        }
    }

    /// Path of the temporary file used while writing `path`.
    pub fn partial_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".partial");
        path.with_file_name(name)
    }

    /// Save a PDF document to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output directory doesn't exist
    /// - Insufficient permissions
    /// - Write operation fails
    pub async fn save(&self, doc: Document, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let compression = self.compression;
        let buffer_size = self.buffer_size;

        let stats = task::spawn_blocking(move || {
            let mut doc = doc;
            let start = Instant::now();

            match compression {
                CompressionLevel::None => {}
                CompressionLevel::Standard => doc.compress(),
                CompressionLevel::Maximum => {
                    doc.prune_objects();
                    doc.compress();
                    doc.renumber_objects();
                }
            }

            let write_path = Self::partial_path(&path_buf);

            if let Err(err) = write_document(&mut doc, &write_path, buffer_size) {
                let _ = std::fs::remove_file(&write_path);
                return Err(err);
            }

            if let Err(source) = std::fs::rename(&write_path, &path_buf) {
                let _ = std::fs::remove_file(&write_path);
                return Err(SheetbinderError::FailedToWrite {
                    path: path_buf,
                    source,
                });
            }

            let file_size = std::fs::metadata(&path_buf).map(|m| m.len()).unwrap_or(0);

            Ok::<_, SheetbinderError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
                compressed: compression != CompressionLevel::None,
            })
        })
        .await
        .map_err(|e| SheetbinderError::other(format!("Write task failed: {e}")))??;

        tracing::info!(
            path = %stats.output_path.display(),
            size = %stats.format_file_size(),
            "wrote pdf"
        );

        Ok(stats)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_document(doc: &mut Document, write_path: &Path, buffer_size: usize) -> Result<()> {
    let file = std::fs::File::create(write_path).map_err(|e| {
        SheetbinderError::FailedToCreateOutput {
            path: write_path.to_path_buf(),
            source: e,
        }
    })?;

    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);

    doc.save_to(&mut writer)
        .map_err(|e| SheetbinderError::FailedToWrite {
            path: write_path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    writer.flush().map_err(|e| SheetbinderError::FailedToWrite {
        path: write_path.to_path_buf(),
        source: e,
    })
}
