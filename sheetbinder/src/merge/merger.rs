//! Core PDF merging implementation.
//!
//! Sources are loaded concurrently, then spliced one after another into a
//! single object table. Each source's pages get their inherited attributes
//! pushed down, the selected pages are re-parented under one new page tree
//! and everything no longer reachable is pruned.

use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::CompressionLevel;
use crate::error::{Result, SheetbinderError};
use crate::io::{LoadedPdf, PdfReader, PdfWriter};
use crate::merge::pages::{flatten_inherited_attributes, install_page_tree, select_pages};
use crate::merge::plan::{MergePlan, SourceSelection};
use crate::utils::format_file_size;

/// Statistics about a merge operation.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of sources merged.
    pub files_merged: usize,

    /// Total number of pages in merged document.
    pub total_pages: usize,

    /// Total time taken for merge.
    pub merge_time: Duration,

    /// Time taken to load all sources.
    pub load_time: Duration,

    /// Total size of input files.
    pub input_size: u64,

    /// Size of the written file, zero until written.
    pub output_size: u64,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Result of an in-memory merge.
pub struct MergeResult {
    /// The merged PDF document.
    pub document: Document,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,

    /// Paths of files that were merged, in plan order.
    pub merged_files: Vec<PathBuf>,
}

/// Concatenates selected pages of several PDFs into one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentMerger {
    reader: PdfReader,
    writer: PdfWriter,
}

impl DocumentMerger {
    /// Create a merger with standard compression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a merger writing with the given compression level.
    pub fn with_compression(compression: CompressionLevel) -> Self {
        Self {
            reader: PdfReader::new(),
            writer: PdfWriter::with_compression(compression),
        }
    }

    /// Merge the plan into an in-memory document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The plan is empty
    /// - Any source cannot be loaded (the error names the source)
    /// - The page tree of a source is unusable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use sheetbinder::merge::{DocumentMerger, MergePlan};
    /// # use sheetbinder::config::PageRange;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut plan = MergePlan::new();
    /// plan.push_ranges("Jan.pdf", &[PageRange::new(None, Some(3))])
    ///     .push_all("Jan_Extracted.pdf");
    ///
    /// let result = DocumentMerger::new().merge(&plan).await?;
    /// println!("{} pages", result.statistics.total_pages);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn merge(&self, plan: &MergePlan) -> Result<MergeResult> {
        if plan.is_empty() {
            return Err(SheetbinderError::NoFilesToMerge);
        }

        let merge_start = Instant::now();

        let loaded = self.reader.load_all(&plan.paths()).await?;
        let load_time = merge_start.elapsed();

        let input_size = loaded.iter().map(|p| p.file_size).sum();
        let merged_files: Vec<PathBuf> = loaded.iter().map(|p| p.path.clone()).collect();

        let document = splice(plan.sources(), loaded)?;
        let total_pages = document.get_pages().len();

        tracing::debug!(
            sources = merged_files.len(),
            pages = total_pages,
            "merged document assembled"
        );

        Ok(MergeResult {
            document,
            statistics: MergeStatistics {
                files_merged: merged_files.len(),
                total_pages,
                merge_time: merge_start.elapsed(),
                load_time,
                input_size,
                output_size: 0,
            },
            merged_files,
        })
    }

    /// Merge the plan and write the result atomically to `output`.
    ///
    /// On failure nothing exists at `output`.
    pub async fn merge_to_file(&self, plan: &MergePlan, output: &Path) -> Result<MergeStatistics> {
        let result = self.merge(plan).await?;
        let mut statistics = result.statistics;

        let written = self.writer.save(result.document, output).await?;
        statistics.output_size = written.file_size;
        statistics.merge_time += written.write_time;

        Ok(statistics)
    }
}

/// Splice loaded sources into one document following their selections.
fn splice(selections: &[SourceSelection], loaded: Vec<LoadedPdf>) -> Result<Document> {
    let version = loaded
        .first()
        .map(|p| p.document.version.clone())
        .unwrap_or_else(|| "1.5".to_string());

    let mut merged = Document::with_version(version);
    let mut next_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();

    for (selection, source) in selections.iter().zip(loaded) {
        let mut doc = source.document;

        flatten_inherited_attributes(&mut doc);
        doc.renumber_objects_with(next_id);

        let selected = select_pages(&mut doc, &selection.ranges).map_err(|e| {
            SheetbinderError::corrupted_pdf(source.path.clone(), e.to_string())
        })?;

        tracing::debug!(
            path = %source.path.display(),
            available = source.page_count,
            selected = selected.len(),
            "selected pages"
        );

        next_id = doc.max_id + 1;
        page_ids.extend(selected);
        merged.objects.extend(doc.objects);
    }

    merged.max_id = next_id - 1;

    install_page_tree(&mut merged, &page_ids)?;

    merged.prune_objects();
    merged.renumber_objects();

    Ok(merged)
}
