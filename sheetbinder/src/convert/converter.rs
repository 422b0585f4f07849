//! Spreadsheet to PDF conversion.
//!
//! The converter opens a workbook on a [`SpreadsheetHost`], renders the
//! selected sheets one by one into a private scratch directory and folds the
//! renders into a single intermediate PDF.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{Config, PageRange, resolve_ranges};
use crate::convert::host::{HostFault, HostLauncher, RenderFormat, SpreadsheetHost};
use crate::convert::session::{HostLease, WorkbookSession};
use crate::error::{Result, SheetbinderError};
use crate::merge::{DocumentMerger, MergePlan, SourceSelection};
use crate::utils::file_stem;

/// Translate a 0-based sheet position into the host's 1-based index.
pub fn host_sheet_index(index: usize) -> usize {
    index + 1
}

/// Scratch PDF produced by a conversion.
///
/// Lives in its own temporary directory, which is removed when the artifact
/// is discarded or dropped.
#[derive(Debug)]
pub struct IntermediateArtifact {
    path: PathBuf,
    scratch: TempDir,
}

impl IntermediateArtifact {
    /// Location of the intermediate PDF.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the artifact and its scratch directory.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn discard(self) {
        let dir = self.scratch.path().to_path_buf();
        match self.scratch.close() {
            Ok(()) => tracing::debug!(path = %dir.display(), "scratch directory removed"),
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "failed to remove scratch directory")
            }
        }
    }
}

/// Converts selected sheets of a workbook into one intermediate PDF.
#[derive(Debug, Clone)]
pub struct SpreadsheetConverter {
    merger: DocumentMerger,
    scratch_root: PathBuf,
    format: RenderFormat,
}

impl SpreadsheetConverter {
    /// Create a converter placing scratch directories under `scratch_root`.
    pub fn new(merger: DocumentMerger, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            merger,
            scratch_root: scratch_root.into(),
            format: RenderFormat::Pdf,
        }
    }

    /// Create a converter from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            DocumentMerger::with_compression(config.compression),
            config.scratch_dir(),
        )
    }

    /// Launch a host, convert, and release the host again.
    ///
    /// The host is quit on every exit path.
    pub async fn convert<L: HostLauncher>(
        &self,
        launcher: &L,
        spreadsheet: &Path,
        ranges: &[PageRange],
    ) -> Result<IntermediateArtifact> {
        let host = launcher
            .launch()
            .map_err(|fault| SheetbinderError::host_failure(spreadsheet.to_path_buf(), fault))?;
        let mut lease = HostLease::new(host);

        self.convert_with(&mut *lease, spreadsheet, ranges).await
    }

    /// Convert using a host owned by the caller.
    ///
    /// The host is left running; only the workbook is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The host reports a failure (`HostFailure`)
    /// - The ranges select no sheet (`EmptySheetSelection`)
    /// - The renders cannot be merged
    pub async fn convert_with<H: SpreadsheetHost + ?Sized>(
        &self,
        host: &mut H,
        spreadsheet: &Path,
        ranges: &[PageRange],
    ) -> Result<IntermediateArtifact> {
        let scratch = tempfile::Builder::new()
            .prefix("sheetbinder-")
            .tempdir_in(&self.scratch_root)?;

        let renders = self.render_sheets(host, spreadsheet, ranges, scratch.path())?;

        let stem = file_stem(spreadsheet).unwrap_or_else(|| "workbook".to_string());
        let path = scratch.path().join(format!("{stem}_Extracted.pdf"));
        let plan: MergePlan = renders.iter().map(SourceSelection::all).collect();

        let merged = self.merger.merge_to_file(&plan, &path).await;
        remove_renders(&renders);
        let stats = merged?;

        tracing::debug!(
            spreadsheet = %spreadsheet.display(),
            sheets = renders.len(),
            pages = stats.total_pages,
            "spreadsheet converted"
        );

        Ok(IntermediateArtifact { path, scratch })
    }

    fn render_sheets<H: SpreadsheetHost + ?Sized>(
        &self,
        host: &mut H,
        spreadsheet: &Path,
        ranges: &[PageRange],
        scratch: &Path,
    ) -> Result<Vec<PathBuf>> {
        let fail =
            |fault: HostFault| SheetbinderError::host_failure(spreadsheet.to_path_buf(), fault);

        let mut session = WorkbookSession::open(host, spreadsheet).map_err(fail)?;
        let workbook = session.workbook();

        let sheet_count = session.host().sheet_count(workbook).map_err(fail)?;
        let selected = resolve_ranges(ranges, sheet_count);

        if selected.is_empty() {
            return Err(SheetbinderError::EmptySheetSelection {
                spreadsheet: spreadsheet.to_path_buf(),
                sheet_count,
            });
        }

        let mut renders = Vec::with_capacity(selected.len());
        for (position, index) in selected.into_iter().enumerate() {
            let host_index = host_sheet_index(index);
            let name = session.host().sheet_name(workbook, host_index).map_err(fail)?;
            let output = scratch.join(format!(
                "sheet-{position:03}-{}.{}",
                sanitize_sheet_name(&name),
                self.format.extension()
            ));

            tracing::debug!(sheet = host_index, name = %name, "rendering sheet");
            session
                .host()
                .render_sheet(workbook, host_index, &output, self.format)
                .map_err(fail)?;

            renders.push(output);
        }

        Ok(renders)
    }
}

fn remove_renders(renders: &[PathBuf]) {
    for render in renders {
        if let Err(err) = std::fs::remove_file(render) {
            tracing::warn!(path = %render.display(), error = %err, "failed to remove sheet render");
        }
    }
}

fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
