//! The spreadsheet host boundary.
//!
//! A host is whatever can open a workbook and render its sheets to pages: an
//! office suite driven over automation, a headless converter process, or a
//! scripted double in tests. Sheet indices on this boundary are 1-based.

use std::fmt;
use std::path::Path;

/// Opaque handle for a workbook opened on a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkbookId(pub u64);

/// Output format requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    /// Portable Document Format.
    #[default]
    Pdf,
}

impl RenderFormat {
    /// Numeric format code understood by office automation hosts.
    pub fn code(&self) -> i32 {
        match self {
            Self::Pdf => 57,
        }
    }

    /// File extension of rendered output.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
        }
    }
}

/// Optional detail some hosts attach to a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedFaultInfo {
    /// Component that raised the failure.
    pub source: Option<String>,
    /// Human readable detail.
    pub description: Option<String>,
    /// Help file reference.
    pub help_file: Option<String>,
    /// Topic id inside the help file.
    pub help_id: Option<i64>,
}

/// Failure reported by a spreadsheet host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFault {
    /// Host error code.
    pub code: i64,
    /// Host error message.
    pub message: String,
    /// Extended detail, when the host supplied any.
    pub extended: Option<ExtendedFaultInfo>,
}

impl HostFault {
    /// Create a fault without extended detail.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            extended: None,
        }
    }

    /// Attach extended detail.
    pub fn with_extended(mut self, extended: ExtendedFaultInfo) -> Self {
        self.extended = Some(extended);
        self
    }
}

impl fmt::Display for HostFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spreadsheet host failed with code {}: {}",
            self.code, self.message
        )?;

        let Some(extended) = &self.extended else {
            return Ok(());
        };

        if let Some(source) = &extended.source {
            write!(f, "\n  Source: {source}")?;
        }
        if let Some(description) = &extended.description {
            write!(f, "\n  Message: {description}")?;
        }
        if let Some(help_file) = &extended.help_file {
            write!(f, "\n  More info: {help_file}")?;
            if let Some(help_id) = extended.help_id {
                write!(f, " (id={help_id})")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HostFault {}

/// Result of a host call.
pub type HostResult<T> = std::result::Result<T, HostFault>;

/// A running spreadsheet host.
///
/// Implementations are driven through `&mut self`, one call at a time.
pub trait SpreadsheetHost {
    /// Show or hide the host's user interface.
    fn set_visible(&mut self, visible: bool) -> HostResult<()>;

    /// Suppress (or re-enable) interactive alert prompts.
    fn set_alerts_suppressed(&mut self, suppressed: bool) -> HostResult<()>;

    /// Open a workbook.
    fn open_workbook(&mut self, path: &Path) -> HostResult<WorkbookId>;

    /// Number of sheets in an open workbook.
    fn sheet_count(&mut self, workbook: WorkbookId) -> HostResult<usize>;

    /// Name of the sheet at 1-based `index`.
    fn sheet_name(&mut self, workbook: WorkbookId, index: usize) -> HostResult<String>;

    /// Render the sheet at 1-based `index` to `output`.
    fn render_sheet(
        &mut self,
        workbook: WorkbookId,
        index: usize,
        output: &Path,
        format: RenderFormat,
    ) -> HostResult<()>;

    /// Close an open workbook without saving.
    fn close_workbook(&mut self, workbook: WorkbookId) -> HostResult<()>;

    /// Shut the host down.
    fn quit(&mut self) -> HostResult<()>;
}

/// Starts hosts on demand.
pub trait HostLauncher {
    /// Host type produced by this launcher.
    type Host: SpreadsheetHost;

    /// Start a new host.
    fn launch(&self) -> HostResult<Self::Host>;
}
