//! Error types for sheetbinder.
//!
//! This module defines all error types that can occur while pairing,
//! converting and merging. Errors are designed to be informative and
//! actionable, providing clear context about what went wrong and how to fix it.
//!
//! # Error Categories
//!
//! - **Configuration Errors**: ambiguous pairings, invalid settings
//! - **Host Errors**: failures reported by the spreadsheet rendering host
//! - **PDF Errors**: missing, corrupted or encrypted source documents
//! - **Output Errors**: problems writing merged documents

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::convert::HostFault;

/// Result type alias for sheetbinder operations.
pub type Result<T> = std::result::Result<T, SheetbinderError>;

/// Main error type for sheetbinder operations.
#[derive(Debug)]
pub enum SheetbinderError {
    /// Input file was not found.
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input path exists but is not a regular file.
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// Failed to load PDF file.
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// PDF file is corrupted or has invalid structure.
    CorruptedPdf {
        /// Path to the corrupted PDF.
        path: PathBuf,
        /// Details about the corruption.
        details: String,
    },

    /// PDF file is encrypted and cannot be processed.
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// A merge plan without any sources was submitted.
    NoFilesToMerge,

    /// The zero-work guard refused to run a merge over nothing.
    NothingToMerge {
        /// What was about to be merged.
        context: String,
    },

    /// Two files under the same extension share a stem, so pairing is ambiguous.
    DuplicateStems {
        /// Extension group that contains the duplicates.
        extension: String,
        /// Every path involved in a collision.
        paths: Vec<PathBuf>,
    },

    /// The spreadsheet host reported a failure.
    HostFailure {
        /// Spreadsheet being converted when the host failed.
        spreadsheet: PathBuf,
        /// Structured failure information from the host.
        fault: HostFault,
    },

    /// The requested sheet ranges select no sheets at all.
    EmptySheetSelection {
        /// Spreadsheet being converted.
        spreadsheet: PathBuf,
        /// Number of sheets the workbook actually has.
        sheet_count: usize,
    },

    /// Failed to create output file.
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Page range text could not be parsed.
    InvalidPageRange {
        /// The offending range text.
        range: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Merge operation failed.
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// Invalid configuration.
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Operator declined to continue.
    Cancelled,

    /// Generic I/O error.
    Io {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Generic error with a custom message.
    Other {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for SheetbinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound { path } => {
                write!(f, "File not found: {}", path.display())
            }
            Self::NotAFile { path } => {
                write!(f, "Not a file: {}", path.display())
            }
            Self::FailedToLoadPdf { path, reason } => {
                write!(
                    f,
                    "Failed to load PDF: {}\n  Reason: {}",
                    path.display(),
                    reason
                )
            }
            Self::CorruptedPdf { path, details } => {
                write!(
                    f,
                    "Corrupted or invalid PDF: {}\n  Details: {}",
                    path.display(),
                    details
                )
            }
            Self::EncryptedPdf { path } => {
                write!(
                    f,
                    "PDF is encrypted and cannot be processed: {}\n  \
                     Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
                    path.display()
                )
            }
            Self::NoFilesToMerge => {
                write!(f, "No input files specified for merging")
            }
            Self::NothingToMerge { context } => {
                write!(f, "Cannot merge zero files together: {context}")
            }
            Self::DuplicateStems { extension, paths } => {
                write!(
                    f,
                    "Ambiguous pairing: several .{extension} files share a name\n  \
                     Remove or rename them to continue:"
                )?;
                for path in paths {
                    write!(f, "\n    {}", path.display())?;
                }
                Ok(())
            }
            Self::HostFailure { spreadsheet, fault } => {
                write!(
                    f,
                    "Failed to convert spreadsheet: {}\n  {}",
                    spreadsheet.display(),
                    fault
                )
            }
            Self::EmptySheetSelection {
                spreadsheet,
                sheet_count,
            } => {
                write!(
                    f,
                    "No sheets selected in: {}\n  \
                     The workbook has {} sheet(s); adjust the sheet ranges",
                    spreadsheet.display(),
                    sheet_count
                )
            }
            Self::FailedToCreateOutput { path, source } => {
                write!(
                    f,
                    "Failed to create output file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::FailedToWrite { path, source } => {
                write!(
                    f,
                    "Failed to write to output file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::InvalidPageRange { range, reason } => {
                write!(f, "Invalid page range '{range}': {reason}")
            }
            Self::MergeFailed { reason } => {
                write!(f, "Merge operation failed: {reason}")
            }
            Self::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {message}")
            }
            Self::Cancelled => {
                write!(f, "Operation cancelled by user")
            }
            Self::Io { source } => {
                write!(f, "I/O error: {source}")
            }
            Self::Other { message } => {
                write!(f, "{message}")
            }
        }
    }
}

impl std::error::Error for SheetbinderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FailedToCreateOutput { source, .. } => Some(source),
            Self::FailedToWrite { source, .. } => Some(source),
            Self::HostFailure { fault, .. } => Some(fault),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for SheetbinderError {
    fn from(err: io::Error) -> Self {
        Self::Io { source: err }
    }
}

impl From<lopdf::Error> for SheetbinderError {
    fn from(err: lopdf::Error) -> Self {
        Self::merge_failed(err.to_string())
    }
}

impl From<anyhow::Error> for SheetbinderError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl SheetbinderError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path,
            reason: reason.into(),
        }
    }

    /// Create a CorruptedPdf error.
    pub fn corrupted_pdf(path: PathBuf, details: impl Into<String>) -> Self {
        Self::CorruptedPdf {
            path,
            details: details.into(),
        }
    }

    /// Create an EncryptedPdf error.
    pub fn encrypted_pdf(path: PathBuf) -> Self {
        Self::EncryptedPdf { path }
    }

    /// Create a NothingToMerge error.
    pub fn nothing_to_merge(context: impl Into<String>) -> Self {
        Self::NothingToMerge {
            context: context.into(),
        }
    }

    /// Translate a host fault raised while converting `spreadsheet`.
    pub fn host_failure(spreadsheet: PathBuf, fault: HostFault) -> Self {
        Self::HostFailure { spreadsheet, fault }
    }

    /// Create an InvalidPageRange error.
    pub fn invalid_page_range(range: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPageRange {
            range: range.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::FailedToLoadPdf { .. } => 3,
            Self::CorruptedPdf { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::NoFilesToMerge => 1,
            Self::NothingToMerge { .. } => 1,
            Self::DuplicateStems { .. } => 1,
            Self::HostFailure { .. } => 7,
            Self::EmptySheetSelection { .. } => 7,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::InvalidPageRange { .. } => 1,
            Self::MergeFailed { .. } => 6,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 0,
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
