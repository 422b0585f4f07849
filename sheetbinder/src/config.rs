//! Configuration module for sheetbinder.
//!
//! This module holds everything that steers a batch run:
//! - The page/sheet range model used to select parts of a source
//! - Pairing rules (extensions, recursion, stem case sensitivity)
//! - Guards and output choices (zero-work guard, combined output, compression)
//! - The external renderer used as spreadsheet host
//!
//! A [`Config`] can be loaded from a JSON file and is then threaded explicitly
//! through the matcher, converter and orchestrator.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SheetbinderError};

/// Zero-based, half-open selector over the pages of a document or the sheets
/// of a workbook.
///
/// Absent bounds default to the start and end of the source. Resolution clamps
/// both bounds into `[0, n]`, so a range never fails to resolve: it simply
/// selects fewer (or no) items.
///
/// Textual form follows slice notation:
/// - `":"` or `""` - everything
/// - `"3:5"` - items 3 and 4
/// - `":3"` - the first three items
/// - `"3:"` - item 3 onwards
/// - `"4"` - only item 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageRange {
    /// First selected index (inclusive).
    pub start: Option<i64>,
    /// End of the selection (exclusive).
    pub end: Option<i64>,
}

impl PageRange {
    /// The "everything" sentinel.
    pub const ALL: PageRange = PageRange {
        start: None,
        end: None,
    };

    /// Create a range from optional bounds.
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    /// Select the half-open span `start..end`.
    pub fn span(start: i64, end: i64) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// Select exactly one index.
    pub fn single(index: i64) -> Self {
        Self::span(index, index.saturating_add(1))
    }

    /// Whether both bounds are absent.
    pub fn is_all(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Resolve this range against a source holding `len` items.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheetbinder::config::PageRange;
    ///
    /// assert_eq!(PageRange::span(3, 5).resolve(10), 3..5);
    /// assert_eq!(PageRange::span(3, 5).resolve(4), 3..4);
    /// assert_eq!(PageRange::ALL.resolve(3), 0..3);
    /// assert!(PageRange::span(5, 2).resolve(10).is_empty());
    /// ```
    pub fn resolve(&self, len: usize) -> Range<usize> {
        let clamp = |bound: i64| bound.clamp(0, len as i64) as usize;
        let start = self.start.map_or(0, clamp);
        let end = self.end.map_or(len, clamp);

        if start >= end { start..start } else { start..end }
    }

    /// Parse the slice notation described on [`PageRange`].
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric bounds, step syntax (`1:2:3`) and
    /// negative single indices.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let text = s.trim();

        if text.is_empty() || text == ":" {
            return Ok(Self::ALL);
        }

        let Some((start, end)) = text.split_once(':') else {
            let index: i64 = text
                .parse()
                .with_context(|| format!("Invalid page index: {text}"))?;
            if index < 0 {
                bail!("Single page indices must be zero or positive, got {index}");
            }
            return Ok(Self::single(index));
        };

        if end.contains(':') {
            bail!("Step syntax is not supported in page range: {text}");
        }

        let parse_bound = |bound: &str| -> anyhow::Result<Option<i64>> {
            let bound = bound.trim();
            if bound.is_empty() {
                return Ok(None);
            }
            let value = bound
                .parse()
                .with_context(|| format!("Invalid page bound: {bound}"))?;
            Ok(Some(value))
        };

        Ok(Self::new(parse_bound(start)?, parse_bound(end)?))
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str(":")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        Ok(())
    }
}

impl FromStr for PageRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PageRange {
    type Error = SheetbinderError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
            .map_err(|err| SheetbinderError::invalid_page_range(value.clone(), err.to_string()))
    }
}

impl From<PageRange> for String {
    fn from(range: PageRange) -> Self {
        range.to_string()
    }
}

/// Resolve a list of ranges against a source of `len` items.
///
/// An empty list selects everything. Otherwise each range resolves on its own
/// and the results are concatenated in list order, keeping duplicates.
pub fn resolve_ranges(ranges: &[PageRange], len: usize) -> Vec<usize> {
    if ranges.is_empty() {
        return (0..len).collect();
    }

    ranges.iter().flat_map(|range| range.resolve(len)).collect()
}

/// Compression level for written PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - preserves exact stream contents.
    None,
    /// Compress streams (default).
    #[default]
    Standard,
    /// Compress streams and drop unreferenced objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = SheetbinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(SheetbinderError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// How file stems are compared when pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemCase {
    /// `Jan` and `jan` are different stems.
    Sensitive,
    /// `Jan` and `jan` are the same stem.
    Insensitive,
    /// Follow the platform's usual filesystem behaviour.
    #[default]
    Native,
}

impl StemCase {
    /// Whether stems must match byte for byte.
    pub fn is_case_sensitive(&self) -> bool {
        match self {
            Self::Sensitive => true,
            Self::Insensitive => false,
            Self::Native => !(cfg!(windows) || cfg!(target_os = "macos")),
        }
    }
}

impl FromStr for StemCase {
    type Err = SheetbinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sensitive" => Ok(Self::Sensitive),
            "insensitive" => Ok(Self::Insensitive),
            "native" => Ok(Self::Native),
            _ => Err(SheetbinderError::invalid_config(format!(
                "Invalid stem case: {s}. Must be one of: sensitive, insensitive, native"
            ))),
        }
    }
}

/// External program used to render one sheet to a PDF.
///
/// Arguments may contain the placeholders `{input}`, `{sheet}`,
/// `{sheet_name}`, `{output}` and `{format}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Program to spawn.
    pub program: PathBuf,
    /// Argument template.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Complete configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for source files.
    pub working_dir: PathBuf,

    /// Directory receiving merged outputs (defaults to `<working_dir>/output`).
    pub output_dir: Option<PathBuf>,

    /// Root for per-conversion scratch directories (defaults to the system temp dir).
    pub scratch_dir: Option<PathBuf>,

    /// Scan subdirectories too.
    pub recursive: bool,

    /// Refuse to run a merge over zero inputs.
    pub disallow_zero_merge: bool,

    /// Merge every per-pair output into one combined document.
    pub combine: bool,

    /// Extension of the document side of a pair (without the dot).
    pub document_extension: String,

    /// Extension of the spreadsheet side of a pair (without the dot).
    pub spreadsheet_extension: String,

    /// Stem comparison rule.
    pub stem_case: StemCase,

    /// Pages kept from each document.
    pub document_pages: Vec<PageRange>,

    /// Sheets rendered from each spreadsheet.
    pub sheet_ranges: Vec<PageRange>,

    /// Pages kept from each document in first-page mode.
    pub first_page_ranges: Vec<PageRange>,

    /// Compression applied to written PDFs.
    pub compression: CompressionLevel,

    /// Upper bound for a single host render call, in seconds.
    pub host_timeout_secs: Option<u64>,

    /// External renderer acting as spreadsheet host.
    pub renderer: Option<RendererConfig>,

    /// Suppress non-error output.
    pub quiet: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Answer every confirmation prompt with yes.
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            output_dir: None,
            scratch_dir: None,
            recursive: true,
            disallow_zero_merge: true,
            combine: true,
            document_extension: "pdf".to_string(),
            spreadsheet_extension: "xlsx".to_string(),
            stem_case: StemCase::Native,
            document_pages: vec![PageRange::new(None, Some(3))],
            sheet_ranges: vec![PageRange::span(3, 5)],
            first_page_ranges: vec![PageRange::new(None, Some(1))],
            compression: CompressionLevel::Standard,
            host_timeout_secs: Some(120),
            renderer: None,
            quiet: false,
            verbose: false,
            assume_yes: false,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            SheetbinderError::invalid_config(format!(
                "Cannot read config file {}: {err}",
                path.display()
            ))
        })?;

        serde_json::from_str(&text).map_err(|err| {
            SheetbinderError::invalid_config(format!(
                "Cannot parse config file {}: {err}",
                path.display()
            ))
        })
    }

    /// Effective output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.working_dir.join("output"))
    }

    /// Effective scratch root.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Effective host call timeout.
    pub fn host_timeout(&self) -> Option<Duration> {
        self.host_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An extension is empty or both extensions are equal
    /// - Verbose and quiet modes are both enabled
    /// - The output directory is the working directory
    /// - The host timeout is zero
    pub fn validate(&self) -> Result<()> {
        let document = self.document_extension.trim_start_matches('.');
        let spreadsheet = self.spreadsheet_extension.trim_start_matches('.');

        if document.is_empty() || spreadsheet.is_empty() {
            return Err(SheetbinderError::invalid_config(
                "File extensions must not be empty",
            ));
        }

        if document.eq_ignore_ascii_case(spreadsheet) {
            return Err(SheetbinderError::invalid_config(format!(
                "Document and spreadsheet extensions must differ, both are .{document}"
            )));
        }

        if self.verbose && self.quiet {
            return Err(SheetbinderError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        if self.output_dir() == self.working_dir {
            return Err(SheetbinderError::invalid_config(format!(
                "Output directory cannot be the working directory: {}",
                self.working_dir.display()
            )));
        }

        if self.host_timeout_secs == Some(0) {
            return Err(SheetbinderError::invalid_config(
                "Host timeout must be at least one second",
            ));
        }

        Ok(())
    }
}
