//! CLI argument parsing for sheetbinder.
//!
//! This module defines the command-line interface structure using `clap` and
//! turns parsed arguments into a [`Config`]. Values from `--config` are
//! applied first; flags given on the command line override them.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sheetbinder::config::{CompressionLevel, Config, PageRange, RendererConfig, StemCase};
use sheetbinder::error::{Result, SheetbinderError};

/// Bind spreadsheets to their matching PDF documents.
///
/// sheetbinder pairs `.pdf` and `.xlsx` files by name, renders selected
/// sheets of each workbook to PDF and appends them to the document's leading
/// pages. Every merged file can then be combined into one.
#[derive(Parser, Debug)]
#[command(name = "sheetbinder")]
#[command(version)]
#[command(about = "Bind spreadsheets to their matching PDF documents", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operations offered by the binary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pair, convert and merge every document with its spreadsheet
    ///
    /// Each pair produces `<stem>_Merged.pdf` in the output directory.
    /// Unless --no-combine is given, all outputs are then merged into
    /// `Combined_1-<N>.pdf`.
    Bind(BindArgs),

    /// Merge the first pages of every document into one file
    ///
    /// Writes `Combined_First_Pages_1-<N>.pdf` to the output directory.
    FirstPages(FirstPagesArgs),

    /// List matched pairs and unmatched files without converting anything
    Scan(ScanArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Use the current directory as working directory
    ///
    /// By default the parent of the current directory is scanned.
    #[arg(long, conflicts_with = "dir")]
    pub root_as_working_dir: bool,

    /// Scan this directory instead
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Write outputs here (default: <working dir>/output)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Load settings from a JSON file before applying flags
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only scan the working directory itself, not its subdirectories
    #[arg(long)]
    pub flat: bool,

    /// Succeed with no output when there is nothing to merge
    #[arg(long)]
    pub allow_empty: bool,

    /// How file names are compared when pairing
    #[arg(long, value_name = "CASE")]
    #[arg(value_parser = ["sensitive", "insensitive", "native"])]
    pub case: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show details and debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options of `bind`.
#[derive(Args, Debug, Clone, Default)]
pub struct BindArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Document pages to keep, in slice notation (default ":3")
    ///
    /// Repeat to select several ranges. Indices start at 0 and the end is
    /// exclusive, so ":3" keeps the first three pages.
    #[arg(long = "pages", value_name = "RANGE", allow_hyphen_values = true)]
    #[arg(value_parser = parse_range)]
    pub pages: Vec<PageRange>,

    /// Sheets to render, in slice notation (default "3:5")
    ///
    /// "3:5" renders the fourth and fifth sheet.
    #[arg(long = "sheets", value_name = "RANGE", allow_hyphen_values = true)]
    #[arg(value_parser = parse_range)]
    pub sheets: Vec<PageRange>,

    /// Do not merge the outputs into one combined file
    #[arg(long)]
    pub no_combine: bool,

    /// Program that renders one sheet to PDF
    #[arg(long, value_name = "PROGRAM")]
    pub renderer: Option<PathBuf>,

    /// Argument passed to the renderer (repeatable)
    ///
    /// Supports {input}, {sheet}, {sheet_name}, {output} and {format}.
    #[arg(long = "renderer-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub renderer_args: Vec<String>,

    /// Seconds a single sheet render may take
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Compression level for written PDFs
    #[arg(short, long, value_name = "LEVEL")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: Option<String>,
}

/// Options of `first-pages`.
#[derive(Args, Debug, Clone, Default)]
pub struct FirstPagesArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Pages to take from each document (default ":1")
    #[arg(long = "pages", value_name = "RANGE", allow_hyphen_values = true)]
    #[arg(value_parser = parse_range)]
    pub pages: Vec<PageRange>,

    /// Compression level for the written PDF
    #[arg(short, long, value_name = "LEVEL")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: Option<String>,
}

/// Options of `scan`.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Print the pairing report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_range(s: &str) -> std::result::Result<PageRange, String> {
    PageRange::parse(s).map_err(|e| e.to_string())
}

/// Pick the directory to scan.
///
/// An explicit directory wins; otherwise the tool runs from a folder inside
/// the working directory, so the parent of `cwd` is used unless the caller
/// asks for `cwd` itself.
pub fn resolve_working_dir(cwd: &Path, root_as_working_dir: bool, dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None if root_as_working_dir => cwd.to_path_buf(),
        None => cwd.parent().unwrap_or(cwd).to_path_buf(),
    }
}

impl Command {
    /// Shared options of the selected subcommand.
    pub fn common(&self) -> &CommonArgs {
        match self {
            Self::Bind(args) => &args.common,
            Self::FirstPages(args) => &args.common,
            Self::Scan(args) => &args.common,
        }
    }

    /// Build the configuration for this invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded, a flag value is
    /// invalid or the resulting configuration fails validation.
    pub fn to_config(&self, cwd: &Path) -> Result<Config> {
        let mut config = self.common().to_config(cwd)?;

        match self {
            Self::Bind(args) => args.apply(&mut config)?,
            Self::FirstPages(args) => {
                if !args.pages.is_empty() {
                    config.first_page_ranges = args.pages.clone();
                }
                if let Some(ref level) = args.compression {
                    config.compression = CompressionLevel::from_str(level)?;
                }
            }
            Self::Scan(_) => {}
        }

        config.validate().map_err(|e| {
            SheetbinderError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }
}

impl CommonArgs {
    fn to_config(&self, cwd: &Path) -> Result<Config> {
        let file_config = match &self.config {
            Some(path) => Some(Config::from_json_file(path)?),
            None => None,
        };

        let from_file_dir = file_config
            .as_ref()
            .map(|c| c.working_dir.clone())
            .filter(|dir| dir != Path::new("."));

        let mut config = file_config.unwrap_or_default();

        config.working_dir = match (&self.dir, from_file_dir) {
            (None, Some(dir)) if !self.root_as_working_dir => cwd.join(dir),
            _ => resolve_working_dir(cwd, self.root_as_working_dir, self.dir.as_deref()),
        };

        if let Some(ref output_dir) = self.output_dir {
            config.output_dir = Some(cwd.join(output_dir));
        }
        if self.flat {
            config.recursive = false;
        }
        if self.allow_empty {
            config.disallow_zero_merge = false;
        }
        if let Some(ref case) = self.case {
            config.stem_case = StemCase::from_str(case)?;
        }

        config.assume_yes |= self.yes;
        config.quiet |= self.quiet;
        config.verbose |= self.verbose;

        Ok(config)
    }
}

impl BindArgs {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if !self.pages.is_empty() {
            config.document_pages = self.pages.clone();
        }
        if !self.sheets.is_empty() {
            config.sheet_ranges = self.sheets.clone();
        }
        if self.no_combine {
            config.combine = false;
        }
        if let Some(ref program) = self.renderer {
            config.renderer = Some(RendererConfig {
                program: program.clone(),
                args: self.renderer_args.clone(),
            });
        } else if !self.renderer_args.is_empty() {
            match config.renderer.as_mut() {
                Some(renderer) => renderer.args = self.renderer_args.clone(),
                None => {
                    return Err(SheetbinderError::invalid_config(
                        "--renderer-arg given without a renderer",
                    ));
                }
            }
        }
        if let Some(timeout) = self.timeout {
            config.host_timeout_secs = Some(timeout);
        }
        if let Some(ref level) = self.compression {
            config.compression = CompressionLevel::from_str(level)?;
        }
        Ok(())
    }
}
