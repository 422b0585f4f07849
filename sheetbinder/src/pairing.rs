//! Pairing documents with spreadsheets by file stem.
//!
//! A directory is scanned once per tracked extension. Files whose stems match
//! form a [`FilePair`]; stems found under only one extension are reported as
//! unmatched and never block the pairs that did match.
//!
//! # Examples
//!
//! ```no_run
//! use sheetbinder::config::Config;
//! use sheetbinder::pairing::PairMatcher;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let report = PairMatcher::from_config(&config).match_dir(&config.working_dir)?;
//! for pair in report.pairs.values() {
//!     println!("{} -> {}", pair.document.display(), pair.spreadsheet.display());
//! }
//! # Ok(())
//! # }
//! ```

use globset::GlobBuilder;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::{Config, StemCase};
use crate::error::{Result, SheetbinderError};
use crate::utils::file_stem;

/// Finds files with a given extension below a root directory.
pub trait FileScanner {
    /// Every file under `root` whose extension is `extension` (without dot).
    fn scan(&self, root: &Path, extension: &str, recursive: bool) -> Result<Vec<PathBuf>>;
}

/// [`FileScanner`] walking the filesystem.
#[derive(Debug, Clone, Default)]
pub struct WalkScanner {
    case: StemCase,
    excluded: Vec<PathBuf>,
}

impl WalkScanner {
    /// Create a scanner matching extensions under the given case rule.
    pub fn new(case: StemCase) -> Self {
        Self {
            case,
            excluded: Vec::new(),
        }
    }

    /// Skip `dir` and everything below it.
    pub fn excluding(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    /// Excluded directories that exist, resolved to canonical form.
    fn resolved_exclusions(&self) -> Vec<PathBuf> {
        self.excluded
            .iter()
            .filter_map(|dir| dir.canonicalize().ok())
            .collect()
    }
}

fn is_excluded(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
    !excluded.is_empty()
        && entry.file_type().is_dir()
        && entry
            .path()
            .canonicalize()
            .is_ok_and(|path| excluded.contains(&path))
}

impl FileScanner for WalkScanner {
    fn scan(&self, root: &Path, extension: &str, recursive: bool) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(SheetbinderError::file_not_found(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(SheetbinderError::invalid_config(format!(
                "Working directory is not a directory: {}",
                root.display()
            )));
        }

        let pattern = format!("*.{}", extension.trim_start_matches('.'));
        let matcher = GlobBuilder::new(&pattern)
            .case_insensitive(!self.case.is_case_sensitive())
            .literal_separator(true)
            .build()
            .map_err(|e| SheetbinderError::invalid_config(format!("Invalid extension: {e}")))?
            .compile_matcher();

        let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let excluded = self.resolved_exclusions();

        let mut found = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|entry| !is_excluded(entry, &excluded))
        {
            let entry = entry.map_err(|e| {
                SheetbinderError::other(format!("Failed to scan {}: {e}", root.display()))
            })?;

            if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
                found.push(entry.into_path());
            }
        }

        tracing::debug!(
            root = %root.display(),
            extension,
            found = found.len(),
            "scanned directory"
        );

        Ok(found)
    }
}

/// A document and a spreadsheet sharing a stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePair {
    /// Shared stem, as spelled by the document.
    pub stem: String,
    /// The document side.
    pub document: PathBuf,
    /// The spreadsheet side.
    pub spreadsheet: PathBuf,
}

/// Outcome of a directory scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairingReport {
    /// Matched pairs keyed by stem.
    pub pairs: BTreeMap<String, FilePair>,
    /// Stems present under exactly one extension.
    pub unmatched: BTreeSet<String>,
}

impl PairingReport {
    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pair matched.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in stem order.
    pub fn into_pairs(self) -> Vec<FilePair> {
        self.pairs.into_values().collect()
    }
}

/// Pairs documents and spreadsheets found below a directory.
#[derive(Debug, Clone)]
pub struct PairMatcher<S: FileScanner = WalkScanner> {
    scanner: S,
    document_extension: String,
    spreadsheet_extension: String,
    recursive: bool,
    case: StemCase,
}

impl PairMatcher<WalkScanner> {
    /// Matcher using the filesystem and the rules in `config`.
    ///
    /// The output directory is left out of the scan.
    pub fn from_config(config: &Config) -> Self {
        let scanner = WalkScanner::new(config.stem_case).excluding(config.output_dir());
        Self::new(
            scanner,
            &config.document_extension,
            &config.spreadsheet_extension,
        )
        .recursive(config.recursive)
        .stem_case(config.stem_case)
    }
}

impl<S: FileScanner> PairMatcher<S> {
    /// Create a recursive matcher with native stem comparison.
    pub fn new(scanner: S, document_extension: &str, spreadsheet_extension: &str) -> Self {
        Self {
            scanner,
            document_extension: document_extension.trim_start_matches('.').to_string(),
            spreadsheet_extension: spreadsheet_extension.trim_start_matches('.').to_string(),
            recursive: true,
            case: StemCase::Native,
        }
    }

    /// Scan subdirectories or not.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the stem comparison rule.
    pub fn stem_case(mut self, case: StemCase) -> Self {
        self.case = case;
        self
    }

    /// Every document under `dir`, in path order.
    pub fn documents(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut documents = self
            .scanner
            .scan(dir, &self.document_extension, self.recursive)?;
        documents.sort();
        Ok(documents)
    }

    /// Pair the files under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateStems` when two files under one extension share a
    /// stem, before anything is paired.
    pub fn match_dir(&self, dir: &Path) -> Result<PairingReport> {
        let documents = self.index(dir, &self.document_extension)?;
        let spreadsheets = self.index(dir, &self.spreadsheet_extension)?;

        let mut report = PairingReport::default();

        for (key, (stem, document)) in &documents {
            match spreadsheets.get(key) {
                Some((_, spreadsheet)) => {
                    report.pairs.insert(
                        stem.clone(),
                        FilePair {
                            stem: stem.clone(),
                            document: document.clone(),
                            spreadsheet: spreadsheet.clone(),
                        },
                    );
                }
                None => {
                    report.unmatched.insert(stem.clone());
                }
            }
        }

        for (key, (stem, _)) in &spreadsheets {
            if !documents.contains_key(key) {
                report.unmatched.insert(stem.clone());
            }
        }

        tracing::debug!(
            pairs = report.pairs.len(),
            unmatched = report.unmatched.len(),
            "pairing complete"
        );

        Ok(report)
    }

    /// Map of comparison key to (stem, path) for one extension.
    fn index(&self, dir: &Path, extension: &str) -> Result<BTreeMap<String, (String, PathBuf)>> {
        let mut paths = self.scanner.scan(dir, extension, self.recursive)?;
        paths.sort();

        let mut index: BTreeMap<String, (String, PathBuf)> = BTreeMap::new();
        let mut collisions: Vec<PathBuf> = Vec::new();

        for path in paths {
            let Some(stem) = file_stem(&path) else {
                continue;
            };
            let key = self.comparison_key(&stem);

            match index.get(&key) {
                Some((_, existing)) => {
                    if !collisions.contains(existing) {
                        collisions.push(existing.clone());
                    }
                    collisions.push(path);
                }
                None => {
                    index.insert(key, (stem, path));
                }
            }
        }

        if !collisions.is_empty() {
            return Err(SheetbinderError::DuplicateStems {
                extension: extension.to_string(),
                paths: collisions,
            });
        }

        Ok(index)
    }

    fn comparison_key(&self, stem: &str) -> String {
        if self.case.is_case_sensitive() {
            stem.to_string()
        } else {
            stem.to_lowercase()
        }
    }
}
