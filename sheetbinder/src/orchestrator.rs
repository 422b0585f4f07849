//! Batch orchestration.
//!
//! Each pair moves through `Pending → Converting → Merging → Done`, or ends
//! in `Failed`. A failing pair never stops the batch; only the combined merge
//! and the zero-work guard can end a run early.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::convert::{HostLauncher, HostLease, SpreadsheetConverter, SpreadsheetHost};
use crate::error::{Result, SheetbinderError};
use crate::merge::{DocumentMerger, MergePlan, SourceSelection};
use crate::pairing::{FilePair, PairMatcher};

/// Where a pair is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    /// Not started.
    Pending,
    /// Spreadsheet is being rendered.
    Converting,
    /// Document and render are being merged.
    Merging,
    /// Output written.
    Done,
    /// Conversion or merge failed.
    Failed,
}

/// What happened to one pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    /// Shared stem.
    pub stem: String,
    /// Document side of the pair.
    pub document: PathBuf,
    /// Spreadsheet side of the pair.
    pub spreadsheet: PathBuf,
    /// Final state.
    pub state: PairState,
    /// Written output, when done.
    pub output: Option<PathBuf>,
    /// Pages in the output, when done.
    pub pages: Option<usize>,
    /// Failure description, when failed.
    pub error: Option<String>,
}

impl PairOutcome {
    fn pending(pair: &FilePair) -> Self {
        Self {
            stem: pair.stem.clone(),
            document: pair.document.clone(),
            spreadsheet: pair.spreadsheet.clone(),
            state: PairState::Pending,
            output: None,
            pages: None,
            error: None,
        }
    }

    fn advance(&mut self, state: PairState) {
        tracing::debug!(stem = %self.stem, from = ?self.state, to = ?state, "pair state");
        self.state = state;
    }

    fn finish(mut self, output: PathBuf, pages: usize) -> Self {
        self.advance(PairState::Done);
        self.output = Some(output);
        self.pages = Some(pages);
        self
    }

    fn fail(mut self, err: SheetbinderError) -> Self {
        tracing::warn!(stem = %self.stem, state = ?self.state, error = %err, "pair failed");
        self.advance(PairState::Failed);
        self.error = Some(err.to_string());
        self
    }

    /// Whether the pair produced an output.
    pub fn is_done(&self) -> bool {
        self.state == PairState::Done
    }
}

/// A document merged from several outputs.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedOutput {
    /// Written file.
    pub path: PathBuf,
    /// Number of sources merged.
    pub sources: usize,
    /// Pages in the file.
    pub pages: usize,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// One entry per pair, in processing order.
    pub outcomes: Vec<PairOutcome>,
    /// Combined document, when one was written.
    pub combined: Option<CombinedOutput>,
}

impl BatchReport {
    /// Number of pairs that produced an output.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_done()).count()
    }

    /// Number of pairs that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Written per-pair outputs, sorted by path.
    pub fn outputs(&self) -> Vec<PathBuf> {
        let mut outputs: Vec<PathBuf> = self
            .outcomes
            .iter()
            .filter_map(|o| o.output.clone())
            .collect();
        outputs.sort();
        outputs
    }
}

/// Drives pairs through conversion and merging.
#[derive(Debug, Clone)]
pub struct ConversionOrchestrator {
    config: Config,
    converter: SpreadsheetConverter,
    merger: DocumentMerger,
}

impl ConversionOrchestrator {
    /// Create an orchestrator for `config`.
    pub fn new(config: Config) -> Self {
        Self {
            converter: SpreadsheetConverter::from_config(&config),
            merger: DocumentMerger::with_compression(config.compression),
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the output written for `pair`.
    pub fn output_path(&self, pair: &FilePair) -> PathBuf {
        self.config
            .output_dir()
            .join(format!("{}_Merged.pdf", pair.stem))
    }

    /// Convert every pair, then combine the outputs if configured.
    pub async fn run<L: HostLauncher>(&self, launcher: &L, pairs: &[FilePair]) -> Result<BatchReport> {
        let mut report = self.convert_pairs(launcher, pairs).await?;
        if self.config.combine {
            self.combine_outputs(&mut report).await?;
        }
        Ok(report)
    }

    /// Like [`run`](Self::run) with a host owned by the caller.
    pub async fn run_with_host<H: SpreadsheetHost + ?Sized>(
        &self,
        host: &mut H,
        pairs: &[FilePair],
    ) -> Result<BatchReport> {
        let mut report = self.convert_pairs_with(host, pairs).await?;
        if self.config.combine {
            self.combine_outputs(&mut report).await?;
        }
        Ok(report)
    }

    /// Launch one host and convert every pair with it.
    ///
    /// The host is released once all pairs are processed.
    pub async fn convert_pairs<L: HostLauncher>(
        &self,
        launcher: &L,
        pairs: &[FilePair],
    ) -> Result<BatchReport> {
        let Some(first) = pairs.first() else {
            self.ensure_work(0, "file pairs")?;
            return Ok(BatchReport::default());
        };

        let host = launcher
            .launch()
            .map_err(|fault| SheetbinderError::host_failure(first.spreadsheet.clone(), fault))?;
        let mut lease = HostLease::new(host);

        self.convert_pairs_with(&mut *lease, pairs).await
    }

    /// Convert every pair with a caller-owned host.
    ///
    /// # Errors
    ///
    /// Returns `NothingToMerge` when there are no pairs and the zero-work
    /// guard is on, or an I/O error if the output directory cannot be created.
    /// Per-pair failures are recorded in the report instead.
    pub async fn convert_pairs_with<H: SpreadsheetHost + ?Sized>(
        &self,
        host: &mut H,
        pairs: &[FilePair],
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        if !self.ensure_work(pairs.len(), "file pairs")? {
            return Ok(report);
        }

        tokio::fs::create_dir_all(self.config.output_dir()).await?;

        for pair in pairs {
            let outcome = self.process_pair(host, pair).await;
            report.outcomes.push(outcome);
        }

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "pairs processed"
        );

        Ok(report)
    }

    async fn process_pair<H: SpreadsheetHost + ?Sized>(
        &self,
        host: &mut H,
        pair: &FilePair,
    ) -> PairOutcome {
        let mut outcome = PairOutcome::pending(pair);

        outcome.advance(PairState::Converting);
        let artifact = match self
            .converter
            .convert_with(host, &pair.spreadsheet, &self.config.sheet_ranges)
            .await
        {
            Ok(artifact) => artifact,
            Err(err) => return outcome.fail(err),
        };

        outcome.advance(PairState::Merging);
        let output = self.output_path(pair);
        let mut plan = MergePlan::new();
        plan.push_ranges(&pair.document, &self.config.document_pages)
            .push_all(artifact.path());

        let merged = self.merger.merge_to_file(&plan, &output).await;
        artifact.discard();

        match merged {
            Ok(stats) => {
                tracing::debug!(
                    stem = %pair.stem,
                    input = %stats.format_input_size(),
                    output = %stats.format_output_size(),
                    "pair merged"
                );
                outcome.finish(output, stats.total_pages)
            }
            Err(err) => outcome.fail(err),
        }
    }

    /// Merge every successful output into `Combined_1-<N>.pdf`.
    ///
    /// Returns `None` when there was nothing to combine and the zero-work
    /// guard is off.
    ///
    /// # Errors
    ///
    /// A failed combined merge is returned as-is and ends the run.
    pub async fn combine_outputs(&self, report: &mut BatchReport) -> Result<Option<CombinedOutput>> {
        let outputs = report.outputs();

        if !self.ensure_work(outputs.len(), "merged outputs")? {
            return Ok(None);
        }

        let path = self
            .config
            .output_dir()
            .join(format!("Combined_1-{}.pdf", outputs.len()));
        let plan: MergePlan = outputs.iter().map(SourceSelection::all).collect();

        let stats = self.merger.merge_to_file(&plan, &path).await?;

        let combined = CombinedOutput {
            path,
            sources: outputs.len(),
            pages: stats.total_pages,
        };
        report.combined = Some(combined.clone());

        Ok(Some(combined))
    }

    /// Merge the leading pages of every document under `dir`.
    ///
    /// Uses the configured `first_page_ranges` and the same scan rules as
    /// pairing. Sources are merged in path order into
    /// `Combined_First_Pages_1-<N>.pdf`.
    pub async fn combine_leading_pages(&self, dir: &Path) -> Result<Option<CombinedOutput>> {
        let documents = PairMatcher::from_config(&self.config).documents(dir)?;

        if !self.ensure_work(documents.len(), "documents")? {
            return Ok(None);
        }

        let output_dir = self.config.output_dir();
        tokio::fs::create_dir_all(&output_dir).await?;

        let path = output_dir.join(format!("Combined_First_Pages_1-{}.pdf", documents.len()));
        let plan: MergePlan = documents
            .iter()
            .map(|d| SourceSelection::with_ranges(d, self.config.first_page_ranges.clone()))
            .collect();

        let stats = self.merger.merge_to_file(&plan, &path).await?;

        Ok(Some(CombinedOutput {
            path,
            sources: documents.len(),
            pages: stats.total_pages,
        }))
    }

    /// Zero-work guard.
    ///
    /// `Ok(false)` means there is nothing to do and the guard is off. Callers
    /// may apply it early, before asking the operator anything.
    ///
    /// # Errors
    ///
    /// `NothingToMerge` naming `context` when `count` is zero and
    /// `disallow_zero_merge` is set.
    pub fn ensure_work(&self, count: usize, context: &str) -> Result<bool> {
        if count > 0 {
            Ok(true)
        } else if self.config.disallow_zero_merge {
            Err(SheetbinderError::nothing_to_merge(context))
        } else {
            tracing::debug!(context, "nothing to merge, skipping");
            Ok(false)
        }
    }
}
