//! Output formatting and display for sheetbinder.
//!
//! This module handles all user-facing output:
//! - Formatted status messages
//! - Pairing and batch summaries
//! - Quiet and verbose modes
//!
//! # Examples
//!
//! ```no_run
//! use sheetbinder::output::OutputFormatter;
//! use sheetbinder::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Scanning for file pairs");
//! formatter.success("Batch completed");
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::config::Config;
use crate::orchestrator::{BatchReport, PairState};
use crate::pairing::PairingReport;

/// Create an output formatter from configuration.
pub fn create_formatter(config: &Config) -> OutputFormatter {
    OutputFormatter::from_config(config)
}

/// Display the matched pairs and the stems left without a partner.
pub fn display_pairing_report(formatter: &OutputFormatter, report: &PairingReport) {
    formatter.section(&format!("Found {} file pair(s):", report.len()));
    for (index, pair) in report.pairs.values().enumerate() {
        formatter.list_item(index + 1, &pair.stem);
        formatter.detail("document", &pair.document.display().to_string());
        formatter.detail("spreadsheet", &pair.spreadsheet.display().to_string());
    }

    if !report.unmatched.is_empty() {
        let stems: Vec<&str> = report.unmatched.iter().map(String::as_str).collect();
        formatter.warning(&format!(
            "{} file(s) without a partner: {}",
            stems.len(),
            stems.join(", ")
        ));
    }
}

/// Display the outcome of every pair and the combined document, if any.
pub fn display_batch_report(formatter: &OutputFormatter, report: &BatchReport) {
    for outcome in &report.outcomes {
        match (&outcome.state, &outcome.output) {
            (PairState::Done, Some(output)) => {
                let pages = outcome.pages.unwrap_or_default();
                formatter.success(&format!(
                    "{} → {} ({pages} pages)",
                    outcome.stem,
                    output.display()
                ));
            }
            _ => {
                let reason = outcome.error.as_deref().unwrap_or("unknown failure");
                formatter.error(&format!("{}: {reason}", outcome.stem));
            }
        }
    }

    if let Some(combined) = &report.combined {
        formatter.success(&format!(
            "Combined {} file(s) into {} ({} pages)",
            combined.sources,
            combined.path.display(),
            combined.pages
        ));
    }

    let summary = format!(
        "{} of {} pair(s) merged",
        report.succeeded(),
        report.outcomes.len()
    );
    if report.failed() > 0 {
        formatter.warning(&format!("{summary}, {} failed", report.failed()));
    } else {
        formatter.info(&summary);
    }
}
