//! sheetbinder - Bind spreadsheets to their matching PDF documents.
//!
//! A batch CLI that pairs documents with workbooks, renders the selected
//! sheets through an external renderer and merges everything into one PDF
//! per pair.

mod cli;

use clap::Parser;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use sheetbinder::config::{Config, PageRange};
use sheetbinder::convert::CommandRenderer;
use sheetbinder::error::{Result, SheetbinderError};
use sheetbinder::orchestrator::ConversionOrchestrator;
use sheetbinder::output::{
    OutputFormatter, create_formatter, display_batch_report, display_pairing_report,
};
use sheetbinder::pairing::PairMatcher;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.command.common().verbose);

    if let Err(err) = run(cli).await {
        match err {
            SheetbinderError::Cancelled => eprintln!("{err}"),
            _ => eprintln!("Error: {err}"),
        }
        process::exit(err.exit_code());
    }
}

/// Install the log subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,sheetbinder=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = cli.command.to_config(&cwd)?;
    tracing::debug!(?config, "configuration resolved");

    let formatter = create_formatter(&config);

    match &cli.command {
        Command::Bind(_) => bind(config, &formatter).await,
        Command::FirstPages(_) => first_pages(config, &formatter).await,
        Command::Scan(args) => scan(&config, &formatter, args.json),
    }
}

async fn bind(config: Config, formatter: &OutputFormatter) -> Result<()> {
    let renderer = CommandRenderer::from_config(&config).ok_or_else(|| {
        SheetbinderError::invalid_config(
            "No renderer configured. Pass --renderer or set \"renderer\" in the config file",
        )
    })?;

    print_header(formatter);
    describe(&config, formatter);
    formatter.field("Sheets", &format_ranges(&config.sheet_ranges));
    formatter.path_field("Renderer", renderer.program());
    formatter.field("Combine outputs", yes_no(config.combine));

    let pairing = PairMatcher::from_config(&config).match_dir(&config.working_dir)?;
    display_pairing_report(formatter, &pairing);
    let pairs = pairing.into_pairs();

    let orchestrator = ConversionOrchestrator::new(config.clone());
    orchestrator.ensure_work(pairs.len(), "file pairs")?;

    confirm("Is the above information correct?", true, &config)?;
    check_output_dir(&config, formatter)?;
    confirm("Start?", true, &config)?;

    let mut report = orchestrator.convert_pairs(&renderer, &pairs).await?;

    if config.combine {
        let outputs = report.outputs().len();
        let wanted = outputs == 0
            || ask(
                &format!("Merge all newly combined .pdfs ({outputs}) into a single pdf?"),
                true,
                &config,
            )?;
        if wanted {
            orchestrator.combine_outputs(&mut report).await?;
        }
    }

    formatter.blank_line();
    display_batch_report(formatter, &report);

    Ok(())
}

async fn first_pages(config: Config, formatter: &OutputFormatter) -> Result<()> {
    print_header(formatter);
    describe(&config, formatter);
    formatter.field("Pages per document", &format_ranges(&config.first_page_ranges));

    let documents = PairMatcher::from_config(&config).documents(&config.working_dir)?;
    formatter.field("Matched documents", &documents.len().to_string());

    let orchestrator = ConversionOrchestrator::new(config.clone());
    orchestrator.ensure_work(documents.len(), "documents")?;

    confirm("Is the above information correct?", true, &config)?;
    check_output_dir(&config, formatter)?;
    confirm("Start?", true, &config)?;

    match orchestrator.combine_leading_pages(&config.working_dir).await? {
        Some(combined) => formatter.success(&format!(
            "Combined {} document(s) into {} ({} pages)",
            combined.sources,
            combined.path.display(),
            combined.pages
        )),
        None => formatter.info("No documents found, nothing written"),
    }

    Ok(())
}

fn scan(config: &Config, formatter: &OutputFormatter, json: bool) -> Result<()> {
    let report = PairMatcher::from_config(config).match_dir(&config.working_dir)?;

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| SheetbinderError::other(format!("Failed to serialize report: {e}")))?;
        println!("{text}");
    } else {
        display_pairing_report(formatter, &report);
    }

    Ok(())
}

fn print_header(formatter: &OutputFormatter) {
    if formatter.should_print() {
        formatter.section(&format!("{} v{}", sheetbinder::NAME, sheetbinder::VERSION));
        formatter.blank_line();
    }
}

fn describe(config: &Config, formatter: &OutputFormatter) {
    formatter.path_field("Working Directory", &config.working_dir);
    formatter.path_field("Output Directory", &config.output_dir());
    formatter.field("Search subdirectories", yes_no(config.recursive));
    formatter.field("Document pages", &format_ranges(&config.document_pages));
    formatter.detail("Stem case", &format!("{:?}", config.stem_case));
    formatter.detail("Compression", &format!("{:?}", config.compression));
    formatter.detail(
        "Refuse empty merges",
        yes_no(config.disallow_zero_merge),
    );
}

fn format_ranges(ranges: &[PageRange]) -> String {
    if ranges.is_empty() {
        return ":".to_string();
    }
    ranges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Ask before writing into an output directory that already has files in it.
fn check_output_dir(config: &Config, formatter: &OutputFormatter) -> Result<()> {
    let output_dir = config.output_dir();
    if is_non_empty_dir(&output_dir)? {
        formatter.warning(&format!(
            "Output directory is not empty: {}",
            output_dir.display()
        ));
        confirm("Existing files may be overwritten. Continue?", false, config)?;
    }
    Ok(())
}

fn is_non_empty_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    Ok(std::fs::read_dir(path)?.next().is_some())
}

/// Like [`ask`], but a "no" cancels the run.
fn confirm(question: &str, default: bool, config: &Config) -> Result<()> {
    if ask(question, default, config)? {
        Ok(())
    } else {
        Err(SheetbinderError::Cancelled)
    }
}

/// Simple yes/no prompt on stdin. An empty answer takes `default`; `--yes`
/// answers for the user.
fn ask(question: &str, default: bool, config: &Config) -> Result<bool> {
    if config.assume_yes {
        return Ok(true);
    }

    let hint = if default { "[Y/n]" } else { "[y/N]" };
    print!("{question} {hint}: ");
    io::stdout().flush().ok();

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .map_err(|err| SheetbinderError::other(format!("Failed to read input: {err}")))?;

    Ok(parse_answer(&response, default))
}

fn parse_answer(response: &str, default: bool) -> bool {
    match response.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "ye" | "yes" => true,
        _ => false,
    }
}
