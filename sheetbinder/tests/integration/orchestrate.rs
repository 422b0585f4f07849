//! End-to-end batch runs against a scripted host.

use sheetbinder::config::Config;
use sheetbinder::error::SheetbinderError;
use sheetbinder::orchestrator::{ConversionOrchestrator, PairState};
use sheetbinder::pairing::{FilePair, PairMatcher};
use std::path::Path;
use tempfile::TempDir;

use crate::common::{
    HostCall, ScriptedHost, ScriptedLauncher, page_labels, sheet_label, write_document,
};

struct Workspace {
    root: TempDir,
    scratch: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            scratch: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn config(&self) -> Config {
        Config {
            working_dir: self.root.path().to_path_buf(),
            scratch_dir: Some(self.scratch.path().to_path_buf()),
            ..Config::default()
        }
    }

    fn add_pair(&self, stem: &str, pages: usize) -> Vec<String> {
        std::fs::write(self.path().join(format!("{stem}.xlsx")), b"").unwrap();
        write_document(&self.path().join(format!("{stem}.pdf")), pages)
    }

    fn pairs(&self, config: &Config) -> Vec<FilePair> {
        PairMatcher::from_config(config)
            .match_dir(self.path())
            .unwrap()
            .into_pairs()
    }
}

#[tokio::test]
async fn test_single_pair_with_lone_document() {
    let ws = Workspace::new();
    let jan = ws.add_pair("Jan", 5);
    write_document(&ws.path().join("Feb.pdf"), 2);

    let config = ws.config();
    let pairs = ws.pairs(&config);
    assert_eq!(pairs.len(), 1);

    let launcher = ScriptedLauncher::new(ScriptedHost::new(10));
    let report = ConversionOrchestrator::new(config)
        .run(&launcher, &pairs)
        .await
        .unwrap();

    let merged = ws.path().join("output").join("Jan_Merged.pdf");
    assert_eq!(report.outputs(), vec![merged.clone()]);
    assert_eq!(report.outcomes[0].state, PairState::Done);
    assert_eq!(report.outcomes[0].pages, Some(5));

    let mut expected = jan[..3].to_vec();
    expected.push(sheet_label("Jan", 4));
    expected.push(sheet_label("Jan", 5));
    assert_eq!(page_labels(&merged), expected);

    let combined = report.combined.unwrap();
    assert_eq!(combined.path, ws.path().join("output").join("Combined_1-1.pdf"));
    assert_eq!(page_labels(&combined.path), expected);

    assert_eq!(launcher.calls().last(), Some(&HostCall::Quit));
}

#[tokio::test]
async fn test_failed_pair_does_not_stop_batch() {
    let ws = Workspace::new();
    ws.add_pair("Feb", 4);
    ws.add_pair("Jan", 4);
    ws.add_pair("Mar", 4);

    let config = ws.config();
    let pairs = ws.pairs(&config);

    let mut host = ScriptedHost::new(10);
    host.fail_render.push("Feb".to_string());

    let report = ConversionOrchestrator::new(config)
        .run_with_host(&mut host, &pairs)
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let feb = report.outcomes.iter().find(|o| o.stem == "Feb").unwrap();
    assert_eq!(feb.state, PairState::Failed);
    assert!(feb.error.as_deref().unwrap().contains("Feb.xlsx"));
    assert!(!ws.path().join("output").join("Feb_Merged.pdf").exists());

    let combined = report.combined.unwrap();
    assert_eq!(combined.sources, 2);
    assert_eq!(combined.path.file_name().unwrap(), "Combined_1-2.pdf");

    assert!(!host.calls().contains(&HostCall::Quit));
}

#[tokio::test]
async fn test_corrupt_document_fails_only_its_pair() {
    let ws = Workspace::new();
    ws.add_pair("Jan", 4);
    std::fs::write(ws.path().join("Feb.xlsx"), b"").unwrap();
    std::fs::write(ws.path().join("Feb.pdf"), b"not a pdf at all").unwrap();

    let config = ws.config();
    let pairs = ws.pairs(&config);
    assert_eq!(pairs.len(), 2);

    let mut host = ScriptedHost::new(10);
    let report = ConversionOrchestrator::new(config)
        .run_with_host(&mut host, &pairs)
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let feb = report.outcomes.iter().find(|o| o.stem == "Feb").unwrap();
    assert_eq!(feb.state, PairState::Failed);
    assert!(feb.error.as_deref().unwrap().contains("Feb.pdf"));

    let output = ws.path().join("output");
    assert!(!output.join("Feb_Merged.pdf").exists());
    assert!(output.join("Jan_Merged.pdf").exists());
    assert!(
        std::fs::read_dir(&output)
            .unwrap()
            .all(|entry| !entry.unwrap().file_name().to_string_lossy().ends_with(".partial"))
    );

    // Feb still rendered its sheets before the merge failed.
    assert!(host.calls().contains(&HostCall::Open("Feb".to_string())));
    assert_eq!(std::fs::read_dir(ws.scratch.path()).unwrap().count(), 0);

    assert_eq!(report.combined.unwrap().sources, 1);
}

#[tokio::test]
async fn test_combined_follows_sorted_output_names() {
    let ws = Workspace::new();
    ws.add_pair("b", 1);
    ws.add_pair("a", 1);

    let config = Config {
        document_pages: vec![sheetbinder::PageRange::ALL],
        sheet_ranges: vec![sheetbinder::PageRange::single(0)],
        ..ws.config()
    };
    let pairs = ws.pairs(&config);

    let mut host = ScriptedHost::new(1);
    let report = ConversionOrchestrator::new(config)
        .run_with_host(&mut host, &pairs)
        .await
        .unwrap();

    let combined = report.combined.unwrap();
    assert_eq!(
        page_labels(&combined.path),
        vec![
            "a doc 0".to_string(),
            sheet_label("a", 1),
            "b doc 0".to_string(),
            sheet_label("b", 1),
        ]
    );
}

#[tokio::test]
async fn test_no_combine_when_disabled() {
    let ws = Workspace::new();
    ws.add_pair("Jan", 3);

    let config = Config {
        combine: false,
        ..ws.config()
    };
    let pairs = ws.pairs(&config);

    let mut host = ScriptedHost::new(10);
    let report = ConversionOrchestrator::new(config)
        .run_with_host(&mut host, &pairs)
        .await
        .unwrap();

    assert!(report.combined.is_none());
    assert!(!ws.path().join("output").join("Combined_1-1.pdf").exists());
}

#[tokio::test]
async fn test_zero_pairs_are_refused() {
    let ws = Workspace::new();
    write_document(&ws.path().join("Feb.pdf"), 2);

    let config = ws.config();
    let pairs = ws.pairs(&config);
    assert!(pairs.is_empty());

    let launcher = ScriptedLauncher::new(ScriptedHost::new(10));
    let result = ConversionOrchestrator::new(config).run(&launcher, &pairs).await;

    assert!(matches!(result, Err(SheetbinderError::NothingToMerge { .. })));
    assert!(!ws.path().join("output").exists());
    assert!(launcher.calls().is_empty());
}

#[tokio::test]
async fn test_zero_pairs_allowed_when_guard_off() {
    let ws = Workspace::new();
    let config = Config {
        disallow_zero_merge: false,
        ..ws.config()
    };

    let launcher = ScriptedLauncher::new(ScriptedHost::new(10));
    let report = ConversionOrchestrator::new(config)
        .run(&launcher, &[])
        .await
        .unwrap();

    assert!(report.outcomes.is_empty());
    assert!(report.combined.is_none());
}

#[tokio::test]
async fn test_every_pair_failing_trips_combine_guard() {
    let ws = Workspace::new();
    ws.add_pair("Jan", 3);

    let config = ws.config();
    let pairs = ws.pairs(&config);

    let mut host = ScriptedHost::new(10);
    host.fail_open.push("Jan".to_string());

    let result = ConversionOrchestrator::new(config)
        .run_with_host(&mut host, &pairs)
        .await;

    assert!(matches!(result, Err(SheetbinderError::NothingToMerge { .. })));
}

#[tokio::test]
async fn test_launch_failure_is_fatal() {
    let ws = Workspace::new();
    ws.add_pair("Jan", 3);

    let config = ws.config();
    let pairs = ws.pairs(&config);

    let mut launcher = ScriptedLauncher::new(ScriptedHost::new(10));
    launcher.fail_launch = true;

    let err = ConversionOrchestrator::new(config)
        .run(&launcher, &pairs)
        .await
        .unwrap_err();

    match err {
        SheetbinderError::HostFailure { spreadsheet, .. } => {
            assert_eq!(spreadsheet, ws.path().join("Jan.xlsx"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rerun_ignores_previous_outputs() {
    let ws = Workspace::new();
    ws.add_pair("Jan", 3);

    let config = ws.config();
    let orchestrator = ConversionOrchestrator::new(config.clone());
    let mut host = ScriptedHost::new(10);

    let pairs = ws.pairs(&config);
    orchestrator.run_with_host(&mut host, &pairs).await.unwrap();

    let again = ws.pairs(&config);
    assert_eq!(again, pairs);
}

#[tokio::test]
async fn test_first_pages_of_every_document() {
    let ws = Workspace::new();
    let b = write_document(&ws.path().join("b.pdf"), 3);
    let a = write_document(&ws.path().join("a.pdf"), 2);
    let c = write_document(&ws.path().join("nested").join("c.pdf"), 4);

    let orchestrator = ConversionOrchestrator::new(ws.config());
    let combined = orchestrator
        .combine_leading_pages(ws.path())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(combined.sources, 3);
    assert_eq!(
        combined.path,
        ws.path().join("output").join("Combined_First_Pages_1-3.pdf")
    );
    assert_eq!(
        page_labels(&combined.path),
        vec![a[0].clone(), b[0].clone(), c[0].clone()]
    );
}

#[tokio::test]
async fn test_first_pages_without_documents() {
    let ws = Workspace::new();
    let orchestrator = ConversionOrchestrator::new(ws.config());

    let result = orchestrator.combine_leading_pages(ws.path()).await;
    assert!(matches!(result, Err(SheetbinderError::NothingToMerge { .. })));
}
