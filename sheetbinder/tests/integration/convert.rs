//! Integration tests for spreadsheet conversion against a scripted host.

use sheetbinder::config::PageRange;
use sheetbinder::convert::SpreadsheetConverter;
use sheetbinder::error::SheetbinderError;
use sheetbinder::merge::DocumentMerger;
use std::path::Path;
use tempfile::TempDir;

use crate::common::{HostCall, ScriptedHost, ScriptedLauncher, page_labels, sheet_label};

fn converter(scratch: &TempDir) -> SpreadsheetConverter {
    SpreadsheetConverter::new(DocumentMerger::new(), scratch.path())
}

#[tokio::test]
async fn test_sheets_three_to_five_of_ten() {
    let scratch = TempDir::new().unwrap();
    let mut host = ScriptedHost::new(10);

    let artifact = converter(&scratch)
        .convert_with(&mut host, Path::new("Jan.xlsx"), &[PageRange::span(3, 5)])
        .await
        .unwrap();

    assert_eq!(host.rendered(), vec![4, 5]);
    assert_eq!(
        artifact.path().file_name().unwrap().to_str(),
        Some("Jan_Extracted.pdf")
    );
    assert_eq!(
        page_labels(artifact.path()),
        vec![sheet_label("Jan", 4), sheet_label("Jan", 5)]
    );

    artifact.discard();
}

#[tokio::test]
async fn test_every_sheet_when_unbounded() {
    let scratch = TempDir::new().unwrap();
    let mut host = ScriptedHost::new(3);

    let artifact = converter(&scratch)
        .convert_with(&mut host, Path::new("Feb.xlsx"), &[PageRange::ALL])
        .await
        .unwrap();

    assert_eq!(host.rendered(), vec![1, 2, 3]);
    assert_eq!(page_labels(artifact.path()).len(), 3);
}

#[tokio::test]
async fn test_session_order_on_success() {
    let scratch = TempDir::new().unwrap();
    let mut host = ScriptedHost::new(4);

    converter(&scratch)
        .convert_with(&mut host, Path::new("Jan.xlsx"), &[PageRange::single(0)])
        .await
        .unwrap();

    assert_eq!(
        host.calls(),
        vec![
            HostCall::SetVisible(false),
            HostCall::SetAlertsSuppressed(true),
            HostCall::Open("Jan".to_string()),
            HostCall::SheetCount,
            HostCall::SheetName(1),
            HostCall::Render(1),
            HostCall::Close,
            HostCall::SetAlertsSuppressed(false),
        ]
    );
}

#[tokio::test]
async fn test_render_failure_still_closes_workbook() {
    let scratch = TempDir::new().unwrap();
    let mut host = ScriptedHost::new(10);
    host.fail_render.push("Jan".to_string());

    let err = converter(&scratch)
        .convert_with(&mut host, Path::new("Jan.xlsx"), &[PageRange::span(3, 5)])
        .await
        .unwrap_err();

    match &err {
        SheetbinderError::HostFailure { spreadsheet, fault } => {
            assert_eq!(spreadsheet, Path::new("Jan.xlsx"));
            assert_eq!(fault.code, -2146827284);
        }
        other => panic!("unexpected error: {other}"),
    }

    let calls = host.calls();
    let close = calls.iter().position(|c| *c == HostCall::Close).unwrap();
    assert_eq!(calls[close + 1], HostCall::SetAlertsSuppressed(false));
    assert!(!calls.contains(&HostCall::Quit));
}

#[tokio::test]
async fn test_open_failure_restores_alerts() {
    let scratch = TempDir::new().unwrap();
    let mut host = ScriptedHost::new(10);
    host.fail_open.push("Locked".to_string());

    let result = converter(&scratch)
        .convert_with(&mut host, Path::new("Locked.xlsx"), &[PageRange::ALL])
        .await;

    assert!(matches!(result, Err(SheetbinderError::HostFailure { .. })));
    let calls = host.calls();
    assert!(!calls.contains(&HostCall::Close));
    assert_eq!(calls.last(), Some(&HostCall::SetAlertsSuppressed(false)));
}

#[tokio::test]
async fn test_empty_selection_is_an_error() {
    let scratch = TempDir::new().unwrap();
    let mut host = ScriptedHost::new(2);

    let err = converter(&scratch)
        .convert_with(&mut host, Path::new("Short.xlsx"), &[PageRange::span(3, 5)])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SheetbinderError::EmptySheetSelection { sheet_count: 2, .. }
    ));
    assert!(host.rendered().is_empty());
    assert!(host.calls().contains(&HostCall::Close));
}

#[tokio::test]
async fn test_launched_host_is_quit() {
    let scratch = TempDir::new().unwrap();
    let launcher = ScriptedLauncher::new(ScriptedHost::new(10));

    let artifact = converter(&scratch)
        .convert(&launcher, Path::new("Jan.xlsx"), &[PageRange::span(3, 5)])
        .await
        .unwrap();
    artifact.discard();

    assert_eq!(launcher.calls().last(), Some(&HostCall::Quit));
}

#[tokio::test]
async fn test_launched_host_is_quit_after_failure() {
    let scratch = TempDir::new().unwrap();
    let mut template = ScriptedHost::new(10);
    template.fail_render.push("Jan".to_string());
    let launcher = ScriptedLauncher::new(template);

    let result = converter(&scratch)
        .convert(&launcher, Path::new("Jan.xlsx"), &[PageRange::span(3, 5)])
        .await;

    assert!(result.is_err());
    assert_eq!(launcher.calls().last(), Some(&HostCall::Quit));
}

#[tokio::test]
async fn test_launch_failure_names_spreadsheet() {
    let scratch = TempDir::new().unwrap();
    let mut launcher = ScriptedLauncher::new(ScriptedHost::new(10));
    launcher.fail_launch = true;

    let err = converter(&scratch)
        .convert(&launcher, Path::new("Jan.xlsx"), &[PageRange::ALL])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Jan.xlsx"));
    assert!(launcher.calls().is_empty());
}

#[tokio::test]
async fn test_discard_removes_scratch() {
    let scratch = TempDir::new().unwrap();
    let mut host = ScriptedHost::new(5);

    let artifact = converter(&scratch)
        .convert_with(&mut host, Path::new("Jan.xlsx"), &[PageRange::ALL])
        .await
        .unwrap();
    let path = artifact.path().to_path_buf();
    assert!(path.exists());

    artifact.discard();
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
