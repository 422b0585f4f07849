//! Integration tests for page-selective merging.

use sheetbinder::config::{CompressionLevel, PageRange};
use sheetbinder::error::SheetbinderError;
use sheetbinder::merge::{DocumentMerger, MergePlan};
use tempfile::TempDir;

use crate::common::{page_labels, write_document};

#[tokio::test]
async fn test_sources_keep_plan_order() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("b.pdf");
    let second = dir.path().join("a.pdf");
    let b = write_document(&first, 2);
    let a = write_document(&second, 1);

    let mut plan = MergePlan::new();
    plan.push_all(&first).push_all(&second);

    let output = dir.path().join("out.pdf");
    let stats = DocumentMerger::new()
        .merge_to_file(&plan, &output)
        .await
        .unwrap();

    assert_eq!(stats.files_merged, 2);
    assert_eq!(stats.total_pages, 3);
    assert_eq!(page_labels(&output), [b, a].concat());
}

#[tokio::test]
async fn test_leading_pages_then_all_pages() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("Jan.pdf");
    let rendered = dir.path().join("Jan_Extracted.pdf");
    let doc_labels = write_document(&document, 5);
    let render_labels = write_document(&rendered, 3);

    let mut plan = MergePlan::new();
    plan.push_ranges(&document, &[PageRange::new(None, Some(3))])
        .push_all(&rendered);

    let output = dir.path().join("Jan_Merged.pdf");
    DocumentMerger::new()
        .merge_to_file(&plan, &output)
        .await
        .unwrap();

    let mut expected = doc_labels[..3].to_vec();
    expected.extend(render_labels);
    assert_eq!(page_labels(&output), expected);
}

#[tokio::test]
async fn test_range_past_end_is_clamped() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("short.pdf");
    let labels = write_document(&document, 2);

    let mut plan = MergePlan::new();
    plan.push_ranges(&document, &[PageRange::new(None, Some(3))]);

    let output = dir.path().join("out.pdf");
    DocumentMerger::new()
        .merge_to_file(&plan, &output)
        .await
        .unwrap();

    assert_eq!(page_labels(&output), labels);
}

#[tokio::test]
async fn test_same_source_twice_keeps_both_copies() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("cover.pdf");
    let labels = write_document(&document, 2);

    let mut plan = MergePlan::new();
    plan.push_ranges(&document, &[PageRange::single(0)])
        .push_ranges(&document, &[PageRange::single(0)]);

    let output = dir.path().join("out.pdf");
    DocumentMerger::new()
        .merge_to_file(&plan, &output)
        .await
        .unwrap();

    assert_eq!(page_labels(&output), vec![labels[0].clone(), labels[0].clone()]);
}

#[tokio::test]
async fn test_merge_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    write_document(&a, 3);
    write_document(&b, 2);

    let mut plan = MergePlan::new();
    plan.push_ranges(&a, &[PageRange::span(1, 3)]).push_all(&b);

    let merger = DocumentMerger::with_compression(CompressionLevel::None);
    let first = dir.path().join("first.pdf");
    let second = dir.path().join("second.pdf");
    merger.merge_to_file(&plan, &first).await.unwrap();
    merger.merge_to_file(&plan, &second).await.unwrap();

    assert_eq!(page_labels(&first), page_labels(&second));
}

#[tokio::test]
async fn test_missing_source_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let present = dir.path().join("present.pdf");
    write_document(&present, 1);

    let mut plan = MergePlan::new();
    plan.push_all(&present).push_all(dir.path().join("missing.pdf"));

    let output = dir.path().join("out.pdf");
    let result = DocumentMerger::new().merge_to_file(&plan, &output).await;

    assert!(matches!(result, Err(SheetbinderError::FileNotFound { .. })));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_empty_plan_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.pdf");

    let result = DocumentMerger::new()
        .merge_to_file(&MergePlan::new(), &output)
        .await;

    assert!(matches!(result, Err(SheetbinderError::NoFilesToMerge)));
}
