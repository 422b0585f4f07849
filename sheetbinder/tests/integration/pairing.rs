//! Integration tests for pairing over real directory trees.

use sheetbinder::config::{Config, StemCase};
use sheetbinder::error::SheetbinderError;
use sheetbinder::pairing::PairMatcher;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

fn config(root: &Path) -> Config {
    Config {
        working_dir: root.to_path_buf(),
        stem_case: StemCase::Sensitive,
        ..Config::default()
    }
}

#[test]
fn test_pairs_across_subdirectories() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "reports/Jan.pdf");
    touch(dir.path(), "sheets/Jan.xlsx");
    touch(dir.path(), "Feb.xlsx");

    let report = PairMatcher::from_config(&config(dir.path()))
        .match_dir(dir.path())
        .unwrap();

    let jan = &report.pairs["Jan"];
    assert_eq!(jan.document, dir.path().join("reports/Jan.pdf"));
    assert_eq!(jan.spreadsheet, dir.path().join("sheets/Jan.xlsx"));
    assert!(report.unmatched.contains("Feb"));
}

#[test]
fn test_flat_scan_ignores_subdirectories() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "Jan.pdf");
    touch(dir.path(), "nested/Jan.xlsx");

    let cfg = Config {
        recursive: false,
        ..config(dir.path())
    };
    let report = PairMatcher::from_config(&cfg).match_dir(dir.path()).unwrap();

    assert!(report.is_empty());
    assert!(report.unmatched.contains("Jan"));
}

#[test]
fn test_same_stem_in_two_directories() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "2023/Jan.pdf");
    touch(dir.path(), "2024/Jan.pdf");
    touch(dir.path(), "Jan.xlsx");

    let err = PairMatcher::from_config(&config(dir.path()))
        .match_dir(dir.path())
        .unwrap_err();

    match err {
        SheetbinderError::DuplicateStems { extension, paths } => {
            assert_eq!(extension, "pdf");
            assert_eq!(
                paths,
                vec![dir.path().join("2023/Jan.pdf"), dir.path().join("2024/Jan.pdf")]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_output_directory_is_not_scanned() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "Jan.pdf");
    touch(dir.path(), "Jan.xlsx");
    touch(dir.path(), "output/Jan_Merged.pdf");
    touch(dir.path(), "output/Combined_1-1.pdf");

    let report = PairMatcher::from_config(&config(dir.path()))
        .match_dir(dir.path())
        .unwrap();

    assert_eq!(report.len(), 1);
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_other_extensions_are_ignored() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "Jan.pdf");
    touch(dir.path(), "Jan.xls");
    touch(dir.path(), "Jan.csv");

    let report = PairMatcher::from_config(&config(dir.path()))
        .match_dir(dir.path())
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(report.unmatched.len(), 1);
}

#[test]
fn test_documents_in_path_order() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "b.pdf");
    touch(dir.path(), "a.pdf");
    touch(dir.path(), "sub/0.pdf");

    let documents = PairMatcher::from_config(&config(dir.path()))
        .documents(dir.path())
        .unwrap();

    assert_eq!(
        documents,
        vec![
            dir.path().join("a.pdf"),
            dir.path().join("b.pdf"),
            dir.path().join("sub/0.pdf"),
        ]
    );
}
