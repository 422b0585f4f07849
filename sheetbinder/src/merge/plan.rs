//! Merge plans: which pages of which sources, in which order.

use std::path::{Path, PathBuf};

use crate::config::PageRange;

/// A source document plus the page ranges to take from it.
///
/// An empty range list selects every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    /// Source document.
    pub path: PathBuf,
    /// Ranges applied in order.
    pub ranges: Vec<PageRange>,
}

impl SourceSelection {
    /// Select every page of `path`.
    pub fn all(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ranges: Vec::new(),
        }
    }

    /// Select the given ranges of `path`.
    pub fn with_ranges(path: impl Into<PathBuf>, ranges: Vec<PageRange>) -> Self {
        Self {
            path: path.into(),
            ranges,
        }
    }

    /// Whether this selection takes the whole source.
    pub fn is_all(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Ordered list of source selections.
///
/// The merger honours this order verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    sources: Vec<SourceSelection>,
}

impl MergePlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a selection.
    pub fn push(&mut self, selection: SourceSelection) -> &mut Self {
        self.sources.push(selection);
        self
    }

    /// Append every page of `path`.
    pub fn push_all(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.push(SourceSelection::all(path))
    }

    /// Append the given ranges of `path`.
    pub fn push_ranges(&mut self, path: impl Into<PathBuf>, ranges: &[PageRange]) -> &mut Self {
        self.push(SourceSelection::with_ranges(path, ranges.to_vec()))
    }

    /// Selections in plan order.
    pub fn sources(&self) -> &[SourceSelection] {
        &self.sources
    }

    /// Source paths in plan order.
    pub fn paths(&self) -> Vec<&Path> {
        self.sources.iter().map(|s| s.path.as_path()).collect()
    }

    /// Number of selections.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the plan has no selections.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FromIterator<SourceSelection> for MergePlan {
    fn from_iter<I: IntoIterator<Item = SourceSelection>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}
