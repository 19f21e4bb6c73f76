//! Append-only corpus of summary digests searched by the ranker.

use crate::summary::Summaries;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub file: String,
    pub summary: String,
}

/// Flat list of `(file, summary)` pairs. Lookups are full scans, so insertion
/// order only matters for breaking score ties.
#[derive(Debug, Clone, Default)]
pub struct ContextIndex {
    entries: Vec<IndexEntry>,
}

impl ContextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the rendered summary of every path in `order` that has one.
    pub fn from_summaries<'a>(order: impl IntoIterator<Item = &'a str>, summaries: &Summaries) -> Self {
        let mut index = Self::new();
        for path in order {
            if let Some(summary) = summaries.get(path) {
                index.add(path, summary.render());
            }
        }
        index
    }

    pub fn add(&mut self, file: impl Into<String>, summary: impl Into<String>) {
        self.entries.push(IndexEntry { file: file.into(), summary: summary.into() });
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
