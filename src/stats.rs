//! Scan-wide statistics accumulation.
//!
//! [`StatsCollector`] is the mutable accumulator: the traversal pass calls
//! [`StatsCollector::observe`] exactly once per discovered file, and
//! [`StatsCollector::finalize`] folds in the aggregation results and
//! returns the immutable [`ScanStatistics`] snapshot. The collector is
//! driven from a single control flow; workers never mutate it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::duplicates::{DuplicateGroup, FinderStats};
use crate::scanner::FileEntry;

/// Histogram key for files without an extension.
pub const NO_EXTENSION: &str = "(no extension)";

/// Immutable statistics snapshot for one completed scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStatistics {
    /// Files discovered by the traversal
    pub total_files: u64,
    /// Total size of discovered files in bytes
    pub total_bytes: u64,
    /// Per-extension file counts, keyed by lowercase extension
    pub extensions: HashMap<String, u64>,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of redundant files across all groups
    pub duplicate_files: usize,
    /// Bytes occupied by redundant copies
    pub wasted_space: u64,
    /// Files that were actually content-hashed
    pub hashed_files: usize,
    /// Files skipped due to per-file read failures
    pub failed_files: usize,
    /// Deepest file seen, in directories below the root
    pub max_depth: usize,
    /// Mean file depth below the root
    pub average_depth: f64,
    /// Whether the scan was cut short by a shutdown request
    pub interrupted: bool,
}

impl ScanStatistics {
    /// Extension histogram sorted by descending count, for display layers.
    #[must_use]
    pub fn extensions_by_count(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .extensions
            .iter()
            .map(|(ext, count)| (ext.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

/// Mutable accumulator for one scan.
///
/// Reset at scan start (by constructing a fresh collector), written to by
/// the traversal and aggregation passes, read once at completion via
/// [`StatsCollector::finalize`].
#[derive(Debug, Default)]
pub struct StatsCollector {
    total_files: u64,
    total_bytes: u64,
    extensions: HashMap<String, u64>,
    max_depth: usize,
    depth_sum: u64,
}

impl StatsCollector {
    /// Create a collector with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one discovered file.
    ///
    /// Called exactly once per candidate, whether or not the file ends up
    /// being hashed.
    pub fn observe(&mut self, file: &FileEntry) {
        self.total_files += 1;
        self.total_bytes += file.size;
        self.max_depth = self.max_depth.max(file.depth);
        self.depth_sum += file.depth as u64;

        let key = file
            .extension()
            .unwrap_or_else(|| NO_EXTENSION.to_string());
        *self.extensions.entry(key).or_insert(0) += 1;
    }

    /// Fold in the aggregation results and produce the final snapshot.
    #[must_use]
    pub fn finalize(self, groups: &[DuplicateGroup], finder: &FinderStats) -> ScanStatistics {
        let average_depth = if self.total_files == 0 {
            0.0
        } else {
            self.depth_sum as f64 / self.total_files as f64
        };

        debug_assert_eq!(finder.duplicate_groups, groups.len());

        ScanStatistics {
            total_files: self.total_files,
            total_bytes: self.total_bytes,
            extensions: self.extensions,
            duplicate_groups: groups.len(),
            duplicate_files: finder.duplicate_files,
            wasted_space: finder.wasted_space,
            hashed_files: finder.hashing.hashed_files,
            failed_files: finder.hashing.failed_files,
            max_depth: self.max_depth,
            average_depth,
            interrupted: finder.hashing.interrupted,
        }
    }
}
