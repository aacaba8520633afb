//! Size-based prefiltering and duplicate group types.
//!
//! # Overview
//!
//! Size grouping is the first phase of duplicate detection: files whose
//! size occurs only once in the tree cannot have a duplicate, so they are
//! eliminated before any hashing happens. Since hashing is the expensive
//! step, this is the dominant cost-saving heuristic, typically removing
//! 70-90% of candidates.
//!
//! # Example
//!
//! ```
//! use treedup::scanner::FileEntry;
//! use treedup::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024, 0),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024, 0),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048, 0),
//! ];
//!
//! let (groups, stats) = group_by_size(files, 1);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);  // the two 1024-byte files
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scanner::{digest_to_hex, Digest, FileEntry};

/// A confirmed group of byte-identical files.
///
/// Invariant: every member has the same size and digest, and a group is
/// only exposed to callers with 2 or more members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// SHA-256 digest of the shared content
    pub digest: Digest,
    /// File size in bytes, shared by all members
    pub size: u64,
    /// Member paths in discovery order
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(digest: Digest, size: u64, paths: Vec<PathBuf>) -> Self {
        Self {
            digest,
            size,
            paths,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of redundant copies (total minus one original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Bytes occupied by redundant copies: `(members - 1) * size`.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Digest as a lowercase hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest_to_hex(&self.digest)
    }
}

/// Statistics from the size-grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Number of unique file sizes seen
    pub unique_sizes: usize,
    /// Files that could still be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Files eliminated because their size occurs only once
    pub eliminated_unique: usize,
    /// Files below the minimum size threshold, never hashed
    pub below_min_size: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated before hashing.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            let eliminated = self.total_files - self.potential_duplicates;
            (eliminated as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size, keeping only groups that can contain duplicates.
///
/// Files smaller than `min_file_size` are dropped up front (with the
/// default threshold of 1 this removes empty files, which all share a
/// single digest). Within each returned group, file order follows
/// discovery order.
///
/// # Returns
///
/// A tuple of:
/// - `HashMap<u64, Vec<FileEntry>>` - files grouped by size, only groups with 2+ members
/// - [`GroupingStats`] - what was eliminated and why
///
/// # Performance
///
/// Metadata only; no file I/O is performed.
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
    min_file_size: u64,
) -> (HashMap<u64, Vec<FileEntry>>, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;

        if file.size < min_file_size {
            stats.below_min_size += 1;
            log::trace!(
                "Below minimum size ({} bytes): {}",
                file.size,
                file.path.display()
            );
            continue;
        }

        all_groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_groups.len();

    let filtered: HashMap<u64, Vec<FileEntry>> = all_groups
        .into_iter()
        .filter(|(size, group)| {
            if group.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    size,
                    group[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += group.len();
                log::debug!("Size group {} bytes: {} candidates", size, group.len());
                true
            }
        })
        .collect();

    log::info!(
        "Size prefilter: {} files -> {} candidates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered, stats)
}
