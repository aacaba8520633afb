//! Digest aggregation: from candidate files to confirmed duplicate groups.
//!
//! # Overview
//!
//! This module runs the detection pipeline over an already-discovered
//! candidate list:
//!
//! 1. **Size prefilter** - [`group_by_size`] drops files whose size is
//!    unique in the tree (they can have no duplicate and are never hashed).
//! 2. **Content hashing** - surviving candidates are hashed by the
//!    [`WorkerPool`], with per-file failures isolated.
//! 3. **Digest grouping** - a single sequential pass consumes the worker
//!    results and merges them by digest, dropping any digest with fewer
//!    than two surviving paths.
//!
//! The sequential merge is the single-writer discipline for the shared
//! map: workers never touch it directly.

use std::collections::HashMap;

use bytesize::ByteSize;

use super::groups::{group_by_size, DuplicateGroup, GroupingStats};
use crate::scanner::{Digest, FileEntry, Hasher};
use crate::workers::{HashingStats, WorkerPool};

/// Statistics from the aggregation pipeline.
#[derive(Debug, Default)]
pub struct FinderStats {
    /// Size-prefilter results
    pub grouping: GroupingStats,
    /// Hashing results
    pub hashing: HashingStats,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Confirmed redundant files (group members minus one original each)
    pub duplicate_files: usize,
    /// Bytes occupied by redundant copies
    pub wasted_space: u64,
}

/// Find duplicate groups among the given candidates.
///
/// Candidates are expected in discovery order; within each returned
/// group, path order follows that discovery order. No ordering is imposed
/// across groups - callers needing a stable display order sort at the
/// boundary.
///
/// Files whose size is unique, or below `min_file_size`, are never
/// hashed. A file that becomes unreadable between discovery and hashing
/// is dropped silently from the results.
///
/// # Example
///
/// ```no_run
/// use treedup::duplicates::find_duplicates;
/// use treedup::scanner::{FileEntry, Hasher};
/// use treedup::workers::WorkerPool;
///
/// let files: Vec<FileEntry> = vec![];
/// let pool = WorkerPool::with_default_workers().unwrap();
/// let (groups, stats) = find_duplicates(files, &pool, &Hasher::new(), 1);
/// println!("{} duplicate groups", stats.duplicate_groups);
/// ```
#[must_use]
pub fn find_duplicates(
    files: Vec<FileEntry>,
    pool: &WorkerPool,
    hasher: &Hasher,
    min_file_size: u64,
) -> (Vec<DuplicateGroup>, FinderStats) {
    let mut stats = FinderStats::default();

    let (size_groups, grouping_stats) = group_by_size(files, min_file_size);
    stats.grouping = grouping_stats;

    if size_groups.is_empty() {
        return (Vec::new(), stats);
    }

    // Flatten the surviving buckets. Digest groups can only form within
    // one size bucket, so per-bucket order is all that matters for the
    // discovery-order contract.
    let candidates: Vec<FileEntry> = size_groups.into_values().flatten().collect();

    let (hashed, hashing_stats) = pool.hash_all(&candidates, hasher);
    stats.hashing = hashing_stats;

    // Single-writer merge of worker results, in submission order.
    let mut by_digest: HashMap<Digest, Vec<usize>> = HashMap::new();
    for (idx, digest) in hashed {
        by_digest.entry(digest).or_default().push(idx);
    }

    let mut groups: Vec<DuplicateGroup> = by_digest
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(digest, members)| {
            let size = candidates[members[0]].size;
            let paths = members
                .iter()
                .map(|&idx| candidates[idx].path.clone())
                .collect();
            DuplicateGroup::new(digest, size, paths)
        })
        .collect();

    // Not part of the contract, but keeps log output and tests stable.
    groups.sort_by(|a, b| b.wasted_space().cmp(&a.wasted_space()));

    stats.duplicate_groups = groups.len();
    stats.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
    stats.wasted_space = groups.iter().map(DuplicateGroup::wasted_space).sum();

    log::info!(
        "Found {} duplicate groups, {} redundant files, {} wasted",
        stats.duplicate_groups,
        stats.duplicate_files,
        ByteSize(stats.wasted_space)
    );

    (groups, stats)
}

/// Flatten groups into the digest -> paths mapping consumed by reporting
/// collaborators.
#[must_use]
pub fn digest_map(groups: &[DuplicateGroup]) -> HashMap<Digest, Vec<std::path::PathBuf>> {
    groups
        .iter()
        .map(|g| (g.digest, g.paths.clone()))
        .collect()
}
