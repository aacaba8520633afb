//! Bounded-concurrency worker pool for content hashing.
//!
//! # Overview
//!
//! [`WorkerPool`] owns a fixed-size rayon thread pool and applies the
//! [`Hasher`](crate::scanner::Hasher) to many candidate files, isolating
//! per-file failures. The pool size defaults to twice the available CPU
//! parallelism, clamped to `[MIN_WORKERS, MAX_WORKERS]`.
//!
//! Worker-count selection is decoupled from the pool behind the
//! [`WorkerStrategy`] trait so the pool can be tested with a fixed count
//! while production callers may plug in the load-aware
//! [`AdaptiveStrategy`]. Retuning applies hysteresis: the active count
//! only changes when the newly computed optimum differs from the current
//! one by more than [`HYSTERESIS_THRESHOLD`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use sysinfo::System;

use crate::error::{HashError, ScanError};
use crate::scanner::{Digest, FileEntry, Hasher};

/// Lower bound on the worker count.
pub const MIN_WORKERS: usize = 2;

/// Hard cap on the worker count; more I/O workers than this thrash disks.
pub const MAX_WORKERS: usize = 32;

/// Minimum difference between the current and proposed worker counts
/// before a retune rebuilds the pool.
pub const HYSTERESIS_THRESHOLD: usize = 2;

/// Default worker count: twice the available CPU parallelism, clamped
/// to `[MIN_WORKERS, MAX_WORKERS]`.
#[must_use]
pub fn default_worker_count() -> usize {
    let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    (cores * 2).clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Strategy for choosing the next worker count between batches.
pub trait WorkerStrategy: Send {
    /// Propose a worker count given the currently active one.
    ///
    /// The returned value is clamped to `[MIN_WORKERS, MAX_WORKERS]` by
    /// the pool; implementations do not need to clamp themselves.
    fn next_worker_count(&mut self, current: usize) -> usize;
}

/// Strategy that always proposes the same count. Used in tests and by
/// callers that configured an explicit `worker_count`.
#[derive(Debug, Clone, Copy)]
pub struct FixedStrategy(pub usize);

impl WorkerStrategy for FixedStrategy {
    fn next_worker_count(&mut self, _current: usize) -> usize {
        self.0
    }
}

/// Strategy that scales the worker count with observed CPU headroom.
///
/// Samples global CPU utilization via `sysinfo` and proposes fewer
/// workers as the system approaches saturation.
pub struct AdaptiveStrategy {
    system: System,
}

impl AdaptiveStrategy {
    /// Create a new adaptive strategy.
    #[must_use]
    pub fn new() -> Self {
        let mut system = System::new();
        // First refresh establishes the baseline sample
        system.refresh_cpu_usage();
        Self { system }
    }
}

impl Default for AdaptiveStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerStrategy for AdaptiveStrategy {
    fn next_worker_count(&mut self, current: usize) -> usize {
        self.system.refresh_cpu_usage();
        let usage = self.system.global_cpu_info().cpu_usage();

        // Above 85% utilization, back off; below 50%, grow toward the
        // parallelism-derived default.
        let proposed = if usage > 85.0 {
            current.saturating_sub(current / 4).max(MIN_WORKERS)
        } else if usage < 50.0 {
            (current + current / 2).min(default_worker_count())
        } else {
            current
        };

        log::debug!(
            "Adaptive strategy: cpu {:.1}%, {} -> {} workers",
            usage,
            current,
            proposed
        );
        proposed
    }
}

/// Statistics from one hashing pass.
///
/// Not `Clone`: the `errors` vec owns `std::io::Error` values, so the
/// stats move through the pipeline by value.
#[derive(Debug, Default)]
pub struct HashingStats {
    /// Files submitted to the pool
    pub input_files: usize,
    /// Files successfully hashed
    pub hashed_files: usize,
    /// Files skipped due to per-file read failures
    pub failed_files: usize,
    /// Total bytes hashed
    pub bytes_hashed: u64,
    /// Errors encountered, one per failed file
    pub errors: Vec<HashError>,
    /// Whether the pass was cut short by the shutdown flag
    pub interrupted: bool,
}

/// Fixed-size pool of hashing workers.
///
/// `hash_all` is synchronous from the caller's point of view: it returns
/// only once every submitted file has been attempted (or the shutdown
/// flag stopped submission). The pool is reusable across batches.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("shutdown_flag", &self.shutdown_flag)
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with the given worker count, clamped to
    /// `[MIN_WORKERS, MAX_WORKERS]`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pool`] if the underlying thread pool cannot
    /// be built; this is fatal for the whole scan.
    pub fn new(workers: usize) -> Result<Self, ScanError> {
        let workers = workers.clamp(MIN_WORKERS, MAX_WORKERS);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;
        log::debug!("Worker pool ready with {} workers", workers);
        Ok(Self {
            pool,
            workers,
            shutdown_flag: None,
        })
    }

    /// Create a pool sized by [`default_worker_count`].
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pool`] if the underlying thread pool cannot
    /// be built.
    pub fn with_default_workers() -> Result<Self, ScanError> {
        Self::new(default_worker_count())
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Currently active worker count.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Recompute the worker count between batches.
    ///
    /// The strategy's proposal is clamped to `[MIN_WORKERS, MAX_WORKERS]`;
    /// the pool is only rebuilt when the clamped proposal differs from
    /// the active count by more than [`HYSTERESIS_THRESHOLD`], to avoid
    /// oscillation. Returns whether the pool was rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pool`] if the replacement pool cannot be
    /// built; the existing pool is left in place in that case only if
    /// construction never started, so treat this as fatal.
    pub fn retune(&mut self, strategy: &mut dyn WorkerStrategy) -> Result<bool, ScanError> {
        let proposed = strategy
            .next_worker_count(self.workers)
            .clamp(MIN_WORKERS, MAX_WORKERS);

        if self.workers.abs_diff(proposed) <= HYSTERESIS_THRESHOLD {
            log::trace!(
                "Retune: keeping {} workers (proposal {})",
                self.workers,
                proposed
            );
            return Ok(false);
        }

        log::info!("Retune: {} -> {} workers", self.workers, proposed);
        self.pool = rayon::ThreadPoolBuilder::new()
            .num_threads(proposed)
            .build()?;
        self.workers = proposed;
        Ok(true)
    }

    /// Hash every candidate file, isolating per-file failures.
    ///
    /// Returns `(index, digest)` pairs in submission order for the files
    /// that hashed successfully; the index refers back into `files`. A
    /// worker that hits an unreadable file logs it and contributes no
    /// entry; it never terminates the pool or other in-flight workers.
    ///
    /// Setting the shutdown flag stops work on files not yet started;
    /// in-flight reads drain normally and the call still returns, so the
    /// pool never hangs a subsequent call.
    #[must_use]
    pub fn hash_all(&self, files: &[FileEntry], hasher: &Hasher) -> (Vec<(usize, Digest)>, HashingStats) {
        let mut stats = HashingStats {
            input_files: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            return (Vec::new(), stats);
        }

        log::debug!(
            "Hashing {} files on {} workers",
            files.len(),
            self.workers
        );

        // Indexed parallel iterators preserve submission order in the
        // collected vec, which keeps discovery order downstream.
        let results: Vec<(usize, Result<Digest, HashError>)> = self.pool.install(|| {
            files
                .par_iter()
                .enumerate()
                .filter_map(|(idx, file)| {
                    if self.is_shutdown_requested() {
                        return None;
                    }
                    Some((idx, hasher.hash_file(&file.path)))
                })
                .collect()
        });

        if self.is_shutdown_requested() {
            stats.interrupted = true;
            log::info!("Hashing interrupted by shutdown signal");
        }

        let mut hashed = Vec::with_capacity(results.len());
        for (idx, result) in results {
            match result {
                Ok(digest) => {
                    stats.hashed_files += 1;
                    stats.bytes_hashed += files[idx].size;
                    hashed.push((idx, digest));
                }
                Err(e) => {
                    log::warn!("Failed to hash {}: {}", files[idx].path.display(), e);
                    stats.failed_files += 1;
                    stats.errors.push(e);
                }
            }
        }

        (hashed, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> FileEntry {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        FileEntry::new(path, content.len() as u64, 0)
    }

    #[test]
    fn test_default_worker_count_bounds() {
        let count = default_worker_count();
        assert!((MIN_WORKERS..=MAX_WORKERS).contains(&count));
    }

    #[test]
    fn test_pool_clamps_worker_count() {
        let pool = WorkerPool::new(1).unwrap();
        assert_eq!(pool.worker_count(), MIN_WORKERS);

        let pool = WorkerPool::new(1000).unwrap();
        assert_eq!(pool.worker_count(), MAX_WORKERS);
    }

    #[test]
    fn test_hash_all_empty_input() {
        let pool = WorkerPool::new(2).unwrap();
        let (hashed, stats) = pool.hash_all(&[], &Hasher::new());

        assert!(hashed.is_empty());
        assert_eq!(stats.input_files, 0);
        assert_eq!(stats.hashed_files, 0);
    }

    #[test]
    fn test_hash_all_preserves_submission_order() {
        let dir = TempDir::new().unwrap();
        let files: Vec<FileEntry> = (0..20)
            .map(|i| write_file(&dir, &format!("f{i}.bin"), format!("content {i}").as_bytes()))
            .collect();

        let pool = WorkerPool::new(4).unwrap();
        let (hashed, stats) = pool.hash_all(&files, &Hasher::new());

        assert_eq!(stats.hashed_files, 20);
        assert_eq!(stats.failed_files, 0);
        let indices: Vec<usize> = hashed.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_hash_all_isolates_failures() {
        let dir = TempDir::new().unwrap();
        let good = write_file(&dir, "good.bin", b"readable");
        let gone = FileEntry::new(PathBuf::from(dir.path().join("missing.bin")), 8, 0);
        let also_good = write_file(&dir, "good2.bin", b"readable");

        let pool = WorkerPool::new(2).unwrap();
        let (hashed, stats) = pool.hash_all(&[good, gone, also_good], &Hasher::new());

        assert_eq!(stats.hashed_files, 2);
        assert_eq!(stats.failed_files, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(matches!(stats.errors[0], HashError::NotFound(_)));
        assert_eq!(hashed.len(), 2);
        // Identical content hashes identically
        assert_eq!(hashed[0].1, hashed[1].1);
    }

    #[test]
    fn test_hashing_stats_move_with_their_errors() {
        let dir = TempDir::new().unwrap();
        let gone = FileEntry::new(dir.path().join("missing.bin"), 8, 0);

        let pool = WorkerPool::new(2).unwrap();
        let (_, stats) = pool.hash_all(&[gone], &Hasher::new());

        // The io::Error sources travel inside the stats value
        let moved = stats;
        assert_eq!(moved.failed_files, 1);
        assert!(format!("{moved:?}").contains("NotFound"));
    }

    #[test]
    fn test_hash_all_counts_bytes() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.bin", b"12345");
        let b = write_file(&dir, "b.bin", b"1234567890");

        let pool = WorkerPool::new(2).unwrap();
        let (_, stats) = pool.hash_all(&[a, b], &Hasher::new());

        assert_eq!(stats.bytes_hashed, 15);
    }

    #[test]
    fn test_shutdown_flag_stops_submission() {
        let dir = TempDir::new().unwrap();
        let files: Vec<FileEntry> = (0..50)
            .map(|i| write_file(&dir, &format!("f{i}.bin"), b"x"))
            .collect();

        let flag = Arc::new(AtomicBool::new(true));
        let pool = WorkerPool::new(2).unwrap().with_shutdown_flag(flag);
        let (hashed, stats) = pool.hash_all(&files, &Hasher::new());

        assert!(hashed.is_empty());
        assert!(stats.interrupted);
    }

    #[test]
    fn test_pool_reusable_after_interrupted_call() {
        let dir = TempDir::new().unwrap();
        let files = vec![write_file(&dir, "a.bin", b"content")];

        let flag = Arc::new(AtomicBool::new(true));
        let pool = WorkerPool::new(2).unwrap().with_shutdown_flag(Arc::clone(&flag));

        let (hashed, _) = pool.hash_all(&files, &Hasher::new());
        assert!(hashed.is_empty());

        // Clearing the flag must make the same pool fully usable again
        flag.store(false, Ordering::SeqCst);
        let (hashed, stats) = pool.hash_all(&files, &Hasher::new());
        assert_eq!(hashed.len(), 1);
        assert!(!stats.interrupted);
    }

    #[test]
    fn test_retune_hysteresis_keeps_close_counts() {
        let mut pool = WorkerPool::new(4).unwrap();
        let mut strategy = FixedStrategy(5);

        // Difference of 1 is within the hysteresis band
        assert!(!pool.retune(&mut strategy).unwrap());
        assert_eq!(pool.worker_count(), 4);
    }

    #[test]
    fn test_retune_applies_large_changes() {
        let mut pool = WorkerPool::new(4).unwrap();
        let mut strategy = FixedStrategy(12);

        assert!(pool.retune(&mut strategy).unwrap());
        assert_eq!(pool.worker_count(), 12);
    }

    #[test]
    fn test_retune_clamps_proposal() {
        let mut pool = WorkerPool::new(8).unwrap();
        let mut strategy = FixedStrategy(500);

        assert!(pool.retune(&mut strategy).unwrap());
        assert_eq!(pool.worker_count(), MAX_WORKERS);
    }

    #[test]
    fn test_adaptive_strategy_stays_in_bounds() {
        let mut strategy = AdaptiveStrategy::new();
        let proposed = strategy.next_worker_count(8).clamp(MIN_WORKERS, MAX_WORKERS);
        assert!((MIN_WORKERS..=MAX_WORKERS).contains(&proposed));
    }
}
