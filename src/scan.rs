//! Scan orchestration: the engine's entry points.
//!
//! [`Scanner`] wires the walker, worker pool, aggregator, and statistics
//! collector together behind two explicitly named operations:
//!
//! - [`Scanner::scan_path`] walks a root directory, then hashes.
//! - [`Scanner::hash_candidates`] hashes an already-discovered candidate
//!   list, for callers that run their own discovery.
//!
//! Both are synchronous and return a [`ScanOutcome`]. A scan interrupted
//! through the shutdown flag returns whatever was aggregated so far, with
//! `stats.interrupted` set, rather than raising from an inconsistent
//! state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;

use crate::config::ScanConfig;
use crate::duplicates::{self, DuplicateGroup};
use crate::error::ScanError;
use crate::scanner::{Digest, FileEntry, Hasher, Walker};
use crate::stats::{ScanStatistics, StatsCollector};
use crate::workers::WorkerPool;

/// Result of one completed (or interrupted) scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Confirmed duplicate groups; members in discovery order
    pub groups: Vec<DuplicateGroup>,
    /// Scan-wide statistics snapshot
    pub stats: ScanStatistics,
}

impl ScanOutcome {
    /// The digest -> paths mapping consumed by reporting collaborators.
    #[must_use]
    pub fn digest_map(&self) -> HashMap<Digest, Vec<PathBuf>> {
        duplicates::digest_map(&self.groups)
    }
}

/// The duplicate-detection engine.
///
/// Holds an immutable [`ScanConfig`] and an optional shutdown flag;
/// construct one per invocation.
///
/// # Example
///
/// ```no_run
/// use treedup::{ScanConfig, Scanner};
/// use std::path::Path;
///
/// let scanner = Scanner::new(ScanConfig::default());
/// let outcome = scanner.scan_path(Path::new("/home/user/Downloads")).unwrap();
/// for group in &outcome.groups {
///     println!("{} x{}", group.digest_hex(), group.len());
/// }
/// ```
#[derive(Debug)]
pub struct Scanner {
    config: ScanConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Scanner {
    /// Create a scanner with the given configuration.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Setting the flag stops issuing new work; in-flight work drains and
    /// the partial outcome is returned with `stats.interrupted` set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configuration this scanner runs with.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan a directory tree and group byte-identical files.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] / [`ScanError::NotADirectory`] for
    /// a bad root before any work begins, and [`ScanError::Pool`] if the
    /// worker pool cannot be built. Per-file failures are logged, skipped,
    /// and reflected in `stats.failed_files` only.
    pub fn scan_path(&self, root: &Path) -> Result<ScanOutcome, ScanError> {
        log::info!("Scanning {}", root.display());

        let mut walker = Walker::new(root, &self.config);
        if let Some(ref flag) = self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let files = walker.collect_files()?;
        self.hash_candidates(files)
    }

    /// Group byte-identical files among pre-discovered candidates.
    ///
    /// Every candidate is observed by the statistics exactly once; files
    /// whose size is unique among the candidates are never hashed.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pool`] if the worker pool cannot be built.
    pub fn hash_candidates(&self, files: Vec<FileEntry>) -> Result<ScanOutcome, ScanError> {
        let mut collector = StatsCollector::new();
        for file in &files {
            collector.observe(file);
        }

        let workers = self
            .config
            .worker_count
            .unwrap_or_else(crate::workers::default_worker_count);
        let mut pool = WorkerPool::new(workers)?;
        if let Some(ref flag) = self.shutdown_flag {
            pool = pool.with_shutdown_flag(Arc::clone(flag));
        }

        let hasher = Hasher::new();
        let (groups, finder_stats) =
            duplicates::find_duplicates(files, &pool, &hasher, self.config.min_file_size);

        let mut stats = collector.finalize(&groups, &finder_stats);
        if self
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
        {
            // Covers shutdown during traversal, before any hashing began
            stats.interrupted = true;
        }
        log::info!(
            "Scan complete: {} files ({}), {} duplicate groups, {} wasted",
            stats.total_files,
            ByteSize(stats.total_bytes),
            stats.duplicate_groups,
            ByteSize(stats.wasted_space)
        );

        Ok(ScanOutcome { groups, stats })
    }
}
