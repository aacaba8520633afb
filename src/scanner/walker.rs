//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and collecting candidate files for duplicate detection. It uses
//! [`jwalk`] for parallel directory walking (4x faster than walkdir).
//!
//! Excluded directories are pruned inside jwalk's `process_read_dir`
//! hook, so their subtrees are never listed at all. Per-entry errors
//! (permission denied, entry vanished) are yielded as values and never
//! abort the walk of sibling entries.
//!
//! # Example
//!
//! ```no_run
//! use treedup::scanner::Walker;
//! use treedup::ScanConfig;
//! use std::path::Path;
//!
//! let config = ScanConfig {
//!     ignore_patterns: vec!["target".to_string()],
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), &config);
//! let files = walker.collect_files().expect("root should exist");
//! println!("Found {} candidate files", files.len());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::filter::ExclusionPolicy;
use super::FileEntry;
use crate::config::ScanConfig;
use crate::error::ScanError;

/// Directory walker for parallel candidate discovery.
///
/// Applies the [`ExclusionPolicy`] per directory entry and prunes
/// rejected subtrees before descending into them.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Follow symbolic links during traversal
    follow_symlinks: bool,
    /// Depth bound below the root, if any
    max_depth: Option<usize>,
    /// Shared exclusion predicate, applied from parallel readers
    policy: Arc<ExclusionPolicy>,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root path.
    #[must_use]
    pub fn new(root: &Path, config: &ScanConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            follow_symlinks: config.follow_symlinks,
            max_depth: config.max_depth,
            policy: Arc::new(ExclusionPolicy::new(config)),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag becomes `true`, the walker stops yielding entries
    /// as soon as possible.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Validate the root path before any traversal work begins.
    fn check_root(&self) -> Result<(), ScanError> {
        let metadata = fs::metadata(&self.root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::NotFound(self.root.clone())
            } else {
                ScanError::Io {
                    path: self.root.clone(),
                    source: e,
                }
            }
        })?;

        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Walk the tree and collect candidate files in discovery order.
    ///
    /// Per-entry errors are logged and skipped; they never abort sibling
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] if the root does not exist and
    /// [`ScanError::NotADirectory`] if it is not a directory. Both are
    /// raised before any traversal work begins.
    pub fn collect_files(&self) -> Result<Vec<FileEntry>, ScanError> {
        self.check_root()?;

        let mut files = Vec::new();
        for result in self.walk() {
            match result {
                Ok(entry) => files.push(entry),
                Err(e) => log::warn!("Skipping entry: {}", e),
            }
        }
        Ok(files)
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Returns an iterator over [`FileEntry`] results. Errors are yielded
    /// as [`ScanError`] values rather than stopping iteration. No ordering
    /// between files is guaranteed beyond sibling-name sorting within each
    /// directory.
    ///
    /// # Performance
    ///
    /// Uses parallel directory reading via jwalk; the exclusion policy is
    /// applied inside the reader threads, so pruned subtrees cost nothing.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let policy = Arc::clone(&self.policy);

        let mut walk_dir = WalkDir::new(&self.root)
            .follow_links(self.follow_symlinks)
            .skip_hidden(false)
            .process_read_dir(move |depth, _path, _read_dir_state, children| {
                // Sort children for deterministic discovery order
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });

                // A depth of None is the synthetic listing holding the root
                // entry itself; the exclusion rules apply only below the
                // root, so a hidden-named or pattern-matching root still
                // gets scanned.
                if depth.is_none() {
                    return;
                }

                // Dropping a directory entry here prunes its whole subtree
                children.retain(|result| match result {
                    Ok(entry) => {
                        let file_type = entry.file_type();
                        let excluded = policy.is_excluded(
                            Path::new(entry.file_name()),
                            file_type.is_dir(),
                            file_type.is_symlink(),
                        );
                        if excluded {
                            log::trace!("Excluded: {}", entry.file_name().to_string_lossy());
                        }
                        !excluded
                    }
                    // Per-entry read errors are surfaced to the iterator
                    Err(_) => true,
                });
            });

        if let Some(depth) = self.max_depth {
            // jwalk counts the root as depth 0, so files at the configured
            // bound sit at jwalk depth bound + 1.
            walk_dir = walk_dir.max_depth(depth.saturating_add(1));
        }

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();

                    // Skip the root directory itself
                    if path == self.root {
                        return None;
                    }

                    if entry.file_type().is_dir() {
                        return None;
                    }

                    let metadata = if self.follow_symlinks {
                        fs::metadata(&path)
                    } else {
                        fs::symlink_metadata(&path)
                    };

                    let metadata = match metadata {
                        Ok(m) => m,
                        Err(e) => return Some(Err(io_error_for(&path, e))),
                    };

                    // Skip sockets, FIFOs, and symlinks resolved to non-files
                    if !metadata.is_file() {
                        return None;
                    }

                    let depth = entry.depth().saturating_sub(1);
                    Some(Ok(FileEntry::new(path, metadata.len(), depth)))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    }))
                }
            }
        })
    }
}

/// Classify an I/O error for a single entry.
fn io_error_for(path: &Path, error: std::io::Error) -> ScanError {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::PermissionDenied => {
            log::warn!("Permission denied: {}", path.display());
            ScanError::PermissionDenied(path.to_path_buf())
        }
        ErrorKind::NotFound => {
            log::debug!("Entry vanished during walk: {}", path.display());
            ScanError::NotFound(path.to_path_buf())
        }
        _ => {
            log::warn!("I/O error for {}: {}", path.display(), error);
            ScanError::Io {
                path: path.to_path_buf(),
                source: error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    /// Create a test tree:
    /// root/file1.txt, root/file2.txt, root/subdir/nested.txt
    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        let mut f = File::create(dir.path().join("file1.txt")).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let mut f = File::create(dir.path().join("file2.txt")).unwrap();
        writeln!(f, "Another file").unwrap();

        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        let mut f = File::create(subdir.join("nested.txt")).unwrap();
        writeln!(f, "Nested file content").unwrap();

        dir
    }

    #[test]
    fn test_walker_finds_files() {
        let dir = create_test_dir();
        let walker = Walker::new(dir.path(), &ScanConfig::default());

        let files = walker.collect_files().unwrap();
        assert_eq!(files.len(), 3);

        for file in &files {
            assert!(file.size > 0);
            assert!(file.path.exists());
        }
    }

    #[test]
    fn test_walker_depths() {
        let dir = create_test_dir();
        let walker = Walker::new(dir.path(), &ScanConfig::default());

        let files = walker.collect_files().unwrap();
        for file in &files {
            let expected = if file.path.file_name().unwrap() == "nested.txt" {
                1
            } else {
                0
            };
            assert_eq!(file.depth, expected, "depth of {}", file.path.display());
        }
    }

    #[test]
    fn test_walker_max_depth_zero() {
        let dir = create_test_dir();
        let config = ScanConfig {
            max_depth: Some(0),
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), &config);

        let files = walker.collect_files().unwrap();
        assert_eq!(files.len(), 2);
        for file in &files {
            assert_ne!(file.path.file_name().unwrap(), "nested.txt");
        }
    }

    #[test]
    fn test_walker_max_depth_includes_bound() {
        let dir = create_test_dir();
        let config = ScanConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), &config);

        // Files exactly at the bound stay in
        let files = walker.collect_files().unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_walker_ignore_patterns_prune_directories() {
        let dir = create_test_dir();

        // A duplicate of file1 hidden in an ignored subtree
        let ignored = dir.path().join("node_modules");
        fs::create_dir(&ignored).unwrap();
        let mut f = File::create(ignored.join("copy.txt")).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let config = ScanConfig {
            ignore_patterns: vec!["node_modules".to_string()],
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), &config);

        let files = walker.collect_files().unwrap();
        assert_eq!(files.len(), 3);
        for file in &files {
            assert!(!file.path.to_string_lossy().contains("node_modules"));
        }
    }

    #[test]
    fn test_walker_ignore_patterns_skip_files() {
        let dir = create_test_dir();

        let mut f = File::create(dir.path().join("scratch.tmp")).unwrap();
        writeln!(f, "Temporary").unwrap();

        let config = ScanConfig {
            ignore_patterns: vec!["*.tmp".to_string()],
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), &config);

        let files = walker.collect_files().unwrap();
        for file in &files {
            assert!(!file.path.to_string_lossy().ends_with(".tmp"));
        }
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_walker_skips_hidden_by_default() {
        let dir = create_test_dir();

        let mut f = File::create(dir.path().join(".hidden")).unwrap();
        writeln!(f, "Hidden content").unwrap();

        let hidden_dir = dir.path().join(".cache");
        fs::create_dir(&hidden_dir).unwrap();
        let mut f = File::create(hidden_dir.join("entry.txt")).unwrap();
        writeln!(f, "Inside hidden dir").unwrap();

        let walker = Walker::new(dir.path(), &ScanConfig::default());
        let files = walker.collect_files().unwrap();

        assert_eq!(files.len(), 3);
        for file in &files {
            let name = file.path.file_name().unwrap().to_string_lossy().to_string();
            assert!(!name.starts_with('.'));
        }
    }

    #[test]
    fn test_walker_includes_hidden_when_configured() {
        let dir = create_test_dir();

        let mut f = File::create(dir.path().join(".hidden")).unwrap();
        writeln!(f, "Hidden content").unwrap();

        let config = ScanConfig {
            include_hidden: true,
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), &config);

        let files = walker.collect_files().unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_skips_symlinks_by_default() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        symlink(dir.path().join("file1.txt"), dir.path().join("link.txt")).unwrap();

        let walker = Walker::new(dir.path(), &ScanConfig::default());
        let files = walker.collect_files().unwrap();

        assert_eq!(files.len(), 3);
        for file in &files {
            assert_ne!(file.path.file_name().unwrap(), "link.txt");
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_follows_symlinks_when_configured() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        symlink(dir.path().join("file1.txt"), dir.path().join("link.txt")).unwrap();

        let config = ScanConfig {
            follow_symlinks: true,
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), &config);

        let files = walker.collect_files().unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_survives_symlink_cycle() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        // subdir/loop -> root, a cycle once links are followed
        symlink(dir.path(), dir.path().join("subdir").join("loop")).unwrap();

        let config = ScanConfig {
            follow_symlinks: true,
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), &config);

        // Must terminate; cycle entries surface as skipped errors
        let files = walker.collect_files().unwrap();
        assert!(files.len() >= 3);
    }

    #[test]
    fn test_walker_hidden_named_root_is_scanned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join(".snapshots");
        fs::create_dir(&root).unwrap();
        let mut f = File::create(root.join("a.txt")).unwrap();
        writeln!(f, "content").unwrap();

        // The hidden-name rule applies below the root, never to it
        let walker = Walker::new(&root, &ScanConfig::default());
        let files = walker.collect_files().unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_walker_root_matching_ignore_pattern_is_scanned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("node_modules");
        fs::create_dir(&root).unwrap();
        let mut f = File::create(root.join("index.js")).unwrap();
        writeln!(f, "module").unwrap();

        let config = ScanConfig {
            ignore_patterns: vec!["node_modules".to_string()],
            ..Default::default()
        };
        let walker = Walker::new(&root, &config);
        let files = walker.collect_files().unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_walker_nonexistent_root() {
        let walker = Walker::new(Path::new("/nonexistent/path/12345"), &ScanConfig::default());
        let err = walker.collect_files().unwrap_err();
        assert!(matches!(err, ScanError::NotFound(_)));
    }

    #[test]
    fn test_walker_root_is_a_file() {
        let dir = create_test_dir();
        let walker = Walker::new(&dir.path().join("file1.txt"), &ScanConfig::default());
        let err = walker.collect_files().unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn test_walker_empty_directory() {
        let dir = TempDir::new().unwrap();
        let walker = Walker::new(dir.path(), &ScanConfig::default());
        let files = walker.collect_files().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_walker_shutdown_flag() {
        let dir = create_test_dir();
        for i in 0..10 {
            let mut f = File::create(dir.path().join(format!("extra{i}.txt"))).unwrap();
            writeln!(f, "Content {i}").unwrap();
        }

        let shutdown = Arc::new(AtomicBool::new(true));
        let walker =
            Walker::new(dir.path(), &ScanConfig::default()).with_shutdown_flag(shutdown);

        let files = walker.collect_files().unwrap();
        assert!(
            files.len() < 5,
            "Expected early termination, got {} files",
            files.len()
        );
    }
}
