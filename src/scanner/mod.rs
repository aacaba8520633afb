//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Exclusion rules as a pure, concurrently callable predicate
//! - Streaming SHA-256 content hashing
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`filter`]: the exclusion policy applied per directory entry
//! - [`walker`]: directory traversal and candidate discovery
//! - [`hasher`]: SHA-256 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use treedup::scanner::Walker;
//! use treedup::ScanConfig;
//! use std::path::Path;
//!
//! let config = ScanConfig {
//!     max_depth: Some(3),
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), &config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod filter;
pub mod hasher;
pub mod walker;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// Re-export main types
pub use filter::ExclusionPolicy;
pub use hasher::{digest_to_hex, hex_to_digest, Digest, Hasher, CHUNK_SIZE};
pub use walker::Walker;

/// A candidate file discovered by the walker.
///
/// Owned by the scan that discovered it; workers receive a borrow and
/// return their results separately, so no entry is mutated concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Number of directories between the root and this file
    pub depth: usize,
}

impl FileEntry {
    /// Create a new file entry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, depth: usize) -> Self {
        Self { path, size, depth }
    }

    /// Lowercase extension of the file, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_new() {
        let entry = FileEntry::new(PathBuf::from("/test/file.txt"), 1024, 1);

        assert_eq!(entry.path, PathBuf::from("/test/file.txt"));
        assert_eq!(entry.size, 1024);
        assert_eq!(entry.depth, 1);
    }

    #[test]
    fn test_file_entry_extension_lowercased() {
        let entry = FileEntry::new(PathBuf::from("/photos/IMG_001.JPG"), 10, 0);
        assert_eq!(entry.extension(), Some("jpg".to_string()));
    }

    #[test]
    fn test_file_entry_no_extension() {
        let entry = FileEntry::new(PathBuf::from("/bin/Makefile"), 10, 0);
        assert_eq!(entry.extension(), None);
    }
}
