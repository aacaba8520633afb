//! Typed error taxonomy for the scan engine.
//!
//! Errors fall into two tiers:
//!
//! - **Fatal** ([`ScanError`]): a bad root path or a worker-pool failure
//!   aborts the whole scan with no partial result.
//! - **Per-file** ([`HashError`]): an unreadable file is logged, skipped,
//!   and never affects sibling files.
//!
//! Callers can match on variants to distinguish "directory not found" from
//! "partial read failures occurred" instead of parsing message strings.

use std::path::PathBuf;

/// Fatal errors raised by [`crate::Scanner`] operations.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The root path does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The root path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Permission was denied when accessing a path.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while accessing a path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be constructed.
    #[error("Worker pool failure: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Per-file errors raised while hashing one candidate.
///
/// These are non-fatal: the worker logs the failure and contributes no
/// entry for that path.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file vanished between discovery and hashing.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify a raw I/O error encountered while reading `path`.
    #[must_use]
    pub fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors raised while loading a [`crate::ScanConfig`] from a file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path to the configuration file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        /// Path to the configuration file
        path: PathBuf,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },
}
