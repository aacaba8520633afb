//! treedup - parallel duplicate-file detection engine.
//!
//! Scans a directory tree, computes SHA-256 content digests, and groups
//! byte-identical files, with scan-wide statistics collected along the
//! way. Traversal applies configurable exclusion rules and prunes
//! rejected subtrees; hashing runs on a bounded worker pool and files
//! whose size is unique in the tree are never hashed at all.
//!
//! The crate is the engine only: argument parsing, interactive
//! resolution, and report rendering live in consuming applications,
//! which receive a digest-to-paths mapping plus a [`ScanStatistics`]
//! snapshot.
//!
//! # Example
//!
//! ```no_run
//! use treedup::{ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let config = ScanConfig {
//!     ignore_patterns: vec!["node_modules".to_string(), "*.tmp".to_string()],
//!     ..Default::default()
//! };
//!
//! let outcome = Scanner::new(config).scan_path(Path::new("/data")).unwrap();
//! println!(
//!     "{} duplicate groups, {} bytes wasted",
//!     outcome.stats.duplicate_groups, outcome.stats.wasted_space
//! );
//! ```

pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod routes;
pub mod scan;
pub mod scanner;
pub mod stats;
pub mod workers;

pub use config::ScanConfig;
pub use duplicates::DuplicateGroup;
pub use error::{ConfigError, HashError, ScanError};
pub use scan::{ScanOutcome, Scanner};
pub use stats::ScanStatistics;
