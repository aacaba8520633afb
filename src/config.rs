//! Scan configuration.
//!
//! [`ScanConfig`] is an immutable value created once per invocation and
//! passed by parameter into every component; no component reads ambient
//! global state. It can be built from defaults, from a flat JSON file, or
//! from `TREEDUP_*` environment variables. Unknown keys are ignored and
//! missing keys fall back to defaults, so callers can share one config
//! source with outer layers.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Immutable configuration for a single scan.
///
/// Safe to share across concurrent readers; never mutated after
/// construction.
///
/// # Example
///
/// ```
/// use treedup::ScanConfig;
///
/// let config = ScanConfig {
///     ignore_patterns: vec!["*.tmp".to_string(), "node_modules".to_string()],
///     max_depth: Some(4),
///     ..Default::default()
/// };
/// assert!(!config.include_hidden);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Shell-glob patterns (`*`, `?`, `[...]`) matched against leaf names.
    /// A matching directory is pruned entirely; a matching file is skipped.
    pub ignore_patterns: Vec<String>,

    /// Include hidden files and directories (leaf name starting with `.`).
    pub include_hidden: bool,

    /// Follow symbolic links during traversal. Symlink cycles are detected
    /// and reported as per-entry errors rather than looping forever.
    pub follow_symlinks: bool,

    /// Maximum traversal depth below the root. `Some(0)` scans only files
    /// directly in the root; `None` is unbounded.
    pub max_depth: Option<usize>,

    /// Minimum file size in bytes for duplicate consideration. Files below
    /// this are still counted in statistics but never hashed. The default
    /// of 1 excludes empty files, which all share a single digest.
    pub min_file_size: u64,

    /// Number of hashing workers. `None` derives a count from available
    /// CPU parallelism (see [`crate::workers::default_worker_count`]).
    pub worker_count: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: Vec::new(),
            include_hidden: false,
            follow_symlinks: false,
            max_depth: None,
            min_file_size: 1,
            worker_count: None,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file.
    ///
    /// Unknown keys in the file are ignored; missing keys take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from a file, falling back to defaults on failure.
    ///
    /// Failures are logged at debug level rather than propagated, matching
    /// the "best effort" contract expected by interactive callers.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Build configuration from `TREEDUP_*` environment variables.
    ///
    /// Recognized variables, all optional:
    ///
    /// - `TREEDUP_EXCLUDE_PATTERNS` - comma-separated glob patterns
    /// - `TREEDUP_INCLUDE_HIDDEN` - `true`/`false`
    /// - `TREEDUP_FOLLOW_SYMLINKS` - `true`/`false`
    /// - `TREEDUP_MAX_DEPTH` - non-negative integer
    /// - `TREEDUP_MIN_FILE_SIZE` - bytes
    /// - `TREEDUP_WORKERS` - worker count
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(patterns) = env::var("TREEDUP_EXCLUDE_PATTERNS") {
            config.ignore_patterns = patterns
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = parse_env("TREEDUP_INCLUDE_HIDDEN", parse_bool) {
            config.include_hidden = v;
        }
        if let Some(v) = parse_env("TREEDUP_FOLLOW_SYMLINKS", parse_bool) {
            config.follow_symlinks = v;
        }
        if let Some(v) = parse_env("TREEDUP_MAX_DEPTH", |s| s.parse().ok()) {
            config.max_depth = Some(v);
        }
        if let Some(v) = parse_env("TREEDUP_MIN_FILE_SIZE", |s| s.parse().ok()) {
            config.min_file_size = v;
        }
        if let Some(v) = parse_env("TREEDUP_WORKERS", |s| s.parse().ok()) {
            config.worker_count = Some(v);
        }

        config
    }
}

/// Read and parse one environment variable, logging unparseable values.
fn parse_env<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        log::warn!("Ignoring invalid value for {}: {:?}", name, raw);
    }
    parsed
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
