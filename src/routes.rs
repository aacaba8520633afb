//! Similar-route analysis over directory paths.
//!
//! Flags pairs of directory routes under a root whose component-wise
//! similarity meets a threshold, which tends to surface parallel copies
//! of the same subtree (`backup/photos/2023` next to `photos/2023`).
//! Similarity is the fraction of matching leading components over the
//! longer route's component count. Pure comparison, quadratic in the
//! number of directories; intended for the moderate directory counts a
//! duplicate scan deals with.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Default similarity threshold.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// A pair of directory routes with their similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSimilarity {
    /// First route, relative to the analyzed root
    pub first: String,
    /// Second route, relative to the analyzed root
    pub second: String,
    /// Similarity score in `[0, 1]`
    pub score: f64,
}

/// Analyzer for similar directory routes.
#[derive(Debug)]
pub struct RouteAnalyzer {
    root: PathBuf,
    threshold: f64,
}

impl RouteAnalyzer {
    /// Create an analyzer for the given root with the default threshold.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Override the similarity threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Find route pairs at or above the similarity threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] / [`ScanError::NotADirectory`] for
    /// a bad root. Per-entry traversal errors are logged and skipped.
    pub fn find_similar_routes(&self) -> Result<Vec<RouteSimilarity>, ScanError> {
        let routes = self.collect_routes()?;

        let mut similar = Vec::new();
        for (i, first) in routes.iter().enumerate() {
            for second in &routes[i + 1..] {
                let score = route_similarity(first, second);
                if score >= self.threshold {
                    similar.push(RouteSimilarity {
                        first: first.clone(),
                        second: second.clone(),
                        score,
                    });
                }
            }
        }

        log::debug!(
            "Route analysis: {} routes, {} similar pairs at threshold {}",
            routes.len(),
            similar.len(),
            self.threshold
        );
        Ok(similar)
    }

    /// Collect root-relative directory routes.
    fn collect_routes(&self) -> Result<Vec<String>, ScanError> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| {
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

        let mut routes = Vec::new();
        for entry in WalkDir::new(&self.root).skip_hidden(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Route analysis skipping entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            if path == self.root {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.root) {
                routes.push(normalize_route(&relative.to_string_lossy()));
            }
        }
        Ok(routes)
    }
}

/// Component-wise similarity between two routes.
///
/// Matching leading components divided by the larger component count;
/// empty routes score zero.
#[must_use]
pub fn route_similarity(first: &str, second: &str) -> f64 {
    if first.is_empty() || second.is_empty() {
        return 0.0;
    }

    let first = normalize_route(first);
    let second = normalize_route(second);

    let parts1: Vec<&str> = first.split('/').collect();
    let parts2: Vec<&str> = second.split('/').collect();

    let matches = parts1
        .iter()
        .zip(parts2.iter())
        .filter(|(a, b)| a == b)
        .count();
    let total = parts1.len().max(parts2.len());

    matches as f64 / total as f64
}

/// Normalize separators so Windows and Unix routes compare equal.
fn normalize_route(route: &str) -> String {
    route.replace('\\', "/")
}
