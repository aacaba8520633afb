//! Exclusion policy applied during traversal.
//!
//! [`ExclusionPolicy`] is a pure predicate over a path's leaf name, kind,
//! and symlink status. It has no side effects and is safe to call
//! concurrently without synchronization, which lets the walker apply it
//! from parallel directory readers.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::config::ScanConfig;

/// Decides whether a path is skipped during traversal.
///
/// Rules, first match wins:
///
/// 1. Symlink while `follow_symlinks` is off - excluded.
/// 2. Hidden leaf name (leading `.`) while `include_hidden` is off - excluded.
/// 3. Leaf name matches any configured glob pattern - excluded.
/// 4. Otherwise included.
///
/// # Example
///
/// ```
/// use treedup::scanner::ExclusionPolicy;
/// use treedup::ScanConfig;
/// use std::path::Path;
///
/// let config = ScanConfig {
///     ignore_patterns: vec!["*.tmp".to_string()],
///     ..Default::default()
/// };
/// let policy = ExclusionPolicy::new(&config);
///
/// assert!(policy.is_excluded(Path::new("scratch.tmp"), false, false));
/// assert!(!policy.is_excluded(Path::new("notes.txt"), false, false));
/// ```
#[derive(Debug)]
pub struct ExclusionPolicy {
    include_hidden: bool,
    follow_symlinks: bool,
    matcher: Option<Gitignore>,
}

impl ExclusionPolicy {
    /// Build a policy from the scan configuration.
    ///
    /// Invalid glob patterns are logged and skipped rather than failing
    /// the whole scan.
    #[must_use]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            include_hidden: config.include_hidden,
            follow_symlinks: config.follow_symlinks,
            matcher: build_matcher(&config.ignore_patterns),
        }
    }

    /// Check whether a path should be skipped.
    ///
    /// Only the leaf name of `path` participates in pattern matching;
    /// `is_dir` and `is_symlink` describe the entry as seen on disk.
    #[must_use]
    pub fn is_excluded(&self, path: &Path, is_dir: bool, is_symlink: bool) -> bool {
        if is_symlink && !self.follow_symlinks {
            return true;
        }

        let leaf = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            // Root-like paths have no leaf and are never excluded here.
            None => return false,
        };

        if !self.include_hidden && leaf.starts_with('.') {
            return true;
        }

        if let Some(ref matcher) = self.matcher {
            if matcher.matched(leaf.as_ref(), is_dir).is_ignore() {
                return true;
            }
        }

        false
    }
}

/// Build a glob matcher from the configured patterns.
fn build_matcher(patterns: &[String]) -> Option<Gitignore> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GitignoreBuilder::new("");
    for pattern in patterns {
        if let Err(e) = builder.add_line(None, pattern) {
            log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
        }
    }

    match builder.build() {
        Ok(matcher) if !matcher.is_empty() => Some(matcher),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Failed to build ignore patterns: {}", e);
            None
        }
    }
}
