//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based prefiltering (files with a unique size are never hashed)
//! - Digest-based grouping of hashed candidates
//! - Duplicate group types and wasted-space accounting

pub mod finder;
pub mod groups;

pub use finder::{digest_map, find_duplicates, FinderStats};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats};
