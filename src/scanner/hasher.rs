//! Streaming SHA-256 file hasher.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing SHA-256 content
//! digests via bounded-memory streaming reads. Files are read in fixed
//! 8 KiB chunks, so peak memory is independent of file size.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest as _, Sha256};

use crate::error::HashError;

/// A 256-bit content digest.
pub type Digest = [u8; 32];

/// Read chunk size in bytes. Matches the page-multiple buffer the kernel
/// readahead path handles well.
pub const CHUNK_SIZE: usize = 8192;

/// Convert a digest to a lowercase hex string.
///
/// # Example
///
/// ```
/// use treedup::scanner::digest_to_hex;
///
/// let mut digest = [0u8; 32];
/// digest[0] = 0xAB;
/// assert!(digest_to_hex(&digest).starts_with("ab00"));
/// ```
#[must_use]
pub fn digest_to_hex(digest: &Digest) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a lowercase hex string back into a digest.
///
/// Returns `None` if the string is not exactly 64 hex characters.
#[must_use]
pub fn hex_to_digest(hex: &str) -> Option<Digest> {
    if hex.len() != 64 {
        return None;
    }
    let mut digest = [0u8; 32];
    for (i, byte) in digest.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(digest)
}

/// Content hasher with streaming reads.
///
/// Stateless and cheap to share across workers.
#[derive(Debug, Default)]
pub struct Hasher;

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute the SHA-256 digest of a file's full content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read; the
    /// variant distinguishes vanished files from permission problems.
    pub fn hash_file(&self, path: &Path) -> Result<Digest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; CHUNK_SIZE];

        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(hasher.finalize().into())
    }
}
