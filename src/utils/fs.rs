//! File system helpers shared by config saving and output generation.
//!
//! Directory creation is idempotent ("already exists" is not an error), and
//! checksums are SHA-256 hex digests used by the generator's hash gate.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;

use crate::core::{Result, RulezError};

/// Ensure a directory exists, creating it and all parents if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| RulezError::io(path, e))
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    Ok(())
}

/// SHA-256 hex digest of an in-memory buffer.
#[must_use]
pub fn content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// SHA-256 hex digest of a file, streamed so large files never load fully
/// into memory.
pub fn calculate_checksum(path: &Path) -> Result<String> {
    let file = fs::File::open(path).map_err(|e| RulezError::io(path, e))?;
    let mut reader = io::BufReader::new(file);
    let mut hasher = Sha256::new();

    io::copy(&mut reader, &mut hasher).map_err(|e| RulezError::io(path, e))?;

    Ok(hex::encode(hasher.finalize()))
}
