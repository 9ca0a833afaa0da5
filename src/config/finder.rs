//! Configuration file discovery.
//!
//! Finds the nearest recognized config file by walking from a start
//! directory toward the filesystem root, and can enumerate every config file
//! under a tree for multi-project workflows.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::{Result, RulezError};

/// Recognized config filenames, in priority order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".ai-rulez.yaml",
    ".ai-rulez.yml",
    "ai-rulez.yaml",
    "ai-rulez.yml",
    ".ai_rulez.yaml",
    ".ai_rulez.yml",
    "ai_rulez.yaml",
    "ai_rulez.yml",
];

/// Search for a config file starting at `start_dir` and walking up through
/// its ancestors. Within one directory, names are tried in
/// [`CONFIG_FILE_NAMES`] priority order.
pub fn find_config_file(start_dir: &Path) -> Result<PathBuf> {
    let start = std::path::absolute(start_dir).map_err(|e| RulezError::io(start_dir, e))?;

    let mut dir = start.as_path();
    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "found configuration file");
                return Ok(candidate);
            }
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }

    Err(RulezError::ConfigNotFound {
        start: start.display().to_string(),
    })
}

/// Recursively find every recognized config file under `root`, skipping
/// hidden directories. Results are sorted for deterministic output.
pub fn find_all_config_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut configs = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        // Descend into the root itself and any non-hidden directory.
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        !entry.file_name().to_string_lossy().starts_with('.')
    });

    for entry in walker {
        let entry = entry.map_err(|e| RulezError::Io {
            path: root.display().to_string(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if CONFIG_FILE_NAMES.contains(&name.as_ref()) {
            configs.push(entry.into_path());
        }
    }

    if configs.is_empty() {
        return Err(RulezError::ConfigNotFound {
            start: root.display().to_string(),
        });
    }

    configs.sort();
    Ok(configs)
}
