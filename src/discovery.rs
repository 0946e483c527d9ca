//! Manifest discovery for batch import.
//!
//! Finds every `*manifest.json` below a root folder, which covers both the
//! per-variant `manifest.json` layout and flattened
//! `{group}_{variant}_manifest.json` exports.

use glob::glob;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::manifest::MANIFEST_SUFFIX;

/// Error during manifest discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Root folder does not exist or is not a directory
    #[error("import folder not found: {}", .0.display())]
    NotADirectory(PathBuf),
    /// Invalid glob pattern
    #[error("invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, #[source] glob::PatternError),
}

/// Discover files under `base_dir` matching `pattern`, sorted by path.
///
/// Unreadable entries are returned separately so the caller can report them.
pub fn discover_files(
    base_dir: &Path,
    pattern: &str,
) -> Result<(Vec<PathBuf>, Vec<glob::GlobError>), DiscoveryError> {
    // Glob metacharacters in the base path would otherwise be interpreted
    let full_pattern =
        format!("{}/{}", glob::Pattern::escape(&base_dir.to_string_lossy()), pattern);

    let paths = glob(&full_pattern)
        .map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    let mut errors = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }

    files.sort();
    Ok((files, errors))
}

/// Recursively find every manifest under `root`.
pub fn discover_manifests(
    root: &Path,
) -> Result<(Vec<PathBuf>, Vec<glob::GlobError>), DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }
    discover_files(root, &format!("**/*{}", MANIFEST_SUFFIX))
}
