//! Local filesystem collector
//!
//! Walks a scan target and produces one [`FileRef`] per regular file.
//! Symlinks are not followed. Hidden directories (`.git`, `.cache`, ...) are
//! pruned unless requested; hidden files such as `.env` are always collected.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use contraband_core::types::FileRef;

use crate::error::CliError;

/// Collector options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// Descend into directories whose name starts with '.'.
    pub include_hidden_dirs: bool,
}

/// Collect the files under `target`, sorted by path.
///
/// A file target yields a single `FileRef` named after the file.
///
/// # Errors
///
/// Returns `CliError::Root` if `target` does not exist.
pub fn collect(target: &Path, options: CollectOptions) -> Result<Vec<FileRef>, CliError> {
    let metadata = std::fs::metadata(target)
        .map_err(|e| CliError::Root(format!("cannot access {}: {}", target.display(), e)))?;

    if metadata.is_file() {
        let root = target.parent().unwrap_or(target);
        return Ok(vec![FileRef::from_path(target, root)?]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(target)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| options.include_hidden_dirs || !is_hidden_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match FileRef::from_path(entry.path(), target) {
            Ok(file) => files.push(file),
            Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping file"),
        }
    }

    debug!(target = %target.display(), files = files.len(), "collected files");
    Ok(files)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}
