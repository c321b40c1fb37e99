//! Directory walk used by the exhaustive project scan

use super::is_excluded_dir;
use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

fn is_excluded(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(is_excluded_dir)
        .unwrap_or(false)
}

/// Every directory under `base` (inclusive) in file-name order.
///
/// Excluded directories are pruned together with their whole subtree, the
/// base included. Symlinks are not followed. Unreadable descendants are
/// skipped; an unreadable base is an error.
pub fn collect_directories(base: &Path) -> Result<Vec<PathBuf>> {
    std::fs::metadata(base)
        .map_err(|e| CoreError::Io(format!("cannot scan {}: {}", base.display(), e)))?;

    let mut dirs = Vec::new();
    let walker = WalkDir::new(base)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_excluded(e)));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
            Ok(_) => {}
            Err(e) if e.depth() == 0 => {
                return Err(CoreError::Io(format!("cannot scan {}: {}", base.display(), e)));
            }
            Err(e) => {
                debug!(error = %e, "Skipping unreadable directory entry");
            }
        }
    }

    Ok(dirs)
}
