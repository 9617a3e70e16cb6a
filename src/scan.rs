//! Directory scanning: discover image files under the configured albums.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Return `true` if `path` has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if ["jpg", "jpeg", "png", "gif", "webp"].contains(&e.as_str())
    )
}

/// Recursively scan each album directory for image files.
///
/// A missing or unreadable album is skipped with a warning; one bad
/// directory never aborts the whole scan. The result is sorted by path so
/// downstream ordering starts from a deterministic base.
#[must_use]
pub fn scan_albums(albums: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in albums {
        if !root.is_dir() {
            warn!(album = %root.display(), "album directory missing; skipping");
            continue;
        }
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file() && is_supported_image(path) {
                        found.push(path.to_path_buf());
                    }
                }
                Err(err) => {
                    warn!(album = %root.display(), error = %err, "skipping unreadable entry");
                }
            }
        }
    }
    found.sort();
    found.dedup();
    debug!(count = found.len(), "album scan complete");
    found
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
