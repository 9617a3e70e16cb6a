//! On-disk photo metadata cache.
//!
//! Keyed by path, invalidated by file modification time, so repeated
//! catalog loads skip re-reading EXIF from unchanged files. The file is a
//! versioned JSON document written atomically (tmp + rename).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::meta::{GeoCoord, Orientation, Photo};

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: HashMap<PathBuf, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    #[serde(rename = "mod-time-ns")]
    mod_time_ns: u64,
    #[serde(rename = "taken-at")]
    taken_at: DateTime<Utc>,
    width: u32,
    height: u32,
    orientation: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coordinates: Option<GeoCoord>,
}

/// In-memory view of the metadata cache.
#[derive(Debug)]
pub struct MetadataCache {
    path: PathBuf,
    entries: HashMap<PathBuf, CacheEntry>,
    dirty: bool,
}

impl MetadataCache {
    /// Load the cache at `path`. A missing file, unreadable JSON, or a
    /// version mismatch all yield an empty cache rather than an error.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read(path) {
            Ok(data) => match serde_json::from_slice::<CacheFile>(&data) {
                Ok(file) if file.version == CACHE_VERSION => file.entries,
                Ok(file) => {
                    debug!(found = file.version, "metadata cache version mismatch; starting fresh");
                    HashMap::new()
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "unreadable metadata cache; starting fresh");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        }
    }

    /// Look up a photo by path; hits only when the file's modification time
    /// still matches the cached one.
    #[must_use]
    pub fn get(&self, path: &Path, mtime: SystemTime) -> Option<Photo> {
        let entry = self.entries.get(path)?;
        if entry.mod_time_ns != mtime_ns(mtime) {
            return None;
        }
        Some(Photo {
            path: path.to_path_buf(),
            taken_at: entry.taken_at,
            width: entry.width,
            height: entry.height,
            orientation: Orientation::from_exif(entry.orientation),
            coordinates: entry.coordinates,
        })
    }

    pub fn insert(&mut self, photo: &Photo, mtime: SystemTime) {
        self.entries.insert(
            photo.path.clone(),
            CacheEntry {
                mod_time_ns: mtime_ns(mtime),
                taken_at: photo.taken_at,
                width: photo.width,
                height: photo.height,
                orientation: photo.orientation.exif_code(),
                coordinates: photo.coordinates,
            },
        );
        self.dirty = true;
    }

    /// Drop entries whose paths are no longer part of the catalog.
    pub fn prune<'a>(&mut self, valid: impl IntoIterator<Item = &'a PathBuf>) {
        let keep: std::collections::HashSet<&PathBuf> = valid.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|path, _| keep.contains(path));
        if self.entries.len() != before {
            self.dirty = true;
        }
    }

    /// Persist the cache if anything changed. Written to a sibling tmp file
    /// first, then renamed over the target.
    ///
    /// # Errors
    /// Fails when the cache directory cannot be created or written.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }
        let file = CacheFile {
            version: CACHE_VERSION,
            entries: self.entries.clone(),
        };
        let data = serde_json::to_vec_pretty(&file).context("serializing metadata cache")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &data)
            .with_context(|| format!("writing metadata cache {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing metadata cache {}", self.path.display()))?;
        self.dirty = false;
        debug!(path = %self.path.display(), entries = self.entries.len(), "metadata cache saved");
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn mtime_ns(mtime: SystemTime) -> u64 {
    mtime
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}
