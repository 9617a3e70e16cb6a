//! Catalog assembly: scan the albums, resolve metadata through the cache,
//! and order the result for playback.

use std::fs;
use std::path::PathBuf;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::cache::MetadataCache;
use crate::config::Configuration;
use crate::error::Error;
use crate::meta::{self, Photo};
use crate::scan;

/// Scan, resolve, and order the photo catalog.
///
/// Files whose metadata cannot be read are skipped with a warning; a
/// completely empty result is `Error::EmptyCatalog`, fatal at startup.
pub fn load(cfg: &Configuration, seed_override: Option<u64>) -> Result<Vec<Photo>, Error> {
    let paths = scan::scan_albums(&cfg.albums);
    let mut cache = MetadataCache::load(&cfg.cache_file());

    let mut photos = Vec::with_capacity(paths.len());
    let mut cache_hits = 0usize;
    for path in &paths {
        let mtime = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot stat photo; skipping");
                continue;
            }
        };
        if let Some(photo) = cache.get(path, mtime) {
            cache_hits += 1;
            photos.push(photo);
            continue;
        }
        match meta::read_photo_meta(path) {
            Ok(photo) => {
                cache.insert(&photo, mtime);
                photos.push(photo);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read photo metadata; skipping");
            }
        }
    }

    cache.prune(paths.iter());
    if let Err(err) = cache.save() {
        warn!(error = %err, "failed to persist metadata cache");
    }

    if photos.is_empty() {
        return Err(Error::EmptyCatalog);
    }
    info!(
        photos = photos.len(),
        cache_hits,
        "catalog loaded"
    );

    order(&mut photos, cfg, seed_override);
    Ok(photos)
}

/// Chronological by capture time, or a seeded shuffle when randomize is on.
fn order(photos: &mut [Photo], cfg: &Configuration, seed_override: Option<u64>) {
    if cfg.randomize {
        let seed = seed_override.or(cfg.shuffle_seed);
        let mut rng = match seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_os_rng(),
        };
        photos.shuffle(&mut rng);
    } else {
        photos.sort_by(|a, b| a.taken_at.cmp(&b.taken_at).then_with(|| a.path.cmp(&b.path)));
    }
}
