//! YAML configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::tiles::MAX_TILE;

/// Directory under the user's home for the default config and cache.
pub const CONFIG_DIR_NAME: &str = ".frameshow";
const CACHE_FILE_NAME: &str = "metadata-cache.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// Album directories scanned for photos.
    pub albums: Vec<PathBuf>,

    /// Auto-advance interval.
    #[serde(with = "humantime_serde", default = "Configuration::default_interval")]
    pub interval: Duration,

    /// Draw each photo's capture date.
    #[serde(default = "Configuration::default_true")]
    pub date_overlay: bool,

    /// Shuffle instead of chronological order.
    #[serde(default)]
    pub randomize: bool,

    /// Deterministic shuffle seed; random when absent.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    /// Pair consecutive portraits into side-by-side slides.
    #[serde(default = "Configuration::default_true")]
    pub pair_portraits: bool,

    /// Maximum edge length of a single renderable tile.
    #[serde(default = "Configuration::default_max_tile_size")]
    pub max_tile_size: u32,

    /// Listen for HDMI-CEC remote key presses.
    #[serde(default = "Configuration::default_true")]
    pub remote_enabled: bool,

    /// HDMI input to claim via CEC at startup; no power/input commands are
    /// sent when absent.
    #[serde(default)]
    pub hdmi_input: Option<u8>,

    /// Metadata cache location; defaults to `~/.frameshow/metadata-cache.json`.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Overlay text size in pixels.
    #[serde(default = "Configuration::default_overlay_font_px")]
    pub overlay_font_px: f32,
}

impl Configuration {
    const fn default_interval() -> Duration {
        Duration::from_secs(10)
    }

    const fn default_true() -> bool {
        true
    }

    const fn default_max_tile_size() -> u32 {
        MAX_TILE
    }

    const fn default_overlay_font_px() -> f32 {
        28.0
    }

    /// Programmatic constructor with defaults; albums still need to pass
    /// validation.
    #[must_use]
    pub fn with_albums(albums: Vec<PathBuf>) -> Self {
        Self {
            albums,
            interval: Self::default_interval(),
            date_overlay: true,
            randomize: false,
            shuffle_seed: None,
            pair_portraits: true,
            max_tile_size: Self::default_max_tile_size(),
            remote_enabled: true,
            hdmi_input: None,
            cache_path: None,
            overlay_font_px: Self::default_overlay_font_px(),
        }
    }

    /// Load the configuration from a YAML file.
    ///
    /// # Errors
    /// Fails when the file is unreadable or the YAML does not match.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(cfg)
    }

    /// Validate field ranges, consuming and returning the configuration so
    /// loading chains into one expression.
    ///
    /// # Errors
    /// Fails on an empty album list or out-of-range values.
    pub fn validated(self) -> Result<Self> {
        ensure!(!self.albums.is_empty(), "albums must list at least one directory");
        ensure!(
            self.interval >= Duration::from_secs(1),
            "interval must be at least 1s"
        );
        ensure!(
            (256..=16_384).contains(&self.max_tile_size),
            "max-tile-size must be between 256 and 16384"
        );
        if let Some(input) = self.hdmi_input {
            ensure!((1..=4).contains(&input), "hdmi-input must be between 1 and 4");
        }
        ensure!(
            self.overlay_font_px.is_finite() && self.overlay_font_px >= 8.0,
            "overlay-font-px must be at least 8"
        );
        Ok(self)
    }

    /// Resolved metadata cache path.
    #[must_use]
    pub fn cache_file(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_DIR_NAME)
                .join(CACHE_FILE_NAME)
        })
    }
}

/// Default config file location: `~/.frameshow/config.yaml`.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join("config.yaml")
}
