//! Configuration loading.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. stock defaults ([`LkConfig::default`])
//! 2. a `config.toml` file: `--config <file>` if given, otherwise
//!    `<user config dir>/lk/config.toml` when it exists
//! 3. command-line flags (applied by `main`)
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # cache_dir = "~/.cache/lk"  # Where thumbnails are stored
//!
//! [thumbnails]
//! width = 230               # Bounding box, pixels
//! height = 230
//! quality = 85              # JPEG quality (1-100)
//! sharpen = false           # Light unsharp mask after resizing
//! layout = "absolute"       # "absolute" or "relative" cache layout
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 0                  # 0 = pick a free port
//!
//! [processing]
//! max_processes = 4         # Workers for `lk warm` (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, Sharpening, ThumbnailConfig};
use crate::store::CacheLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LkConfig {
    /// Thumbnail cache directory. Defaults to `<user cache dir>/lk`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    pub thumbnails: ThumbnailsConfig,
    pub server: ServerConfig,
    pub processing: ProcessingConfig,
}

impl LkConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.width == 0 || self.thumbnails.height == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.width and thumbnails.height must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.server.bind.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind is not an IP address: {}",
                self.server.bind
            )));
        }
        Ok(())
    }

    /// Effective cache root: the configured directory or the platform default.
    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// `<user cache dir>/lk`, e.g. `~/.cache/lk` on Linux. Falls back to the
/// system temp directory on platforms without a cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("lk")
}

/// `<user config dir>/lk/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lk").join("config.toml"))
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Bounding box width in pixels.
    pub width: u32,
    /// Bounding box height in pixels.
    pub height: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Apply a light unsharp mask after downscaling.
    pub sharpen: bool,
    /// How source paths are mirrored under the cache directory.
    pub layout: CacheLayout,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        let defaults = ThumbnailConfig::default();
        Self {
            width: defaults.max_width,
            height: defaults.max_height,
            quality: defaults.quality.value(),
            sharpen: false,
            layout: CacheLayout::default(),
        }
    }
}

impl ThumbnailsConfig {
    /// The generator's view of these settings.
    pub fn to_thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            max_width: self.width,
            max_height: self.height,
            quality: Quality::new(self.quality),
            sharpening: self.sharpen.then(Sharpening::light),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on. The default exposes the gallery to the LAN.
    pub bind: String,
    /// Port to listen on; 0 lets the OS pick one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 0,
        }
    }
}

/// Parallel processing settings for `lk warm`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(LkConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LkConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LkConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the default location is used
/// if present and stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<LkConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => match default_config_path() {
            Some(path) => load_raw_config(&path)?,
            None => None,
        },
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# lk configuration
# ================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Default location: ~/.config/lk/config.toml (or pass --config <file>).
# Command-line flags override values from this file.
# Unknown keys will cause an error.

# Directory for cached thumbnails. Defaults to the user cache directory
# (~/.cache/lk on Linux).
# cache_dir = "/home/me/.cache/lk"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Bounding box in pixels. Images are scaled to fit, aspect ratio preserved.
width = 230
height = 230

# JPEG quality (1 = worst, 100 = best).
quality = 85

# Light unsharp mask after resizing.
sharpen = false

# Cache layout:
#   "absolute" - <cache_dir>/<full source path>, shareable between trees
#   "relative" - <cache_dir>/<path below the served directory>
layout = "absolute"

# ---------------------------------------------------------------------------
# Server
# ---------------------------------------------------------------------------
[server]
# Address to listen on. 0.0.0.0 makes the gallery reachable from the LAN.
bind = "0.0.0.0"

# Port to listen on. 0 picks a free port.
port = 0

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `lk warm`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
