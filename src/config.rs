//! Converter configuration.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. stock defaults (below)
//! 2. a TOML file: `--config <FILE>`, or `heic-convert.toml` in the working
//!    directory when it exists
//! 3. command-line flags (`--dir`, `--quality`, `--no-optimize`, `--log-file`)
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! photos_dir = "/app/photos"     # Directory scanned for HEIC/HEIF files
//!
//! [jpeg]
//! quality = 95                   # 1-100
//! optimize = true                # Optimized Huffman tables (smaller files)
//! background = [255, 255, 255]   # RGB that transparent pixels are flattened onto
//!
//! [logging]
//! file = "conversion.log"        # Appended to; "" disables file logging
//! level = "info"                 # trace | debug | info | warn | error
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const CONFIG_FILENAME: &str = "heic-convert.toml";

/// Accepted values for `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Photos directory used when neither the config file nor the CLI set one.
pub const DEFAULT_PHOTOS_DIR: &str = "/app/photos";

/// Full converter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Directory scanned (non-recursively) for HEIC/HEIF files.
    pub photos_dir: PathBuf,
    pub jpeg: JpegConfig,
    pub logging: LoggingConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            photos_dir: PathBuf::from(DEFAULT_PHOTOS_DIR),
            jpeg: JpegConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// JPEG output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    /// Encoding quality (1 = smallest, 100 = best).
    pub quality: u32,
    /// Compute optimized Huffman tables per image.
    pub optimize: bool,
    /// RGB colour that transparent pixels are composited onto.
    pub background: [u8; 3],
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            optimize: true,
            background: [255, 255, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log file path; empty disables file logging.
    pub file: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "conversion.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn log_file(&self) -> Option<&Path> {
        if self.file.is_empty() {
            None
        } else {
            Some(Path::new(&self.file))
        }
    }
}

/// Values given on the command line. `None` / `false` leaves the config alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub photos_dir: Option<PathBuf>,
    pub quality: Option<u32>,
    pub no_optimize: bool,
    pub log_file: Option<PathBuf>,
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg.quality) {
            return Err(ConfigError::Validation(
                "jpeg.quality must be 1-100".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        if self.photos_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "photos_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Apply command-line overrides, then re-validate.
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        if let Some(dir) = &overrides.photos_dir {
            self.photos_dir = dir.clone();
        }
        if let Some(quality) = overrides.quality {
            self.jpeg.quality = quality;
        }
        if overrides.no_optimize {
            self.jpeg.optimize = false;
        }
        if let Some(file) = &overrides.log_file {
            self.logging.file = file.to_string_lossy().into_owned();
        }
        self.validate()?;
        Ok(self)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ConverterConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io(e),
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ConverterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective file-level config.
///
/// An explicit path must exist. Without one, [`CONFIG_FILENAME`] in
/// `working_dir` is used if present, otherwise stock defaults.
pub fn load_config(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<ConverterConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let implicit = working_dir.join(CONFIG_FILENAME);
            if implicit.is_file() {
                Some(load_raw_config(&implicit)?)
            } else {
                None
            }
        }
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# heic-convert configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Save as heic-convert.toml in the working directory, or pass --config <FILE>.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# Directory scanned for .heic/.heif files (not recursive).
# Each photo is converted to a .jpg with the same name, next to the original.
photos_dir = "/app/photos"

# ---------------------------------------------------------------------------
# JPEG output
# ---------------------------------------------------------------------------
[jpeg]
# Encoding quality, 1 (smallest) to 100 (best).
quality = 95

# Compute optimized Huffman tables for each image. Smaller files, same pixels.
optimize = true

# JPEG has no transparency. Transparent pixels are blended onto this RGB colour.
background = [255, 255, 255]

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# Log file, appended to on every run. Set to "" to log to the console only.
file = "conversion.log"

# One of: trace, debug, info, warn, error. RUST_LOG takes precedence.
level = "info"
"##
}
