//! Generator configuration.
//!
//! Handles loading and validating `dyngfx.toml`. All values have defaults;
//! a config file only needs the keys it wants to override. Settings that the
//! legacy graphics classes kept in static fields (encoder quality, output
//! folder) live here and are passed explicitly to [`generate`](crate::generate).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "png"            # png | jpeg | gif
//! quality = 90              # 1-100, JPEG only
//! folder = "generated"      # Where generated graphics are written
//!
//! [resize]
//! filter = "lanczos3"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [sharpen]
//! radius = 0                # 0 disables sharpening
//! intensity = 1.0
//!
//! [kernel]
//! include_edges = true          # Convolve pixels near the border (neighbors clamped)
//! preserve_transparency = true  # Fully transparent pixels bypass convolution
//! center_factor = 1.0           # Gaussian center factor for kernels of size <= 3
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    DEFAULT_CENTER_FACTOR, Filter, KernelOptions, OutputFormat, Quality, Sharpening,
    validate_intensity,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "dyngfx.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: OutputConfig,
    pub resize: ResizeConfig,
    pub sharpen: SharpenConfig,
    pub kernel: KernelConfig,
    pub processing: ProcessingConfig,
}

/// Encoding and persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Encoder quality (1 = worst, 100 = best). Ignored by lossless formats.
    pub quality: u32,
    /// Folder generated graphics are written to.
    pub folder: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 90,
            folder: PathBuf::from("generated"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: Filter,
}

/// Default unsharp-mask settings applied after resizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharpenConfig {
    pub radius: u32,
    pub intensity: f32,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        let s = Sharpening::default();
        Self {
            radius: s.radius,
            intensity: s.intensity,
        }
    }
}

/// Edge policy for every kernel the generator builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    pub include_edges: bool,
    pub preserve_transparency: bool,
    pub center_factor: f32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            include_edges: true,
            preserve_transparency: true,
            center_factor: DEFAULT_CENTER_FACTOR,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads. When absent, all CPU cores are used.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

impl Config {
    /// Load and validate a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate config text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if validate_intensity(self.sharpen.intensity).is_err() {
            return Err(ConfigError::Validation(
                "sharpen.intensity must be a non-negative number".into(),
            ));
        }
        if !self.kernel.center_factor.is_finite() || self.kernel.center_factor <= 0.0 {
            return Err(ConfigError::Validation(
                "kernel.center_factor must be positive".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.output.quality)
    }

    pub fn sharpening(&self) -> Sharpening {
        Sharpening::new(self.sharpen.radius, self.sharpen.intensity)
    }

    pub fn kernel_options(&self) -> KernelOptions {
        KernelOptions {
            include_edges: self.kernel.include_edges,
            preserve_transparency: self.kernel.preserve_transparency,
            center_factor: self.kernel.center_factor,
        }
    }
}

/// Resolve the effective thread count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// A documented config file with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# dyngfx configuration
# All options are optional - defaults shown below.

[output]
# Encoded format of generated graphics: "png", "jpeg" or "gif".
format = "png"
# Encoder quality, 1 (worst) to 100 (best). Only used for JPEG.
quality = 90
# Folder generated graphics and the cache manifest are written to.
folder = "generated"

[resize]
# Resampling filter: "nearest", "triangle", "catmull-rom", "gaussian", "lanczos3".
filter = "lanczos3"

[sharpen]
# Unsharp-mask radius applied after resizing. 0 disables sharpening.
radius = 0
# How strongly the blur is subtracted from the original.
intensity = 1.0

[kernel]
# Convolve pixels near the image border, clamping neighbor lookups.
include_edges = true
# Leave fully transparent pixels untouched.
preserve_transparency = true
# Gaussian center factor, used only for kernels of size 3 or less.
center_factor = 1.0

[processing]
# Maximum parallel workers. Omit to use every CPU core.
# max_processes = 4
"#
}
