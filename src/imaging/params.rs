//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the caller (CLI, [`generate`](crate::generate)) and the
//! [`pipeline`](super::pipeline), which does the actual pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (radius + intensity).
//! - [`Rotation`]: Rotation hint applied before the size-reducing resample.
//! - [`Filter`]: Resampling filter used for the dimension reduction.
//! - [`OutputFormat`]: Encoded format handed to the codec.
//! - [`KernelOptions`]: Edge and transparency policy shared by every kernel.
//! - [`ResizeRequest`]: Everything needed for one resize/sharpen run.

use super::error::ImagingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
///
/// Only constructible through [`Quality::new`], so the value is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// The value as the `u8` encoders take.
    pub fn as_u8(self) -> u8 {
        u8::try_from(self.0).unwrap_or(100)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `radius`: Gaussian kernel radius; the kernel is built with size `2 × radius`
///   (forced odd). `0` disables sharpening.
/// - `intensity`: How much of the blur is subtracted from the original.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub radius: u32,
    pub intensity: f32,
}

impl Sharpening {
    pub fn new(radius: u32, intensity: f32) -> Self {
        Self { radius, intensity }
    }

    /// Size of the Gaussian kernel used for this sharpening, before the
    /// odd-size adjustment done by the kernel itself.
    pub fn kernel_size(self) -> u32 {
        self.radius.saturating_mul(2)
    }

    pub fn is_enabled(self) -> bool {
        self.radius > 0
    }
}

impl Default for Sharpening {
    fn default() -> Self {
        Self {
            radius: 0,
            intensity: 1.0,
        }
    }
}

/// Rotation hint applied before resizing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Rotation {
    #[default]
    None,
    /// 90° clockwise.
    Clockwise,
    /// 90° counter-clockwise (270° clockwise).
    CounterClockwise,
    /// Rotate 180° twice before resampling. Pixel-identical, kept so callers
    /// relying on the legacy "force a clean re-sample" step can still ask for it.
    ForceNormalize,
}

impl Rotation {
    /// Whether the rotated image swaps its width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Clockwise | Rotation::CounterClockwise)
    }

    /// Short tag used in generated filenames. `None` has no tag.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Rotation::None => None,
            Rotation::Clockwise => Some("cw"),
            Rotation::CounterClockwise => Some("ccw"),
            Rotation::ForceNormalize => Some("norm"),
        }
    }
}

/// Resampling filter for the dimension reduction step.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<Filter> for image::imageops::FilterType {
    fn from(filter: Filter) -> Self {
        use image::imageops::FilterType;
        match filter {
            Filter::Nearest => FilterType::Nearest,
            Filter::Triangle => FilterType::Triangle,
            Filter::CatmullRom => FilterType::CatmullRom,
            Filter::Gaussian => FilterType::Gaussian,
            Filter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Encoded output format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Gif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Gif => "gif",
        }
    }

    /// Format for a file extension, case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }

    /// Whether the format can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Unsharp-mask intensities must be finite and non-negative.
pub fn validate_intensity(intensity: f32) -> Result<(), ImagingError> {
    if intensity.is_finite() && intensity >= 0.0 {
        Ok(())
    } else {
        Err(ImagingError::InvalidRequest(format!(
            "sharpen intensity must be a non-negative number, got {intensity}"
        )))
    }
}

/// Edge and transparency policy for convolution kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelOptions {
    /// Process pixels within `radius` of the border (neighbors are clamped).
    pub include_edges: bool,
    /// Fully transparent source pixels bypass convolution.
    pub preserve_transparency: bool,
    /// Gaussian center factor used verbatim for kernels of size 3 or less.
    pub center_factor: f32,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            include_edges: true,
            preserve_transparency: true,
            center_factor: super::kernel::DEFAULT_CENTER_FACTOR,
        }
    }
}

/// Parameters for one resize + optional sharpen run.
///
/// A zero `width` or `height` means "derive from the source aspect ratio".
/// At least one of them must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    pub sharpening: Sharpening,
    pub filter: Filter,
    pub kernel: KernelOptions,
}

impl ResizeRequest {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rotation: Rotation::default(),
            sharpening: Sharpening::default(),
            filter: Filter::default(),
            kernel: KernelOptions::default(),
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_sharpening(mut self, sharpening: Sharpening) -> Self {
        self.sharpening = sharpening;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelOptions) -> Self {
        self.kernel = kernel;
        self
    }

    /// Reject requests that cannot be satisfied for any source image.
    pub fn validate(&self) -> Result<(), ImagingError> {
        if self.width == 0 && self.height == 0 {
            return Err(ImagingError::InvalidRequest(
                "target width and height cannot both be zero".into(),
            ));
        }
        if self.sharpening.is_enabled() {
            validate_intensity(self.sharpening.intensity)?;
        }
        let center_factor = self.kernel.center_factor;
        if self.sharpening.is_enabled() && (!center_factor.is_finite() || center_factor <= 0.0) {
            return Err(ImagingError::InvalidKernel(format!(
                "center factor must be positive, got {center_factor}"
            )));
        }
        Ok(())
    }
}
