//! Square convolution kernels and the unsharp mask built on top of them.
//!
//! A [`ConvolutionKernel`] is an odd-sized `N × N` matrix of `f32` weights plus
//! the sum of those weights (`total`). Applying it to a [`PixelBuffer`]
//! produces a new buffer where each R, G and B value is the weighted sum of its
//! neighborhood divided by `total`. Alpha is copied through, never convolved.
//!
//! ## Gaussian synthesis
//!
//! For a requested size `S` the kernel size is `N = S | 1` and the radius
//! `R = N / 2`. Each cell at distance `d` from the center gets
//! `exp(−d² / center_factor)`. Kernels of size 3 or less use the caller's
//! center factor verbatim; larger ones use `−2R² / ln(0.01)`, which puts the
//! corner cells at 1% of the center weight whatever the size.
//!
//! ## Edge policy
//!
//! - `include_edges = false`: pixels within `R` of a border are not processed
//!   and stay transparent in the output.
//! - `include_edges = true`: every pixel is processed; neighbor coordinates are
//!   clamped per axis into the image.
//! - `preserve_transparency = true`: a fully transparent source pixel is copied
//!   to the output unchanged.
//!
//! Rows are convolved in parallel with rayon. Each task writes one row of the
//! freshly allocated output, so results match a sequential pass exactly.

use super::buffer::{ALPHA, CHANNELS, PixelBuffer, combine, constrain};
use super::error::ImagingError;
use super::params::KernelOptions;
use rayon::prelude::*;

/// Center factor used for small Gaussian kernels when the caller has no preference.
pub const DEFAULT_CENTER_FACTOR: f32 = 1.0;

/// Relative weight of the corner cells of a Gaussian kernel larger than 3×3.
const CORNER_WEIGHT: f32 = 0.01;

/// Odd-sized square convolution matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionKernel {
    size: usize,
    radius: usize,
    weights: Vec<f32>,
    total: f32,
    include_edges: bool,
    preserve_transparency: bool,
}

impl ConvolutionKernel {
    /// Build a kernel from explicit row-major weights.
    ///
    /// `size` must be odd and `weights` must hold `size × size` values whose
    /// sum is finite and nonzero.
    pub fn from_weights(size: usize, weights: Vec<f32>) -> Result<Self, ImagingError> {
        if size % 2 == 0 {
            return Err(ImagingError::InvalidKernel(format!(
                "size must be odd, got {size}"
            )));
        }
        if weights.len() != size * size {
            return Err(ImagingError::InvalidKernel(format!(
                "expected {} weights for a {size}x{size} kernel, got {}",
                size * size,
                weights.len()
            )));
        }
        let total: f32 = weights.iter().sum();
        if total == 0.0 || !total.is_finite() {
            return Err(ImagingError::InvalidKernel(format!(
                "weights must sum to a finite nonzero total, got {total}"
            )));
        }
        Ok(Self::with_weights(size, weights, total))
    }

    /// Synthesize a Gaussian kernel of (at least) the requested size.
    pub fn gaussian(size: u32, center_factor: f32) -> Result<Self, ImagingError> {
        if !center_factor.is_finite() || center_factor <= 0.0 {
            return Err(ImagingError::InvalidKernel(format!(
                "center factor must be positive, got {center_factor}"
            )));
        }

        let n = (size | 1) as usize;
        let r = n / 2;
        let factor = if n > 3 {
            -2.0 * (r * r) as f32 / CORNER_WEIGHT.ln()
        } else {
            center_factor
        };

        let mut weights = Vec::with_capacity(n * n);
        let mut total = 0.0f32;
        for i in 0..n {
            let dy = i as f32 - r as f32;
            for j in 0..n {
                let dx = j as f32 - r as f32;
                let weight = (-(dx * dx + dy * dy) / factor).exp();
                total += weight;
                weights.push(weight);
            }
        }

        tracing::debug!(size = n, radius = r, center_factor = factor, total, "gaussian kernel");
        Ok(Self::with_weights(n, weights, total))
    }

    fn with_weights(size: usize, weights: Vec<f32>, total: f32) -> Self {
        let defaults = KernelOptions::default();
        Self {
            size,
            radius: size / 2,
            weights,
            total,
            include_edges: defaults.include_edges,
            preserve_transparency: defaults.preserve_transparency,
        }
    }

    pub fn with_include_edges(mut self, include_edges: bool) -> Self {
        self.include_edges = include_edges;
        self
    }

    pub fn with_preserve_transparency(mut self, preserve_transparency: bool) -> Self {
        self.preserve_transparency = preserve_transparency;
        self
    }

    /// Take both edge flags from `options`.
    pub fn with_options(self, options: &KernelOptions) -> Self {
        self.with_include_edges(options.include_edges)
            .with_preserve_transparency(options.preserve_transparency)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Sum of all weights; the normalization divisor.
    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn include_edges(&self) -> bool {
        self.include_edges
    }

    pub fn preserve_transparency(&self) -> bool {
        self.preserve_transparency
    }

    /// Raw weight at `(row, col)`.
    pub fn weight(&self, row: usize, col: usize) -> f32 {
        self.weights[row * self.size + col]
    }

    /// Row-major raw weights, unscaled.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Convolve `source` and return a new buffer.
    ///
    /// With `invert`, the blur is turned into an unsharp mask: the original is
    /// combined with the blurred result via [`combine::invert`] using
    /// `intensity` as the factor.
    ///
    /// With `include_edges` off, the unprocessed border of the blur is blank,
    /// so in sharpen mode border channels come out as `(intensity + 1) · c`
    /// with the source alpha.
    pub fn apply(&self, source: &PixelBuffer, invert: bool, intensity: f32) -> PixelBuffer {
        let blurred = self.convolve(source);
        if !invert {
            return blurred;
        }
        let mut sharpened = source.clone();
        sharpened.combine_unchecked(&blurred, combine::invert, intensity);
        sharpened
    }

    /// Plain convolution (Gaussian blur for a Gaussian kernel).
    pub fn blur(&self, source: &PixelBuffer) -> PixelBuffer {
        self.apply(source, false, 0.0)
    }

    /// Unsharp-mask sharpening.
    pub fn unsharp_mask(&self, source: &PixelBuffer, intensity: f32) -> PixelBuffer {
        self.apply(source, true, intensity)
    }

    fn convolve(&self, source: &PixelBuffer) -> PixelBuffer {
        let (width, height) = source.dimensions();
        if source.is_empty() {
            return PixelBuffer::blank(width, height);
        }

        let r = self.radius as u32;
        let (xs, ys) = if self.include_edges {
            (0..width, 0..height)
        } else {
            (r..width.saturating_sub(r), r..height.saturating_sub(r))
        };

        let src = source.as_raw();
        let row_len = width as usize * CHANNELS;
        // All zeros: every pixel starts out as transparent black.
        let mut out = vec![0u8; row_len * height as usize];

        out.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as u32;
                if !ys.contains(&y) {
                    return;
                }
                for x in xs.clone() {
                    let o = x as usize * CHANNELS;
                    let i = y as usize * row_len + o;
                    let pixel = &mut row[o..o + CHANNELS];
                    if self.preserve_transparency && src[i + ALPHA] == 0 {
                        pixel.copy_from_slice(&src[i..i + CHANNELS]);
                        continue;
                    }
                    let rgb = self.sample(source, x, y);
                    pixel[..ALPHA].copy_from_slice(&rgb);
                    pixel[ALPHA] = src[i + ALPHA];
                }
            });

        PixelBuffer::from_raw(width, height, out)
    }

    /// Weighted, normalized RGB of the neighborhood around `(x, y)`.
    fn sample(&self, source: &PixelBuffer, x: u32, y: u32) -> [u8; 3] {
        let src = source.as_raw();
        let width = source.width() as i64;
        let max_x = width - 1;
        let max_y = source.height() as i64 - 1;
        let r = self.radius as i64;

        let mut acc = [0.0f32; 3];
        for ky in -r..=r {
            let sy = (y as i64 + ky).clamp(0, max_y);
            let weights = &self.weights[(ky + r) as usize * self.size..][..self.size];
            for (kx, &weight) in (-r..=r).zip(weights) {
                let sx = (x as i64 + kx).clamp(0, max_x);
                let i = (sy * width + sx) as usize * CHANNELS;
                acc[0] += src[i] as f32 * weight;
                acc[1] += src[i + 1] as f32 * weight;
                acc[2] += src[i + 2] as f32 * weight;
            }
        }
        acc.map(|sum| constrain(sum / self.total))
    }
}
