//! Shared test utilities for the dyngfx test suite.
//!
//! Synthetic buffers with known structure, plus small statistics helpers for
//! asserting on convolution output.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let src = checkerboard(64, 64, 1);
//! let out = ConvolutionKernel::gaussian(6, 1.0).unwrap().blur(&src);
//! assert!(region_variance(&out, (3, 3, 61, 61)) < region_variance(&src, (3, 3, 61, 61)));
//! ```

use crate::imaging::PixelBuffer;
use image::Rgba;

// =========================================================================
// Buffers
// =========================================================================

/// Every pixel is `color`.
pub fn uniform(width: u32, height: u32, color: Rgba<u8>) -> PixelBuffer {
    PixelBuffer::filled(width, height, color)
}

/// Opaque black/white checkerboard with square cells of `cell` pixels.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> PixelBuffer {
    let mut buffer = PixelBuffer::blank(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if ((x / cell) + (y / cell)) % 2 == 0 { 0 } else { 255 };
            buffer.set_pixel(x, y, Rgba([v, v, v, 255]));
        }
    }
    buffer
}

/// Opaque gray step: `dark` for `x < width / 2`, `light` from there on.
pub fn step_edge(width: u32, height: u32, dark: u8, light: u8) -> PixelBuffer {
    let mut buffer = PixelBuffer::blank(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if x < width / 2 { dark } else { light };
            buffer.set_pixel(x, y, Rgba([v, v, v, 255]));
        }
    }
    buffer
}

/// Opaque `color` framed by a fully transparent border `border` pixels wide,
/// like a UI graphic with rounded-off corners.
pub fn transparent_frame(width: u32, height: u32, border: u32, color: Rgba<u8>) -> PixelBuffer {
    let mut buffer = PixelBuffer::blank(width, height);
    for y in border..height.saturating_sub(border) {
        for x in border..width.saturating_sub(border) {
            buffer.set_pixel(x, y, color);
        }
    }
    buffer
}

// =========================================================================
// Statistics
// =========================================================================

/// Variance of the red channel over `[x0, x1) × [y0, y1)`.
pub fn region_variance(buffer: &PixelBuffer, region: (u32, u32, u32, u32)) -> f64 {
    let (x0, y0, x1, y1) = region;
    let values: Vec<f64> = (y0..y1)
        .flat_map(|y| (x0..x1).map(move |x| (x, y)))
        .map(|(x, y)| buffer.channel(x, y, 0) as f64)
        .collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
