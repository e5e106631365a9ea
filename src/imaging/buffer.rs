//! Channel-addressed pixel storage for the convolution core.
//!
//! A [`PixelBuffer`] is a flat `width × height × 4` byte array in RGBA order,
//! indexed as `(y · width + x) · 4 + channel`. Tight loops go through plain
//! slice indexing instead of the `image` crate's per-pixel API; conversion to
//! and from [`RgbaImage`] happens only at the codec boundary.
//!
//! Coordinates are the caller's responsibility. An out-of-range access panics:
//! dropping a write silently would corrupt convolution results undetectably.

use super::error::ImagingError;
use image::{DynamicImage, Rgba, RgbaImage};

/// Channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Index of the alpha channel within a pixel.
pub const ALPHA: usize = 3;

/// Fully transparent black, the fill color of [`PixelBuffer::blank`].
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pluggable per-channel combination used by [`PixelBuffer::combine_with`].
///
/// Called as `combine(this, other, factor)`; the result is clamped to `[0, 255]`.
pub mod combine {
    /// `c1 + factor · c2`
    pub fn add(c1: f32, c2: f32, factor: f32) -> f32 {
        c1 + factor * c2
    }

    /// Unsharp-mask inversion: `(factor + 1) · c1 − factor · c2`, where `c1` is
    /// the original value and `c2` the blurred one.
    pub fn invert(c1: f32, c2: f32, factor: f32) -> f32 {
        (factor + 1.0) * c1 - factor * c2
    }

    /// Keeps `c1`.
    pub fn identity(c1: f32, _c2: f32, _factor: f32) -> f32 {
        c1
    }
}

/// Clamp a computed channel value into `[0, 255]`, rounding to nearest.
///
/// NaN maps to 0. Values never wrap.
#[inline]
pub fn constrain(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Dense RGBA pixel store for a single image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A buffer of the given size where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        let len = width as usize * height as usize;
        let mut data = Vec::with_capacity(len * CHANNELS);
        for _ in 0..len {
            data.extend_from_slice(&color.0);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// A fully transparent buffer, used as the accumulation target of a convolution.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    /// Copy every pixel of a decoded image. The result shares nothing with `image`.
    pub fn from_image(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().clone(),
        }
    }

    /// Take ownership of an RGBA image's pixels without copying.
    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    /// Convert any decoded image to RGBA and take ownership of its pixels.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::from_rgba(image.into_rgba8())
    }

    /// Wrap an RGBA byte vector produced inside the core.
    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * CHANNELS);
        Self {
            width,
            height,
            data,
        }
    }

    /// Reconstitute a standard image for the codec.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| self.get_pixel(x, y))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} buffer",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        let i = self.index(x, y);
        Rgba([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        let i = self.index(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&color.0);
    }

    /// Single channel value (0 = R, 1 = G, 2 = B, 3 = A).
    pub fn channel(&self, x: u32, y: u32, channel: usize) -> u8 {
        assert!(channel < CHANNELS, "channel {channel} out of range");
        self.data[self.index(x, y) + channel]
    }

    /// True iff alpha at `(x, y)` is exactly zero.
    pub fn is_transparent(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y) + ALPHA] == 0
    }

    /// Replace every R, G and B value with `combine(this, other, factor)`,
    /// clamped to `[0, 255]`. Alpha is left alone so transparency masks survive.
    pub fn combine_with<F>(
        &mut self,
        other: &PixelBuffer,
        combine: F,
        factor: f32,
    ) -> Result<(), ImagingError>
    where
        F: Fn(f32, f32, f32) -> f32,
    {
        if self.dimensions() != other.dimensions() {
            return Err(ImagingError::DimensionMismatch {
                left: self.dimensions(),
                right: other.dimensions(),
            });
        }
        self.combine_unchecked(other, combine, factor);
        Ok(())
    }

    /// [`combine_with`](Self::combine_with) for buffers already known to match.
    pub(crate) fn combine_unchecked<F>(&mut self, other: &PixelBuffer, combine: F, factor: f32)
    where
        F: Fn(f32, f32, f32) -> f32,
    {
        for (dst, src) in self
            .data
            .chunks_exact_mut(CHANNELS)
            .zip(other.data.chunks_exact(CHANNELS))
        {
            for c in 0..ALPHA {
                dst[c] = constrain(combine(dst[c] as f32, src[c] as f32, factor));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{checkerboard, uniform};

    #[test]
    fn blank_is_fully_transparent() {
        let b = PixelBuffer::blank(3, 2);
        assert_eq!(b.dimensions(), (3, 2));
        for y in 0..2 {
            for x in 0..3 {
                assert!(b.is_transparent(x, y));
                assert_eq!(b.get_pixel(x, y), TRANSPARENT);
            }
        }
    }

    #[test]
    fn set_then_get_pixel() {
        let mut b = PixelBuffer::blank(4, 4);
        b.set_pixel(2, 3, Rgba([10, 20, 30, 40]));
        assert_eq!(b.get_pixel(2, 3), Rgba([10, 20, 30, 40]));
        assert_eq!(b.channel(2, 3, 1), 20);
        assert!(!b.is_transparent(2, 3));
        assert!(b.is_transparent(3, 2));
    }

    #[test]
    fn flat_layout_is_row_major() {
        let mut b = PixelBuffer::blank(3, 2);
        b.set_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let i = (3 + 1) * CHANNELS;
        assert_eq!(&b.as_raw()[i..i + 4], &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "outside 2x2 buffer")]
    fn out_of_range_write_panics() {
        let mut b = PixelBuffer::blank(2, 2);
        b.set_pixel(2, 0, Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn image_round_trip_is_independent_copy() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(1, 0, Rgba([9, 8, 7, 6]));
        let b = PixelBuffer::from_image(&img);
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));

        assert_eq!(b.get_pixel(1, 0), Rgba([9, 8, 7, 6]));
        assert_eq!(b.to_image().get_pixel(1, 0), &Rgba([9, 8, 7, 6]));
    }

    #[test]
    fn combine_identity_leaves_buffer_unchanged() {
        let original = checkerboard(8, 8, 2);
        let mut b = original.clone();
        b.combine_with(&original, combine::identity, 0.0).unwrap();
        assert_eq!(b, original);
    }

    #[test]
    fn combine_add_clamps_and_keeps_alpha() {
        let mut a = uniform(2, 2, Rgba([200, 10, 0, 77]));
        let b = uniform(2, 2, Rgba([100, 5, 0, 255]));
        a.combine_with(&b, combine::add, 1.0).unwrap();
        assert_eq!(a.get_pixel(0, 0), Rgba([255, 15, 0, 77]));
    }

    #[test]
    fn combine_invert_clamps_below_zero() {
        let mut orig = uniform(1, 1, Rgba([10, 100, 250, 255]));
        let blurred = uniform(1, 1, Rgba([50, 100, 200, 255]));
        orig.combine_with(&blurred, combine::invert, 1.0).unwrap();
        // 2*10 - 50 = -30 -> 0; 2*100 - 100 = 100; 2*250 - 200 = 300 -> 255
        assert_eq!(orig.get_pixel(0, 0), Rgba([0, 100, 255, 255]));
    }

    #[test]
    fn combine_rejects_mismatched_dimensions() {
        let mut a = PixelBuffer::blank(2, 2);
        let b = PixelBuffer::blank(2, 3);
        let err = a.combine_with(&b, combine::add, 1.0).unwrap_err();
        assert_eq!(
            err,
            ImagingError::DimensionMismatch {
                left: (2, 2),
                right: (2, 3)
            }
        );
    }

    #[test]
    fn constrain_rounds_and_clamps() {
        assert_eq!(constrain(-4.0), 0);
        assert_eq!(constrain(254.6), 255);
        assert_eq!(constrain(1000.0), 255);
        assert_eq!(constrain(12.4), 12);
        assert_eq!(constrain(f32::NAN), 0);
    }

    #[test]
    fn empty_buffer_has_no_pixels() {
        let b = PixelBuffer::blank(0, 5);
        assert!(b.is_empty());
        assert!(b.as_raw().is_empty());
    }
}
