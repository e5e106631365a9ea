//! Pure Rust codec built on the `image` crate's decoders and encoders.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF) | `image::load_from_memory` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` (single frame) |
//!
//! JPEG has no alpha channel; buffers are flattened to RGB by dropping alpha.

use super::backend::{BackendError, ImageCodec};
use super::buffer::PixelBuffer;
use super::params::{OutputFormat, Quality};
use image::DynamicImage;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;

/// Codec backed by the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_error(format: OutputFormat) -> impl Fn(image::ImageError) -> BackendError {
    move |e| BackendError::Encode {
        format,
        message: e.to_string(),
    }
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError> {
        let image = image::load_from_memory(bytes).map_err(|e| match e {
            image::ImageError::Unsupported(_) => BackendError::UnsupportedFormat(e.to_string()),
            _ => BackendError::Decode(e.to_string()),
        })?;
        Ok(PixelBuffer::from_dynamic(image))
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let image = buffer.to_image();
        let mut out = Vec::new();

        match format {
            OutputFormat::Png => {
                DynamicImage::ImageRgba8(image)
                    .write_with_encoder(PngEncoder::new(&mut out))
                    .map_err(encode_error(format))?;
            }
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut out, quality.as_u8());
                DynamicImage::ImageRgb8(rgb)
                    .write_with_encoder(encoder)
                    .map_err(encode_error(format))?;
            }
            OutputFormat::Gif => {
                let mut encoder = GifEncoder::new(&mut out);
                encoder
                    .encode_frame(image::Frame::new(image))
                    .map_err(encode_error(format))?;
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{checkerboard, uniform};
    use image::Rgba;

    #[test]
    fn png_round_trip_is_lossless() {
        let codec = RustCodec::new();
        let mut src = checkerboard(9, 7, 2);
        src.set_pixel(0, 0, Rgba([1, 2, 3, 0]));

        let bytes = codec.encode(&src, OutputFormat::Png, Quality::default()).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn jpeg_encode_keeps_dimensions() {
        let codec = RustCodec::new();
        let src = uniform(16, 8, Rgba([200, 30, 30, 255]));

        let bytes = codec.encode(&src, OutputFormat::Jpeg, Quality::new(80)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.channel(3, 3, 3), 255);
    }

    #[test]
    fn out_of_range_quality_encodes_at_maximum() {
        let codec = RustCodec::new();
        let src = checkerboard(16, 16, 4);

        let over = codec.encode(&src, OutputFormat::Jpeg, Quality::new(300)).unwrap();
        let max = codec.encode(&src, OutputFormat::Jpeg, Quality::new(100)).unwrap();
        assert_eq!(over, max);
    }

    #[test]
    fn gif_encode_produces_gif_header() {
        let codec = RustCodec::new();
        let src = uniform(4, 4, Rgba([0, 0, 255, 255]));

        let bytes = codec.encode(&src, OutputFormat::Gif, Quality::default()).unwrap();
        assert_eq!(&bytes[..3], b"GIF");
        assert_eq!(codec.decode(&bytes).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn unknown_bytes_are_unsupported() {
        let err = RustCodec::new().decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedFormat(_)));
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let bytes = RustCodec::new()
            .encode(&uniform(8, 8, Rgba([1, 2, 3, 255])), OutputFormat::Png, Quality::default())
            .unwrap();
        let err = RustCodec::new().decode(&bytes[..20]).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }
}
