//! Codec boundary trait and shared error type.
//!
//! The pixel core never touches file formats. The [`ImageCodec`] trait defines
//! the two operations the host must supply: decode bytes into a
//! [`PixelBuffer`], and encode a buffer into bytes of a given format and
//! quality.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), built on the `image` crate.

use super::buffer::PixelBuffer;
use super::params::{OutputFormat, Quality};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to encode {format}: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },
}

/// Trait for image codecs.
///
/// Implementations must be `Sync` so a single codec can serve parallel
/// generation jobs.
pub trait ImageCodec: Sync {
    /// Decode an encoded image into an RGBA buffer.
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError>;

    /// Encode a buffer. `quality` only matters for lossy formats.
    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::Mutex;

    /// Mock codec that records calls and fabricates images.
    ///
    /// `decode` returns a uniform buffer of `decode_size` (or fails when
    /// `fail_decode` is set); `encode` returns `width`, `height` as bytes.
    /// Uses Mutex (not RefCell) so it is Sync like a real codec.
    pub struct MockCodec {
        pub decode_size: (u32, u32),
        pub fail_decode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode { len: usize },
        Encode {
            width: u32,
            height: u32,
            format: OutputFormat,
            quality: u32,
        },
    }

    impl MockCodec {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                decode_size: (width, height),
                fail_decode: false,
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_decode: true,
                ..Self::new(1, 1)
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageCodec for MockCodec {
        fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode { len: bytes.len() });
            if self.fail_decode {
                return Err(BackendError::Decode("mock decode failure".into()));
            }
            let (w, h) = self.decode_size;
            Ok(PixelBuffer::filled(w, h, Rgba([255, 0, 0, 255])))
        }

        fn encode(
            &self,
            buffer: &PixelBuffer,
            format: OutputFormat,
            quality: Quality,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: buffer.width(),
                height: buffer.height(),
                format,
                quality: quality.value(),
            });
            let mut bytes = buffer.width().to_le_bytes().to_vec();
            bytes.extend_from_slice(&buffer.height().to_le_bytes());
            Ok(bytes)
        }
    }

    #[test]
    fn mock_records_decode_and_encode() {
        let codec = MockCodec::new(4, 3);
        let buffer = codec.decode(b"abc").unwrap();
        assert_eq!(buffer.dimensions(), (4, 3));

        let bytes = codec
            .encode(&buffer, OutputFormat::Jpeg, Quality::new(70))
            .unwrap();
        assert_eq!(bytes.len(), 8);

        let ops = codec.get_operations();
        assert_eq!(ops[0], RecordedOp::Decode { len: 3 });
        assert!(matches!(
            ops[1],
            RecordedOp::Encode {
                width: 4,
                height: 3,
                format: OutputFormat::Jpeg,
                quality: 70,
            }
        ));
    }

    #[test]
    fn failing_mock_reports_decode_error() {
        let codec = MockCodec::failing();
        assert!(matches!(codec.decode(b""), Err(BackendError::Decode(_))));
    }
}
