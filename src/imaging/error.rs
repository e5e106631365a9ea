use thiserror::Error;

/// Configuration errors raised by the pixel core before any pixel work begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImagingError {
    #[error("Invalid resize request: {0}")]
    InvalidRequest(String),
    #[error("Invalid kernel: {0}")]
    InvalidKernel(String),
    #[error("Buffer dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },
}
