//! Raster core: convolution, unsharp mask and resize.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Blur / sharpen** | [`ConvolutionKernel`] over a [`PixelBuffer`], rows in parallel with `rayon` |
//! | **Rotate / resample** | `image::imageops` (`rotate90`/`rotate270`/`rotate180`, `resize`) |
//! | **Decode / encode** | [`ImageCodec`] trait, [`RustCodec`] on the `image` crate |
//!
//! The module is split into:
//! - **Buffer**: channel-addressed RGBA storage and combine strategies
//! - **Kernel**: Gaussian synthesis and convolution
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a resize request
//! - **Pipeline**: Planning + execution of rotate/resize/sharpen
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]

pub mod backend;
pub mod buffer;
pub mod calculations;
mod error;
pub mod kernel;
mod params;
pub mod pipeline;
pub mod rust_backend;

pub use backend::{BackendError, ImageCodec};
pub use buffer::{PixelBuffer, combine};
pub use error::ImagingError;
pub use kernel::{ConvolutionKernel, DEFAULT_CENTER_FACTOR};
pub use params::{
    Filter, KernelOptions, OutputFormat, Quality, ResizeRequest, Rotation, Sharpening,
    validate_intensity,
};
pub use pipeline::{ResizePlan, plan_resize, resize_and_sharpen};
pub use rust_backend::RustCodec;
