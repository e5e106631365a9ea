//! # dyngfx
//!
//! Generates sharpened, blurred and resized raster graphics (buttons,
//! thumbnails, corners) and caches them on disk.
//!
//! # Architecture
//!
//! ```text
//! bytes ─► decode ─► PixelBuffer ─► rotate/resize ─► ConvolutionKernel ─► encode ─► cache
//!          (codec)                  (pipeline)       (unsharp mask)       (codec)
//! ```
//!
//! The pixel core ([`imaging`]) is pure and single-owner: every operation
//! takes a buffer by reference and returns a fresh one. It has no I/O. The
//! host layer ([`generate`], [`cache`], [`naming`], [`config`]) decides whether
//! regeneration is needed, talks to the codec and persists results.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pixel buffer, convolution kernels, resize/sharpen pipeline, codec boundary |
//! | [`generate`] | Per-source and batch generation: cache lookup, decode, process, encode, write |
//! | [`cache`] | Content-addressed manifest of generated files |
//! | [`naming`] | Output filenames derived from the request |
//! | [`config`] | `dyngfx.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## Channel-addressed buffer
//!
//! Convolution runs on a flat RGBA byte vector indexed as
//! `(y · width + x) · 4 + channel`, not through the `image` crate's per-pixel
//! API. The `image` crate is used at the edges: decoding, encoding, rotation
//! and resampling.
//!
//! ## Alpha is never convolved
//!
//! Blur and sharpen only touch R, G and B. Alpha is copied through, and fully
//! transparent pixels can bypass convolution entirely, so transparent corners
//! of UI graphics stay clean.
//!
//! ## Explicit settings
//!
//! Encoder quality, output folder and format are carried in
//! [`generate::GenerateSettings`], never in global state.

pub mod cache;
pub mod config;
pub mod generate;
pub mod imaging;
pub mod naming;

#[cfg(test)]
pub(crate) mod test_helpers;
