//! Pure calculation functions for resize dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::error::ImagingError;
use super::params::Rotation;

/// Source dimensions as seen after applying `rotation`.
///
/// A quarter turn swaps the axes, so ratios must be computed on the swapped pair.
pub fn oriented_dimensions(source: (u32, u32), rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_axes() {
        (source.1, source.0)
    } else {
        source
    }
}

/// Fill in a zero target side from the source aspect ratio.
///
/// # Arguments
/// * `source` - Source dimensions (width, height), both nonzero
/// * `target` - Requested bounding box; `0` means "derive"
///
/// # Returns
/// * `(width, height)` - Bounding box with both sides set
///
/// # Examples
/// ```
/// # use dyngfx::imaging::calculations::derive_target;
/// // 100x50 with only a width of 50 → 50x25
/// assert_eq!(derive_target((100, 50), (50, 0)).unwrap(), (50, 25));
/// ```
pub fn derive_target(source: (u32, u32), target: (u32, u32)) -> Result<(u32, u32), ImagingError> {
    let (src_w, src_h) = source;
    let ratio = src_w as f64 / src_h as f64;

    match target {
        (0, 0) => Err(ImagingError::InvalidRequest(
            "target width and height cannot both be zero".into(),
        )),
        (w, 0) => Ok((w, ((w as f64 / ratio).round() as u32).max(1))),
        (0, h) => Ok((((h as f64 * ratio).round() as u32).max(1), h)),
        both => Ok(both),
    }
}

/// Calculate the output size for fitting `source` into a bounding box.
///
/// Preserves the source aspect ratio. The side whose shrink ratio
/// (`source / target`) is larger binds; the other is recomputed from the
/// aspect ratio so neither axis is distorted. Never upscales.
///
/// # Arguments
/// * `source` - Source dimensions (width, height), already axis-swapped for rotation
/// * `target` - Requested bounding box; one side may be `0`
///
/// # Returns
/// * `Ok(None)` - The source already fits (or is empty): no resize
/// * `Ok(Some((width, height)))` - Output dimensions
/// * `Err(InvalidRequest)` - Both target sides are zero
pub fn calculate_fit_dimensions(
    source: (u32, u32),
    target: (u32, u32),
) -> Result<Option<(u32, u32)>, ImagingError> {
    if target == (0, 0) {
        return Err(ImagingError::InvalidRequest(
            "target width and height cannot both be zero".into(),
        ));
    }

    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return Ok(None);
    }

    let (tgt_w, tgt_h) = derive_target(source, target)?;
    if src_w <= tgt_w && src_h <= tgt_h {
        return Ok(None);
    }

    let ratio = src_w as f64 / src_h as f64;
    let width_ratio = src_w as f64 / tgt_w as f64;
    let height_ratio = src_h as f64 / tgt_h as f64;

    let dims = if width_ratio > height_ratio {
        // Width binds: height follows the aspect ratio
        (tgt_w, ((tgt_w as f64 / ratio).round() as u32).max(1))
    } else {
        // Height binds: width follows the aspect ratio
        (((tgt_h as f64 * ratio).round() as u32).max(1), tgt_h)
    };
    Ok(Some(dims))
}
