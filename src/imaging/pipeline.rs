//! Resize + sharpen pipeline.
//!
//! Combines the pure [`calculations`](super::calculations) with the pixel
//! core. Planning happens first and validates everything (target box, kernel
//! parameters), so an invalid request is rejected before any pixel work:
//!
//! 1. Swap the source axes if a quarter-turn rotation is requested.
//! 2. Derive the missing target side and pick the binding axis; never upscale.
//! 3. Rotate.
//! 4. Resample to the planned size with the requested [`Filter`](super::Filter).
//! 5. Unsharp-mask with a Gaussian kernel of size `2 × radius` if sharpening is on.

use super::buffer::PixelBuffer;
use super::calculations::{calculate_fit_dimensions, oriented_dimensions};
use super::error::ImagingError;
use super::kernel::ConvolutionKernel;
use super::params::{ResizeRequest, Rotation};
use image::RgbaImage;
use image::imageops;

/// What the pipeline will do for one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizePlan {
    pub rotation: Rotation,
    /// Output size, or `None` when the source already fits.
    pub target: Option<(u32, u32)>,
    /// Sharpening kernel and intensity.
    pub sharpen: Option<(ConvolutionKernel, f32)>,
}

/// Plan a resize without touching pixels.
pub fn plan_resize(source: (u32, u32), request: &ResizeRequest) -> Result<ResizePlan, ImagingError> {
    request.validate()?;
    let oriented = oriented_dimensions(source, request.rotation);
    let target = calculate_fit_dimensions(oriented, (request.width, request.height))?;

    let sharpening = request.sharpening;
    let sharpen = if sharpening.is_enabled() {
        let kernel =
            ConvolutionKernel::gaussian(sharpening.kernel_size(), request.kernel.center_factor)?
                .with_options(&request.kernel);
        Some((kernel, sharpening.intensity))
    } else {
        None
    };

    tracing::debug!(
        ?source,
        ?oriented,
        ?target,
        rotation = ?request.rotation,
        sharpen_radius = sharpening.radius,
        "planned resize"
    );

    Ok(ResizePlan {
        rotation: request.rotation,
        target,
        sharpen,
    })
}

fn rotate(image: RgbaImage, rotation: Rotation) -> RgbaImage {
    match rotation {
        Rotation::None => image,
        Rotation::Clockwise => imageops::rotate90(&image),
        Rotation::CounterClockwise => imageops::rotate270(&image),
        Rotation::ForceNormalize => imageops::rotate180(&imageops::rotate180(&image)),
    }
}

/// Rotate, downscale and optionally sharpen `source` into a new buffer.
pub fn resize_and_sharpen(
    source: &PixelBuffer,
    request: &ResizeRequest,
) -> Result<PixelBuffer, ImagingError> {
    let plan = plan_resize(source.dimensions(), request)?;
    Ok(execute_plan(source, &plan, request))
}

/// Run an already validated plan.
pub fn execute_plan(source: &PixelBuffer, plan: &ResizePlan, request: &ResizeRequest) -> PixelBuffer {
    let mut image = rotate(source.to_image(), plan.rotation);
    if let Some((width, height)) = plan.target {
        image = imageops::resize(&image, width, height, request.filter.into());
    }
    let resized = PixelBuffer::from_rgba(image);

    match &plan.sharpen {
        Some((kernel, intensity)) => kernel.unsharp_mask(&resized, *intensity),
        None => resized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{KernelOptions, Sharpening};
    use crate::test_helpers::{step_edge, uniform};
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn red_100x50_to_width_50() {
        let src = uniform(100, 50, RED);
        let out = resize_and_sharpen(&src, &ResizeRequest::new(50, 0)).unwrap();
        assert_eq!(out, uniform(50, 25, RED));
    }

    #[test]
    fn height_only_request_derives_width() {
        let src = uniform(80, 40, RED);
        let out = resize_and_sharpen(&src, &ResizeRequest::new(0, 10)).unwrap();
        assert_eq!(out.dimensions(), (20, 10));
    }

    #[test]
    fn smaller_source_is_not_upscaled() {
        let src = step_edge(10, 6, 0, 255);
        let out = resize_and_sharpen(&src, &ResizeRequest::new(100, 100)).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn both_zero_is_rejected() {
        let src = uniform(4, 4, RED);
        let err = resize_and_sharpen(&src, &ResizeRequest::new(0, 0)).unwrap_err();
        assert!(matches!(err, ImagingError::InvalidRequest(_)));
    }

    #[test]
    fn bad_kernel_is_rejected_at_planning() {
        let request = ResizeRequest::new(10, 10)
            .with_sharpening(Sharpening::new(1, 1.0))
            .with_kernel(KernelOptions {
                center_factor: 0.0,
                ..KernelOptions::default()
            });
        assert!(matches!(
            plan_resize((20, 20), &request),
            Err(ImagingError::InvalidKernel(_))
        ));
    }

    #[test]
    fn non_finite_intensity_is_rejected() {
        let request =
            ResizeRequest::new(10, 10).with_sharpening(Sharpening::new(2, f32::INFINITY));
        assert!(matches!(
            plan_resize((20, 20), &request),
            Err(ImagingError::InvalidRequest(_))
        ));
    }

    #[test]
    fn plan_swaps_axes_for_quarter_turn() {
        let request = ResizeRequest::new(0, 50).with_rotation(Rotation::Clockwise);
        // 100x50 rotated is 50x100; height 50 binds → 25x50
        let plan = plan_resize((100, 50), &request).unwrap();
        assert_eq!(plan.target, Some((25, 50)));
    }

    #[test]
    fn plan_builds_kernel_of_twice_radius() {
        let request = ResizeRequest::new(10, 0).with_sharpening(Sharpening::new(4, 1.0));
        let plan = plan_resize((100, 100), &request).unwrap();
        let (kernel, intensity) = plan.sharpen.unwrap();
        assert_eq!(kernel.size(), 9);
        assert_eq!(intensity, 1.0);
    }

    #[test]
    fn clockwise_rotation_moves_top_left_to_top_right() {
        let mut src = uniform(3, 2, Rgba([0, 0, 0, 255]));
        src.set_pixel(0, 0, RED);
        let request = ResizeRequest::new(100, 100).with_rotation(Rotation::Clockwise);
        let out = resize_and_sharpen(&src, &request).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(out.get_pixel(1, 0), RED);
    }

    #[test]
    fn counter_clockwise_rotation_moves_top_left_to_bottom_left() {
        let mut src = uniform(3, 2, Rgba([0, 0, 0, 255]));
        src.set_pixel(0, 0, RED);
        let request = ResizeRequest::new(100, 100).with_rotation(Rotation::CounterClockwise);
        let out = resize_and_sharpen(&src, &request).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(out.get_pixel(0, 2), RED);
    }

    #[test]
    fn force_normalize_keeps_pixels() {
        let src = step_edge(12, 5, 10, 240);
        let request = ResizeRequest::new(100, 0).with_rotation(Rotation::ForceNormalize);
        assert_eq!(resize_and_sharpen(&src, &request).unwrap(), src);
    }

    #[test]
    fn sharpen_runs_without_resize() {
        let src = step_edge(30, 4, 60, 190);
        let request = ResizeRequest::new(100, 100).with_sharpening(Sharpening::new(2, 1.0));
        let out = resize_and_sharpen(&src, &request).unwrap();
        assert!(out.channel(15, 2, 0) > 190);
        assert!(out.channel(14, 2, 0) < 60);
    }

    #[test]
    fn sharpen_after_resize_keeps_uniform_color() {
        let src = uniform(64, 64, Rgba([12, 200, 99, 255]));
        let request = ResizeRequest::new(16, 0).with_sharpening(Sharpening::new(3, 2.0));
        let out = resize_and_sharpen(&src, &request).unwrap();
        assert_eq!(out, uniform(16, 16, Rgba([12, 200, 99, 255])));
    }
}
