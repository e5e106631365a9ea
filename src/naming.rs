//! Filename derivation for generated graphics.
//!
//! Every generated file name spells out the main request parameters and ends
//! with a content fingerprint (see [`cache::content_fingerprint`]), so neither
//! two sources sharing a stem nor two requests differing only in filter,
//! quality or kernel flags collide on disk:
//!
//! ```text
//! {stem}-{W}x{H}[-s{radius}i{intensity}][-{rotation}]-{fingerprint}.{ext}
//! ```
//!
//! - `logo.png`, width 50 → `logo-50x0-3fa9c01b2e.png`
//! - `logo.png`, 50×0, sharpen radius 4 at 1.0, clockwise, JPEG →
//!   `logo-50x0-s4i1.00-cw-3fa9c01b2e.jpg`
//!
//! [`cache::content_fingerprint`]: crate::cache::content_fingerprint
//!
//! Stems are sanitized to `[A-Za-z0-9_-]`; anything else becomes `_`.

use crate::imaging::{OutputFormat, ResizeRequest};
use std::path::Path;

/// Replace characters outside `[A-Za-z0-9_-]` with `_`. Empty stems become `image`.
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// Sanitized file stem of `source` (`images/Logo Big.png` → `Logo_Big`).
pub fn source_stem(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_stem(&stem)
}

/// Derive the output filename for `stem` under `request`, encoded as `format`.
pub fn output_filename(
    stem: &str,
    request: &ResizeRequest,
    format: OutputFormat,
    fingerprint: &str,
) -> String {
    let mut name = format!(
        "{}-{}x{}",
        sanitize_stem(stem),
        request.width,
        request.height
    );
    let sharpening = request.sharpening;
    if sharpening.is_enabled() {
        name.push_str(&format!(
            "-s{}i{:.2}",
            sharpening.radius, sharpening.intensity
        ));
    }
    if let Some(tag) = request.rotation.tag() {
        name.push('-');
        name.push_str(tag);
    }
    name.push('-');
    name.push_str(fingerprint);
    name.push('.');
    name.push_str(format.extension());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Rotation, Sharpening};

    #[test]
    fn plain_resize_name() {
        let request = ResizeRequest::new(50, 0);
        assert_eq!(
            output_filename("logo", &request, OutputFormat::Png, "f00d"),
            "logo-50x0-f00d.png"
        );
    }

    #[test]
    fn sharpen_and_rotation_in_name() {
        let request = ResizeRequest::new(50, 0)
            .with_sharpening(Sharpening::new(4, 1.0))
            .with_rotation(Rotation::Clockwise);
        assert_eq!(
            output_filename("logo", &request, OutputFormat::Jpeg, "f00d"),
            "logo-50x0-s4i1.00-cw-f00d.jpg"
        );
    }

    #[test]
    fn disabled_sharpening_is_omitted() {
        let request = ResizeRequest::new(10, 20).with_sharpening(Sharpening::new(0, 3.0));
        assert_eq!(
            output_filename("a", &request, OutputFormat::Gif, "f00d"),
            "a-10x20-f00d.gif"
        );
    }

    #[test]
    fn force_normalize_has_tag() {
        let request = ResizeRequest::new(1, 1).with_rotation(Rotation::ForceNormalize);
        assert_eq!(
            output_filename("a", &request, OutputFormat::Png, "f00d"),
            "a-1x1-norm-f00d.png"
        );
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_stem("Logo Big/../x"), "Logo_Big____x");
        assert_eq!(sanitize_stem("ok-name_1"), "ok-name_1");
        assert_eq!(sanitize_stem(""), "image");
    }

    #[test]
    fn source_stem_strips_directory_and_extension() {
        assert_eq!(source_stem(Path::new("images/Logo Big.png")), "Logo_Big");
        assert_eq!(source_stem(Path::new("/")), "image");
    }
}
