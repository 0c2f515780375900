//! Edge etching: dark brush-stroke outlines.
//!
//! Edges are detected on the *original* raster, not the stylized one —
//! the quantized result has synthetic region boundaries everywhere,
//! while the original's edges follow actual subject contours. The
//! binary edge map is thickened by one morphological dilation pass and
//! then subtracted (scaled down by `intensity`) from the composited
//! raster, darkening the outlines without ever wrapping below zero.

use image::{GrayImage, RgbImage};
use imageproc::distance_transform::Norm;

/// Canny hysteresis low threshold.
pub const CANNY_LOW: f32 = 50.0;

/// Canny hysteresis high threshold.
pub const CANNY_HIGH: f32 = 150.0;

/// Etch dilated edges of `original` into `composed`.
///
/// Per channel: `out = composed - edge / intensity` with integer
/// division and saturation at 0. Higher intensity values divide more,
/// so the outlining fades as the painting gets more abstract.
#[must_use = "returns the etched image"]
#[allow(clippy::cast_possible_truncation)]
pub fn etch(original: &RgbImage, composed: &RgbImage, intensity: u32) -> RgbImage {
    let edges = detect_edges(original);
    let thick = imageproc::morphology::dilate(&edges, Norm::LInf, 1);

    RgbImage::from_fn(composed.width(), composed.height(), |x, y| {
        let sub = (u32::from(thick.get_pixel(x, y).0[0]) / intensity.max(1)) as u8;
        let px = composed.get_pixel(x, y).0;
        image::Rgb(std::array::from_fn(|c| px[c].saturating_sub(sub)))
    })
}

/// Grayscale the raster and run Canny with the fixed thresholds.
///
/// Returns a binary map: 255 for edge pixels, 0 elsewhere.
#[must_use = "returns the binary edge map"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn detect_edges(image: &RgbImage) -> GrayImage {
    // Standard luminance weights for the RGB-to-gray conversion.
    let gray = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y).0;
        let luma = 0.299f32.mul_add(
            f32::from(px[0]),
            0.587f32.mul_add(f32::from(px[1]), 0.114 * f32::from(px[2])),
        );
        image::Luma([luma.round().clamp(0.0, 255.0) as u8])
    });

    imageproc::edges::canny(&gray, CANNY_LOW, CANNY_HIGH)
}
