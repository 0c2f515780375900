//! Canvas texture compositing.

use image::RgbImage;

/// Weight of the quantized painting in the blend.
pub const PAINT_WEIGHT: f32 = 0.9;

/// Weight of the canvas texture in the blend.
pub const CANVAS_WEIGHT: f32 = 0.1;

/// Alpha-blend the canvas texture under the quantized painting:
/// `out = quantized * 0.9 + canvas * 0.1`, rounded and clamped.
///
/// Both rasters must share dimensions; the pipeline generates the
/// canvas at the working size, so this holds by construction.
/// Deterministic given its inputs (the canvas itself is the random
/// part).
#[must_use = "returns the composited image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compose(quantized: &RgbImage, canvas: &RgbImage) -> RgbImage {
    RgbImage::from_fn(quantized.width(), quantized.height(), |x, y| {
        let paint = quantized.get_pixel(x, y).0;
        let texture = canvas.get_pixel(x, y).0;
        image::Rgb(std::array::from_fn(|c| {
            f32::from(paint[c])
                .mul_add(PAINT_WEIGHT, f32::from(texture[c]) * CANVAS_WEIGHT)
                .round()
                .clamp(0.0, 255.0) as u8
        }))
    })
}
