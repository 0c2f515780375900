//! Canvas texture synthesis.
//!
//! Produces the near-uniform light background that the composited
//! painting sits on: a flat 240 base tone with per-pixel subtractive
//! noise, like the weave of a primed canvas.
//!
//! This stage is intentionally non-deterministic: each invocation draws
//! fresh noise so repeated conversions do not share a visibly identical
//! texture. Seeding the execution's RNG (see [`crate::stylize_with`])
//! makes it reproducible for tests.

use image::RgbImage;
use rand::Rng;
use rand::rngs::StdRng;

/// Base tone of the canvas, per channel.
pub const CANVAS_BASE: u8 = 240;

/// Exclusive upper bound of the subtractive noise, per channel.
pub const CANVAS_NOISE_MAX: u8 = 15;

/// Synthesize a textured canvas raster of the given dimensions.
///
/// Every channel of every pixel is `CANVAS_BASE` minus an independent
/// uniform draw from `[0, CANVAS_NOISE_MAX)`, clamped at zero. Pixels
/// are generated in row-major order, so a seeded RNG yields a
/// reproducible texture.
#[must_use = "returns the canvas raster"]
pub fn textured_canvas(width: u32, height: u32, rng: &mut StdRng) -> RgbImage {
    RgbImage::from_fn(width, height, |_, _| {
        image::Rgb(std::array::from_fn(|_| {
            CANVAS_BASE.saturating_sub(rng.gen_range(0..CANVAS_NOISE_MAX))
        }))
    })
}
