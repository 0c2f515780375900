//! Stochastic brush-layer compositing.
//!
//! The painterly texture comes from layering: each pass produces a
//! slightly different abstraction of the smoothed raster (the filter
//! parameters cycle with the layer index), and every pass after the
//! first overwrites a random ~30% of the accumulated result. Regions
//! never hit by a later mask keep layer 0, so strokes from different
//! abstraction levels sit next to each other like overlapping dabs.
//!
//! The per-layer abstraction is a domain-transform recursive filter
//! (the edge-aware smoothing behind common "stylization" NPR filters)
//! followed by a bilateral pass whose window tracks the brush size.

use image::RgbImage;
use rand::Rng;
use rand::rngs::StdRng;

use crate::smooth;
use crate::types::{CancelToken, StylizeError};

/// Fraction of pixels a layer overwrites: mask is `uniform > 0.7`.
const MASK_THRESHOLD: f64 = 0.7;

/// Scale from the per-layer spatial parameter (0.5..0.9) to the domain
/// transform's sigma_s in pixel units.
const STYLIZE_SIGMA_SCALE: f32 = 60.0;

/// Recursive-filter passes of the domain transform.
const STYLIZE_PASSES: i32 = 3;

/// Composite `brush_count` stochastic stylization layers.
///
/// For layer `i`:
/// - brush size is `max(2, radius - i % 3)`
/// - the stylization filter runs with spatial parameter
///   `0.5 + (i % 5) * 0.1` and range parameter `0.5 + (i % 3) * 0.05`
/// - the layer is re-smoothed with a bilateral filter of diameter
///   `brush_size * 2 + 1` and sigma `35 + (i % 20)`
///
/// Layer 0 initializes the result; each subsequent layer draws a fresh
/// random mask and overwrites only the selected pixels (a stochastic
/// overwrite, not an average). With `brush_count = 1` the output is
/// exactly the single layer-0 stylization.
///
/// # Errors
///
/// Returns [`StylizeError::Cancelled`] if the token is flipped between
/// layers.
#[allow(clippy::cast_precision_loss)]
pub fn brush_layers(
    smoothed: &RgbImage,
    radius: u32,
    brush_count: u32,
    rng: &mut StdRng,
    cancel: &CancelToken,
) -> Result<RgbImage, StylizeError> {
    let mut result = RgbImage::new(smoothed.width(), smoothed.height());

    for i in 0..brush_count {
        cancel.check()?;

        let brush_size = radius.saturating_sub(i % 3).max(2);
        let spatial = 0.5 + (i % 5) as f32 * 0.1;
        let range = 0.5 + (i % 3) as f32 * 0.05;
        let sigma = (35 + i % 20) as f32;

        let layer = stylize_layer(smoothed, spatial, range);
        let layer = smooth::bilateral(&layer, brush_size * 2 + 1, sigma, sigma);

        if i == 0 {
            result = layer;
        } else {
            overwrite_masked(&mut result, &layer, rng);
        }
    }

    Ok(result)
}

/// Overwrite ~30% of `result` with pixels from `layer`, chosen by a
/// fresh per-pixel random mask. The mask is drawn here and discarded;
/// every call consumes new randomness, so no two layers share a mask.
fn overwrite_masked(result: &mut RgbImage, layer: &RgbImage, rng: &mut StdRng) {
    for (dst, src) in result.pixels_mut().zip(layer.pixels()) {
        if rng.r#gen::<f64>() > MASK_THRESHOLD {
            *dst = *src;
        }
    }
}

/// Edge-aware stylization filter (domain transform, recursive form).
///
/// Smooths aggressively inside low-gradient regions while halting at
/// strong color edges, giving the soft painterly abstraction each brush
/// layer starts from. `spatial` scales the smoothing extent
/// ([`STYLIZE_SIGMA_SCALE`] pixels at 1.0); `range` sets the edge
/// sensitivity (smaller values stop at weaker edges).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::needless_range_loop
)]
fn stylize_layer(image: &RgbImage, spatial: f32, range: f32) -> RgbImage {
    let (w, h) = image.dimensions();
    let (w, h) = (w as usize, h as usize);
    let sigma_s = spatial * STYLIZE_SIGMA_SCALE;
    let sigma_r = range.max(1e-3);

    // Planar f32 copy, channels in [0, 1].
    let mut data: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| std::array::from_fn(|c| f32::from(p.0[c]) / 255.0))
        .collect();

    // Domain-transform derivatives along each axis:
    // d = 1 + (sigma_s / sigma_r) * sum_c |dI_c|.
    // Computed once from the input; the recursive passes reuse them.
    let ratio = sigma_s / sigma_r;
    let l1 = |a: [f32; 3], b: [f32; 3]| {
        (a[0] - b[0]).abs() + (a[1] - b[1]).abs() + (a[2] - b[2]).abs()
    };
    let mut dx = vec![1.0f32; w * h];
    let mut dy = vec![1.0f32; w * h];
    for y in 0..h {
        for x in 1..w {
            dx[y * w + x] = ratio.mul_add(l1(data[y * w + x], data[y * w + x - 1]), 1.0);
        }
    }
    for y in 1..h {
        for x in 0..w {
            dy[y * w + x] = ratio.mul_add(l1(data[y * w + x], data[(y - 1) * w + x]), 1.0);
        }
    }

    for pass in 0..STYLIZE_PASSES {
        // Per-pass sigma shrinks so the combined passes approximate one
        // filter of sigma_s (Gastal & Oliveira 2011, eq. 14).
        let sigma_h = sigma_s * 3.0f32.sqrt() * 2.0f32.powi(STYLIZE_PASSES - 1 - pass)
            / (4.0f32.powi(STYLIZE_PASSES) - 1.0).sqrt();
        let a = (-(2.0f32.sqrt()) / sigma_h).exp();

        // Horizontal: left-to-right, then right-to-left.
        for y in 0..h {
            for x in 1..w {
                let weight = a.powf(dx[y * w + x]);
                let prev = data[y * w + x - 1];
                let cur = &mut data[y * w + x];
                for c in 0..3 {
                    cur[c] += weight * (prev[c] - cur[c]);
                }
            }
            for x in (0..w.saturating_sub(1)).rev() {
                let weight = a.powf(dx[y * w + x + 1]);
                let next = data[y * w + x + 1];
                let cur = &mut data[y * w + x];
                for c in 0..3 {
                    cur[c] += weight * (next[c] - cur[c]);
                }
            }
        }

        // Vertical: top-to-bottom, then bottom-to-top.
        for x in 0..w {
            for y in 1..h {
                let weight = a.powf(dy[y * w + x]);
                let above = data[(y - 1) * w + x];
                let cur = &mut data[y * w + x];
                for c in 0..3 {
                    cur[c] += weight * (above[c] - cur[c]);
                }
            }
            for y in (0..h.saturating_sub(1)).rev() {
                let weight = a.powf(dy[(y + 1) * w + x]);
                let below = data[(y + 1) * w + x];
                let cur = &mut data[y * w + x];
                for c in 0..3 {
                    cur[c] += weight * (below[c] - cur[c]);
                }
            }
        }
    }

    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let px = data[y as usize * w + x as usize];
        image::Rgb(std::array::from_fn(|c| {
            (px[c] * 255.0).round().clamp(0.0, 255.0) as u8
        }))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn gradient_image() -> RgbImage {
        RgbImage::from_fn(24, 24, |x, y| {
            image::Rgb([(x * 10) as u8, (y * 10) as u8, ((x + y) * 5) as u8])
        })
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = gradient_image();
        let mut rng = StdRng::seed_from_u64(0);
        let out = brush_layers(&img, 4, 5, &mut rng, &CancelToken::new()).unwrap();
        assert_eq!(out.dimensions(), img.dimensions());
    }

    #[test]
    fn single_layer_equals_layer_zero_stylization() {
        // brush_count = 1 must skip blending entirely: the output is the
        // layer-0 stylization (spatial 0.5, range 0.5, brush size =
        // radius, sigma 35) with no randomness consumed.
        let img = gradient_image();
        let radius = 4;

        let expected = stylize_layer(&img, 0.5, 0.5);
        let expected = smooth::bilateral(&expected, radius * 2 + 1, 35.0, 35.0);

        let mut rng = StdRng::seed_from_u64(99);
        let out = brush_layers(&img, radius, 1, &mut rng, &CancelToken::new()).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn uniform_input_stays_uniform() {
        // Every filter involved is a weighted average, so a constant
        // raster is a fixed point regardless of masks.
        let img = RgbImage::from_pixel(16, 16, image::Rgb([128, 128, 128]));
        let mut rng = StdRng::seed_from_u64(7);
        let out = brush_layers(&img, 3, 6, &mut rng, &CancelToken::new()).unwrap();
        for pixel in out.pixels() {
            assert_eq!(pixel.0, [128, 128, 128]);
        }
    }

    #[test]
    fn seeded_runs_are_identical() {
        let img = gradient_image();
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let out_a = brush_layers(&img, 4, 8, &mut a, &CancelToken::new()).unwrap();
        let out_b = brush_layers(&img, 4, 8, &mut b, &CancelToken::new()).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn later_layers_change_some_pixels() {
        // With 8 layers at ~30% overwrite each, the multi-layer result
        // must differ from the single-layer one on a non-uniform input.
        let img = gradient_image();
        let mut rng_one = StdRng::seed_from_u64(5);
        let mut rng_many = StdRng::seed_from_u64(5);
        let one = brush_layers(&img, 4, 1, &mut rng_one, &CancelToken::new()).unwrap();
        let many = brush_layers(&img, 4, 8, &mut rng_many, &CancelToken::new()).unwrap();
        assert_ne!(one, many);
    }

    #[test]
    fn cancelled_token_aborts() {
        let img = gradient_image();
        let token = CancelToken::new();
        token.cancel();
        let mut rng = StdRng::seed_from_u64(0);
        let result = brush_layers(&img, 4, 20, &mut rng, &token);
        assert!(matches!(result, Err(StylizeError::Cancelled)));
    }

    #[test]
    fn stylize_layer_smooths_within_regions() {
        // A noisy flat region should end up flatter.
        let img = RgbImage::from_fn(20, 20, |x, y| {
            let base = 100 + ((x + y) % 2) as u8 * 20; // checkered noise
            image::Rgb([base, base, base])
        });
        let out = stylize_layer(&img, 0.9, 0.6);

        let spread = |img: &RgbImage| {
            let (min, max) = img
                .pixels()
                .map(|p| p.0[0])
                .fold((255u8, 0u8), |(lo, hi), v| (lo.min(v), hi.max(v)));
            max - min
        };
        assert!(
            spread(&out) < spread(&img),
            "expected checkered noise flattened, spread {} -> {}",
            spread(&img),
            spread(&out)
        );
    }

    #[test]
    fn stylize_layer_respects_strong_edges() {
        let img = RgbImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Rgb([20, 20, 20])
            } else {
                image::Rgb([230, 230, 230])
            }
        });
        let out = stylize_layer(&img, 0.5, 0.5);
        let left = out.get_pixel(5, 10).0[0];
        let right = out.get_pixel(15, 10).0[0];
        assert!(
            right > left + 100,
            "expected dark/bright separation preserved, got {left} vs {right}"
        );
    }
}
