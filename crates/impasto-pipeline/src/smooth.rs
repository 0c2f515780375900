//! Edge-preserving smoothing via a joint-color bilateral filter.
//!
//! `imageproc::filter::bilateral_filter` only accepts single-channel
//! images, so this module carries an RGB implementation: the range
//! kernel uses the joint Euclidean distance across all three channels,
//! which preserves color edges that a per-channel filter would bleed
//! through. Border pixels are handled by clamp-to-edge sampling.

use image::RgbImage;

/// Fixed filter diameter for the base smoothing pass.
pub const SMOOTH_DIAMETER: u32 = 9;

/// Fixed color and space sigma for the base smoothing pass.
pub const SMOOTH_SIGMA: f32 = 75.0;

/// Base smoothing pass: fixed-parameter bilateral filter.
///
/// Flat regions become smoother while edges stronger than the color
/// sigma survive. Deterministic.
#[must_use = "returns the smoothed image"]
pub fn smooth(image: &RgbImage) -> RgbImage {
    bilateral(image, SMOOTH_DIAMETER, SMOOTH_SIGMA, SMOOTH_SIGMA)
}

/// Bilateral filter over an RGB raster.
///
/// `diameter` is the full window width (an even value covers the same
/// window as the next odd value up). Degenerate parameters (diameter
/// below 3, non-positive sigma) return the input unchanged rather than
/// producing a meaningless kernel.
#[must_use = "returns the filtered image"]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn bilateral(image: &RgbImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> RgbImage {
    if diameter < 3 || sigma_color <= 0.0 || sigma_space <= 0.0 {
        return image.clone();
    }

    let (w, h) = image.dimensions();
    let radius = i64::from(diameter / 2);
    let two_sigma_color_sq = 2.0 * sigma_color * sigma_color;
    let two_sigma_space_sq = 2.0 * sigma_space * sigma_space;

    // The spatial kernel depends only on the offset; precompute it.
    let mut spatial = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dx * dx + dy * dy) as f32;
            spatial.push((dx, dy, (-dist_sq / two_sigma_space_sq).exp()));
        }
    }

    RgbImage::from_fn(w, h, |x, y| {
        let center = image.get_pixel(x, y).0;
        let mut acc = [0.0f32; 3];
        let mut weight_sum = 0.0f32;

        for &(dx, dy, spatial_weight) in &spatial {
            let nx = (i64::from(x) + dx).clamp(0, i64::from(w) - 1) as u32;
            let ny = (i64::from(y) + dy).clamp(0, i64::from(h) - 1) as u32;
            let sample = image.get_pixel(nx, ny).0;

            let mut color_dist_sq = 0.0f32;
            for c in 0..3 {
                let d = f32::from(sample[c]) - f32::from(center[c]);
                color_dist_sq += d * d;
            }

            let weight = spatial_weight * (-color_dist_sq / two_sigma_color_sq).exp();
            weight_sum += weight;
            for c in 0..3 {
                acc[c] += weight * f32::from(sample[c]);
            }
        }

        // The center sample always contributes weight 1.0, so the sum
        // is never zero.
        image::Rgb(std::array::from_fn(|c| {
            (acc[c] / weight_sum).round().clamp(0.0, 255.0) as u8
        }))
    })
}
