//! Color quantization via k-means clustering.
//!
//! Flattens the raster into 3-D color points, clusters them into
//! `K = 8 + intensity / 2` centers, and remaps every pixel to its
//! nearest center, producing the flat color regions typical of oil
//! paint. Several random restarts keep the best (lowest within-cluster
//! variance) run; k-means has no global-optimum guarantee and the
//! restarts bound worst-case visual inconsistency rather than enforce
//! correctness.

use image::RgbImage;
use rand::Rng;
use rand::rngs::StdRng;

use crate::types::{CancelToken, StylizeError};

/// Iteration cap per k-means run.
pub const MAX_ITERATIONS: u32 = 20;

/// Convergence threshold on centroid movement (Euclidean, per axis
/// range 0-255).
pub const CONVERGENCE_EPSILON: f32 = 1e-3;

/// Number of random restarts; the run with the lowest within-cluster
/// variance wins.
pub const RESTARTS: u32 = 10;

/// Number of color centers for a given intensity.
#[must_use]
pub const fn color_count(intensity: u32) -> u32 {
    8 + intensity / 2
}

/// Quantize the raster to at most `color_count(intensity)` colors.
///
/// Images with fewer distinct colors than K degenerate gracefully:
/// empty clusters are reseeded from random points and duplicate centers
/// simply collapse, so the output may use fewer than K colors.
///
/// # Errors
///
/// Returns [`StylizeError::Cancelled`] if the token flips between
/// restarts, and [`StylizeError::Fault`] if no restart produced a
/// usable clustering (not expected on any non-empty raster).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(
    image: &RgbImage,
    intensity: u32,
    rng: &mut StdRng,
    cancel: &CancelToken,
) -> Result<RgbImage, StylizeError> {
    let points: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| std::array::from_fn(|c| f32::from(p.0[c])))
        .collect();
    if points.is_empty() {
        return Err(StylizeError::Fault("quantizer received an empty raster".into()));
    }

    let k = (color_count(intensity) as usize).min(points.len());

    let mut best: Option<(f32, Vec<[f32; 3]>)> = None;
    for _ in 0..RESTARTS {
        cancel.check()?;
        let (variance, centers) = kmeans_run(&points, k, rng);
        if best.as_ref().is_none_or(|(best_var, _)| variance < *best_var) {
            best = Some((variance, centers));
        }
    }

    let (variance, centers) = best.ok_or_else(|| {
        StylizeError::Fault("k-means produced no clustering within the restart budget".into())
    })?;
    log::debug!(
        "quantized to {} centers, within-cluster variance {variance:.1}",
        centers.len()
    );

    // Remap every pixel to its nearest center.
    Ok(RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let idx = (u64::from(y) * u64::from(image.width()) + u64::from(x)) as usize;
        let center = centers[nearest(&centers, points[idx])];
        image::Rgb(std::array::from_fn(|c| {
            center[c].round().clamp(0.0, 255.0) as u8
        }))
    }))
}

/// One k-means run: random initialization, Lloyd iterations until the
/// iteration cap or centroid movement drops under the epsilon.
/// Returns the total within-cluster variance and the centers.
#[allow(clippy::cast_precision_loss)]
fn kmeans_run(points: &[[f32; 3]], k: usize, rng: &mut StdRng) -> (f32, Vec<[f32; 3]>) {
    // Random initial centers drawn from the data. Duplicates are fine;
    // they become empty clusters and get reseeded below.
    let mut centers: Vec<[f32; 3]> =
        (0..k).map(|_| points[rng.gen_range(0..points.len())]).collect();

    let mut variance = 0.0f32;
    for _ in 0..MAX_ITERATIONS {
        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0u64; k];
        variance = 0.0;

        for &p in points {
            let idx = nearest(&centers, p);
            variance += dist_sq(centers[idx], p);
            counts[idx] += 1;
            for c in 0..3 {
                sums[idx][c] += f64::from(p[c]);
            }
        }

        let mut movement = 0.0f32;
        for i in 0..k {
            let new_center = if counts[i] == 0 {
                // Empty cluster: reseed from a random point so degenerate
                // inputs (fewer distinct colors than k) cannot wedge.
                points[rng.gen_range(0..points.len())]
            } else {
                std::array::from_fn(|c| (sums[i][c] / counts[i] as f64) as f32)
            };
            movement = movement.max(dist_sq(centers[i], new_center).sqrt());
            centers[i] = new_center;
        }

        if movement < CONVERGENCE_EPSILON {
            break;
        }
    }

    (variance, centers)
}

fn nearest(centers: &[[f32; 3]], p: [f32; 3]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, &c) in centers.iter().enumerate() {
        let d = dist_sq(c, p);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

fn dist_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr.mul_add(dr, dg.mul_add(dg, db * db))
}
