//! Shared types for the impasto stylization pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can reference pipeline
/// rasters without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for consumers that inspect the edge map.
pub use image::GrayImage;

/// Number of stochastic brush layers used when parameters are resolved
/// from raw UI slider values.
pub const DEFAULT_BRUSH_COUNT: u32 = 20;

/// Ceiling on encoded input size accepted by callers of the pipeline.
///
/// Enforced by the surrounding service/CLI before decoding, not by the
/// pipeline itself.
pub const MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Resolved stylization parameters.
///
/// These are the values the pipeline operates on. Raw UI slider values
/// (0-100) must be resolved through [`StyleParams::from_sliders`] first;
/// the pipeline never sees raw slider values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleParams {
    /// Brush size: spatial extent of the edge-preserving filters.
    /// Must be at least 3.
    pub radius: u32,

    /// Stylization strength: drives the quantization color count
    /// (`8 + intensity / 2`) and the edge-etch divisor. Must be at
    /// least 5.
    pub intensity: u32,

    /// Number of stochastic brush layering passes. Must be at least 1.
    pub brush_count: u32,

    /// Saturation scale applied by the color enhancer, in percent.
    /// Must lie in `1..=200`; 100 is identity.
    pub color_vibrance: u32,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            radius: 4,
            intensity: 10,
            brush_count: DEFAULT_BRUSH_COUNT,
            color_vibrance: 100,
        }
    }
}

impl StyleParams {
    /// Resolve raw UI slider values (0-100, vibrance 0-250ish) into
    /// pipeline parameters.
    ///
    /// The mapping is the canonical caller contract:
    /// `radius = max(3, brush_size / 20)`,
    /// `intensity = max(5, intensity / 10)`,
    /// `color_vibrance = clamp(value or 100, 1, 200)`, and a fixed
    /// brush count of [`DEFAULT_BRUSH_COUNT`].
    ///
    /// `color_vibrance` is `Option` because the upstream form field may
    /// be absent or unparseable; it then defaults to 100 (identity).
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_sliders(brush_size: u32, intensity: u32, color_vibrance: Option<i64>) -> Self {
        Self {
            radius: (brush_size / 20).max(3),
            intensity: (intensity / 10).max(5),
            brush_count: DEFAULT_BRUSH_COUNT,
            color_vibrance: color_vibrance.unwrap_or(100).clamp(1, 200) as u32,
        }
    }

    /// Number of color centers used by the quantizer: `8 + intensity / 2`.
    #[must_use]
    pub const fn color_count(&self) -> u32 {
        8 + self.intensity / 2
    }

    /// Check every field against its documented bounds.
    ///
    /// # Errors
    ///
    /// Returns [`StylizeError::Parameter`] naming the offending field.
    /// Values are never silently clamped here; clamping happens only in
    /// the documented slider mapping of [`StyleParams::from_sliders`].
    pub fn validate(&self) -> Result<(), StylizeError> {
        if self.radius < 3 {
            return Err(StylizeError::Parameter(format!(
                "radius must be at least 3, got {}",
                self.radius
            )));
        }
        if self.intensity < 5 {
            return Err(StylizeError::Parameter(format!(
                "intensity must be at least 5, got {}",
                self.intensity
            )));
        }
        if self.brush_count < 1 {
            return Err(StylizeError::Parameter(format!(
                "brush_count must be at least 1, got {}",
                self.brush_count
            )));
        }
        if !(1..=200).contains(&self.color_vibrance) {
            return Err(StylizeError::Parameter(format!(
                "color_vibrance must lie in 1..=200, got {}",
                self.color_vibrance
            )));
        }
        Ok(())
    }
}

/// Cooperative cancellation handle for one pipeline execution.
///
/// Cloneable; a watchdog thread (or async task) holds one clone and the
/// pipeline the other. The pipeline polls the token at stage boundaries
/// and inside the brush/k-means loops, abandoning work with
/// [`StylizeError::Cancelled`] once flipped. No partial output is ever
/// returned after cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Convert the flag into an early-return error for use with `?`.
    pub(crate) fn check(&self) -> Result<(), StylizeError> {
        if self.is_cancelled() {
            Err(StylizeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Output of a stylization run with every intermediate raster preserved.
///
/// Useful for debugging parameter choices (the CLI's `--dump-stages`)
/// and for tests asserting per-stage invariants. All rasters share the
/// dimensions of `working`.
#[derive(Debug, Clone)]
pub struct StagedOutput {
    /// The working raster: the decoded input after the optional
    /// performance downscale.
    pub working: RgbImage,
    /// Edge-preserving smoothing pass over the working raster.
    pub smoothed: RgbImage,
    /// Synthesized canvas texture (random; seed-dependent).
    pub canvas: RgbImage,
    /// Result of the stochastic brush-layer compositor.
    pub brushed: RgbImage,
    /// Contrast/brightness/vibrance enhanced raster.
    pub enhanced: RgbImage,
    /// Color-quantized raster (at most `8 + intensity / 2` colors).
    pub quantized: RgbImage,
    /// Quantized raster composited over the canvas texture.
    pub composed: RgbImage,
    /// Final raster after edge etching.
    pub etched: RgbImage,
}

impl StagedOutput {
    /// The final pipeline output.
    #[must_use]
    pub const fn final_image(&self) -> &RgbImage {
        &self.etched
    }
}

/// Errors that can occur during stylization.
#[derive(Debug, thiserror::Error)]
pub enum StylizeError {
    /// The input byte slice was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The input bytes could not be decoded as PNG, JPEG, or WebP.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// A style parameter was outside its documented bounds.
    #[error("invalid style parameter: {0}")]
    Parameter(String),

    /// Unexpected failure inside a pipeline stage.
    #[error("internal processing fault: {0}")]
    Fault(String),

    /// The execution was cancelled (or timed out) by the caller.
    #[error("stylization was cancelled")]
    Cancelled,

    /// The final raster could not be serialized to PNG.
    #[error("failed to encode output image: {0}")]
    Encode(#[source] image::ImageError),
}
