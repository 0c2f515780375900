//! impasto-pipeline: Oil-paint stylization pipeline (sans-IO).
//!
//! Turns one photo and four numeric parameters into an oil-painting-style
//! raster through a linear chain of passes:
//! edge-preserving smoothing -> stochastic brush layering ->
//! color enhancement -> k-means quantization -> canvas compositing ->
//! edge etching.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and rasters. File handling, slider parsing, and timeouts
//! live in `impasto-cli` (or whatever service embeds the pipeline).
//!
//! # Randomness
//!
//! Three passes draw randomness (canvas noise, per-layer brush masks,
//! k-means initialization), all from a single `StdRng` owned by the
//! execution. Production draws the seed from entropy, so two runs on the
//! same input differ in texture and brush placement; passing a fixed
//! seed to [`stylize_with`] makes output bit-identical across runs.

pub mod brush;
pub mod canvas;
pub mod codec;
pub mod compose;
pub mod enhance;
pub mod etch;
pub mod quantize;
pub mod smooth;
pub mod types;

use rand::SeedableRng;
pub use rand::rngs::StdRng;

pub use types::{
    CancelToken, DEFAULT_BRUSH_COUNT, GrayImage, MAX_INPUT_BYTES, RgbImage, StagedOutput,
    StyleParams, StylizeError,
};

/// Run the full stylization pipeline with an entropy seed and no
/// cancellation.
///
/// Takes raw image bytes (PNG, JPEG, WebP) and resolved parameters,
/// returns PNG bytes of the painted result.
///
/// # Errors
///
/// See [`stylize_with`].
pub fn stylize(bytes: &[u8], params: &StyleParams) -> Result<Vec<u8>, StylizeError> {
    stylize_with(bytes, params, None, &CancelToken::new())
}

/// Run the full stylization pipeline.
///
/// `seed` fixes the execution's random source for reproducible output;
/// `None` draws from entropy. `cancel` may be flipped from another
/// thread to abandon the run.
///
/// # Pipeline steps
///
/// 1. Decode and drop alpha ([`codec::decode`])
/// 2. Performance downscale ([`codec::downscale_if_large`])
/// 3. Edge-preserving smoothing ([`smooth::smooth`])
/// 4. Canvas texture synthesis ([`canvas::textured_canvas`])
/// 5. Stochastic brush layering ([`brush::brush_layers`])
/// 6. Contrast/vibrance enhancement ([`enhance::enhance`])
/// 7. K-means color quantization ([`quantize::quantize`])
/// 8. Canvas compositing ([`compose::compose`])
/// 9. Edge etching ([`etch::etch`])
/// 10. PNG encoding ([`codec::encode_png`])
///
/// # Errors
///
/// [`StylizeError::Parameter`] for out-of-range parameters,
/// [`StylizeError::EmptyInput`] / [`StylizeError::Decode`] for bad
/// input bytes, [`StylizeError::Cancelled`] if the token flips, and
/// [`StylizeError::Fault`] / [`StylizeError::Encode`] for internal
/// failures. No partial image is ever returned.
pub fn stylize_with(
    bytes: &[u8],
    params: &StyleParams,
    seed: Option<u64>,
    cancel: &CancelToken,
) -> Result<Vec<u8>, StylizeError> {
    params.validate()?;
    let decoded = codec::decode(bytes)?;
    let working = codec::downscale_if_large(decoded);
    let mut rng = make_rng(seed);
    let staged = run_stages(&working, params, &mut rng, cancel)?;
    codec::encode_png(staged.final_image())
}

/// Stylize an already-decoded raster, keeping every intermediate stage.
///
/// The caller is responsible for any downscaling
/// ([`codec::downscale_if_large`]); all stages preserve the dimensions
/// of `image` exactly.
///
/// # Errors
///
/// [`StylizeError::Parameter`], [`StylizeError::Cancelled`], or
/// [`StylizeError::Fault`] as in [`stylize_with`].
pub fn stylize_staged(
    image: &RgbImage,
    params: &StyleParams,
    seed: Option<u64>,
    cancel: &CancelToken,
) -> Result<StagedOutput, StylizeError> {
    let mut rng = make_rng(seed);
    run_stages(image, params, &mut rng, cancel)
}

/// Stylize an already-decoded raster with a caller-owned RNG.
///
/// Exposed for embedders and tests that manage their own random source;
/// [`stylize_with`] is the byte-level convenience wrapper.
///
/// # Errors
///
/// As [`stylize_staged`].
pub fn stylize_raster(
    image: &RgbImage,
    params: &StyleParams,
    rng: &mut StdRng,
    cancel: &CancelToken,
) -> Result<RgbImage, StylizeError> {
    run_stages(image, params, rng, cancel).map(|staged| staged.etched)
}

fn make_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// The shared stage chain behind every public entry point.
fn run_stages(
    image: &RgbImage,
    params: &StyleParams,
    rng: &mut StdRng,
    cancel: &CancelToken,
) -> Result<StagedOutput, StylizeError> {
    params.validate()?;
    cancel.check()?;
    let (width, height) = image.dimensions();
    log::debug!(
        "stylizing {width}x{height} raster: radius={} intensity={} brush_count={} vibrance={}",
        params.radius,
        params.intensity,
        params.brush_count,
        params.color_vibrance
    );

    let smoothed = smooth::smooth(image);
    cancel.check()?;

    let canvas = canvas::textured_canvas(width, height, rng);

    let brushed = brush::brush_layers(&smoothed, params.radius, params.brush_count, rng, cancel)?;

    let enhanced = enhance::enhance(&brushed, params.color_vibrance);
    cancel.check()?;

    let quantized = quantize::quantize(&enhanced, params.intensity, rng, cancel)?;

    let composed = compose::compose(&quantized, &canvas);
    cancel.check()?;

    let etched = etch::etch(image, &composed, params.intensity);

    Ok(StagedOutput {
        working: image.clone(),
        smoothed,
        canvas,
        brushed,
        enhanced,
        quantized,
        composed,
        etched,
    })
}
