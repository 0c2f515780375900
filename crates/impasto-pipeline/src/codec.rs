//! Image decoding, encoding, and the performance downscale.
//!
//! First and last steps of the pipeline: raw bytes in, `RgbImage` out,
//! and the final raster back to PNG bytes. RGBA inputs lose their alpha
//! channel here (`to_rgb8`), matching the service contract of an opaque
//! oil-paint output.

use image::RgbImage;

use crate::types::StylizeError;

/// Inputs whose longest side exceeds this are halved before processing.
pub const MAX_WORKING_DIM: u32 = 1000;

/// Decode raw image bytes (PNG, JPEG, WebP) into an RGB raster.
///
/// # Errors
///
/// Returns [`StylizeError::EmptyInput`] if `bytes` is empty and
/// [`StylizeError::Decode`] if the data is corrupt or the format is
/// unrecognized.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, StylizeError> {
    if bytes.is_empty() {
        return Err(StylizeError::EmptyInput);
    }

    let img = image::load_from_memory(bytes).map_err(StylizeError::Decode)?;
    Ok(img.to_rgb8())
}

/// Halve the raster if its longest side exceeds [`MAX_WORKING_DIM`].
///
/// Large inputs dominate the bilateral/k-means cost; halving keeps
/// conversion latency bounded without visibly changing the painted
/// result. Rasters at or under the limit pass through untouched.
#[must_use = "returns the working raster"]
pub fn downscale_if_large(image: RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    if w.max(h) <= MAX_WORKING_DIM {
        return image;
    }

    let (new_w, new_h) = ((w / 2).max(1), (h / 2).max(1));
    log::debug!("downscaling {w}x{h} input to {new_w}x{new_h}");
    image::imageops::resize(&image, new_w, new_h, image::imageops::FilterType::Triangle)
}

/// Serialize a raster to PNG bytes.
///
/// # Errors
///
/// Returns [`StylizeError::Encode`] if PNG serialization fails.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, StylizeError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )
    .map_err(StylizeError::Encode)?;
    Ok(buf)
}
