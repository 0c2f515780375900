//! Integration test: run synthetic photos through the full byte-level
//! pipeline and check the output contract.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use impasto_pipeline::{CancelToken, StyleParams, StylizeError, codec, stylize_with};

/// A small synthetic "photo": two color regions with a soft vertical
/// gradient, enough structure to exercise every stage.
fn synthetic_photo_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        let shade = (y * 255 / height.max(1)) as u8;
        if x < width / 2 {
            image::Rgb([200, shade, 60])
        } else {
            image::Rgb([40, shade, 210])
        }
    });
    codec::encode_png(&img).expect("encoding the fixture should succeed")
}

#[test]
fn full_pipeline_produces_decodable_png_of_same_size() {
    let png = synthetic_photo_png(64, 48);
    let params = StyleParams {
        radius: 4,
        intensity: 10,
        brush_count: 5,
        color_vibrance: 100,
    };

    let out_bytes = stylize_with(&png, &params, Some(42), &CancelToken::new())
        .expect("pipeline should succeed on a well-formed image");

    let out = codec::decode(&out_bytes).expect("output must be a valid PNG");
    assert_eq!(out.dimensions(), (64, 48));
}

#[test]
fn output_reflects_input_color_regions() {
    // The left half is warm, the right half cool; stylization must not
    // scramble that overall structure.
    let png = synthetic_photo_png(64, 64);
    let params = StyleParams {
        brush_count: 5,
        ..StyleParams::default()
    };
    let out = codec::decode(
        &stylize_with(&png, &params, Some(42), &CancelToken::new()).unwrap(),
    )
    .unwrap();

    let mean_red = |x0: u32, x1: u32| {
        let mut sum = 0u64;
        let mut n = 0u64;
        for y in 0..64 {
            for x in x0..x1 {
                sum += u64::from(out.get_pixel(x, y).0[0]);
                n += 1;
            }
        }
        sum / n
    };
    let left = mean_red(0, 32);
    let right = mean_red(32, 64);
    assert!(
        left > right + 50,
        "expected warm left half to stay redder: left={left} right={right}"
    );
}

#[test]
fn oversized_input_is_downscaled_by_half() {
    let png = synthetic_photo_png(1200, 40);
    let params = StyleParams {
        brush_count: 2,
        ..StyleParams::default()
    };
    let out = codec::decode(
        &stylize_with(&png, &params, Some(0), &CancelToken::new()).unwrap(),
    )
    .unwrap();
    assert_eq!(out.dimensions(), (600, 20));
}

#[test]
fn webp_input_is_accepted() {
    // Encode the fixture as lossless WebP and run the pipeline on it.
    let img = codec::decode(&synthetic_photo_png(32, 32)).unwrap();
    let mut webp = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut webp);
    let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut cursor);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )
    .unwrap();

    let params = StyleParams {
        brush_count: 2,
        ..StyleParams::default()
    };
    let out_bytes = stylize_with(&webp, &params, Some(0), &CancelToken::new())
        .expect("WebP input should decode");
    let out = codec::decode(&out_bytes).unwrap();
    assert_eq!(out.dimensions(), (32, 32));
}

#[test]
fn cancellation_from_another_thread_aborts() {
    // A pre-flipped token exercises the same path as a watchdog thread
    // cancelling mid-run, without the timing flakiness.
    let png = synthetic_photo_png(64, 64);
    let token = CancelToken::new();
    let watchdog = token.clone();
    watchdog.cancel();

    let result = stylize_with(&png, &StyleParams::default(), Some(0), &token);
    assert!(matches!(result, Err(StylizeError::Cancelled)));
}
