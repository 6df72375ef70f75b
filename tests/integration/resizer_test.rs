// Resize stage integration tests
//
// Drive the stage through its public API the way a pipeline would:
// build a payload, await the stage, inspect the merged outputs.

use super::test_images::{decode_dimensions, jpeg, png_rgba};
use bytes::Bytes;
use image_resizer::config::ResizerConfig;
use image_resizer::error::ResizeError;
use image_resizer::imaging::{GeometryError, Raster};
use image_resizer::metrics::Metrics;
use image_resizer::modes::{ImageMode, ModeRegistry};
use image_resizer::pipeline::*;
use rstest::rstest;
use std::sync::Arc;

fn stage_with(config: ResizerConfig, modes: ModeRegistry) -> (Resizer, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new());
    (Resizer::new(&config, Arc::new(modes), metrics.clone()), metrics)
}

fn stage() -> Resizer {
    let config = ResizerConfig {
        workers: 2,
        ..Default::default()
    };
    stage_with(config, ModeRegistry::with_builtin_modes()).0
}

fn resize_payload(source: Vec<u8>, width: u32, height: u32, mode: &str) -> Payload {
    Payload::new()
        .with(ORIGINAL_IMAGE, source)
        .with(WIDTH, width)
        .with(HEIGHT, height)
        .with(MODE, mode)
}

/// Sets its own encoder quality, like a per-tenant strategy would
struct LowQuality;

impl ImageMode for LowQuality {
    fn resize(&self, mut raster: Raster, w: u32, h: u32) -> Result<Raster, GeometryError> {
        raster.set_quality(10);
        raster.scale_to(w, h)
    }
}

// Test: skip_resize copies the source through and adds no dimensions
#[tokio::test]
async fn test_skip_resize_returns_original_bytes() {
    let source = jpeg(64, 48);
    let payload = Payload::new()
        .with(ORIGINAL_IMAGE, source.clone())
        .with(SKIP_RESIZE, true)
        .with(WIDTH, 10u32)
        .with(MODE, "does-not-exist");

    let out = stage().process(payload).await.unwrap();
    assert_eq!(out.bytes(IMAGE).unwrap(), Bytes::from(source));
    assert!(!out.contains(RESIZED_WIDTH));
    assert!(!out.contains(RESIZED_HEIGHT));
}

// Test: skip_resize is a presence flag, so false still skips
#[tokio::test]
async fn test_skip_resize_false_still_skips() {
    let payload = Payload::new()
        .with(ORIGINAL_IMAGE, vec![1u8, 2, 3])
        .with(SKIP_RESIZE, false);

    let out = stage().process(payload).await.unwrap();
    assert_eq!(out.bytes(IMAGE).unwrap(), Bytes::from_static(&[1, 2, 3]));
}

// Test: 500x500 JPEG resized with fit to 200x200
#[tokio::test]
async fn test_resize_fit_500_to_200() {
    let out = stage()
        .process(resize_payload(jpeg(500, 500), 200, 200, "fit"))
        .await
        .unwrap();

    assert_eq!(out.dimension(RESIZED_WIDTH).unwrap(), 200);
    assert_eq!(out.dimension(RESIZED_HEIGHT).unwrap(), 200);
    assert_eq!(decode_dimensions(&out.bytes(IMAGE).unwrap()), (200, 200));
}

// Test: fullcrop of the 100x100 window at (50,50)
#[tokio::test]
async fn test_fullcrop_window() {
    let payload = resize_payload(jpeg(300, 300), 100, 100, "fit")
        .with(FULLCROP, true)
        .with(X1, 50u32)
        .with(Y1, 50u32);

    let out = stage().process(payload).await.unwrap();
    assert_eq!(out.dimension(RESIZED_WIDTH).unwrap(), 100);
    assert_eq!(out.dimension(RESIZED_HEIGHT).unwrap(), 100);
    assert_eq!(decode_dimensions(&out.bytes(IMAGE).unwrap()), (100, 100));
}

// Test: reported dimensions are the actual output, not the request
#[rstest]
#[case("stretch", (800, 600), (200, 200), (200, 200))]
#[case("fit", (800, 600), (200, 200), (200, 150))]
#[case("fill", (800, 600), (200, 200), (200, 200))]
#[case("inside", (100, 50), (400, 400), (100, 50))]
#[case("pad", (800, 400), (300, 300), (300, 300))]
#[tokio::test]
async fn test_reported_dimensions_match_output(
    #[case] mode: &str,
    #[case] source: (u32, u32),
    #[case] target: (u32, u32),
    #[case] expected: (u32, u32),
) {
    let out = stage()
        .process(resize_payload(jpeg(source.0, source.1), target.0, target.1, mode))
        .await
        .unwrap();

    let reported = (
        out.dimension(RESIZED_WIDTH).unwrap(),
        out.dimension(RESIZED_HEIGHT).unwrap(),
    );
    assert_eq!(reported, expected);
    assert_eq!(decode_dimensions(&out.bytes(IMAGE).unwrap()), expected);
}

// Test: PNG sources with alpha are re-encoded as JPEG
#[tokio::test]
async fn test_png_with_alpha_is_reencoded_as_jpeg() {
    let out = stage()
        .process(resize_payload(png_rgba(120, 60), 60, 30, "stretch"))
        .await
        .unwrap();
    assert!(out.bytes(IMAGE).unwrap().starts_with(&[0xFF, 0xD8]));
}

// Test: unknown mode fails and leaves the payload as it was
#[tokio::test]
async fn test_unknown_mode_does_not_mutate_payload() {
    let mut payload = resize_payload(jpeg(50, 50), 10, 10, "face");
    let before = payload.clone();

    let err = stage().process_in_place(&mut payload).await.unwrap_err();
    assert_eq!(err, ResizeError::unknown_mode("face"));
    assert_eq!(payload, before);
    assert!(!payload.contains(IMAGE));
}

// Test: required fields are enforced per path
#[rstest]
#[case(WIDTH)]
#[case(HEIGHT)]
#[case(MODE)]
#[case(ORIGINAL_IMAGE)]
#[tokio::test]
async fn test_resize_requires_field(#[case] field: &str) {
    let mut payload = resize_payload(jpeg(20, 20), 10, 10, "fit");
    payload.remove(field);

    let err = stage().process(payload).await.unwrap_err();
    assert_eq!(err, ResizeError::missing_field(field));
}

// Test: a crop window outside the source is a strategy failure
#[tokio::test]
async fn test_fullcrop_out_of_bounds() {
    let payload = resize_payload(jpeg(100, 100), 50, 50, "fit")
        .with(FULLCROP, true)
        .with(X1, 80u32)
        .with(Y1, 80u32);

    let err = stage().process(payload).await.unwrap_err();
    assert_eq!(err.kind(), "strategy");
}

// Test: garbage bytes surface as a decode failure
#[tokio::test]
async fn test_corrupt_source_is_decode_error() {
    let err = stage()
        .process(resize_payload(b"GIF89a-but-not-really".to_vec(), 10, 10, "fit"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "decode");
}

// Test: sources over the pixel budget are rejected before decoding
#[tokio::test]
async fn test_source_pixel_budget() {
    let config = ResizerConfig {
        workers: 1,
        max_source_pixels: 10_000,
        ..Default::default()
    };
    let (stage, metrics) = stage_with(config, ModeRegistry::with_builtin_modes());

    let err = stage
        .process(resize_payload(jpeg(200, 200), 50, 50, "fit"))
        .await
        .unwrap_err();
    assert_eq!(err, ResizeError::source_too_large(200, 200, 10_000));
    assert_eq!(metrics.outcome_count("resizer", "source_too_large"), 1);
}

// Test: the same request produces byte-identical output
#[tokio::test]
async fn test_output_is_deterministic() {
    let stage = stage();
    let source = jpeg(321, 123);

    let first = stage
        .process(resize_payload(source.clone(), 100, 100, "fill"))
        .await
        .unwrap();
    let second = stage
        .process(resize_payload(source, 100, 100, "fill"))
        .await
        .unwrap();
    assert_eq!(first.bytes(IMAGE).unwrap(), second.bytes(IMAGE).unwrap());
}

// Test: configured quality is honoured over the mode's choice
#[tokio::test]
async fn test_configured_quality_wins() {
    let mut modes = ModeRegistry::with_builtin_modes();
    modes.register("low", LowQuality);
    let source = jpeg(400, 400);

    let (unset, _) = stage_with(
        ResizerConfig {
            workers: 1,
            ..Default::default()
        },
        modes.clone(),
    );
    let (high, _) = stage_with(
        ResizerConfig {
            workers: 1,
            image_quality: Some(95),
            ..Default::default()
        },
        modes,
    );

    let mode_quality = unset
        .process(resize_payload(source.clone(), 200, 200, "low"))
        .await
        .unwrap()
        .bytes(IMAGE)
        .unwrap();
    let configured = high
        .process(resize_payload(source, 200, 200, "low"))
        .await
        .unwrap()
        .bytes(IMAGE)
        .unwrap();

    // Quality 10 from the mode survives when unset; 95 is much larger
    assert!(configured.len() > mode_quality.len());
}

// Test: every call is counted with its outcome
#[tokio::test]
async fn test_metrics_record_each_outcome() {
    let (stage, metrics) = stage_with(
        ResizerConfig {
            workers: 1,
            ..Default::default()
        },
        ModeRegistry::with_builtin_modes(),
    );

    stage
        .process(Payload::new().with(ORIGINAL_IMAGE, vec![0u8]).with(SKIP_RESIZE, true))
        .await
        .unwrap();
    stage
        .process(resize_payload(jpeg(40, 40), 20, 20, "fit"))
        .await
        .unwrap();
    let _ = stage
        .process(resize_payload(jpeg(40, 40), 20, 20, "nope"))
        .await;

    assert_eq!(metrics.invocation_count(), 3);
    assert_eq!(metrics.outcome_count("resizer", "skip"), 1);
    assert_eq!(metrics.outcome_count("resizer", "resize"), 1);
    assert_eq!(metrics.outcome_count("resizer", "unknown_mode"), 1);
    assert!(metrics
        .export_prometheus()
        .contains("stage_outcomes_total{stage=\"resizer\",outcome=\"resize\"} 1"));
}

// Test: absurd target sizes fail as a strategy error before any allocation
#[rstest]
#[case(70_000, 70_000)]
#[case(70_000, 1)]
#[case(1, 65_536)]
#[tokio::test]
async fn test_oversized_target_is_rejected(#[case] width: u32, #[case] height: u32) {
    let (stage, metrics) = stage_with(
        ResizerConfig {
            workers: 1,
            ..Default::default()
        },
        ModeRegistry::with_builtin_modes(),
    );

    let mut payload = resize_payload(jpeg(8, 8), width, height, "stretch");
    let before = payload.clone();
    let err = stage.process_in_place(&mut payload).await.unwrap_err();

    assert!(matches!(err, ResizeError::StrategyFailed { ref mode, .. } if mode == "stretch"));
    assert_eq!(payload, before);
    assert_eq!(metrics.outcome_count("resizer", "strategy"), 1);
}

// Test: quality 0 is accepted and encodes as the lowest quality
#[tokio::test]
async fn test_quality_zero_encodes() {
    let (stage, _) = stage_with(
        ResizerConfig {
            workers: 1,
            image_quality: Some(0),
            ..Default::default()
        },
        ModeRegistry::with_builtin_modes(),
    );

    let out = stage
        .process(resize_payload(jpeg(64, 64), 32, 32, "fit"))
        .await
        .unwrap();
    assert_eq!(decode_dimensions(&out.bytes(IMAGE).unwrap()), (32, 32));
}
