mod common;

use common::*;
use landing_site::detection::build_standard_pipeline;
use landing_site::detection::steps::CleanStep;
use landing_site::{DetectError, Pipeline, PipelineData};
use std::sync::Arc;

fn blue_pipeline() -> DetectionPipeline {
    DetectionPipeline::new(DetectorConfig::default()).expect("default config is valid")
}

#[test]
fn scenario_a_blue_disk_is_found() -> anyhow::Result<()> {
    let frame = disk_frame(WIDTH, HEIGHT, (320, 240), 50, TEST_BLUE);
    let detection = blue_pipeline().detect(&frame, &ColorTarget::blue())?;

    let expected_area = std::f64::consts::PI * 50.0 * 50.0;
    let area = count_foreground(&detection.mask) as f64;
    assert!((area - expected_area).abs() / expected_area < 0.05, "mask area {area}");

    assert_eq!(detection.circles.len(), 1, "{:?}", detection.circles);
    let primary = detection.primary_circle().expect("primary circle");
    assert_eq!(detection.primary, Some(0));
    assert_near(primary.x, 320, 2, "center x");
    assert_near(primary.y, 240, 2, "center y");
    assert_near(primary.radius, 50, 3, "radius");
    assert_ne!(detection.annotated, frame);
    Ok(())
}

#[test]
fn scenario_b_small_disk_is_filtered_out() -> anyhow::Result<()> {
    let frame = disk_frame(WIDTH, HEIGHT, (320, 240), 5, TEST_BLUE);
    let detection = blue_pipeline().detect(&frame, &ColorTarget::blue())?;

    assert_eq!(count_foreground(&detection.mask), 0);
    assert!(detection.circles.is_empty());
    assert_eq!(detection.primary, None);
    assert_eq!(detection.annotated, frame);
    Ok(())
}

#[test]
fn scenario_c_ring_is_detected_as_filled_disk() -> anyhow::Result<()> {
    let frame = ring_frame((320, 240), 60, 25, TEST_BLUE);
    let detection = blue_pipeline().detect(&frame, &ColorTarget::blue())?;

    assert_eq!(detection.mask.get_pixel(320, 240)[0], 255);
    let primary = detection.primary_circle().expect("primary circle");
    assert_near(primary.x, 320, 2, "center x");
    assert_near(primary.y, 240, 2, "center y");
    assert_near(primary.radius, 60, 3, "radius");
    Ok(())
}

#[test]
fn red_marker_found_only_by_red_target() -> anyhow::Result<()> {
    let frame = disk_frame(WIDTH, HEIGHT, (200, 200), 60, TEST_RED);
    let detections = blue_pipeline().detect_all(&frame)?;

    assert_eq!(detections.len(), 2);
    let blue = detections.iter().find(|d| d.target == "blue").expect("blue result");
    let red = detections.iter().find(|d| d.target == "red").expect("red result");
    assert!(blue.primary.is_none());
    assert_eq!(blue.annotated, frame);
    let circle = red.primary_circle().expect("red primary");
    assert_near(circle.radius, 60, 3, "radius");
    Ok(())
}

#[test]
fn repeated_runs_are_identical() -> anyhow::Result<()> {
    let frame = ring_frame((300, 220), 70, 20, TEST_BLUE);
    let pipeline = blue_pipeline();

    let first = pipeline.detect_all(&frame)?;
    let second = pipeline.detect_all(&frame)?;
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.circles, b.circles);
        assert_eq!(a.primary, b.primary);
        assert_eq!(a.annotated, b.annotated);
        assert_eq!(a.mask, b.mask);
    }
    Ok(())
}

#[test]
fn zero_sized_frame_is_rejected() {
    let frame = image::RgbImage::new(0, 0);
    let err = blue_pipeline().detect(&frame, &ColorTarget::blue()).unwrap_err();
    assert!(matches!(err, DetectError::InvalidInput { .. }));
}

#[test]
fn debug_mode_saves_every_step() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");
    let pipeline = blue_pipeline().with_debug(debug_dir.clone())?;

    let frame = disk_frame(WIDTH, HEIGHT, (320, 240), 50, TEST_BLUE);
    pipeline.detect(&frame, &ColorTarget::blue())?;

    for step in [
        "01_color_segmentation",
        "02_region_cleaning",
        "03_region_filtering",
        "04_circle_detection",
    ] {
        assert!(debug_dir.join(step).join("blue.png").exists(), "missing {step}");
    }
    Ok(())
}

#[test]
fn verbose_run_matches_quiet_run() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");
    let verbose = blue_pipeline()
        .with_verbose(true)
        .with_debug(debug_dir.clone())?;

    let frame = disk_frame(WIDTH, HEIGHT, (320, 240), 50, TEST_BLUE);
    let loud = verbose.detect_frame(&frame, 7)?;
    let quiet = blue_pipeline().detect_frame(&frame, 7)?;

    assert_eq!(loud.len(), quiet.len());
    for (a, b) in loud.iter().zip(&quiet) {
        assert_eq!(a.circles, b.circles);
        assert_eq!(a.annotated, b.annotated);
    }
    assert!(debug_dir.join("04_circle_detection").join("000007_blue.png").exists());
    Ok(())
}

#[test]
fn debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;
    assert!(Pipeline::new().with_debug(dir.path().to_path_buf()).is_err());
    Ok(())
}

#[test]
fn standard_pipeline_step_order() -> anyhow::Result<()> {
    let config = DetectorConfig::default();
    let pipeline = build_standard_pipeline(&ColorTarget::blue(), &config);
    assert_eq!(
        pipeline.step_names(),
        ["Color Segmentation", "Region Cleaning", "Region Filtering", "Circle Detection"]
    );

    let frame = Arc::new(disk_frame(WIDTH, HEIGHT, (320, 240), 50, TEST_BLUE));
    let partial = pipeline.run_partial(PipelineData::from_frame(frame, "partial"), 1)?;
    assert!(partial.mask.is_some());
    assert!(partial.circles.is_empty());
    Ok(())
}

#[test]
fn mask_step_without_segmentation_fails() {
    let pipeline = Pipeline::new().add_step_boxed(Box::new(CleanStep { kernel: 2 }));
    let frame = Arc::new(blank_frame(10, 10));
    let result = pipeline.run(PipelineData::from_frame(frame, "bad"));
    assert!(matches!(result, Err(DetectError::ConfigInvalid(_))));
}
