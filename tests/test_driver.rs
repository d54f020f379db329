mod common;

use common::*;
use image::RgbImage;
use landing_site::DetectError;
use landing_site::driver::{
    Command, DirectorySink, DriverOptions, DriverStats, FrameDriver, FrameSource, ImageSequence,
    LogSink,
};
use std::sync::mpsc;
use std::time::Duration;

const SMALL_W: u32 = 160;
const SMALL_H: u32 = 120;

fn small_disk() -> RgbImage {
    disk_frame(SMALL_W, SMALL_H, (80, 60), 20, TEST_BLUE)
}

fn blue_driver(max_frames: Option<u64>) -> FrameDriver {
    let mut config = DetectorConfig::default();
    config.select_targets(&["blue".to_string()]).expect("blue is configured");
    let pipeline = DetectionPipeline::new(config).expect("valid config");
    FrameDriver::new(
        pipeline,
        DriverOptions {
            poll_interval: Duration::from_millis(1),
            max_frames,
        },
    )
}

fn run_with(
    driver: &FrameDriver,
    frames: Vec<RgbImage>,
    commands: &[Command],
) -> anyhow::Result<(DriverStats, LogSink)> {
    let (sender, receiver) = mpsc::channel();
    for command in commands {
        sender.send(*command)?;
    }
    drop(sender);

    let mut source = ImageSequence::from_frames(frames);
    let mut sink = LogSink::default();
    let stats = driver.run(&mut source, &mut sink, &receiver)?;
    Ok((stats, sink))
}

#[test]
fn loops_back_to_first_frame() -> anyhow::Result<()> {
    let driver = blue_driver(Some(5));
    let (stats, sink) = run_with(&driver, vec![small_disk(), blank_frame(SMALL_W, SMALL_H)], &[])?;

    assert_eq!(stats.frames, 5);
    assert_eq!(stats.loops, 2);
    assert_eq!(stats.detections, 3);
    assert_eq!(sink.count("blue"), 5);
    assert_eq!(sink.count("blue_mask"), 5);
    Ok(())
}

#[test]
fn quit_stops_after_current_frame() -> anyhow::Result<()> {
    let driver = blue_driver(None);
    let (stats, _) = run_with(&driver, vec![small_disk()], &[Command::Quit])?;
    assert_eq!(stats.frames, 1);
    Ok(())
}

#[test]
fn pause_waits_for_next_input() -> anyhow::Result<()> {
    let driver = blue_driver(Some(3));
    let (stats, _) = run_with(&driver, vec![small_disk()], &[Command::Pause, Command::Resume])?;
    assert_eq!(stats.frames, 3);

    // nobody left to resume a paused driver
    let driver = blue_driver(None);
    let (stats, _) = run_with(&driver, vec![small_disk()], &[Command::Pause])?;
    assert_eq!(stats.frames, 1);
    Ok(())
}

#[test]
fn invalid_frames_are_skipped() -> anyhow::Result<()> {
    let driver = blue_driver(Some(2));
    let (stats, sink) = run_with(&driver, vec![RgbImage::new(0, 0), small_disk()], &[])?;
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(sink.count("blue"), 1);
    Ok(())
}

#[test]
fn empty_sequence_is_an_error() {
    let driver = blue_driver(Some(1));
    let result = run_with(&driver, Vec::new(), &[]);
    let err = result.unwrap_err();
    assert!(matches!(err.downcast_ref::<DetectError>(), Some(DetectError::EmptySource)));
}

#[test]
fn directory_source_reads_sorted_images() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    small_disk().save(dir.path().join("frame_b.png"))?;
    blank_frame(SMALL_W, SMALL_H).save(dir.path().join("frame_a.png"))?;
    std::fs::write(dir.path().join("notes.txt"), "not a frame")?;

    let mut source = ImageSequence::open(dir.path())?;
    assert_eq!(source.len(), 2);
    let first = source.next_frame()?.expect("first frame");
    assert_eq!(first, blank_frame(SMALL_W, SMALL_H));
    assert!(source.next_frame()?.is_some());
    assert!(source.next_frame()?.is_none());

    source.rewind()?;
    assert_eq!(source.position(), 0);
    Ok(())
}

#[test]
fn missing_or_empty_sources() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    assert!(matches!(
        ImageSequence::open(dir.path().join("nope.mp4")),
        Err(DetectError::SourceUnavailable(_))
    ));
    assert!(matches!(ImageSequence::open(dir.path()), Err(DetectError::EmptySource)));
    Ok(())
}

#[test]
fn directory_sink_writes_annotated_frames() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let driver = blue_driver(Some(2));

    let (sender, receiver) = mpsc::channel::<Command>();
    drop(sender);
    let mut source = ImageSequence::from_frames(vec![small_disk()]);
    let mut sink = DirectorySink::new(dir.path().join("out"))?;
    driver.run(&mut source, &mut sink, &receiver)?;

    assert!(sink.frame_path("blue", 0).exists());
    assert!(sink.frame_path("blue", 1).exists());
    assert!(sink.frame_path("blue_mask", 1).exists());
    let written = image::open(sink.frame_path("blue", 0))?.to_rgb8();
    assert_eq!(written.dimensions(), (SMALL_W, SMALL_H));
    Ok(())
}
