//! Frame driver: pulls frames from a [`FrameSource`], runs detection for
//! every configured color, hands the results to a [`DisplaySink`] and
//! reacts to [`Command`]s between frames.

pub mod control;
pub mod sink;
pub mod source;

pub use control::{Command, spawn_stdin_commands};
pub use sink::{DirectorySink, DisplaySink, LogSink};
pub use source::{FrameSource, ImageSequence};

use image::DynamicImage;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::detection::DetectionPipeline;
use crate::error::{DetectError, Result};

#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// How long to wait for user input after each frame
    pub poll_interval: Duration,
    /// Stop after this many frames; loop forever when `None`
    pub max_frames: Option<u64>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(30),
            max_frames: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Frames read from the source
    pub frames: u64,
    /// Frames whose detection was skipped because the frame was invalid
    pub skipped: u64,
    /// Number of (frame, color) pairs with a primary circle
    pub detections: u64,
    /// Times the source was rewound
    pub loops: u64,
}

enum Flow {
    Continue,
    Quit,
}

pub struct FrameDriver {
    pipeline: DetectionPipeline,
    options: DriverOptions,
}

impl FrameDriver {
    pub fn new(pipeline: DetectionPipeline, options: DriverOptions) -> Self {
        Self { pipeline, options }
    }

    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn DisplaySink,
        commands: &Receiver<Command>,
    ) -> Result<DriverStats> {
        let mut stats = DriverStats::default();
        let colors: Vec<&str> = self
            .pipeline
            .config()
            .targets
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        info!(?colors, frames = source.len(), "driver started");

        loop {
            if self.options.max_frames.is_some_and(|max| stats.frames >= max) {
                debug!(frames = stats.frames, "frame limit reached");
                break;
            }

            let frame = match source.next_frame()? {
                Some(frame) => frame,
                None => {
                    debug!("end of stream, rewinding");
                    source.rewind()?;
                    stats.loops += 1;
                    source.next_frame()?.ok_or(DetectError::EmptySource)?
                }
            };
            let frame_index = stats.frames;
            stats.frames += 1;

            match self.pipeline.detect_frame(&frame, frame_index) {
                Ok(detections) => {
                    for detection in detections {
                        if detection.primary.is_some() {
                            stats.detections += 1;
                        }
                        let mask_window = format!("{}_mask", detection.target);
                        sink.show(
                            &detection.target,
                            frame_index,
                            &DynamicImage::ImageRgb8(detection.annotated),
                        )?;
                        sink.show(&mask_window, frame_index, &DynamicImage::ImageLuma8(detection.mask))?;
                    }
                }
                Err(DetectError::InvalidInput { width, height }) => {
                    warn!(frame_index, width, height, "skipping invalid frame");
                    stats.skipped += 1;
                }
                Err(e) => return Err(e),
            }

            if let Flow::Quit = self.poll(commands) {
                info!(frames = stats.frames, "quit requested");
                break;
            }
        }

        Ok(stats)
    }

    fn poll(&self, commands: &Receiver<Command>) -> Flow {
        match commands.recv_timeout(self.options.poll_interval) {
            Ok(Command::Quit) => Flow::Quit,
            Ok(Command::Pause) => {
                info!("paused");
                // any further input resumes, except quit
                match commands.recv() {
                    Ok(Command::Quit) | Err(_) => Flow::Quit,
                    Ok(_) => Flow::Continue,
                }
            }
            Ok(Command::Resume) | Err(RecvTimeoutError::Timeout) => Flow::Continue,
            Err(RecvTimeoutError::Disconnected) => {
                // keep the frame pacing when nobody can send input
                std::thread::sleep(self.options.poll_interval);
                Flow::Continue
            }
        }
    }
}
