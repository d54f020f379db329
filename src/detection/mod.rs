pub mod annotate;
pub mod circles;
pub mod contours;
pub mod morphology;
pub mod preprocessing;
pub mod steps;

use image::RgbImage;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::error::{DetectError, Result};
use crate::models::{ColorTarget, MarkerDetection};
use crate::pipeline::{DebugConfig, Pipeline, PipelineData};

/// Main detection orchestrator: runs the per-color pipeline on a frame
pub struct DetectionPipeline {
    config: DetectorConfig,
    debug: Option<DebugConfig>,
    verbose: bool,
}

impl DetectionPipeline {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            debug: None,
            verbose: false,
        })
    }

    /// Log every pipeline step with its duration
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Save every step's mask under `output_dir` (must be empty or missing)
    pub fn with_debug(mut self, output_dir: std::path::PathBuf) -> Result<Self> {
        self.debug = Pipeline::new().with_debug(output_dir)?.debug_config().cloned();
        Ok(self)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect one target color on a frame
    pub fn detect(&self, frame: &RgbImage, target: &ColorTarget) -> Result<MarkerDetection> {
        self.detect_labeled(Arc::new(frame.clone()), target, &target.name)
    }

    /// Detect every configured target color, sequentially and independently
    pub fn detect_all(&self, frame: &RgbImage) -> Result<Vec<MarkerDetection>> {
        self.detect_frame(frame, 0)
    }

    /// Same as [`detect_all`](Self::detect_all), tagging debug output with
    /// the frame index
    pub fn detect_frame(&self, frame: &RgbImage, frame_index: u64) -> Result<Vec<MarkerDetection>> {
        let shared = Arc::new(frame.clone());
        self.config
            .targets
            .iter()
            .map(|target| {
                let label = format!("{:06}_{}", frame_index, target.name);
                self.detect_labeled(shared.clone(), target, &label)
            })
            .collect()
    }

    fn detect_labeled(
        &self,
        frame: Arc<RgbImage>,
        target: &ColorTarget,
        label: &str,
    ) -> Result<MarkerDetection> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectError::InvalidInput { width, height });
        }

        let pipeline = build_standard_pipeline(target, &self.config)
            .with_verbose(self.verbose)
            .with_debug_config(self.debug.clone());
        let data = pipeline.run(PipelineData::from_frame(frame, label))?;

        let primary = circles::select_primary(&data.circles);
        let annotated = annotate::annotate(&data.original, &data.circles, primary);
        let mask = data.require_mask("annotation")?.clone();

        match primary.and_then(|idx| data.circles.get(idx)) {
            Some(c) => info!(
                color = %target.name,
                x = c.x,
                y = c.y,
                radius = c.radius,
                candidates = data.circles.len(),
                "landing site found"
            ),
            None => debug!(color = %target.name, "no landing site"),
        }

        Ok(MarkerDetection {
            target: target.name.clone(),
            mask,
            circles: data.circles,
            primary,
            annotated,
        })
    }
}

/// Build the standard four-step detection pipeline for one target color
pub fn build_standard_pipeline(target: &ColorTarget, config: &DetectorConfig) -> Pipeline {
    use crate::detection::steps::*;

    Pipeline::new()
        .add_step(Arc::new(SegmentStep {
            target: target.clone(),
            blur_sigma: config.blur_sigma,
        }))
        .add_step(Arc::new(CleanStep {
            kernel: config.morph_kernel,
        }))
        .add_step(Arc::new(RegionFilterStep {
            min_area_ratio: config.min_area_ratio,
        }))
        .add_step(Arc::new(CircleDetectStep {
            params: config.hough.clone(),
        }))
}
