use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{DetectError, Result};
use crate::models::{Circle, Mask};

/// Data that flows through the pipeline for one frame and one target color
#[derive(Clone)]
pub struct PipelineData {
    /// The frame being analysed, never modified by the steps
    pub original: Arc<RgbImage>,

    /// Current binary mask (None until segmentation ran)
    pub mask: Option<Mask>,

    /// Circles found so far, in detector order
    pub circles: Vec<Circle>,

    /// Name used for debug output files (e.g. "000012_blue")
    pub label: String,
}

impl PipelineData {
    pub fn from_frame(frame: Arc<RgbImage>, label: impl Into<String>) -> Self {
        Self {
            original: frame,
            mask: None,
            circles: Vec::new(),
            label: label.into(),
        }
    }

    /// Mask produced by an earlier step; running a mask step before
    /// segmentation is a pipeline construction error.
    pub fn require_mask(&self, step: &str) -> Result<&Mask> {
        self.mask.as_ref().ok_or_else(|| {
            DetectError::ConfigInvalid(format!("step '{step}' needs a mask from an earlier step"))
        })
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    /// Report every step at info level with its duration
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug directories)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(DetectError::ConfigInvalid(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    /// Use an already validated debug configuration
    pub fn with_debug_config(mut self, debug: Option<DebugConfig>) -> Self {
        self.context.debug = debug;
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn debug_config(&self) -> Option<&DebugConfig> {
        self.context.debug.as_ref()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order
    pub fn run(&self, input: PipelineData) -> Result<PipelineData> {
        self.run_partial(input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: PipelineData, num_steps: usize) -> Result<PipelineData> {
        let mut data = input;
        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            let started = Instant::now();
            data = step.process(data, &self.context)?;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            if self.context.verbose {
                info!(
                    step = step.name(),
                    label = %data.label,
                    circles = data.circles.len(),
                    elapsed_ms,
                    "step finished"
                );
            } else {
                debug!(step = step.name(), label = %data.label, "step finished");
            }
            self.save_debug_output(step_idx, step.name(), &data)?;
        }
        Ok(data)
    }

    /// Save the step's mask if debug mode is enabled
    fn save_debug_output(&self, step_idx: usize, step_name: &str, data: &PipelineData) -> Result<()> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };
        let Some(mask) = &data.mask else {
            return Ok(());
        };

        let step_dir_name = format!(
            "{:02}_{}",
            step_idx + 1,
            step_name.to_lowercase().replace(' ', "_")
        );
        let step_dir = debug_config.output_dir.join(&step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        let filename = format!("{}.png", data.label);
        mask.save(step_dir.join(&filename))?;
        if self.context.verbose {
            debug!("saved {}/{}", step_dir_name, filename);
        }
        Ok(())
    }
}
