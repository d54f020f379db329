pub mod config;
pub mod detection;
pub mod driver;
pub mod error;
pub mod logger;
pub mod models;
pub mod pipeline;

pub use config::{DetectorConfig, HoughParams};
pub use detection::DetectionPipeline;
pub use error::{DetectError, Result};
pub use models::{Circle, ColorRange, ColorTarget, Mask, MarkerDetection, Region};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
