mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from landing_site for tests
pub use landing_site::{Circle, ColorTarget, DetectionPipeline, DetectorConfig, Mask};
