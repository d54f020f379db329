use crate::config::HoughParams;
use crate::detection::{circles, contours, morphology, preprocessing};
use crate::error::Result;
use crate::models::ColorTarget;
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};
use tracing::debug;

/// Threshold the frame in HSV space into a binary mask
pub struct SegmentStep {
    pub target: ColorTarget,
    pub blur_sigma: Option<f32>,
}

impl PipelineStep for SegmentStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let mask = match self.blur_sigma {
            Some(sigma) if sigma > 0.0 => {
                let blurred = preprocessing::apply_blur(&data.original, sigma);
                preprocessing::segment_color(&blurred, &self.target)?
            }
            _ => preprocessing::segment_color(&data.original, &self.target)?,
        };
        debug!(
            color = %self.target.name,
            selected = mask.pixels().filter(|p| p[0] > 0).count(),
            "segmented"
        );
        data.mask = Some(mask);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Color Segmentation"
    }
}

/// Opening then closing to drop speckles and close small gaps
pub struct CleanStep {
    pub kernel: u32,
}

impl PipelineStep for CleanStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let cleaned = morphology::clean(data.require_mask(self.name())?, self.kernel);
        data.mask = Some(cleaned);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Region Cleaning"
    }
}

/// Erase small regions and fill holes
pub struct RegionFilterStep {
    pub min_area_ratio: f64,
}

impl PipelineStep for RegionFilterStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let filtered = contours::filter_regions(data.require_mask(self.name())?, self.min_area_ratio);
        data.mask = Some(filtered);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Region Filtering"
    }
}

/// Run the circle transform on the filtered mask
pub struct CircleDetectStep {
    pub params: HoughParams,
}

impl PipelineStep for CircleDetectStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        data.circles = circles::hough_circles(data.require_mask(self.name())?, &self.params);
        debug!(circles = data.circles.len(), "circle detection");
        Ok(data)
    }

    fn name(&self) -> &str {
        "Circle Detection"
    }
}
