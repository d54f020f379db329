//! Detector configuration.
//!
//! All thresholds live in one immutable [`DetectorConfig`] that is built at
//! startup (defaults, optionally overlaid by a JSON file) and borrowed by
//! every pipeline run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};
use crate::models::ColorTarget;

/// Parameters of the gradient Hough circle transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// Inverse accumulator resolution.
    pub dp: f64,
    /// Minimum distance between accepted circle centers.
    pub min_distance: f64,
    /// Upper Canny threshold; the lower one is half of it.
    pub canny_threshold: f32,
    /// Votes a center (and edge support a radius) must exceed.
    pub accumulator_threshold: u32,
    pub min_radius: u32,
    /// 0 means the larger frame dimension.
    pub max_radius: u32,
    /// Share of a candidate's perimeter that must lie on mask edges.
    pub min_coverage: f64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            dp: 1.1,
            min_distance: 40.0,
            canny_threshold: 200.0,
            accumulator_threshold: 25,
            min_radius: 0,
            max_radius: 240,
            min_coverage: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Gaussian blur applied to the frame before segmentation.
    pub blur_sigma: Option<f32>,
    /// Side of the square structuring element used by the cleaner.
    pub morph_kernel: u32,
    /// Regions smaller than `min_area_ratio * width * height` are dropped.
    pub min_area_ratio: f64,
    pub hough: HoughParams,
    pub targets: Vec<ColorTarget>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blur_sigma: None,
            morph_kernel: 2,
            min_area_ratio: 0.0009,
            hough: HoughParams::default(),
            targets: vec![ColorTarget::blue(), ColorTarget::red()],
        }
    }
}

impl DetectorConfig {
    /// Load a JSON config from disk. Missing fields keep their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=255).contains(&self.morph_kernel) {
            return Err(DetectError::ConfigInvalid(format!(
                "morph_kernel {} outside [1, 255]",
                self.morph_kernel
            )));
        }
        if !(0.0..=1.0).contains(&self.min_area_ratio) {
            return Err(DetectError::ConfigInvalid(format!(
                "min_area_ratio {} outside [0, 1]",
                self.min_area_ratio
            )));
        }
        if self.hough.dp <= 0.0 {
            return Err(DetectError::ConfigInvalid("hough.dp must be positive".into()));
        }
        if self.hough.max_radius != 0 && self.hough.min_radius > self.hough.max_radius {
            return Err(DetectError::ConfigInvalid(format!(
                "hough.min_radius {} exceeds max_radius {}",
                self.hough.min_radius, self.hough.max_radius
            )));
        }
        if !(0.0..=1.0).contains(&self.hough.min_coverage) {
            return Err(DetectError::ConfigInvalid(format!(
                "hough.min_coverage {} outside [0, 1]",
                self.hough.min_coverage
            )));
        }
        if self.targets.is_empty() {
            return Err(DetectError::ConfigInvalid("no target colors configured".into()));
        }
        Ok(())
    }

    /// Keep only the targets whose names are listed, in the listed order.
    pub fn select_targets(&mut self, names: &[String]) -> Result<()> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let target = self
                .targets
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| DetectError::ConfigInvalid(format!("unknown target color: {name}")))?;
            selected.push(target.clone());
        }
        self.targets = selected;
        Ok(())
    }
}
