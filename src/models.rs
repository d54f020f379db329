use image::{GrayImage, RgbImage};
use imageproc::contours::Contour;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Single-channel binary image, 255 = selected, 0 = background.
pub type Mask = GrayImage;

/// Foreground value of a [`Mask`].
pub const FOREGROUND: u8 = 255;
/// Background value of a [`Mask`].
pub const BACKGROUND: u8 = 0;

/// Inclusive HSV box. Hue is 0..180 (degrees / 2), saturation and value 0..255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

/// A marker color: one HSV range, plus a second one when the hue band
/// crosses the 0/180 boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTarget {
    pub name: String,
    pub range: ColorRange,
    #[serde(default)]
    pub wrap: Option<ColorRange>,
}

impl ColorTarget {
    pub fn blue() -> Self {
        Self {
            name: "blue".to_string(),
            range: ColorRange::new([100, 100, 100], [130, 230, 230]),
            wrap: None,
        }
    }

    pub fn red() -> Self {
        Self {
            name: "red".to_string(),
            range: ColorRange::new([0, 100, 70], [25, 255, 255]),
            wrap: Some(ColorRange::new([163, 100, 70], [179, 255, 255])),
        }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        self.range.contains(hsv) || self.wrap.is_some_and(|w| w.contains(hsv))
    }
}

/// Detected circle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
}

impl Circle {
    pub const fn new(x: i32, y: i32, radius: i32) -> Self {
        Self { x, y, radius }
    }
}

/// Boundary of a connected foreground component plus its place in the
/// containment hierarchy.
#[derive(Debug, Clone)]
pub struct Region {
    pub points: Vec<Point<i32>>,
    pub parent: Option<usize>,
}

impl Region {
    /// Area enclosed by the boundary polygon (shoelace formula).
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let p = self.points[i];
                let q = self.points[(i + 1) % n];
                p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64
            })
            .sum();
        twice.abs() as f64 / 2.0
    }

    /// A region with a parent is enclosed by another one.
    pub fn is_hole(&self) -> bool {
        self.parent.is_some()
    }
}

impl From<Contour<i32>> for Region {
    fn from(contour: Contour<i32>) -> Self {
        Self {
            points: contour.points,
            parent: contour.parent,
        }
    }
}

/// Result of running the pipeline for one target color on one frame.
#[derive(Debug, Clone)]
pub struct MarkerDetection {
    pub target: String,
    pub mask: Mask,
    pub circles: Vec<Circle>,
    pub primary: Option<usize>,
    pub annotated: RgbImage,
}

impl MarkerDetection {
    pub fn primary_circle(&self) -> Option<Circle> {
        self.primary.and_then(|idx| self.circles.get(idx).copied())
    }
}
