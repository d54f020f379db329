use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;

use crate::models::Circle;

/// Outline style used when drawing a circle.
#[derive(Debug, Clone, Copy)]
pub struct CircleStyle {
    pub color: Rgb<u8>,
    pub thickness: i32,
}

pub const CANDIDATE_STYLE: CircleStyle = CircleStyle {
    color: Rgb([255, 255, 0]),
    thickness: 2,
};

pub const PRIMARY_STYLE: CircleStyle = CircleStyle {
    color: Rgb([0, 255, 0]),
    thickness: 4,
};

/// Draw a circle outline `thickness` pixels wide, centered on its radius
pub fn draw_circle(canvas: &mut RgbImage, circle: &Circle, style: CircleStyle) {
    let inner = circle.radius - style.thickness / 2;
    for r in inner..inner + style.thickness.max(1) {
        if r >= 0 {
            draw_hollow_circle_mut(canvas, (circle.x, circle.y), r, style.color);
        }
    }
}

/// Copy of `frame` with every circle outlined and the primary one on top.
pub fn annotate(frame: &RgbImage, circles: &[Circle], primary: Option<usize>) -> RgbImage {
    let mut out = frame.clone();
    for circle in circles {
        draw_circle(&mut out, circle, CANDIDATE_STYLE);
    }
    if let Some(circle) = primary.and_then(|idx| circles.get(idx)) {
        draw_circle(&mut out, circle, PRIMARY_STYLE);
    }
    out
}
