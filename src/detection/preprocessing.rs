use image::{GrayImage, Luma, RgbImage};

use crate::error::{DetectError, Result};
use crate::models::{BACKGROUND, ColorTarget, FOREGROUND, Mask};

/// Convert one RGB pixel to 8-bit HSV (hue 0..180, saturation and value 0..255).
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let s = if max > 0.0 { diff * 255.0 / max } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    // 360 degrees folds back onto hue 0
    let h = ((h / 2.0).round() as u32 % 180) as u8;
    [h, s.round() as u8, max as u8]
}

/// Apply Gaussian blur to the frame
pub fn apply_blur(frame: &RgbImage, sigma: f32) -> RgbImage {
    if frame.width() == 0 || frame.height() == 0 {
        return frame.clone();
    }
    image::imageops::blur(frame, sigma)
}

/// Select the pixels whose HSV value falls inside the target's range(s)
pub fn segment_color(frame: &RgbImage, target: &ColorTarget) -> Result<Mask> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidInput { width, height });
    }

    let mut mask = GrayImage::new(width, height);
    for (x, y, px) in frame.enumerate_pixels() {
        let hsv = rgb_to_hsv(px[0], px[1], px[2]);
        let value = if target.contains(hsv) { FOREGROUND } else { BACKGROUND };
        mask.put_pixel(x, y, Luma([value]));
    }
    Ok(mask)
}
