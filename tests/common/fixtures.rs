#![allow(dead_code)]

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

/// Saturated-enough blue that stays inside the blue HSV box (S, V <= 230)
pub const TEST_BLUE: Rgb<u8> = Rgb([30, 60, 200]);
pub const TEST_RED: Rgb<u8> = Rgb([220, 30, 30]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;

/// Creates a black frame
pub fn blank_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BLACK)
}

/// Creates a black frame with a single filled disk
pub fn disk_frame(width: u32, height: u32, center: (i32, i32), radius: i32, color: Rgb<u8>) -> RgbImage {
    let mut frame = blank_frame(width, height);
    draw_filled_circle_mut(&mut frame, center, radius, color);
    frame
}

/// Creates a black frame with a ring: a filled disk with a black center
pub fn ring_frame(center: (i32, i32), outer: i32, inner: i32, color: Rgb<u8>) -> RgbImage {
    let mut frame = disk_frame(WIDTH, HEIGHT, center, outer, color);
    draw_filled_circle_mut(&mut frame, center, inner, BLACK);
    frame
}

/// Creates an empty mask
pub fn blank_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

/// Paints a filled square of side `size` with its top-left corner at (x, y)
pub fn paint_square(mask: &mut GrayImage, x: i32, y: i32, size: u32, value: u8) {
    draw_filled_rect_mut(mask, Rect::at(x, y).of_size(size, size), Luma([value]));
}

/// Deterministic speckle pattern for morphology tests
pub fn noise_mask(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut state = seed;
    GrayImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        if (state >> 16) % 3 == 0 { Luma([255]) } else { Luma([0]) }
    })
}

pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] == 255).count()
}

pub fn assert_near(actual: i32, expected: i32, tolerance: i32, what: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{what}: expected {expected} +/- {tolerance}, got {actual}"
    );
}
