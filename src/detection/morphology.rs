//! Square-kernel binary morphology.
//!
//! The structuring element is a `k x k` square anchored at `(k/2, k/2)`.
//! Pixels outside the image are ignored, so the border never erodes a
//! region or grows one. Dilation uses the reflected element, which makes
//! [`open`] and [`close`] proper (idempotent) filters for even kernels too.

use image::{GrayImage, Luma};
use imageproc::morphology::{Mask as Element, grayscale_dilate, grayscale_erode};

use crate::models::{FOREGROUND, Mask};

/// Square element of side `k` whose origin sits at `(center, center)`.
fn square(k: u32, center: u32) -> Element {
    let side = GrayImage::from_pixel(k, k, Luma([FOREGROUND]));
    Element::from_image(&side, center as u8, center as u8)
}

/// Origin of the element used for erosion and of its reflection.
fn anchors(k: u32) -> (u32, u32) {
    let anchor = k / 2;
    (anchor, k - 1 - anchor)
}

pub fn erode(mask: &Mask, k: u32) -> Mask {
    if k <= 1 {
        return mask.clone();
    }
    let (anchor, _) = anchors(k);
    grayscale_erode(mask, &square(k, anchor))
}

pub fn dilate(mask: &Mask, k: u32) -> Mask {
    if k <= 1 {
        return mask.clone();
    }
    let (_, reflected) = anchors(k);
    grayscale_dilate(mask, &square(k, reflected))
}

/// Erosion followed by dilation: removes isolated speckles.
pub fn open(mask: &Mask, k: u32) -> Mask {
    dilate(&erode(mask, k), k)
}

/// Dilation followed by erosion: fills small gaps.
pub fn close(mask: &Mask, k: u32) -> Mask {
    erode(&dilate(mask, k), k)
}

/// Opening then closing with the same kernel.
pub fn clean(mask: &Mask, k: u32) -> Mask {
    close(&open(mask, k), k)
}
