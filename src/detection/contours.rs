use image::Luma;
use imageproc::contours::find_contours;
use imageproc::point::Point;
use tracing::trace;

use crate::models::{BACKGROUND, FOREGROUND, Mask, Region};

/// Find region boundaries with their containment hierarchy
pub fn find_regions(mask: &Mask) -> Vec<Region> {
    find_contours::<i32>(mask)
        .into_iter()
        .map(Region::from)
        .collect()
}

/// Paint a region's boundary and everything it encloses with `value`
pub fn fill_region(mask: &mut Mask, points: &[Point<i32>], value: u8) {
    let (width, height) = mask.dimensions();
    let inside = |x: i32, y: i32| x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height;

    if points.len() >= 3 {
        let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(0);
        let max_y = points
            .iter()
            .map(|p| p.y)
            .max()
            .unwrap_or(0)
            .min(height as i32 - 1);

        let mut crossings: Vec<f64> = Vec::new();
        for y in min_y..=max_y {
            crossings.clear();
            for (i, p) in points.iter().enumerate() {
                let q = points[(i + 1) % points.len()];
                // half-open rule keeps the crossing count even at vertices
                let (lo, hi) = if p.y < q.y { (*p, q) } else { (q, *p) };
                if lo.y <= y && y < hi.y {
                    let t = (y - lo.y) as f64 / (hi.y - lo.y) as f64;
                    crossings.push(lo.x as f64 + t * (hi.x - lo.x) as f64);
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for pair in crossings.chunks_exact(2) {
                let start = pair[0].ceil() as i32;
                let end = pair[1].floor() as i32;
                for x in start.max(0)..=end.min(width as i32 - 1) {
                    mask.put_pixel(x as u32, y as u32, Luma([value]));
                }
            }
        }
    }

    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let steps = (q.x - p.x).abs().max((q.y - p.y).abs());
        for s in 0..=steps {
            let t = if steps == 0 { 0.0 } else { s as f64 / steps as f64 };
            let x = (p.x as f64 + t * (q.x - p.x) as f64).round() as i32;
            let y = (p.y as f64 + t * (q.y - p.y) as f64).round() as i32;
            if inside(x, y) {
                mask.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }
    }
}

/// Erase small regions and fill holes, in extraction order.
///
/// For each region the small-area erase is applied first and the hole
/// fill second, so a small hole ends up filled. Later regions can
/// overwrite pixels painted for earlier ones.
pub fn filter_regions(mask: &Mask, min_area_ratio: f64) -> Mask {
    let (width, height) = mask.dimensions();
    let min_area = min_area_ratio * width as f64 * height as f64;
    let regions = find_regions(mask);

    let mut out = mask.clone();
    for (idx, region) in regions.iter().enumerate() {
        let area = region.area();
        if area < min_area {
            trace!(idx, area, "erasing small region");
            fill_region(&mut out, &region.points, BACKGROUND);
        }
        if region.is_hole() {
            trace!(idx, area, parent = ?region.parent, "filling hole");
            fill_region(&mut out, &region.points, FOREGROUND);
        }
    }
    out
}
