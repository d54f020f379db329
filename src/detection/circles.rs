use image::Luma;
use imageproc::definitions::Image;
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use std::f64::consts::TAU;
use tracing::trace;

use crate::config::HoughParams;
use crate::models::{Circle, Mask};

/// Width of the distance window used to vote for a radius, in pixels.
const RADIUS_WINDOW: usize = 2;

/// Smoothing applied to the mask before taking gradient directions. A raw
/// binary edge only yields a handful of Sobel angles.
const GRADIENT_SIGMA: f32 = 2.0;

/// Side of the square cells edge points are bucketed into.
const GRID_CELL: usize = 32;

/// Band around the current estimate, as a share of its radius, for each
/// least-squares refit.
const FIT_BANDS: [f64; 3] = [0.25, 0.12, 0.06];
const MIN_FIT_BAND: f64 = 2.0;
const MIN_FIT_POINTS: usize = 8;

/// Angular step between perimeter samples when measuring coverage.
const SAMPLE_STEP: f64 = 0.05;
const MIN_INLIER_DISTANCE: f64 = 2.0;
const MAX_INLIER_DISTANCE: f64 = 100.0;

type Estimate = (f64, f64, f64);

/// Detect circles with a two-stage gradient Hough transform.
///
/// Centers are found by letting every edge pixel vote along its gradient
/// line, then each center (strongest first) gets the radius best supported
/// by the edge pixels around it. That estimate is refit by least squares to
/// the edges near it and kept only when enough of its perimeter lies on an
/// edge. Circles come back ordered by center votes.
pub fn hough_circles(mask: &Mask, params: &HoughParams) -> Vec<Circle> {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let edges = canny(mask, params.canny_threshold / 2.0, params.canny_threshold);
    let smooth = gaussian_blur_f32(mask, GRADIENT_SIGMA);
    let gx = horizontal_sobel(&smooth);
    let gy = vertical_sobel(&smooth);

    let min_radius = params.min_radius as f64;
    let max_radius = if params.max_radius == 0 {
        width.max(height) as f64
    } else {
        params.max_radius as f64
    };

    let idp = 1.0 / params.dp;
    let acc_w = (width as f64 * idp).ceil() as usize + 2;
    let acc_h = (height as f64 * idp).ceil() as usize + 2;
    let mut acc = vec![0u32; acc_w * acc_h];
    let mut points = Vec::new();

    for (x, y, px) in edges.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }
        let vx = gx.get_pixel(x, y)[0] as f64;
        let vy = gy.get_pixel(x, y)[0] as f64;
        let mag = vx.hypot(vy);
        if mag == 0.0 {
            continue;
        }
        points.push((x as f64, y as f64));

        let (ux, uy) = (vx / mag, vy / mag);
        for sign in [1.0, -1.0] {
            let mut r = min_radius;
            while r <= max_radius {
                let cx = (x as f64 + sign * ux * r) * idp;
                let cy = (y as f64 + sign * uy * r) * idp;
                if cx < 0.0 || cy < 0.0 || cx >= acc_w as f64 || cy >= acc_h as f64 {
                    break;
                }
                acc[cy as usize * acc_w + cx as usize] += 1;
                r += 1.0;
            }
        }
    }

    if points.is_empty() {
        return Vec::new();
    }

    let threshold = params.accumulator_threshold;
    let mut centers = Vec::new();
    for y in 1..acc_h - 1 {
        for x in 1..acc_w - 1 {
            let idx = y * acc_w + x;
            let v = acc[idx];
            if v > threshold
                && v > acc[idx - 1]
                && v >= acc[idx + 1]
                && v > acc[idx - acc_w]
                && v >= acc[idx + acc_w]
            {
                centers.push((x, y, v));
            }
        }
    }
    centers.sort_by(|a, b| b.2.cmp(&a.2));
    trace!(edges = points.len(), centers = centers.len(), "hough accumulator");
    if centers.is_empty() {
        return Vec::new();
    }

    let grid = EdgeGrid::new(&points, width, height);
    let distances = euclidean_squared_distance_transform(&edges);
    let min_dist2 = params.min_distance * params.min_distance;
    let crowded = |circles: &[Estimate], cx: f64, cy: f64| {
        circles.iter().any(|&(ox, oy, _)| {
            let (dx, dy) = (ox - cx, oy - cy);
            dx * dx + dy * dy < min_dist2
        })
    };

    let bins = max_radius.floor() as usize + RADIUS_WINDOW + 1;
    let mut hist = vec![0u32; bins];
    let mut sums = vec![0.0f64; bins];
    let mut circles: Vec<Estimate> = Vec::new();

    for (ax, ay, _votes) in centers {
        let (cx, cy) = refine_center(&acc, acc_w, ax, ay, params.dp);
        if crowded(&circles, cx, cy) {
            continue;
        }

        let nearby = grid.within(cx, cy, max_radius);
        hist.fill(0);
        sums.fill(0.0);
        for &(_, _, d) in &nearby {
            if d >= min_radius {
                let bin = d.floor() as usize;
                hist[bin] += 1;
                sums[bin] += d;
            }
        }
        let Some(radius) = best_radius(&hist, &sums, threshold) else {
            continue;
        };

        let (x, y, r) = refine_circle(&nearby, (cx, cy, radius), max_radius);
        if r < min_radius || r > max_radius || crowded(&circles, x, y) {
            continue;
        }
        let covered = coverage(&distances, (x, y, r));
        if covered < params.min_coverage {
            trace!(x, y, r, covered, "candidate rejected");
            continue;
        }
        circles.push((x, y, r));
    }

    circles
        .into_iter()
        .map(|(x, y, r)| Circle::new(x.round() as i32, y.round() as i32, r.round() as i32))
        .collect()
}

/// Vote-weighted centroid of the 3x3 accumulator neighbourhood, in pixels
fn refine_center(acc: &[u32], acc_w: usize, ax: usize, ay: usize, dp: f64) -> (f64, f64) {
    let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
    for y in ay - 1..=ay + 1 {
        for x in ax - 1..=ax + 1 {
            let v = acc[y * acc_w + x] as f64;
            sx += (x as f64 + 0.5) * v;
            sy += (y as f64 + 0.5) * v;
            total += v;
        }
    }
    (sx / total * dp, sy / total * dp)
}

/// Edge points bucketed into square cells
struct EdgeGrid {
    cols: usize,
    rows: usize,
    cells: Vec<Vec<(f64, f64)>>,
}

impl EdgeGrid {
    fn new(points: &[(f64, f64)], width: u32, height: u32) -> Self {
        let cols = (width as usize).div_ceil(GRID_CELL);
        let rows = (height as usize).div_ceil(GRID_CELL);
        let mut cells = vec![Vec::new(); cols * rows];
        for &(x, y) in points {
            let (col, row) = (x as usize / GRID_CELL, y as usize / GRID_CELL);
            cells[row * cols + col].push((x, y));
        }
        Self { cols, rows, cells }
    }

    /// Points no farther than `radius` from `(cx, cy)`, with that distance.
    fn within(&self, cx: f64, cy: f64, radius: f64) -> Vec<(f64, f64, f64)> {
        let cell = GRID_CELL as f64;
        let span = |center: f64, count: usize| {
            let lo = ((center - radius) / cell).floor().max(0.0) as usize;
            let hi = (((center + radius) / cell).floor().max(0.0) as usize).min(count - 1);
            lo..=hi
        };

        let mut found = Vec::new();
        for row in span(cy, self.rows) {
            for col in span(cx, self.cols) {
                for &(x, y) in &self.cells[row * self.cols + col] {
                    let d = (x - cx).hypot(y - cy);
                    if d <= radius {
                        found.push((x, y, d));
                    }
                }
            }
        }
        found
    }
}

/// Refit the estimate to the edge points in a shrinking band around it.
/// Stops at the last plausible fit.
fn refine_circle(points: &[(f64, f64, f64)], mut estimate: Estimate, max_radius: f64) -> Estimate {
    for share in FIT_BANDS {
        let (cx, cy, r) = estimate;
        let band = (r * share).max(MIN_FIT_BAND);
        let arc: Vec<(f64, f64)> = points
            .iter()
            .map(|&(x, y, _)| (x, y))
            .filter(|&(x, y)| ((x - cx).hypot(y - cy) - r).abs() <= band)
            .collect();
        if arc.len() < MIN_FIT_POINTS {
            break;
        }
        match fit_circle(&arc) {
            Some(fit) if fit.2 <= max_radius => estimate = fit,
            _ => break,
        }
    }
    estimate
}

/// Algebraic least-squares circle through `points`; `None` when they are
/// (nearly) collinear.
fn fit_circle(points: &[(f64, f64)]) -> Option<Estimate> {
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
    let (mx, my) = (sx / n, sy / n);

    let (mut suu, mut svv, mut suv) = (0.0, 0.0, 0.0);
    let (mut suuu, mut svvv, mut suvv, mut svuu) = (0.0, 0.0, 0.0, 0.0);
    for &(x, y) in points {
        let (u, v) = (x - mx, y - my);
        suu += u * u;
        svv += v * v;
        suv += u * v;
        suuu += u * u * u;
        svvv += v * v * v;
        suvv += u * v * v;
        svuu += v * u * u;
    }

    let det = suu * svv - suv * suv;
    if det <= 1e-9 * (suu * svv).max(1.0) {
        return None;
    }
    let bu = 0.5 * (suuu + suvv);
    let bv = 0.5 * (svvv + svuu);
    let uc = (bu * svv - bv * suv) / det;
    let vc = (bv * suu - bu * suv) / det;
    let r = (uc * uc + vc * vc + (suu + svv) / n).sqrt();

    let fit = (mx + uc, my + vc, r);
    (fit.0.is_finite() && fit.1.is_finite() && r.is_finite()).then_some(fit)
}

/// Share of perimeter samples lying within the inlier distance of an edge.
/// Samples outside the frame count as misses.
fn coverage(distances: &Image<Luma<f64>>, (cx, cy, r): Estimate) -> f64 {
    let tolerance = (r / 25.0).clamp(MIN_INLIER_DISTANCE, MAX_INLIER_DISTANCE);
    let limit = tolerance * tolerance;
    let (width, height) = distances.dimensions();

    let samples = (TAU / SAMPLE_STEP).ceil() as u32;
    let mut inliers = 0u32;
    for i in 0..samples {
        let t = f64::from(i) * SAMPLE_STEP;
        let (x, y) = (cx + r * t.cos(), cy + r * t.sin());
        if x < 0.0 || y < 0.0 || x >= width as f64 || y >= height as f64 {
            continue;
        }
        if distances.get_pixel(x as u32, y as u32)[0] < limit {
            inliers += 1;
        }
    }
    f64::from(inliers) / f64::from(samples)
}

/// Radius whose distance window has the best support per unit radius, if
/// that support exceeds `threshold`. Returns the mean distance in the window.
fn best_radius(hist: &[u32], sums: &[f64], threshold: u32) -> Option<f64> {
    let mut best: Option<(usize, u32)> = None;
    for start in 0..hist.len().saturating_sub(RADIUS_WINDOW - 1) {
        let support: u32 = hist[start..start + RADIUS_WINDOW].iter().sum();
        if support == 0 {
            continue;
        }
        let r_est = (start + 1) as u64;
        let better = match best {
            None => true,
            Some((bs, bsup)) => (support as u64) * (bs as u64 + 1) > (bsup as u64) * r_est,
        };
        if better {
            best = Some((start, support));
        }
    }

    let (start, support) = best?;
    if support <= threshold {
        return None;
    }
    let total: f64 = sums[start..start + RADIUS_WINDOW].iter().sum();
    Some(total / support as f64)
}

/// Index of the largest circle; the first one wins ties.
pub fn select_primary(circles: &[Circle]) -> Option<usize> {
    let mut primary: Option<usize> = None;
    for (idx, circle) in circles.iter().enumerate() {
        if primary.is_none_or(|best| circle.radius > circles[best].radius) {
            primary = Some(idx);
        }
    }
    primary
}
