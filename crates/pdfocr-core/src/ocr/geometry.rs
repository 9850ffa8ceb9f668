//! Convex hull and minimum-area rectangle for skew estimation.

use std::cmp::Ordering;

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rotated rectangle of minimum area enclosing a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinAreaRect {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees, always in `[-90, 0)`.
    pub angle: f64,
}

fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull in counter-clockwise order (monotone chain).
///
/// Collinear points are dropped, so a degenerate set yields fewer than three
/// vertices.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Map an edge direction to the `[-90, 0)` convention.
fn normalize_angle(degrees: f64) -> f64 {
    let a = degrees.rem_euclid(90.0);
    // rem_euclid can round up to exactly 90.0 for tiny negative inputs
    let a = if a >= 90.0 { 0.0 } else { a };
    a - 90.0
}

/// Minimum-area enclosing rectangle (rotating calipers over the hull).
///
/// Returns `None` for an empty point set.
pub fn min_area_rect(points: &[Point]) -> Option<MinAreaRect> {
    let hull = convex_hull(points);

    match hull.len() {
        0 => None,
        1 => Some(MinAreaRect {
            center: hull[0],
            width: 0.0,
            height: 0.0,
            angle: -90.0,
        }),
        2 => {
            let (a, b) = (hull[0], hull[1]);
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            Some(MinAreaRect {
                center: Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
                width: (dx * dx + dy * dy).sqrt(),
                height: 0.0,
                angle: normalize_angle(dy.atan2(dx).to_degrees()),
            })
        }
        n => {
            let mut best: Option<(f64, MinAreaRect)> = None;

            for i in 0..n {
                let origin = hull[i];
                let next = hull[(i + 1) % n];
                let (ex, ey) = (next.x - origin.x, next.y - origin.y);
                let len = (ex * ex + ey * ey).sqrt();
                if len < f64::EPSILON {
                    continue;
                }
                let (nx, ny) = (ex / len, ey / len);
                let (px, py) = (-ny, nx);

                let (mut min_n, mut max_n) = (f64::MAX, f64::MIN);
                let (mut min_p, mut max_p) = (f64::MAX, f64::MIN);
                for q in &hull {
                    let (qx, qy) = (q.x - origin.x, q.y - origin.y);
                    let proj_n = nx * qx + ny * qy;
                    let proj_p = px * qx + py * qy;
                    min_n = min_n.min(proj_n);
                    max_n = max_n.max(proj_n);
                    min_p = min_p.min(proj_p);
                    max_p = max_p.max(proj_p);
                }

                let width = max_n - min_n;
                let height = max_p - min_p;
                let area = width * height;

                if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
                    let cn = (min_n + max_n) / 2.0;
                    let cp = (min_p + max_p) / 2.0;
                    best = Some((
                        area,
                        MinAreaRect {
                            center: Point::new(
                                origin.x + cn * nx + cp * px,
                                origin.y + cn * ny + cp * py,
                            ),
                            width,
                            height,
                            angle: normalize_angle(ny.atan2(nx).to_degrees()),
                        },
                    ));
                }
            }

            best.map(|(_, rect)| rect)
        }
    }
}

/// Rotation (degrees) that undoes a skew reported as `angle`.
///
/// Folds the ±90° ambiguity of rectangle angles: below -45 the rectangle is
/// read as standing on its other side.
pub fn deskew_correction(angle: f64) -> f64 {
    if angle < -45.0 {
        -(90.0 + angle)
    } else {
        -angle
    }
}
