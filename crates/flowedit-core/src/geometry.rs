//! Point and segment primitives shared by the boundary locator and path extractor.

use kurbo::Point;

/// Result of projecting a point onto a line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Distance from the query point to `point`.
    pub distance: f64,
    /// Closest point on the segment.
    pub point: Point,
    /// Position of `point` along the segment, in `[0, 1]`.
    pub t: f64,
}

/// Project `p` onto the segment `a -> b`.
///
/// The projection is clamped to the segment, so `t` is always in `[0, 1]`.
/// A zero-length segment projects every point onto `a` with `t = 0`.
pub fn project_point_onto_segment(p: Point, a: Point, b: Point) -> SegmentProjection {
    let seg = b - a;
    let len_sq = seg.hypot2();
    let t = if len_sq == 0.0 {
        0.0
    } else {
        ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0)
    };
    let point = a + seg * t;
    SegmentProjection {
        distance: p.distance(point),
        point,
        t,
    }
}

/// Iterate the edges of an implicitly closed polygon.
///
/// Edge `i` runs from `points[i]` to `points[(i + 1) % n]`.
pub fn polygon_edges(points: &[Point]) -> impl Iterator<Item = (usize, Point, Point)> + '_ {
    let n = points.len();
    points
        .iter()
        .enumerate()
        .map(move |(i, &a)| (i, a, points[(i + 1) % n]))
}
