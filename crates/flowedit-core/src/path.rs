//! Perimeter paths between two snapped points of the same region.

use crate::entities::{BoundaryPoint, Region};
use crate::geometry::{polygon_edges, project_point_onto_segment};
use kurbo::Point;

/// Maximum distance at which a point counts as lying on an edge.
pub const ON_EDGE_EPSILON: f64 = 0.1;

/// Direction used to walk around the perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkDirection {
    /// Increasing vertex index, wrapping around.
    #[default]
    Forward,
    /// Whichever of the forward and backward walks is shorter.
    /// Ties keep the forward walk.
    Shortest,
}

/// Walk the perimeter of `region` forward from `start` to `end`.
///
/// The result is `[start, <visited vertices>, end]`. When either point is
/// not within [`ON_EDGE_EPSILON`] of an edge, the straight connector
/// `[start, end]` is returned instead.
pub fn extract_boundary_path(start: &BoundaryPoint, end: &BoundaryPoint, region: &Region) -> Vec<Point> {
    extract_boundary_path_with(start, end, region, WalkDirection::Forward)
}

/// Walk the perimeter of `region` from `start` to `end` in the given direction.
pub fn extract_boundary_path_with(
    start: &BoundaryPoint,
    end: &BoundaryPoint,
    region: &Region,
    direction: WalkDirection,
) -> Vec<Point> {
    let points = &region.points;
    let (Some(start_index), Some(end_index)) = (edge_index(start.point, points), edge_index(end.point, points)) else {
        log::debug!("Door endpoints are not on region {}; using a straight connector", region.id);
        return vec![start.point, end.point];
    };

    let forward = walk_forward(start.point, end.point, start_index, end_index, points);
    match direction {
        WalkDirection::Forward => forward,
        WalkDirection::Shortest => {
            let backward = walk_backward(start.point, end.point, start_index, end_index, points);
            if path_length(&backward) < path_length(&forward) {
                backward
            } else {
                forward
            }
        }
    }
}

/// Index of the edge `point` lies on.
///
/// A point on a vertex touches two edges; the later one in perimeter order
/// is reported.
fn edge_index(point: Point, points: &[Point]) -> Option<usize> {
    polygon_edges(points)
        .filter(|&(_, a, b)| project_point_onto_segment(point, a, b).distance < ON_EDGE_EPSILON)
        .map(|(i, _, _)| i)
        .last()
}

fn walk_forward(start: Point, end: Point, start_index: usize, end_index: usize, points: &[Point]) -> Vec<Point> {
    let n = points.len();
    let mut path = vec![start];
    let mut current = start_index;
    while current != end_index {
        current = (current + 1) % n;
        path.push(points[current]);
    }
    path.push(end);
    path
}

fn walk_backward(start: Point, end: Point, start_index: usize, end_index: usize, points: &[Point]) -> Vec<Point> {
    let n = points.len();
    let mut path = vec![start];
    let mut current = start_index;
    while current != end_index {
        path.push(points[current]);
        current = (current + n - 1) % n;
    }
    path.push(end);
    path
}

/// Total length of a polyline.
pub fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}
