//! Snapping free points onto region perimeters.

use crate::entities::{BoundaryPoint, Region};
use crate::geometry::{SegmentProjection, polygon_edges, project_point_onto_segment};
use kurbo::Point;

/// Distance threshold for perimeter snapping (in canvas units).
pub const DEFAULT_SNAP_THRESHOLD: f64 = 10.0;

/// Find the point on any region's perimeter closest to `query`.
///
/// Every edge of every region is considered, polygons being implicitly
/// closed. The nearest match is returned only when its distance is strictly
/// below `threshold`. On ties the first edge in region order, then perimeter
/// order, wins.
pub fn find_closest_boundary_point(query: Point, regions: &[Region], threshold: f64) -> Option<BoundaryPoint> {
    let mut best: Option<(SegmentProjection, usize, usize)> = None;

    for (region_index, region) in regions.iter().enumerate() {
        for (segment_index, a, b) in polygon_edges(&region.points) {
            let projection = project_point_onto_segment(query, a, b);
            let closer = match &best {
                Some((current, _, _)) => projection.distance < current.distance,
                None => true,
            };
            if closer {
                best = Some((projection, region_index, segment_index));
            }
        }
    }

    let (projection, region_index, segment_index) = best?;
    if projection.distance >= threshold {
        log::debug!(
            "No snap target near ({}, {}): nearest edge is {:.2} away",
            query.x,
            query.y,
            projection.distance
        );
        return None;
    }

    Some(BoundaryPoint {
        point: projection.point,
        region_index,
        segment_index,
        region_id: regions[region_index].id.clone(),
    })
}
