//! Regions, lines, doors, and snapped boundary points.

use kurbo::Point;

/// A simple closed polygon.
///
/// Points are ordered around the perimeter; the closing edge from the last
/// point back to the first is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub points: Vec<Point>,
}

impl Region {
    /// Minimum number of vertices for a region created in the editor.
    pub const MIN_POINTS: usize = 3;

    pub fn new(id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }
}

/// A free-standing segment, unrelated to any region.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: String,
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(id: impl Into<String>, start: Point, end: Point) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }
}

/// A point snapped onto a specific edge of a specific region.
///
/// The region is referenced by position and id rather than by pointer: use
/// [`BoundaryPoint::resolve`] to look it up, which fails once the region has
/// been deleted or moved.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPoint {
    pub point: Point,
    pub region_index: usize,
    pub segment_index: usize,
    pub region_id: String,
}

impl BoundaryPoint {
    /// Look up the owning region, checking that the slot still holds it.
    pub fn resolve<'a>(&self, regions: &'a [Region]) -> Option<&'a Region> {
        regions
            .get(self.region_index)
            .filter(|region| region.id == self.region_id)
    }

    /// Whether both points were snapped onto the same region.
    pub fn same_region(&self, other: &BoundaryPoint) -> bool {
        self.region_index == other.region_index && self.region_id == other.region_id
    }
}

/// A connector following a region's perimeter.
///
/// Doors created in the editor keep their snapped endpoints. Doors loaded
/// from a configuration only carry the walked path.
#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    pub id: String,
    pub start: Option<BoundaryPoint>,
    pub end: Option<BoundaryPoint>,
    /// Full path from start to end, inclusive.
    pub path_points: Vec<Point>,
}

impl Door {
    /// Build a door from two endpoints on the same region.
    ///
    /// Returns `None` when the endpoints belong to different regions.
    pub fn attached(
        id: impl Into<String>,
        start: BoundaryPoint,
        end: BoundaryPoint,
        path_points: Vec<Point>,
    ) -> Option<Self> {
        if !start.same_region(&end) {
            return None;
        }
        Some(Self {
            id: id.into(),
            start: Some(start),
            end: Some(end),
            path_points,
        })
    }

    /// Build a door from a path alone.
    pub fn detached(id: impl Into<String>, path_points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            start: None,
            end: None,
            path_points,
        }
    }

    /// Whether the door still knows which region it belongs to.
    pub fn is_attached(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}
