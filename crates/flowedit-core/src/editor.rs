//! Editor state machine.
//!
//! `EditorState` is an immutable snapshot of everything the editor surface
//! needs: the entity lists, the current draw mode, and any in-progress
//! interaction. Every operation returns a new snapshot instead of mutating
//! the current one, so the surface can keep or discard snapshots freely.

use crate::boundary::{DEFAULT_SNAP_THRESHOLD, find_closest_boundary_point};
use crate::config::{self, ConfigDocument, EntitySet};
use crate::entities::{BoundaryPoint, Door, Line, Region};
use crate::path::{WalkDirection, extract_boundary_path_with};
use kurbo::Point;

/// What a click does on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    /// Clicks add polygon vertices; finishing creates a region.
    #[default]
    Region,
    /// Two clicks create a free-standing line.
    Line,
    /// Two snapped clicks on the same region create a door.
    Door,
}

/// Kinds of entity held by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Region,
    Line,
    Door,
}

impl EntityKind {
    fn id_prefix(self) -> &'static str {
        match self {
            EntityKind::Region => "region",
            EntityKind::Line => "line",
            EntityKind::Door => "door",
        }
    }
}

/// Result of an editor operation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Nothing changed.
    Unchanged,
    /// A vertex was appended to the region being drawn.
    PointAdded,
    /// The first endpoint of a line was placed.
    LineStarted,
    /// The first endpoint of a door was snapped onto a region.
    DoorStarted,
    /// A door click found no perimeter within the snap threshold.
    NoSnapTarget,
    /// The door endpoints were on different regions; no door was created.
    DoorRejected,
    Created { kind: EntityKind, id: String },
    Deleted { kind: EntityKind, id: String },
}

/// Snapshot of the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    mode: DrawMode,
    entities: EntitySet,
    /// Vertices of the region being drawn, or the first endpoint of a line.
    active_points: Vec<Point>,
    /// First endpoint of a door being drawn.
    pending_door: Option<BoundaryPoint>,
    /// Snap target under the pointer in door mode.
    hovered: Option<Point>,
    /// Rubber-band segment in line mode.
    preview_line: Option<(Point, Point)>,
    snap_threshold: f64,
    walk_direction: WalkDirection,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    /// Create an empty editor in region mode.
    pub fn new() -> Self {
        Self {
            mode: DrawMode::default(),
            entities: EntitySet::default(),
            active_points: Vec::new(),
            pending_door: None,
            hovered: None,
            preview_line: None,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            walk_direction: WalkDirection::default(),
        }
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn regions(&self) -> &[Region] {
        &self.entities.regions
    }

    pub fn lines(&self) -> &[Line] {
        &self.entities.lines
    }

    pub fn doors(&self) -> &[Door] {
        &self.entities.doors
    }

    pub fn active_points(&self) -> &[Point] {
        &self.active_points
    }

    pub fn pending_door(&self) -> Option<&BoundaryPoint> {
        self.pending_door.as_ref()
    }

    pub fn hovered_point(&self) -> Option<Point> {
        self.hovered
    }

    pub fn preview_line(&self) -> Option<(Point, Point)> {
        self.preview_line
    }

    pub fn snap_threshold(&self) -> f64 {
        self.snap_threshold
    }

    /// Whether `finish_drawing` would create a region.
    pub fn can_finish_drawing(&self) -> bool {
        self.mode == DrawMode::Region && self.active_points.len() >= Region::MIN_POINTS
    }

    /// Use a different snap threshold for door placement.
    pub fn with_snap_threshold(&self, threshold: f64) -> Self {
        Self {
            snap_threshold: threshold,
            ..self.clone()
        }
    }

    /// Use a different perimeter walk for new doors.
    pub fn with_walk_direction(&self, direction: WalkDirection) -> Self {
        Self {
            walk_direction: direction,
            ..self.clone()
        }
    }

    /// Switch draw mode, abandoning any in-progress interaction.
    pub fn with_mode(&self, mode: DrawMode) -> Self {
        Self {
            mode,
            ..self.cleared_interaction()
        }
    }

    fn cleared_interaction(&self) -> Self {
        Self {
            active_points: Vec::new(),
            pending_door: None,
            hovered: None,
            preview_line: None,
            ..self.clone()
        }
    }

    /// Handle a click at canvas coordinates.
    pub fn click(&self, point: Point) -> (Self, EditOutcome) {
        match self.mode {
            DrawMode::Region => {
                let mut next = self.clone();
                next.active_points.push(point);
                (next, EditOutcome::PointAdded)
            }
            DrawMode::Line => self.click_line(point),
            DrawMode::Door => self.click_door(point),
        }
    }

    fn click_line(&self, point: Point) -> (Self, EditOutcome) {
        let Some(&start) = self.active_points.first() else {
            let mut next = self.clone();
            next.active_points = vec![point];
            return (next, EditOutcome::LineStarted);
        };

        let mut next = self.cleared_interaction();
        let id = next.next_id(EntityKind::Line);
        next.entities.lines.push(Line::new(id.clone(), start, point));
        (next, EditOutcome::Created { kind: EntityKind::Line, id })
    }

    fn click_door(&self, point: Point) -> (Self, EditOutcome) {
        let Some(snapped) = find_closest_boundary_point(point, &self.entities.regions, self.snap_threshold) else {
            return (self.clone(), EditOutcome::NoSnapTarget);
        };

        let Some(start) = self.pending_door.clone() else {
            let mut next = self.clone();
            next.pending_door = Some(snapped);
            return (next, EditOutcome::DoorStarted);
        };

        let mut next = self.clone();
        next.pending_door = None;

        let region = match start.resolve(&self.entities.regions) {
            Some(region) if start.same_region(&snapped) => region,
            _ => {
                log::debug!(
                    "Discarding door from {} to {}: endpoints are on different regions",
                    start.region_id,
                    snapped.region_id
                );
                return (next, EditOutcome::DoorRejected);
            }
        };

        let path_points = extract_boundary_path_with(&start, &snapped, region, self.walk_direction);
        let id = next.next_id(EntityKind::Door);
        match Door::attached(id.clone(), start, snapped, path_points) {
            Some(door) => {
                next.entities.doors.push(door);
                (next, EditOutcome::Created { kind: EntityKind::Door, id })
            }
            None => (next, EditOutcome::DoorRejected),
        }
    }

    /// Track the pointer for hover and preview feedback.
    pub fn pointer_moved(&self, point: Point) -> Self {
        match self.mode {
            DrawMode::Door => Self {
                hovered: find_closest_boundary_point(point, &self.entities.regions, self.snap_threshold)
                    .map(|hit| hit.point),
                ..self.clone()
            },
            DrawMode::Line => Self {
                preview_line: self.active_points.first().map(|&start| (start, point)),
                ..self.clone()
            },
            DrawMode::Region => self.clone(),
        }
    }

    /// Close the polygon being drawn into a new region.
    ///
    /// Does nothing unless in region mode with at least three vertices.
    pub fn finish_drawing(&self) -> (Self, EditOutcome) {
        if !self.can_finish_drawing() {
            return (self.clone(), EditOutcome::Unchanged);
        }

        let mut next = self.cleared_interaction();
        let id = next.next_id(EntityKind::Region);
        next.entities
            .regions
            .push(Region::new(id.clone(), self.active_points.clone()));
        (next, EditOutcome::Created { kind: EntityKind::Region, id })
    }

    /// Delete the entity at `index` in its list.
    pub fn delete(&self, kind: EntityKind, index: usize) -> (Self, EditOutcome) {
        let mut next = self.clone();
        let id = match kind {
            EntityKind::Region if index < next.entities.regions.len() => {
                // Region positions shift, so a half-placed door can no longer be trusted.
                next.pending_door = None;
                next.hovered = None;
                next.entities.regions.remove(index).id
            }
            EntityKind::Line if index < next.entities.lines.len() => next.entities.lines.remove(index).id,
            EntityKind::Door if index < next.entities.doors.len() => next.entities.doors.remove(index).id,
            _ => return (next, EditOutcome::Unchanged),
        };
        (next, EditOutcome::Deleted { kind, id })
    }

    /// Serialize all entities.
    pub fn to_config(&self) -> ConfigDocument {
        config::serialize(&self.entities)
    }

    /// Replace all entities with those from a configuration.
    pub fn with_config(&self, document: &ConfigDocument) -> Self {
        Self {
            entities: config::deserialize(document),
            ..self.cleared_interaction()
        }
    }

    /// Next unused id of the form `<kind>_<n>`.
    fn next_id(&self, kind: EntityKind) -> String {
        let ids: Vec<&str> = match kind {
            EntityKind::Region => self.entities.regions.iter().map(|r| r.id.as_str()).collect(),
            EntityKind::Line => self.entities.lines.iter().map(|l| l.id.as_str()).collect(),
            EntityKind::Door => self.entities.doors.iter().map(|d| d.id.as_str()).collect(),
        };
        (ids.len() + 1..)
            .map(|n| format!("{}_{}", kind.id_prefix(), n))
            .find(|candidate| !ids.contains(&candidate.as_str()))
            .unwrap_or_default()
    }
}
