//! Flow Region Editor Core Library
//!
//! Geometry and persistence-mapping engine for authoring flow configurations:
//! polygonal regions, free-standing lines, and doors that follow a region's
//! perimeter between two snapped points.

pub mod boundary;
pub mod config;
pub mod editor;
pub mod entities;
pub mod geometry;
pub mod path;
pub mod storage;

pub use boundary::{DEFAULT_SNAP_THRESHOLD, find_closest_boundary_point};
pub use config::{ConfigDocument, ConfigError, CoordPair, EntitySet, deserialize, serialize};
pub use editor::{DrawMode, EditOutcome, EditorState, EntityKind};
pub use entities::{BoundaryPoint, Door, Line, Region};
pub use geometry::{SegmentProjection, polygon_edges, project_point_onto_segment};
pub use path::{ON_EDGE_EPSILON, WalkDirection, extract_boundary_path, extract_boundary_path_with};
pub use storage::{ConfigStore, FileStore, MemoryStore, StoreError, StoreResult};

pub use kurbo::Point;
