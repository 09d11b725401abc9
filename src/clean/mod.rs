//! Via clearance cleaning
//!
//! Decides which candidate vias violate clearance rules against a read-only
//! snapshot of the board. A uniform grid narrows the net-collision candidates,
//! an R-tree narrows footprint containment, and Rayon evaluates vias in
//! parallel.
//!
//! # Submodules
//! - `types` - Verdicts, thresholds, rule toggles, engine-local entities, report
//! - `distance` - Point distance and containment primitives
//! - `grid` - Uniform grid spatial index
//! - `snapshot` - Snapshot construction, bounds strategy, obstacle index
//! - `checks` - Per-via rule evaluation
//! - `runners` - Batch entry points

mod checks;
mod distance;
mod grid;
mod runners;
mod snapshot;
mod types;

pub use types::{
    ClearanceThresholds, CleanError, CleanReport, Obstacle, ObstacleShape, OutlineShape, Polygon,
    RemovedVia, RuleSet, SnapshotWarning, Via, Violation, ViolationCounts, Zone,
};

pub use distance::{
    distance_point_to_arc, distance_point_to_circle, distance_point_to_polygon,
    distance_point_to_segment, distance_sq_point_to_segment, point_in_bounding_box,
    point_in_polygon_by_ray_cast,
};

pub use grid::{GridEntry, GridIndex, DEFAULT_CELL_SIZE};

pub use snapshot::{
    resolve_arc_angles, BoardSnapshot, BoundsStrategy, CandidateSelection, ObstacleIndex,
};

pub use checks::evaluate;

pub use runners::{classify, run_clean, CancelFlag};
