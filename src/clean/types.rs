//! Via cleaning data types
//!
//! Engine-local copies of board entities, rule configuration, verdicts and
//! the batch report.

use crate::board::{from_mm, BoundingBox, NetCode, Point, ViaData, ViaId};
use crate::settings::ConfigError;
use serde::Serialize;
use std::fmt;

use super::distance::{
    distance_point_to_arc, distance_point_to_circle, distance_point_to_polygon,
    distance_point_to_segment, normalize_degrees, point_in_polygon_by_ray_cast,
};

/// Reason a via is removed, in evaluation priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    OutsideBoard,
    ComponentCollision,
    NetCollision,
    BoardEdgeCollision,
    ZoneCollision,
}

impl Violation {
    pub const ALL: [Violation; 5] = [
        Violation::OutsideBoard,
        Violation::ComponentCollision,
        Violation::NetCollision,
        Violation::BoardEdgeCollision,
        Violation::ZoneCollision,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Violation::OutsideBoard => "outside board",
            Violation::ComponentCollision => "component collision",
            Violation::NetCollision => "different-net clearance",
            Violation::BoardEdgeCollision => "board edge clearance",
            Violation::ZoneCollision => "zone clearance",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Clearance thresholds in nanometers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearanceThresholds {
    /// Minimum clearance to tracks and vias of other nets
    pub min_clearance: f64,
    pub board_edge_clearance: f64,
    pub zone_clearance: f64,
}

impl ClearanceThresholds {
    pub fn from_mm(min_clearance_mm: f64, board_edge_mm: f64, zone_mm: f64) -> Self {
        Self {
            min_clearance: from_mm(min_clearance_mm),
            board_edge_clearance: from_mm(board_edge_mm),
            zone_clearance: from_mm(zone_mm),
        }
    }
}

impl Default for ClearanceThresholds {
    fn default() -> Self {
        Self::from_mm(0.2, 0.3, 0.2)
    }
}

/// Rule toggles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    pub check_components: bool,
    pub check_nets: bool,
    pub check_board_edge: bool,
    pub check_zones: bool,
    pub check_outside_board: bool,
}

impl RuleSet {
    /// Every rule disabled
    pub const fn none() -> Self {
        Self {
            check_components: false,
            check_nets: false,
            check_board_edge: false,
            check_zones: false,
            check_outside_board: false,
        }
    }

    /// Only the rule that produces `violation`
    pub fn only(violation: Violation) -> Self {
        let mut rules = Self::none();
        match violation {
            Violation::OutsideBoard => rules.check_outside_board = true,
            Violation::ComponentCollision => rules.check_components = true,
            Violation::NetCollision => rules.check_nets = true,
            Violation::BoardEdgeCollision => rules.check_board_edge = true,
            Violation::ZoneCollision => rules.check_zones = true,
        }
        rules
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            check_components: true,
            check_nets: true,
            check_board_edge: true,
            check_zones: true,
            check_outside_board: true,
        }
    }
}

/// Candidate via
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Via {
    pub id: ViaId,
    pub position: Point,
    pub net: NetCode,
    pub diameter: i64,
    pub drill: i64,
}

impl Via {
    pub fn radius(&self) -> f64 {
        self.diameter as f64 / 2.0
    }
}

impl From<&ViaData> for Via {
    fn from(v: &ViaData) -> Self {
        Self {
            id: v.id,
            position: v.position,
            net: v.net,
            diameter: v.diameter,
            drill: v.drill,
        }
    }
}

/// Copper item another net's via must keep clear of
#[derive(Clone, Debug, PartialEq)]
pub enum ObstacleShape {
    Segment {
        start: Point,
        end: Point,
        width: i64,
    },
    Arc {
        center: Point,
        radius: f64,
        start_deg: f64,
        sweep_deg: f64,
        width: i64,
    },
    Via {
        id: ViaId,
        position: Point,
        diameter: i64,
    },
}

/// Obstacle tagged with its net
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub net: NetCode,
    pub shape: ObstacleShape,
}

impl Obstacle {
    /// Half the copper width (or the radius for vias)
    pub fn half_width(&self) -> f64 {
        match &self.shape {
            ObstacleShape::Segment { width, .. } | ObstacleShape::Arc { width, .. } => {
                *width as f64 / 2.0
            }
            ObstacleShape::Via { diameter, .. } => *diameter as f64 / 2.0,
        }
    }

    /// Box covering all copper of this obstacle
    pub fn reach_box(&self) -> BoundingBox {
        let half = self.half_width().ceil() as i64;
        match &self.shape {
            ObstacleShape::Segment { start, end, .. } => {
                BoundingBox::new(*start, *end).inflated(half)
            }
            ObstacleShape::Arc {
                center,
                radius,
                start_deg,
                sweep_deg,
                ..
            } => arc_extent(*center, *radius, *start_deg, *sweep_deg).inflated(half),
            ObstacleShape::Via { position, .. } => {
                BoundingBox::new(*position, *position).inflated(half)
            }
        }
    }
}

/// Bounding box of the swept part of an arc
///
/// Covers both endpoints and every axis extreme (0, 90, 180, 270 degrees)
/// inside the sweep. Sweep conventions match `distance_point_to_arc`.
pub fn arc_extent(center: Point, radius: f64, start_deg: f64, sweep_deg: f64) -> BoundingBox {
    let (start, sweep) = if sweep_deg.abs() >= 360.0 {
        (0.0, 360.0)
    } else if sweep_deg < 0.0 {
        (normalize_degrees(start_deg + sweep_deg), -sweep_deg)
    } else {
        (normalize_degrees(start_deg), sweep_deg)
    };

    let at = |deg: f64| {
        let rad = deg.to_radians();
        (
            center.x as f64 + radius * rad.cos(),
            center.y as f64 + radius * rad.sin(),
        )
    };
    let mut points = vec![at(start), at(start + sweep)];
    for quadrant in [0.0, 90.0, 180.0, 270.0] {
        if normalize_degrees(quadrant - start) <= sweep {
            points.push(at(quadrant));
        }
    }

    let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    BoundingBox::new(
        Point::new(min_x.floor() as i64, min_y.floor() as i64),
        Point::new(max_x.ceil() as i64, max_y.ceil() as i64),
    )
}

/// Simple polygon with optional holes, rings implicitly closed
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(outer: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self { outer, holes }
    }

    /// Needs at least three vertices on the outer ring
    pub fn is_degenerate(&self) -> bool {
        self.outer.len() < 3
    }

    /// All ring edges, outer ring first
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        std::iter::once(&self.outer)
            .chain(self.holes.iter())
            .filter(|ring| !ring.is_empty())
            .flat_map(|ring| {
                let n = ring.len();
                (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
            })
    }

    /// Even-odd containment across the outer ring and holes
    pub fn contains(&self, p: Point) -> bool {
        point_in_polygon_by_ray_cast(p, self.edges())
    }
}

/// Board outline element with its distance function
#[derive(Clone, Debug, PartialEq)]
pub enum OutlineShape {
    Segment {
        start: Point,
        end: Point,
    },
    Arc {
        center: Point,
        radius: f64,
        start_deg: f64,
        sweep_deg: f64,
    },
    Circle {
        center: Point,
        radius: f64,
    },
    Polygon(Polygon),
}

impl OutlineShape {
    pub fn distance_to(&self, p: Point) -> f64 {
        match self {
            OutlineShape::Segment { start, end } => distance_point_to_segment(p, *start, *end),
            OutlineShape::Arc {
                center,
                radius,
                start_deg,
                sweep_deg,
            } => distance_point_to_arc(p, *center, *radius, *start_deg, *sweep_deg),
            OutlineShape::Circle { center, radius } => distance_point_to_circle(p, *center, *radius),
            OutlineShape::Polygon(poly) => distance_point_to_polygon(p, poly),
        }
    }
}

/// Copper zone of one net
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    pub name: String,
    pub net: NetCode,
    pub polygon: Polygon,
}

/// Non-fatal condition found while building a snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotWarning {
    /// Neither board bounds nor outline segments exist
    OutsideBoardDisabled,
    /// Outline or zone shapes that cannot be measured were ignored
    ShapesSkipped { count: usize },
}

impl fmt::Display for SnapshotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotWarning::OutsideBoardDisabled => f.write_str(
                "board outline could not be determined; outside-board check is disabled",
            ),
            SnapshotWarning::ShapesSkipped { count } => {
                write!(f, "{count} unsupported outline or zone shapes were skipped")
            }
        }
    }
}

/// Per-category removal counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ViolationCounts {
    pub outside_board: usize,
    pub component_collision: usize,
    pub net_collision: usize,
    pub board_edge_collision: usize,
    pub zone_collision: usize,
}

impl ViolationCounts {
    pub fn record(&mut self, violation: Violation) {
        *self.slot(violation) += 1;
    }

    pub fn get(&self, violation: Violation) -> usize {
        match violation {
            Violation::OutsideBoard => self.outside_board,
            Violation::ComponentCollision => self.component_collision,
            Violation::NetCollision => self.net_collision,
            Violation::BoardEdgeCollision => self.board_edge_collision,
            Violation::ZoneCollision => self.zone_collision,
        }
    }

    pub fn total(&self) -> usize {
        Violation::ALL.iter().map(|v| self.get(*v)).sum()
    }

    fn slot(&mut self, violation: Violation) -> &mut usize {
        match violation {
            Violation::OutsideBoard => &mut self.outside_board,
            Violation::ComponentCollision => &mut self.component_collision,
            Violation::NetCollision => &mut self.net_collision,
            Violation::BoardEdgeCollision => &mut self.board_edge_collision,
            Violation::ZoneCollision => &mut self.zone_collision,
        }
    }
}

/// A via selected for removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RemovedVia {
    pub id: ViaId,
    pub reason: Violation,
}

/// Outcome of one batch
#[derive(Clone, Debug, Default, Serialize)]
pub struct CleanReport {
    /// Vias to remove, ordered by id
    pub removals: Vec<RemovedVia>,
    pub counts: ViolationCounts,
    pub checked: usize,
    pub kept: usize,
    pub warnings: Vec<SnapshotWarning>,
    pub elapsed_ms: f64,
}

impl CleanReport {
    pub fn removed_ids(&self) -> Vec<ViaId> {
        self.removals.iter().map(|r| r.id).collect()
    }

    /// One-line summary for the user
    pub fn summary(&self) -> String {
        let secs = self.elapsed_ms / 1000.0;
        if self.removals.is_empty() {
            return format!("No vias to remove. Time: {secs:.2} s");
        }
        if self.counts.outside_board > 0 {
            format!(
                "Removed {} vias (outside board: {}). Time: {secs:.2} s",
                self.removals.len(),
                self.counts.outside_board
            )
        } else {
            format!("Removed {} vias. Time: {secs:.2} s", self.removals.len())
        }
    }
}

/// Batch failure
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("via cleaning was cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(min: (i64, i64), max: (i64, i64)) -> BoundingBox {
        BoundingBox::new(Point::new(min.0, min.1), Point::new(max.0, max.1))
    }

    #[test]
    fn test_arc_extent_covers_only_the_sweep() {
        let c = Point::new(0, 0);
        assert_eq!(arc_extent(c, 1000.0, 0.0, 90.0), bb((0, 0), (1000, 1000)));
        // Same arc described clockwise from its end
        assert_eq!(arc_extent(c, 1000.0, 90.0, -90.0), bb((0, 0), (1000, 1000)));
        assert_eq!(arc_extent(c, 1000.0, 0.0, 360.0), bb((-1000, -1000), (1000, 1000)));

        // Crosses 0 degrees, so it reaches x = r
        let wrap = arc_extent(c, 1000.0, 315.0, 90.0);
        assert_eq!(wrap, bb((707, -708), (1000, 708)));
    }

    #[test]
    fn test_arc_reach_box_adds_half_width() {
        let arc = Obstacle {
            net: 1,
            shape: ObstacleShape::Arc {
                center: Point::new(5000, 5000),
                radius: 1000.0,
                start_deg: 0.0,
                sweep_deg: 90.0,
                width: 200,
            },
        };
        assert_eq!(arc.reach_box(), bb((4900, 4900), (6100, 6100)));
    }

    #[test]
    fn test_violation_order_is_priority_order() {
        let mut sorted = Violation::ALL;
        sorted.sort();
        assert_eq!(sorted, Violation::ALL);
    }

    #[test]
    fn test_counts_record_and_total() {
        let mut counts = ViolationCounts::default();
        counts.record(Violation::NetCollision);
        counts.record(Violation::NetCollision);
        counts.record(Violation::OutsideBoard);
        assert_eq!(counts.get(Violation::NetCollision), 2);
        assert_eq!(counts.get(Violation::ZoneCollision), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_rule_set_only() {
        let rules = RuleSet::only(Violation::ZoneCollision);
        assert!(rules.check_zones);
        assert!(!rules.check_nets && !rules.check_components);
        assert!(!rules.check_board_edge && !rules.check_outside_board);
    }

    #[test]
    fn test_reach_box_covers_width() {
        let obstacle = Obstacle {
            net: 1,
            shape: ObstacleShape::Segment {
                start: Point::new(0, 0),
                end: Point::new(1000, 0),
                width: 201,
            },
        };
        let bb = obstacle.reach_box();
        assert_eq!(bb.min, Point::new(-101, -101));
        assert_eq!(bb.max, Point::new(1101, 101));
    }

    #[test]
    fn test_summary_messages() {
        let mut report = CleanReport {
            elapsed_ms: 1250.0,
            ..Default::default()
        };
        assert_eq!(report.summary(), "No vias to remove. Time: 1.25 s");

        report.removals.push(RemovedVia {
            id: ViaId(7),
            reason: Violation::OutsideBoard,
        });
        report.counts.record(Violation::OutsideBoard);
        assert_eq!(report.summary(), "Removed 1 vias (outside board: 1). Time: 1.25 s");
    }
}
