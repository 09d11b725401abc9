//! Per-via clearance rules
//!
//! Each rule is a pure function of one via and the shared snapshot. The rules
//! run in a fixed priority order and the first violation wins.

use super::distance::{
    distance_point_to_arc, distance_point_to_polygon, distance_sq, distance_sq_point_to_segment,
};
use super::snapshot::{BoardSnapshot, ObstacleIndex};
use super::types::{ClearanceThresholds, Obstacle, ObstacleShape, RuleSet, Via, Violation};

/// Classify one via; `None` means the via is kept
///
/// Order: outside board, component, other net, board edge, zone.
pub fn evaluate(
    via: &Via,
    snapshot: &BoardSnapshot,
    index: &ObstacleIndex,
    thresholds: &ClearanceThresholds,
    rules: &RuleSet,
) -> Option<Violation> {
    if rules.check_outside_board && is_outside_board(via, snapshot) {
        return Some(Violation::OutsideBoard);
    }
    if rules.check_components && hits_component(via, snapshot) {
        return Some(Violation::ComponentCollision);
    }
    if rules.check_nets && hits_other_net(via, snapshot, index, thresholds.min_clearance) {
        return Some(Violation::NetCollision);
    }
    if rules.check_board_edge && hits_board_edge(via, snapshot, thresholds.board_edge_clearance) {
        return Some(Violation::BoardEdgeCollision);
    }
    if rules.check_zones && hits_zone(via, snapshot, thresholds.zone_clearance) {
        return Some(Violation::ZoneCollision);
    }
    None
}

/// Outside the board per the snapshot's bounds strategy; false when unknown
pub fn is_outside_board(via: &Via, snapshot: &BoardSnapshot) -> bool {
    snapshot.bounds.is_outside(via.position).unwrap_or(false)
}

/// Via center inside any footprint bounding box
pub fn hits_component(via: &Via, snapshot: &BoardSnapshot) -> bool {
    snapshot.footprints.containing(via.position).is_some()
}

/// Too close to copper of another net
pub fn hits_other_net(
    via: &Via,
    snapshot: &BoardSnapshot,
    index: &ObstacleIndex,
    min_clearance: f64,
) -> bool {
    let via_radius = via.radius();
    let search_radius = min_clearance + via_radius * 2.0;

    index
        .candidates_near(via.position, search_radius)
        .filter_map(|i| snapshot.obstacles.get(i))
        .filter(|obstacle| should_check_pair(via, obstacle))
        .any(|obstacle| obstacle_collides(via, obstacle, min_clearance))
}

/// Skip same-net copper and the via itself
pub fn should_check_pair(via: &Via, obstacle: &Obstacle) -> bool {
    if obstacle.net == via.net {
        return false;
    }
    !matches!(obstacle.shape, ObstacleShape::Via { id, .. } if id == via.id)
}

/// Exact clearance test between a via and one obstacle
pub fn obstacle_collides(via: &Via, obstacle: &Obstacle, min_clearance: f64) -> bool {
    let needed = min_clearance + via.radius() + obstacle.half_width();
    let p = via.position;

    match &obstacle.shape {
        ObstacleShape::Via { position, .. } => distance_sq(p, *position) < needed * needed,
        ObstacleShape::Segment { start, end, .. } => {
            distance_sq_point_to_segment(p, *start, *end) < needed * needed
        }
        ObstacleShape::Arc {
            center,
            radius,
            start_deg,
            sweep_deg,
            ..
        } => distance_point_to_arc(p, *center, *radius, *start_deg, *sweep_deg) < needed,
    }
}

/// Closer to any outline element than the edge clearance
pub fn hits_board_edge(via: &Via, snapshot: &BoardSnapshot, edge_clearance: f64) -> bool {
    let needed = edge_clearance + via.radius();
    snapshot
        .outline
        .iter()
        .any(|shape| shape.distance_to(via.position) < needed)
}

/// Closer to a zone of another net than the zone clearance
pub fn hits_zone(via: &Via, snapshot: &BoardSnapshot, zone_clearance: f64) -> bool {
    let needed = zone_clearance + via.radius();
    snapshot
        .zones
        .iter()
        .filter(|zone| zone.net != via.net)
        .any(|zone| distance_point_to_polygon(via.position, &zone.polygon) < needed)
}
