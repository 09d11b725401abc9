//! Board snapshot construction
//!
//! Copies the entities the enabled rules need out of a `BoardData` document,
//! resolving shape variants and the outside-board strategy once so the
//! evaluation path never branches on host data quirks.

use crate::board::{
    ArcGeometry, BoardData, BoundingBox, FootprintIndex, OutlineData, Point, TrackData, ViaData,
};
use std::time::Instant;

use super::distance::{point_in_bounding_box, point_in_polygon_by_ray_cast};
use super::grid::GridIndex;
use super::types::{
    Obstacle, ObstacleShape, OutlineShape, Polygon, RuleSet, SnapshotWarning, Via, Zone,
};

/// Which vias of the board are cleaning candidates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CandidateSelection {
    /// Vias flagged as selected in the host
    #[default]
    Selected,
    /// Every via on the board
    All,
}

impl CandidateSelection {
    fn includes(&self, via: &ViaData) -> bool {
        match self {
            CandidateSelection::Selected => via.selected,
            CandidateSelection::All => true,
        }
    }
}

/// How the outside-board rule decides containment, resolved once per snapshot
#[derive(Clone, Debug, PartialEq)]
pub enum BoundsStrategy {
    /// Inclusive containment in the board bounding box
    BoundingBox(BoundingBox),
    /// Even-odd ray cast against the straight outline segments only
    RayCast(Vec<(Point, Point)>),
    /// No usable geometry; the rule is skipped
    Unavailable,
}

impl BoundsStrategy {
    /// Whether `p` lies outside the board, `None` when undecidable
    pub fn is_outside(&self, p: Point) -> Option<bool> {
        match self {
            BoundsStrategy::BoundingBox(bb) => Some(!point_in_bounding_box(p, bb)),
            BoundsStrategy::RayCast(edges) => {
                Some(!point_in_polygon_by_ray_cast(p, edges.iter().copied()))
            }
            BoundsStrategy::Unavailable => None,
        }
    }
}

/// Read-only copy of the board geometry for one batch
#[derive(Clone, Debug)]
pub struct BoardSnapshot {
    pub candidates: Vec<Via>,
    /// Tracks, arcs and vias of every net (candidates included)
    pub obstacles: Vec<Obstacle>,
    pub footprints: FootprintIndex,
    pub zones: Vec<Zone>,
    pub outline: Vec<OutlineShape>,
    pub bounds: BoundsStrategy,
    pub warnings: Vec<SnapshotWarning>,
    pub skipped_shapes: usize,
}

impl BoardSnapshot {
    /// Gather everything the enabled rules need from `board`
    pub fn build(board: &BoardData, rules: &RuleSet, selection: CandidateSelection) -> Self {
        let start = Instant::now();
        let mut skipped_shapes = 0;

        let candidates: Vec<Via> = board
            .vias
            .iter()
            .filter(|v| selection.includes(v))
            .map(Via::from)
            .collect();

        let obstacles = if rules.check_nets {
            collect_obstacles(board)
        } else {
            Vec::new()
        };

        let footprints = if rules.check_components {
            FootprintIndex::build(&board.footprints)
        } else {
            FootprintIndex::default()
        };

        let zones = if rules.check_zones {
            collect_zones(board, &mut skipped_shapes)
        } else {
            Vec::new()
        };

        let outline = if rules.check_board_edge || rules.check_outside_board {
            collect_outline(&board.outline, &mut skipped_shapes)
        } else {
            Vec::new()
        };

        let bounds = if rules.check_outside_board {
            resolve_bounds(board, &outline)
        } else {
            BoundsStrategy::Unavailable
        };

        let mut warnings = Vec::new();
        if rules.check_outside_board && bounds == BoundsStrategy::Unavailable {
            warnings.push(SnapshotWarning::OutsideBoardDisabled);
        }
        if skipped_shapes > 0 {
            warnings.push(SnapshotWarning::ShapesSkipped {
                count: skipped_shapes,
            });
        }
        for warning in &warnings {
            log::warn!("{}", warning);
        }

        log::debug!(
            "Snapshot built in {:?}: {} candidates, {} obstacles, {} footprints, {} zones, {} outline shapes, bounds {}",
            start.elapsed(),
            candidates.len(),
            obstacles.len(),
            footprints.len(),
            zones.len(),
            outline.len(),
            match &bounds {
                BoundsStrategy::BoundingBox(_) => "bbox",
                BoundsStrategy::RayCast(_) => "ray-cast",
                BoundsStrategy::Unavailable => "unavailable",
            }
        );

        Self {
            candidates,
            obstacles,
            footprints,
            zones,
            outline,
            bounds,
            warnings,
            skipped_shapes,
        }
    }
}

/// Start angle and sweep in degrees for either arc encoding
///
/// From endpoints the sweep runs counter-clockwise from start to end; a
/// non-positive difference wraps by a full turn.
pub fn resolve_arc_angles(center: Point, geometry: &ArcGeometry) -> (f64, f64) {
    match *geometry {
        ArcGeometry::Angles {
            start_angle_deg,
            sweep_deg,
        } => (start_angle_deg, sweep_deg),
        ArcGeometry::Endpoints { start, end } => {
            let angle_of = |p: Point| {
                (p.y as f64 - center.y as f64)
                    .atan2(p.x as f64 - center.x as f64)
                    .to_degrees()
            };
            let start_angle = angle_of(start);
            let mut sweep = angle_of(end) - start_angle;
            if sweep <= 0.0 {
                sweep += 360.0;
            }
            (start_angle, sweep)
        }
    }
}

fn collect_obstacles(board: &BoardData) -> Vec<Obstacle> {
    let tracks = board.tracks.iter().map(|track| match track {
        TrackData::Segment {
            start,
            end,
            width,
            net,
            ..
        } => Obstacle {
            net: *net,
            shape: ObstacleShape::Segment {
                start: *start,
                end: *end,
                width: *width,
            },
        },
        TrackData::Arc {
            center,
            radius,
            geometry,
            width,
            net,
            ..
        } => {
            let (start_deg, sweep_deg) = resolve_arc_angles(*center, geometry);
            Obstacle {
                net: *net,
                shape: ObstacleShape::Arc {
                    center: *center,
                    radius: *radius as f64,
                    start_deg,
                    sweep_deg,
                    width: *width,
                },
            }
        }
    });

    let vias = board.vias.iter().map(|via| Obstacle {
        net: via.net,
        shape: ObstacleShape::Via {
            id: via.id,
            position: via.position,
            diameter: via.diameter,
        },
    });

    tracks.chain(vias).collect()
}

fn collect_zones(board: &BoardData, skipped: &mut usize) -> Vec<Zone> {
    let mut zones = Vec::with_capacity(board.zones.len());
    for zone in &board.zones {
        let polygon = Polygon::new(zone.outline.clone(), zone.holes.clone());
        if polygon.is_degenerate() {
            log::debug!("Skipping zone '{}' with {} vertices", zone.name, zone.outline.len());
            *skipped += 1;
            continue;
        }
        zones.push(Zone {
            name: zone.name.clone(),
            net: zone.net,
            polygon,
        });
    }
    zones
}

fn collect_outline(outline: &[OutlineData], skipped: &mut usize) -> Vec<OutlineShape> {
    let mut shapes = Vec::with_capacity(outline.len());
    for item in outline {
        let shape = match item {
            OutlineData::Segment { start, end } => OutlineShape::Segment {
                start: *start,
                end: *end,
            },
            OutlineData::Arc {
                center,
                radius,
                geometry,
            } => {
                let (start_deg, sweep_deg) = resolve_arc_angles(*center, geometry);
                OutlineShape::Arc {
                    center: *center,
                    radius: *radius as f64,
                    start_deg,
                    sweep_deg,
                }
            }
            OutlineData::Circle { center, radius } => OutlineShape::Circle {
                center: *center,
                radius: *radius as f64,
            },
            OutlineData::Polygon { points, holes } => {
                let polygon = Polygon::new(points.clone(), holes.clone());
                if polygon.is_degenerate() {
                    log::debug!("Skipping outline polygon with {} vertices", points.len());
                    *skipped += 1;
                    continue;
                }
                OutlineShape::Polygon(polygon)
            }
            OutlineData::Unsupported => {
                log::debug!("Skipping unsupported outline shape");
                *skipped += 1;
                continue;
            }
        };
        shapes.push(shape);
    }
    shapes
}

/// Direct edge bounds, then computed bounds, then outline segments
fn resolve_bounds(board: &BoardData, outline: &[OutlineShape]) -> BoundsStrategy {
    if let Some(bb) = board.edge_bounds.filter(BoundingBox::is_valid) {
        return BoundsStrategy::BoundingBox(bb);
    }
    if let Some(bb) = board.computed_bounds.filter(BoundingBox::is_valid) {
        return BoundsStrategy::BoundingBox(bb);
    }

    // Curved outline elements are not part of the fallback
    let edges: Vec<(Point, Point)> = outline
        .iter()
        .filter_map(|shape| match shape {
            OutlineShape::Segment { start, end } => Some((*start, *end)),
            _ => None,
        })
        .collect();

    if edges.is_empty() {
        BoundsStrategy::Unavailable
    } else {
        BoundsStrategy::RayCast(edges)
    }
}

/// Grid over the snapshot's obstacles
///
/// One shared grid; the payload is the obstacle's position in
/// `BoardSnapshot::obstacles`, through which its net is known. Tracks are
/// inserted into the cells along their length, arcs and vias into the cells
/// of their copper extent.
#[derive(Clone, Debug)]
pub struct ObstacleIndex {
    grid: GridIndex<usize>,
}

impl ObstacleIndex {
    pub fn build(snapshot: &BoardSnapshot, cell_size: i64) -> Self {
        let start = Instant::now();
        let mut grid = GridIndex::new(cell_size);
        for (i, obstacle) in snapshot.obstacles.iter().enumerate() {
            match &obstacle.shape {
                ObstacleShape::Segment { start, end, .. } => {
                    grid.insert_along(*start, *end, obstacle.half_width().ceil() as i64, i);
                }
                _ => grid.insert_spanning(&obstacle.reach_box(), i),
            }
        }
        log::debug!(
            "Obstacle index built in {:?}: {} obstacles in {} entries over {} cells",
            start.elapsed(),
            snapshot.obstacles.len(),
            grid.len(),
            grid.cell_count()
        );
        Self { grid }
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Obstacle indices whose copper may lie within `radius` of `p`
    ///
    /// May repeat an index and may include far obstacles.
    pub fn candidates_near(&self, p: Point, radius: f64) -> impl Iterator<Item = usize> + '_ {
        self.grid.query_near(p.x, p.y, radius).map(|e| e.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FootprintData, ViaId, ZoneData};

    fn via(id: u64, x: i64, y: i64, net: i32, selected: bool) -> ViaData {
        ViaData {
            id: ViaId(id),
            position: Point::new(x, y),
            net,
            diameter: 600_000,
            drill: 300_000,
            selected,
        }
    }

    fn square_outline(size: i64) -> Vec<OutlineData> {
        let c = [
            Point::new(0, 0),
            Point::new(size, 0),
            Point::new(size, size),
            Point::new(0, size),
        ];
        (0..4)
            .map(|i| OutlineData::Segment {
                start: c[i],
                end: c[(i + 1) % 4],
            })
            .collect()
    }

    #[test]
    fn test_candidates_follow_selection() {
        let board = BoardData {
            vias: vec![via(1, 0, 0, 1, true), via(2, 0, 0, 1, false)],
            ..Default::default()
        };
        let rules = RuleSet::default();
        let selected = BoardSnapshot::build(&board, &rules, CandidateSelection::Selected);
        assert_eq!(selected.candidates.len(), 1);
        assert_eq!(selected.candidates[0].id, ViaId(1));

        let all = BoardSnapshot::build(&board, &rules, CandidateSelection::All);
        assert_eq!(all.candidates.len(), 2);
        // Every via is also an obstacle
        assert_eq!(all.obstacles.len(), 2);
    }

    #[test]
    fn test_bounds_prefers_edge_bounds() {
        let edge = BoundingBox::new(Point::new(0, 0), Point::new(100, 100));
        let computed = BoundingBox::new(Point::new(-10, -10), Point::new(200, 200));
        let board = BoardData {
            edge_bounds: Some(edge),
            computed_bounds: Some(computed),
            outline: square_outline(100),
            ..Default::default()
        };
        let snapshot = BoardSnapshot::build(&board, &RuleSet::default(), CandidateSelection::All);
        assert_eq!(snapshot.bounds, BoundsStrategy::BoundingBox(edge));
        assert!(snapshot.warnings.is_empty());
    }

    #[test]
    fn test_bounds_falls_back_to_computed_then_ray_cast() {
        let degenerate = BoundingBox::new(Point::new(0, 0), Point::new(100, 0));
        let computed = BoundingBox::new(Point::new(0, 0), Point::new(50, 50));
        let mut board = BoardData {
            edge_bounds: Some(degenerate),
            computed_bounds: Some(computed),
            outline: square_outline(100),
            ..Default::default()
        };
        let snapshot = BoardSnapshot::build(&board, &RuleSet::default(), CandidateSelection::All);
        assert_eq!(snapshot.bounds, BoundsStrategy::BoundingBox(computed));

        board.computed_bounds = None;
        let snapshot = BoardSnapshot::build(&board, &RuleSet::default(), CandidateSelection::All);
        match &snapshot.bounds {
            BoundsStrategy::RayCast(edges) => assert_eq!(edges.len(), 4),
            other => panic!("expected ray cast, got {other:?}"),
        }
        assert_eq!(snapshot.bounds.is_outside(Point::new(50, 50)), Some(false));
        assert_eq!(snapshot.bounds.is_outside(Point::new(150, 50)), Some(true));
    }

    #[test]
    fn test_missing_outline_disables_outside_check_with_warning() {
        let board = BoardData {
            outline: vec![OutlineData::Circle {
                center: Point::new(0, 0),
                radius: 1000,
            }],
            ..Default::default()
        };
        let snapshot = BoardSnapshot::build(&board, &RuleSet::default(), CandidateSelection::All);
        assert_eq!(snapshot.bounds, BoundsStrategy::Unavailable);
        assert_eq!(snapshot.bounds.is_outside(Point::new(0, 0)), None);
        assert_eq!(snapshot.warnings, vec![SnapshotWarning::OutsideBoardDisabled]);

        // No warning when the rule is off
        let rules = RuleSet {
            check_outside_board: false,
            ..RuleSet::default()
        };
        let snapshot = BoardSnapshot::build(&board, &rules, CandidateSelection::All);
        assert!(snapshot.warnings.is_empty());
    }

    #[test]
    fn test_unsupported_shapes_are_skipped() {
        let mut outline = square_outline(100);
        outline.push(OutlineData::Unsupported);
        outline.push(OutlineData::Polygon {
            points: vec![Point::new(0, 0), Point::new(1, 1)],
            holes: Vec::new(),
        });
        let board = BoardData {
            outline,
            zones: vec![ZoneData {
                name: "GND".to_string(),
                net: 1,
                outline: vec![Point::new(0, 0)],
                holes: Vec::new(),
            }],
            ..Default::default()
        };
        let snapshot = BoardSnapshot::build(&board, &RuleSet::default(), CandidateSelection::All);
        assert_eq!(snapshot.outline.len(), 4);
        assert!(snapshot.zones.is_empty());
        assert_eq!(snapshot.skipped_shapes, 3);
        assert!(snapshot
            .warnings
            .contains(&SnapshotWarning::ShapesSkipped { count: 3 }));
    }

    #[test]
    fn test_disabled_rules_skip_collection() {
        let board = BoardData {
            vias: vec![via(1, 0, 0, 1, true)],
            footprints: vec![FootprintData {
                reference: "U1".to_string(),
                bounds: BoundingBox::new(Point::new(0, 0), Point::new(10, 10)),
            }],
            ..Default::default()
        };
        let snapshot = BoardSnapshot::build(&board, &RuleSet::none(), CandidateSelection::All);
        assert!(snapshot.obstacles.is_empty());
        assert!(snapshot.footprints.is_empty());
        assert_eq!(snapshot.candidates.len(), 1);
    }

    #[test]
    fn test_resolve_arc_from_endpoints() {
        let center = Point::new(0, 0);
        let quarter = ArcGeometry::Endpoints {
            start: Point::new(1000, 0),
            end: Point::new(0, 1000),
        };
        let (start, sweep) = resolve_arc_angles(center, &quarter);
        assert!(start.abs() < 1e-9);
        assert!((sweep - 90.0).abs() < 1e-9);

        // End before start wraps to the long way round
        let wrapped = ArcGeometry::Endpoints {
            start: Point::new(0, 1000),
            end: Point::new(1000, 0),
        };
        let (start, sweep) = resolve_arc_angles(center, &wrapped);
        assert!((start - 90.0).abs() < 1e-9);
        assert!((sweep - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_obstacle_index_finds_long_track() {
        let board = BoardData {
            tracks: vec![TrackData::Segment {
                id: 1,
                start: Point::new(0, 0),
                end: Point::new(50_000_000, 0),
                width: 250_000,
                net: 2,
            }],
            ..Default::default()
        };
        let snapshot = BoardSnapshot::build(&board, &RuleSet::default(), CandidateSelection::All);
        let index = ObstacleIndex::build(&snapshot, 1_000_000);
        // Middle of the track, far from both endpoints
        let near: Vec<usize> = index
            .candidates_near(Point::new(25_000_000, 300_000), 1_000_000.0)
            .collect();
        assert!(near.contains(&0));
    }
}
