//! Board document types
//!
//! Serde model of the board snapshot handed over by the host CAD application.
//! All coordinates and sizes are integer nanometers.

use serde::{Deserialize, Serialize};

/// Nanometers per millimeter
pub const NM_PER_MM: f64 = 1_000_000.0;

/// Convert a length in millimeters to nanometers
pub fn from_mm(mm: f64) -> f64 {
    mm * NM_PER_MM
}

/// Convert a length in nanometers to millimeters
pub fn to_mm(nm: f64) -> f64 {
    nm / NM_PER_MM
}

/// Electrical net code as assigned by the host
pub type NetCode = i32;

/// Opaque handle of a via in the host board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViaId(pub u64);

/// A 2D point in nanometers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Point from millimeter coordinates, rounded to the nearest nanometer
    pub fn from_mm(x: f64, y: f64) -> Self {
        Self {
            x: from_mm(x).round() as i64,
            y: from_mm(y).round() as i64,
        }
    }
}

/// Axis-aligned rectangle, corners inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self {
            min: Point::new(min.x.min(max.x), min.y.min(max.y)),
            max: Point::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |bb, p| Self {
            min: Point::new(bb.min.x.min(p.x), bb.min.y.min(p.y)),
            max: Point::new(bb.max.x.max(p.x), bb.max.y.max(p.y)),
        }))
    }

    pub fn width(&self) -> i64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i64 {
        self.max.y - self.min.y
    }

    /// True when the box spans a non-zero area
    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Box grown by `margin` on every side
    pub fn inflated(&self, margin: i64) -> Self {
        Self {
            min: Point::new(
                self.min.x.saturating_sub(margin),
                self.min.y.saturating_sub(margin),
            ),
            max: Point::new(
                self.max.x.saturating_add(margin),
                self.max.y.saturating_add(margin),
            ),
        }
    }
}

/// Via as exported by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViaData {
    pub id: ViaId,
    pub position: Point,
    pub net: NetCode,
    pub diameter: i64,
    pub drill: i64,
    /// Selected in the host editor; selected vias are the cleaning candidates
    #[serde(default)]
    pub selected: bool,
}

/// Copper track (straight or arc), tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackData {
    Segment {
        id: u64,
        start: Point,
        end: Point,
        width: i64,
        net: NetCode,
    },
    Arc {
        id: u64,
        center: Point,
        radius: i64,
        #[serde(flatten)]
        geometry: ArcGeometry,
        width: i64,
        net: NetCode,
    },
}

/// Arc extent, as either explicit endpoints or start angle plus sweep
///
/// Newer hosts export endpoints, older ones export angles. Both are accepted
/// and resolved to angles when the snapshot is built.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArcGeometry {
    Endpoints { start: Point, end: Point },
    Angles { start_angle_deg: f64, sweep_deg: f64 },
}

/// Placed footprint, only its bounding box matters here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintData {
    #[serde(default)]
    pub reference: String,
    pub bounds: BoundingBox,
}

/// Copper zone with its filled outline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneData {
    #[serde(default)]
    pub name: String,
    pub net: NetCode,
    pub outline: Vec<Point>,
    #[serde(default)]
    pub holes: Vec<Vec<Point>>,
}

/// Edge-cuts drawing, tagged by `shape`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum OutlineData {
    Segment {
        start: Point,
        end: Point,
    },
    Arc {
        center: Point,
        radius: i64,
        #[serde(flatten)]
        geometry: ArcGeometry,
    },
    Circle {
        center: Point,
        radius: i64,
    },
    Polygon {
        points: Vec<Point>,
        #[serde(default)]
        holes: Vec<Vec<Point>>,
    },
    /// Any shape kind this engine has no distance function for
    #[serde(other)]
    Unsupported,
}

/// Complete board document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardData {
    #[serde(default)]
    pub vias: Vec<ViaData>,
    #[serde(default)]
    pub tracks: Vec<TrackData>,
    #[serde(default)]
    pub footprints: Vec<FootprintData>,
    #[serde(default)]
    pub zones: Vec<ZoneData>,
    #[serde(default)]
    pub outline: Vec<OutlineData>,
    /// Bounds of the edge-cuts layer as reported directly by the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_bounds: Option<BoundingBox>,
    /// Bounds computed by the host from all board items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_bounds: Option<BoundingBox>,
}

impl BoardData {
    /// Drop the given vias, returning how many were removed
    pub fn remove_vias(&mut self, ids: &[ViaId]) -> usize {
        let before = self.vias.len();
        self.vias.retain(|v| !ids.contains(&v.id));
        before - self.vias.len()
    }
}
