//! Uniform grid spatial index
//!
//! Buckets 2D points by a fixed cell size. Queries return whole buckets in a
//! square neighborhood around the query point, so results always over-cover
//! the requested radius and callers must re-check exact distances.

use crate::board::{BoundingBox, Point};
use std::collections::HashMap;

/// Default cell size: 1 mm in nanometers
pub const DEFAULT_CELL_SIZE: i64 = 1_000_000;

/// Entry stored in a grid bucket
#[derive(Clone, Debug, PartialEq)]
pub struct GridEntry<T> {
    pub x: i64,
    pub y: i64,
    pub payload: T,
}

/// Inclusive range of occupied cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellExtent {
    min: (i64, i64),
    max: (i64, i64),
}

impl CellExtent {
    fn including(self, cell: (i64, i64)) -> Self {
        Self {
            min: (self.min.0.min(cell.0), self.min.1.min(cell.1)),
            max: (self.max.0.max(cell.0), self.max.1.max(cell.1)),
        }
    }
}

/// Uniform grid bucketing points into square cells
#[derive(Clone, Debug)]
pub struct GridIndex<T> {
    cell_size: i64,
    buckets: HashMap<(i64, i64), Vec<GridEntry<T>>>,
    len: usize,
    extent: Option<CellExtent>,
}

fn midpoint(a: i64, b: i64) -> i64 {
    ((a as i128 + b as i128) / 2) as i64
}

impl<T> GridIndex<T> {
    /// Create an empty grid; non-positive cell sizes are clamped to 1
    pub fn new(cell_size: i64) -> Self {
        Self {
            cell_size: cell_size.max(1),
            buckets: HashMap::new(),
            len: 0,
            extent: None,
        }
    }

    pub fn cell_size(&self) -> i64 {
        self.cell_size
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.buckets.len()
    }

    /// Cell coordinate containing (x, y), flooring towards negative infinity
    pub fn cell_of(&self, x: i64, y: i64) -> (i64, i64) {
        (x.div_euclid(self.cell_size), y.div_euclid(self.cell_size))
    }

    pub fn insert(&mut self, x: i64, y: i64, payload: T) {
        let cell = self.cell_of(x, y);
        self.push(cell, GridEntry { x, y, payload });
    }

    fn push(&mut self, cell: (i64, i64), entry: GridEntry<T>) {
        self.buckets.entry(cell).or_default().push(entry);
        self.len += 1;
        self.extent = Some(match self.extent {
            Some(extent) => extent.including(cell),
            None => CellExtent { min: cell, max: cell },
        });
    }

    /// Iterate buckets in the neighborhood of (x, y) covering `radius`
    ///
    /// The neighborhood spans `ceil(radius / cell_size) + 1` cells in each
    /// direction, clipped to the occupied cells. When the clipped square holds
    /// more cells than there are buckets, the buckets are scanned instead. No
    /// distance filtering is applied.
    pub fn query_near(
        &self,
        x: i64,
        y: i64,
        radius: f64,
    ) -> Box<dyn Iterator<Item = &GridEntry<T>> + '_> {
        let extent = match self.extent {
            Some(extent) => extent,
            None => return Box::new(std::iter::empty()),
        };
        let (cx, cy) = self.cell_of(x, y);
        // Float to int casts saturate; NaN radius is treated as zero
        let reach = (radius.max(0.0) / self.cell_size as f64).ceil() as i64 as i128 + 1;

        let clip = |c: i64, lo: i64, hi: i64| {
            let min = (c as i128 - reach).max(lo as i128) as i64;
            let max = (c as i128 + reach).min(hi as i128) as i64;
            (min, max)
        };
        let (min_x, max_x) = clip(cx, extent.min.0, extent.max.0);
        let (min_y, max_y) = clip(cy, extent.min.1, extent.max.1);
        if min_x > max_x || min_y > max_y {
            return Box::new(std::iter::empty());
        }

        let columns = (max_x as i128 - min_x as i128 + 1) as u128;
        let rows = (max_y as i128 - min_y as i128 + 1) as u128;
        if columns * rows > self.buckets.len() as u128 {
            return Box::new(
                self.buckets
                    .iter()
                    .filter(move |((gx, gy), _)| {
                        (min_x..=max_x).contains(gx) && (min_y..=max_y).contains(gy)
                    })
                    .flat_map(|(_, bucket)| bucket.iter()),
            );
        }

        Box::new(
            (min_x..=max_x)
                .flat_map(move |gx| (min_y..=max_y).map(move |gy| (gx, gy)))
                .filter_map(move |cell| self.buckets.get(&cell))
                .flatten(),
        )
    }
}

impl<T: Clone> GridIndex<T> {
    /// Insert `payload` into every cell overlapped by `bounds`
    ///
    /// Each copy is anchored at the box center. Meant for compact items
    /// (vias, arcs); use `insert_along` for straight tracks.
    pub fn insert_spanning(&mut self, bounds: &BoundingBox, payload: T) {
        let (min_cx, min_cy) = self.cell_of(bounds.min.x, bounds.min.y);
        let (max_cx, max_cy) = self.cell_of(bounds.max.x, bounds.max.y);
        let anchor_x = midpoint(bounds.min.x, bounds.max.x);
        let anchor_y = midpoint(bounds.min.y, bounds.max.y);

        for gx in min_cx..=max_cx {
            for gy in min_cy..=max_cy {
                self.push(
                    (gx, gy),
                    GridEntry {
                        x: anchor_x,
                        y: anchor_y,
                        payload: payload.clone(),
                    },
                );
            }
        }
    }

    /// Insert `payload` into the cells within `margin` of segment `a`-`b`
    ///
    /// Walks the segment column by column; in each column only the rows the
    /// margin-inflated segment crosses are filled, so the entry count grows
    /// with the segment length rather than its bounding box area.
    pub fn insert_along(&mut self, a: Point, b: Point, margin: i64, payload: T) {
        let margin = margin.max(0);
        let (lo, hi) = if a.x <= b.x { (a, b) } else { (b, a) };
        let anchor_x = midpoint(a.x, b.x);
        let anchor_y = midpoint(a.y, b.y);

        let cs = self.cell_size as f64;
        let m = margin as f64;
        // One extra nanometer absorbs float rounding at cell borders
        let pad = m + 1.0;
        let (lo_x, lo_y) = (lo.x as f64, lo.y as f64);
        let (hi_x, hi_y) = (hi.x as f64, hi.y as f64);
        let dx = hi_x - lo_x;
        let slope = if dx > 0.0 { (hi_y - lo_y) / dx } else { 0.0 };

        let min_cx = lo.x.saturating_sub(margin).div_euclid(self.cell_size);
        let max_cx = hi.x.saturating_add(margin).div_euclid(self.cell_size);

        for gx in min_cx..=max_cx {
            let (y0, y1) = if dx > 0.0 {
                // Segment part whose capsule can reach this column
                let slab_lo = (gx as f64 * cs - m).max(lo_x);
                let slab_hi = ((gx as f64 + 1.0) * cs + m).min(hi_x);
                if slab_lo > slab_hi {
                    continue;
                }
                (
                    lo_y + (slab_lo - lo_x) * slope,
                    lo_y + (slab_hi - lo_x) * slope,
                )
            } else {
                (lo_y, hi_y)
            };

            let min_cy = ((y0.min(y1) - pad) / cs).floor() as i64;
            let max_cy = ((y0.max(y1) + pad) / cs).floor() as i64;
            for gy in min_cy..=max_cy {
                self.push(
                    (gx, gy),
                    GridEntry {
                        x: anchor_x,
                        y: anchor_y,
                        payload: payload.clone(),
                    },
                );
            }
        }
    }
}
