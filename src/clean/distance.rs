//! Distance calculation algorithms for clearance checks
//!
//! Point-to-segment, arc, circle and polygon distances plus the containment
//! tests used by the outside-board rule. Inputs are nanometer points, results
//! are nanometers as `f64`.

use crate::board::{BoundingBox, Point};
use super::types::Polygon;

/// Squared point-to-segment distance
///
/// The projection parameter is clamped to [0, 1]. A zero-length segment
/// degenerates to the squared distance to `a`.
pub fn distance_sq_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let abx = b.x as f64 - a.x as f64;
    let aby = b.y as f64 - a.y as f64;
    let apx = p.x as f64 - a.x as f64;
    let apy = p.y as f64 - a.y as f64;
    let ab_len2 = abx * abx + aby * aby;

    if ab_len2 == 0.0 {
        return apx * apx + apy * apy;
    }

    let t = ((apx * abx + apy * aby) / ab_len2).clamp(0.0, 1.0);
    let dx = apx - t * abx;
    let dy = apy - t * aby;
    dx * dx + dy * dy
}

/// Point-to-segment minimum distance
pub fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    distance_sq_point_to_segment(p, a, b).sqrt()
}

/// Squared distance between two points
pub fn distance_sq(a: Point, b: Point) -> f64 {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    dx * dx + dy * dy
}

/// Angle in degrees mapped into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if a >= 360.0 { 0.0 } else { a }
}

/// Point-to-arc minimum distance
///
/// The arc starts at `start_deg` and sweeps `sweep_deg` counter-clockwise in
/// board coordinates. A negative sweep describes the same arc traversed the
/// other way; a sweep of a full turn or more is a circle.
pub fn distance_point_to_arc(
    p: Point,
    center: Point,
    radius: f64,
    start_deg: f64,
    sweep_deg: f64,
) -> f64 {
    let dx = p.x as f64 - center.x as f64;
    let dy = p.y as f64 - center.y as f64;
    let center_to_point = dx.hypot(dy);

    if sweep_deg.abs() >= 360.0 {
        return (center_to_point - radius).abs();
    }

    let (start_deg, sweep_deg) = if sweep_deg < 0.0 {
        (start_deg + sweep_deg, -sweep_deg)
    } else {
        (start_deg, sweep_deg)
    };

    let start = normalize_degrees(start_deg);
    let end = normalize_degrees(start + sweep_deg);
    let angle = normalize_degrees(dy.atan2(dx).to_degrees());

    let in_range = if start <= end {
        start <= angle && angle <= end
    } else {
        // Sweep crosses 0 degrees
        angle >= start || angle <= end
    };

    if in_range {
        return (center_to_point - radius).abs();
    }

    let endpoint = |deg: f64| {
        let rad = deg.to_radians();
        (
            center.x as f64 + radius * rad.cos(),
            center.y as f64 + radius * rad.sin(),
        )
    };
    let (sx, sy) = endpoint(start);
    let (ex, ey) = endpoint(end);
    let px = p.x as f64;
    let py = p.y as f64;

    let to_start = (px - sx).hypot(py - sy);
    let to_end = (px - ex).hypot(py - ey);
    to_start.min(to_end)
}

/// Point-to-circle distance: absolute radial deviation
///
/// A point inside the circle and one outside it at the same radial offset
/// are equally close.
pub fn distance_point_to_circle(p: Point, center: Point, radius: f64) -> f64 {
    let dx = p.x as f64 - center.x as f64;
    let dy = p.y as f64 - center.y as f64;
    (dx.hypot(dy) - radius).abs()
}

/// Point-to-polygon distance, 0 for points on or inside the filled area
pub fn distance_point_to_polygon(p: Point, polygon: &Polygon) -> f64 {
    if polygon.contains(p) {
        return 0.0;
    }

    polygon
        .edges()
        .map(|(a, b)| distance_sq_point_to_segment(p, a, b))
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}

/// Inclusive point-in-box test
pub fn point_in_bounding_box(p: Point, bb: &BoundingBox) -> bool {
    p.x >= bb.min.x && p.x <= bb.max.x && p.y >= bb.min.y && p.y <= bb.max.y
}

/// Even-odd containment by casting a horizontal ray towards +x
///
/// Counts the boundary edges crossing the ray; an odd count means inside.
pub fn point_in_polygon_by_ray_cast<I>(p: Point, edges: I) -> bool
where
    I: IntoIterator<Item = (Point, Point)>,
{
    let px = p.x as f64;
    let py = p.y as f64;
    let mut crossings = 0usize;

    for (a, b) in edges {
        if (a.y > p.y) != (b.y > p.y) {
            let (ax, ay) = (a.x as f64, a.y as f64);
            let (bx, by) = (b.x as f64, b.y as f64);
            let x_at = ax + (bx - ax) * (py - ay) / (by - ay);
            if px < x_at {
                crossings += 1;
            }
        }
    }

    crossings % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i64, y: i64) -> Point {
        Point::new(x, y)
    }

    fn square(min: i64, max: i64) -> Vec<Point> {
        vec![pt(min, min), pt(max, min), pt(max, max), pt(min, max)]
    }

    #[test]
    fn test_point_segment_distance() {
        let d = distance_point_to_segment(pt(0, 1000), pt(0, 0), pt(2000, 0));
        assert!((d - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_segment_is_point_distance() {
        let points = [pt(0, 0), pt(3, 4), pt(-7, 11), pt(1_000_000, -250_000)];
        let a = pt(5, -2);
        for p in points {
            let expected = distance_sq(p, a).sqrt();
            assert_eq!(distance_point_to_segment(p, a, a), expected);
        }
    }

    #[test]
    fn test_projection_is_clamped_to_endpoints() {
        // Beyond b: distance to b, not to the infinite line
        let d = distance_point_to_segment(pt(5000, 3000), pt(0, 0), pt(1000, 0));
        assert!((d - 5000.0).abs() < 1e-6);
        // Before a
        let d = distance_point_to_segment(pt(-3000, 4000), pt(0, 0), pt(1000, 0));
        assert!((d - 5000.0).abs() < 1e-6);
    }

    #[test]
    fn test_segment_distance_symmetric() {
        let cases = [
            (pt(10, 20), pt(-100, 40), pt(300, -80)),
            (pt(0, 0), pt(1, 1), pt(1, 1)),
            (pt(12345, -6789), pt(0, 0), pt(99999, 55555)),
        ];
        for (p, a, b) in cases {
            let ab = distance_point_to_segment(p, a, b);
            let ba = distance_point_to_segment(p, b, a);
            assert!((ab - ba).abs() < 1e-6, "{ab} vs {ba}");
        }
    }

    #[test]
    fn test_circle_distance() {
        let c = pt(0, 0);
        assert_eq!(distance_point_to_circle(pt(1000, 0), c, 1000.0), 0.0);
        assert_eq!(distance_point_to_circle(pt(0, -1000), c, 1000.0), 0.0);

        // Inside and outside at the same radial offset compare equal
        let inside = distance_point_to_circle(pt(800, 0), c, 1000.0);
        let outside = distance_point_to_circle(pt(1200, 0), c, 1000.0);
        assert_eq!(inside, outside);

        // Monotonic in radial deviation
        let mut last = 0.0;
        for r in (1000..2000).step_by(100) {
            let d = distance_point_to_circle(pt(r, 0), c, 1000.0);
            assert!(d >= last);
            last = d;
        }
    }

    #[test]
    fn test_arc_distance_in_range() {
        // Quarter arc from 0 to 90 degrees, radius 1000
        let d = distance_point_to_arc(pt(1414, 1414), pt(0, 0), 1000.0, 0.0, 90.0);
        assert!((d - (1414.0f64.hypot(1414.0) - 1000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_arc_distance_out_of_range_uses_endpoints() {
        // Point at 180 degrees is nearest to the 90 degree endpoint (0, 1000)
        let d = distance_point_to_arc(pt(-1000, 0), pt(0, 0), 1000.0, 0.0, 90.0);
        assert!((d - 1000.0f64.hypot(1000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_arc_crossing_zero_degrees() {
        // From 315 sweeping 90 degrees ends at 45, covering 0
        let on_arc = distance_point_to_arc(pt(1000, 0), pt(0, 0), 1000.0, 315.0, 90.0);
        assert!(on_arc < 1e-6);

        // A point at 270 degrees is outside the sweep
        let off_arc = distance_point_to_arc(pt(0, -1000), pt(0, 0), 1000.0, 315.0, 90.0);
        assert!(off_arc > 100.0);
    }

    #[test]
    fn test_arc_negative_angles_are_normalized() {
        // The point angle from atan2 is negative here; it must still be in range
        let d = distance_point_to_arc(pt(0, -1000), pt(0, 0), 1000.0, 200.0, 100.0);
        assert!(d < 1e-6);

        // Negative sweep describes the same arc as its mirror
        let fwd = distance_point_to_arc(pt(700, 700), pt(0, 0), 1000.0, 0.0, 90.0);
        let back = distance_point_to_arc(pt(700, 700), pt(0, 0), 1000.0, 90.0, -90.0);
        assert!((fwd - back).abs() < 1e-6);
    }

    #[test]
    fn test_full_sweep_is_circle() {
        let d = distance_point_to_arc(pt(-1500, 0), pt(0, 0), 1000.0, 10.0, 360.0);
        assert!((d - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_polygon_distance() {
        let poly = Polygon::new(square(0, 1000), Vec::new());
        assert_eq!(distance_point_to_polygon(pt(500, 500), &poly), 0.0);
        assert_eq!(distance_point_to_polygon(pt(1000, 500), &poly), 0.0);
        let d = distance_point_to_polygon(pt(1300, 500), &poly);
        assert!((d - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_polygon_distance_inside_hole() {
        let poly = Polygon::new(square(0, 1000), vec![square(400, 600)]);
        let d = distance_point_to_polygon(pt(500, 500), &poly);
        assert!((d - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_in_bounding_box_inclusive() {
        let bb = BoundingBox::new(pt(0, 0), pt(100, 100));
        assert!(point_in_bounding_box(pt(0, 0), &bb));
        assert!(point_in_bounding_box(pt(100, 50), &bb));
        assert!(!point_in_bounding_box(pt(101, 50), &bb));
        assert!(!point_in_bounding_box(pt(50, -1), &bb));
    }

    #[test]
    fn test_ray_cast() {
        let ring = square(0, 1000);
        let edges: Vec<(Point, Point)> = (0..ring.len())
            .map(|i| (ring[i], ring[(i + 1) % ring.len()]))
            .collect();
        assert!(point_in_polygon_by_ray_cast(pt(500, 500), edges.iter().copied()));
        assert!(!point_in_polygon_by_ray_cast(pt(1500, 500), edges.iter().copied()));
        assert!(!point_in_polygon_by_ray_cast(pt(-500, 500), edges.iter().copied()));
        assert!(!point_in_polygon_by_ray_cast(pt(500, 500), std::iter::empty()));
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let far = pt(i64::MAX, i64::MAX);
        let near = pt(i64::MIN, i64::MIN);
        assert!(distance_sq(far, near).is_finite());
        assert!(distance_point_to_segment(far, near, pt(0, 0)) > 0.0);
        assert!(distance_point_to_circle(near, far, 10.0).is_finite());
        assert!(distance_point_to_arc(near, far, 10.0, 0.0, 90.0).is_finite());
    }
}
