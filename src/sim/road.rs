//! Axis-aligned road segments
//!
//! A road is a centerline from `start` to `end` that shares one coordinate
//! (horizontal or vertical), thickened by `width`: a dog may stand anywhere
//! within half the width of the centerline, including past either end.

use std::hash::{Hash, Hasher};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Point, pseudoscalar};
use crate::approx_eq;
use crate::consts::ROAD_WIDTH;

/// A thickened road segment
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Road {
    pub start: Point,
    pub end: Point,
    pub width: f64,
}

impl Road {
    /// Horizontal road from `start` to x = `end_x`
    pub fn horizontal(start: Point, end_x: f64) -> Self {
        Self::new(start, DVec2::new(end_x, start.y))
    }

    /// Vertical road from `start` to y = `end_y`
    pub fn vertical(start: Point, end_y: f64) -> Self {
        Self::new(start, DVec2::new(start.x, end_y))
    }

    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            width: ROAD_WIDTH,
        }
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        approx_eq(self.start.y, self.end.y)
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        approx_eq(self.start.x, self.end.x)
    }

    #[inline]
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    /// Lowest corner of the centerline (min x, min y)
    #[inline]
    pub fn min_corner(&self) -> Point {
        self.start.min(self.end)
    }

    /// Highest corner of the centerline (max x, max y)
    #[inline]
    pub fn max_corner(&self) -> Point {
        self.start.max(self.end)
    }

    /// Check if a point lies within the road band (boundary inclusive).
    ///
    /// The band is the centerline's bounding box grown by half the width on
    /// every side. Its corners are walked counter-clockwise and the point must
    /// be on the left of (or on) every edge.
    pub fn contains_point(&self, pos: Point) -> bool {
        let h = self.half_width();
        let lo = self.min_corner() - DVec2::splat(h);
        let hi = self.max_corner() + DVec2::splat(h);
        let p1 = lo;
        let p2 = DVec2::new(hi.x, lo.y);
        let p3 = hi;
        let p4 = DVec2::new(lo.x, hi.y);
        pseudoscalar(pos, p1, p2) >= 0.0
            && pseudoscalar(pos, p2, p3) >= 0.0
            && pseudoscalar(pos, p3, p4) >= 0.0
            && pseudoscalar(pos, p4, p1) >= 0.0
    }

    /// Endpoints ordered so that equal roads compare equal regardless of direction
    fn canonical(&self) -> (Point, Point) {
        let (a, b) = (self.start, self.end);
        if (a.x, a.y) <= (b.x, b.y) { (a, b) } else { (b, a) }
    }
}

impl PartialEq for Road {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Road {}

impl Hash for Road {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (a, b) = self.canonical();
        for c in [a.x, a.y, b.x, b.y] {
            // +0.0 and -0.0 compare equal, so they must hash equal too
            (c + 0.0).to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_road_orientation() {
        let h = Road::horizontal(DVec2::new(0.0, 0.0), 10.0);
        assert!(h.is_horizontal());
        assert!(!h.is_vertical());
        assert_eq!(h.end, DVec2::new(10.0, 0.0));

        let v = Road::vertical(DVec2::new(3.0, 5.0), -5.0);
        assert!(v.is_vertical());
        assert_eq!(v.min_corner(), DVec2::new(3.0, -5.0));
        assert_eq!(v.max_corner(), DVec2::new(3.0, 5.0));
    }

    #[test]
    fn test_contains_point_boundary_inclusive() {
        let road = Road::horizontal(DVec2::new(0.0, 0.0), 10.0);
        assert!(road.contains_point(DVec2::new(5.0, 0.0)));
        assert!(road.contains_point(DVec2::new(-0.4, 0.4)));
        assert!(road.contains_point(DVec2::new(10.4, -0.4)));
        assert!(!road.contains_point(DVec2::new(5.0, 0.41)));
        assert!(!road.contains_point(DVec2::new(10.5, 0.0)));
    }

    #[test]
    fn test_contains_point_reversed_road() {
        let road = Road::vertical(DVec2::new(0.0, 10.0), 0.0);
        assert!(road.contains_point(DVec2::new(0.0, 5.0)));
        assert!(road.contains_point(DVec2::new(0.4, 10.4)));
        assert!(!road.contains_point(DVec2::new(0.0, -0.5)));
    }

    #[test]
    fn test_equality_ignores_direction() {
        let a = Road::horizontal(DVec2::new(0.0, 0.0), 10.0);
        let b = Road::horizontal(DVec2::new(10.0, 0.0), 0.0);
        let c = Road::horizontal(DVec2::new(0.0, 1.0), 10.0);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Road> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_points_within_half_width_are_inside(
            x0 in -100i32..100,
            len in -50i32..50,
            t in 0.0f64..=1.0,
            off in -0.4f64..=0.4,
            along in -0.4f64..=0.4,
            vertical in any::<bool>(),
        ) {
            let start = DVec2::new(x0 as f64, 7.0);
            let road = if vertical {
                Road::vertical(start, 7.0 + len as f64)
            } else {
                Road::horizontal(start, x0 as f64 + len as f64)
            };
            let lo = road.min_corner();
            let hi = road.max_corner();
            let on_line = lo + (hi - lo) * t;
            let p = if vertical {
                DVec2::new(on_line.x + off, on_line.y)
            } else {
                DVec2::new(on_line.x, on_line.y + off)
            };
            prop_assert!(road.contains_point(p));

            // Past the ends, still within the band
            let tip = if vertical {
                DVec2::new(hi.x + off, hi.y + along.abs())
            } else {
                DVec2::new(hi.x + along.abs(), hi.y + off)
            };
            prop_assert!(road.contains_point(tip));
        }
    }
}
