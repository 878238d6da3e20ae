//! Planar vector math: `Point` and `LineSegment`.
//!
//! Positions are metric coordinates in `f64`.  The operational model sums
//! exponentials of sub-centimetre distances, so single precision is not
//! enough headroom here (unlike a city-scale lat/lon grid).

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

// ── Point ─────────────────────────────────────────────────────────────────────

/// A 2-D point, doubling as a 2-D vector.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean norm.
    #[inline]
    pub fn norm(self) -> f64 {
        self.norm_square().sqrt()
    }

    /// Squared norm — cheaper than [`norm`](Self::norm) for comparisons.
    #[inline]
    pub fn norm_square(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Unit vector in the same direction, or `ZERO` for a (near-)zero vector.
    pub fn normalized(self) -> Point {
        let n = self.norm();
        if n <= 1e-12 {
            Point::ZERO
        } else {
            Point::new(self.x / n, self.y / n)
        }
    }

    #[inline]
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z-component of the cross product `self × other`.
    #[inline]
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotation by +90° (counter-clockwise).
    #[inline]
    pub fn rotate90(self) -> Point {
        Point::new(-self.y, self.x)
    }

    #[inline]
    pub fn distance_to(self, other: Point) -> f64 {
        (other - self).norm()
    }

    /// `true` if both components are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ── LineSegment ───────────────────────────────────────────────────────────────

/// A finite line segment between two points.
///
/// Walls, obstacle edges, doors, and navigation lines are all segments; the
/// operational model only ever needs shortest-point, distance, and crossing
/// queries against them.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSegment {
    pub p1: Point,
    pub p2: Point,
}

impl LineSegment {
    #[inline]
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    #[inline]
    pub fn length(self) -> f64 {
        (self.p2 - self.p1).norm()
    }

    #[inline]
    pub fn center(self) -> Point {
        (self.p1 + self.p2) * 0.5
    }

    /// The point on the segment closest to `p` (projection clamped to the
    /// endpoints).
    pub fn shortest_point(self, p: Point) -> Point {
        let dir = self.p2 - self.p1;
        let len2 = dir.norm_square();
        if len2 <= 1e-24 {
            return self.p1;
        }
        let t = ((p - self.p1).dot(dir) / len2).clamp(0.0, 1.0);
        self.p1 + dir * t
    }

    #[inline]
    pub fn dist_to(self, p: Point) -> f64 {
        self.dist_to_square(p).sqrt()
    }

    #[inline]
    pub fn dist_to_square(self, p: Point) -> f64 {
        (p - self.shortest_point(p)).norm_square()
    }

    /// Which side of the (infinite) carrier line `p` lies on.
    ///
    /// Positive = left of p1→p2, negative = right, ~0 = collinear.
    #[inline]
    pub fn signed_side(self, p: Point) -> f64 {
        (self.p2 - self.p1).cross(p - self.p1)
    }

    /// `true` if the segment `a→b` crosses this segment.
    ///
    /// Endpoint touches count as a crossing; collinear overlap does not.
    /// Used for the door-crossing side test and visibility blocking.
    pub fn crosses(self, a: Point, b: Point) -> bool {
        let d1 = self.signed_side(a);
        let d2 = self.signed_side(b);
        let other = LineSegment::new(a, b);
        let d3 = other.signed_side(self.p1);
        let d4 = other.signed_side(self.p2);
        d1 * d2 <= 0.0 && d3 * d4 <= 0.0 && (d1 != 0.0 || d2 != 0.0 || d3 != 0.0 || d4 != 0.0)
    }
}

impl fmt::Display for LineSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.p1, self.p2)
    }
}
