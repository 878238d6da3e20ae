//! Simple polygon with the containment and shape queries the engine needs.

use ped_core::{LineSegment, Point};

/// A simple (non-self-intersecting) polygon given as a vertex loop.
///
/// The closing edge from the last vertex back to the first is implicit.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Build from a vertex loop.  At least 3 vertices; orientation does not
    /// matter for any of the queries below.
    pub fn new(points: Vec<Point>) -> Self {
        debug_assert!(points.len() >= 3, "polygon needs at least 3 vertices");
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterator over the boundary edges, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = LineSegment> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| LineSegment::new(self.points[i], self.points[(i + 1) % n]))
    }

    /// Signed area (positive for counter-clockwise winding).
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let mut acc = 0.0;
        for i in 0..n {
            acc += self.points[i].cross(self.points[(i + 1) % n]);
        }
        acc * 0.5
    }

    /// Area centroid.
    pub fn centroid(&self) -> Point {
        let area = self.signed_area();
        if area.abs() < 1e-12 {
            // Degenerate; fall back to the vertex mean.
            let n = self.points.len() as f64;
            let sum = self
                .points
                .iter()
                .fold(Point::ZERO, |acc, &p| acc + p);
            return sum * (1.0 / n);
        }
        let n = self.points.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            let w = p.cross(q);
            cx += (p.x + q.x) * w;
            cy += (p.y + q.y) * w;
        }
        Point::new(cx / (6.0 * area), cy / (6.0 * area))
    }

    /// Ray-casting point-in-polygon test.  Points on the boundary count as
    /// inside (an agent standing exactly on a wall is still in the subroom).
    pub fn contains(&self, p: Point) -> bool {
        for edge in self.edges() {
            if edge.dist_to_square(p) < 1e-18 {
                return true;
            }
        }
        let n = self.points.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// `true` if all turns along the boundary have the same sense.
    ///
    /// Collinear runs are tolerated; a degenerate (zero-area) polygon is not
    /// convex.
    pub fn is_convex(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut sign = 0.0_f64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let c = self.points[(i + 2) % n];
            let cross = (b - a).cross(c - b);
            if cross.abs() < 1e-12 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        sign != 0.0
    }

    /// A circle guaranteed to contain the polygon: centroid plus the largest
    /// vertex distance.  Used to pre-filter agents before the exact
    /// point-in-polygon test.
    pub fn containing_circle(&self) -> (Point, f64) {
        let center = self.centroid();
        let radius = self
            .points
            .iter()
            .map(|&p| center.distance_to(p))
            .fold(0.0, f64::max);
        (center, radius)
    }

    /// Axis-aligned bounding box as `(min, max)` corners.
    pub fn bounding_box(&self) -> (Point, Point) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }
}
