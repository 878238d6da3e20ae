//! Grid distance fields descended by gradient.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ped_core::Point;
use ped_geometry::Building;

const UNREACHABLE: f64 = f64::INFINITY;

/// A distance-to-target field over a uniform grid covering the building.
///
/// Computed once per target stage and cached by the engine until a geometry
/// mutation flags the router dirty.  Cells are walkable if their center lies
/// in some subroom; steps between adjacent cells additionally require line
/// of sight so the field never leaks through walls.
pub(crate) struct FloorField {
    origin: Point,
    cell: f64,
    nx: usize,
    ny: usize,
    dist: Vec<f64>,
}

impl FloorField {
    pub fn compute(building: &Building, target: Point, cell: f64) -> Self {
        let (min, max) = building.bounding_box();
        let origin = Point::new(min.x - cell, min.y - cell);
        let nx = (((max.x - origin.x) / cell).ceil() as usize + 2).max(1);
        let ny = (((max.y - origin.y) / cell).ceil() as usize + 2).max(1);

        let mut field = Self {
            origin,
            cell,
            nx,
            ny,
            dist: vec![UNREACHABLE; nx * ny],
        };

        let Some(start) = field.cell_of(target) else {
            return field;
        };
        if building.get_room_and_subroom(field.center(start)).is_none() {
            return field;
        }

        // Dijkstra outward from the target cell, 8-connected.
        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
        field.dist[start] = 0.0;
        heap.push(Reverse((0, start)));

        while let Some(Reverse((cost_q, idx))) = heap.pop() {
            let cost = cost_q as f64 * 1e-6;
            if cost > field.dist[idx] + 1e-9 {
                continue;
            }
            let here = field.center(idx);
            let Some(here_sr) = building.get_room_and_subroom(here) else {
                continue;
            };
            let (cx, cy) = (idx % field.nx, idx / field.nx);
            for dy in -1_i64..=1 {
                for dx in -1_i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx_i = cx as i64 + dx;
                    let ny_i = cy as i64 + dy;
                    if nx_i < 0 || ny_i < 0 || nx_i >= field.nx as i64 || ny_i >= field.ny as i64
                    {
                        continue;
                    }
                    let nidx = ny_i as usize * field.nx + nx_i as usize;
                    let npos = field.center(nidx);
                    let Some(there_sr) = building.get_room_and_subroom(npos) else {
                        continue;
                    };
                    if !building.is_visible(here, npos, &[here_sr, there_sr]) {
                        continue;
                    }
                    let step = if dx != 0 && dy != 0 {
                        cell * std::f64::consts::SQRT_2
                    } else {
                        cell
                    };
                    let next = cost + step;
                    if next < field.dist[nidx] {
                        field.dist[nidx] = next;
                        heap.push(Reverse(((next * 1e6) as u64, nidx)));
                    }
                }
            }
        }
        field
    }

    fn cell_of(&self, p: Point) -> Option<usize> {
        let cx = ((p.x - self.origin.x) / self.cell).floor();
        let cy = ((p.y - self.origin.y) / self.cell).floor();
        if cx < 0.0 || cy < 0.0 {
            return None;
        }
        let (cx, cy) = (cx as usize, cy as usize);
        if cx >= self.nx || cy >= self.ny {
            return None;
        }
        Some(cy * self.nx + cx)
    }

    fn center(&self, idx: usize) -> Point {
        let cx = (idx % self.nx) as f64;
        let cy = (idx / self.nx) as f64;
        Point::new(
            self.origin.x + (cx + 0.5) * self.cell,
            self.origin.y + (cy + 0.5) * self.cell,
        )
    }

    /// Remaining distance to the target from `p` (infinite if unreachable).
    pub fn distance_at(&self, p: Point) -> f64 {
        self.cell_of(p).map(|i| self.dist[i]).unwrap_or(UNREACHABLE)
    }

    /// Steepest-descent direction at `p`, or `None` when `p` is at the
    /// target cell or outside the reachable area.
    pub fn direction_at(&self, p: Point) -> Option<Point> {
        let idx = self.cell_of(p)?;
        if !self.dist[idx].is_finite() {
            return None;
        }
        if self.dist[idx] == 0.0 {
            return None;
        }
        let (cx, cy) = (idx % self.nx, idx / self.nx);
        let mut best: Option<(f64, usize)> = None;
        for dy in -1_i64..=1 {
            for dx in -1_i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx_i = cx as i64 + dx;
                let ny_i = cy as i64 + dy;
                if nx_i < 0 || ny_i < 0 || nx_i >= self.nx as i64 || ny_i >= self.ny as i64 {
                    continue;
                }
                let nidx = ny_i as usize * self.nx + nx_i as usize;
                let d = self.dist[nidx];
                if d.is_finite() && best.map(|(bd, bi)| (d, nidx) < (bd, bi)).unwrap_or(true) {
                    best = Some((d, nidx));
                }
            }
        }
        let (best_dist, best_idx) = best?;
        if best_dist >= self.dist[idx] {
            return None;
        }
        Some((self.center(best_idx) - p).normalized())
    }
}
