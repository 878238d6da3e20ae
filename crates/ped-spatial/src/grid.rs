//! The uniform-grid index.

use std::collections::HashMap;

use ped_core::{AgentId, Point};

use crate::error::{SpatialError, SpatialResult};

/// Spatial index over agent positions.
///
/// Rebuild with [`update`](Self::update) once per tick; the simulation also
/// inserts incrementally via [`add`](Self::add) when an agent is created
/// between ticks, so placement validation sees agents added this frame.
///
/// Query results are deterministic: cells are visited in a fixed coordinate
/// order and agents within a cell keep insertion order.
pub struct NeighborhoodSearch {
    cell_size: f64,
    /// Cell coordinate → indices into `entries`.
    cells: HashMap<(i64, i64), Vec<usize>>,
    entries: Vec<(AgentId, Point)>,
}

impl NeighborhoodSearch {
    /// `interaction_range` is the largest radius the operational model will
    /// ever query with; `cell_size` must cover it or the one-ring cell scan
    /// would miss neighbors.
    pub fn new(cell_size: f64, interaction_range: f64) -> SpatialResult<Self> {
        if cell_size <= 0.0 {
            return Err(SpatialError::NonPositiveCellSize(cell_size));
        }
        if cell_size < interaction_range {
            return Err(SpatialError::CellSizeTooSmall {
                cell_size,
                interaction_range,
            });
        }
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
            entries: Vec::new(),
        })
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    fn cell_of(&self, p: Point) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Rebuild the index from scratch.  O(N).
    pub fn update(&mut self, agents: impl IntoIterator<Item = (AgentId, Point)>) {
        self.cells.clear();
        self.entries.clear();
        for (id, pos) in agents {
            self.add(id, pos);
        }
    }

    /// Insert one agent without rebuilding (used by `AddAgent` mid-frame).
    pub fn add(&mut self, id: AgentId, pos: Point) {
        let idx = self.entries.len();
        self.entries.push((id, pos));
        self.cells.entry(self.cell_of(pos)).or_default().push(idx);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All agents with `‖p_j − p‖ ≤ r`, exactly.
    ///
    /// The scan covers every cell overlapping the query disk, so any radius
    /// is valid; the cell-size check at construction only guarantees the
    /// common interaction-range query touches at most a 3×3 block.
    pub fn neighbours(&self, p: Point, r: f64) -> Vec<(AgentId, Point)> {
        let r2 = r * r;
        let (cx0, cy0) = self.cell_of(Point::new(p.x - r, p.y - r));
        let (cx1, cy1) = self.cell_of(Point::new(p.x + r, p.y + r));

        let mut out = Vec::new();
        for cx in cx0..=cx1 {
            for cy in cy0..=cy1 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &idx in bucket {
                    let (id, pos) = self.entries[idx];
                    if (pos - p).norm_square() <= r2 {
                        out.push((id, pos));
                    }
                }
            }
        }
        out
    }

    /// The `k` nearest agents to `p`, ascending by distance (ties broken by
    /// agent id).  Scans outward ring by ring until `k` hits cannot be beaten
    /// by anything in an unscanned ring.
    pub fn k_nearest(&self, p: Point, k: usize) -> Vec<(AgentId, Point)> {
        if k == 0 || self.entries.is_empty() {
            return Vec::new();
        }
        let center = self.cell_of(p);
        let mut hits: Vec<(f64, AgentId, Point)> = Vec::new();
        let mut ring = 0_i64;
        loop {
            let mut any_cell = false;
            for cx in (center.0 - ring)..=(center.0 + ring) {
                for cy in (center.1 - ring)..=(center.1 + ring) {
                    let on_ring =
                        (cx - center.0).abs() == ring || (cy - center.1).abs() == ring;
                    if !on_ring {
                        continue;
                    }
                    if let Some(bucket) = self.cells.get(&(cx, cy)) {
                        any_cell = true;
                        for &idx in bucket {
                            let (id, pos) = self.entries[idx];
                            hits.push(((pos - p).norm_square(), id, pos));
                        }
                    }
                }
            }
            // A ring at distance d can only contain points closer than
            // (d-1) * cell_size; once we have k hits within that bound, stop.
            let safe_dist = (ring.max(1) - 1) as f64 * self.cell_size;
            hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            if hits.len() >= k && hits[k - 1].0 <= safe_dist * safe_dist {
                break;
            }
            ring += 1;
            // All agents collected and no more occupied cells to find.
            if !any_cell && hits.len() == self.entries.len() {
                break;
            }
            if ring as usize > self.entries.len() + 2 && hits.len() == self.entries.len() {
                break;
            }
        }
        hits.truncate(k);
        hits.into_iter().map(|(_, id, pos)| (id, pos)).collect()
    }
}
