//! `ped-spatial` — the per-tick spatial index over agent positions.
//!
//! A uniform grid rebuilt from scratch once per tick.  Radius queries scan
//! the cells overlapping the query disk and filter by exact distance, so
//! there are no false negatives and false positives are bounded by the cell
//! size.  Correctness requires `cell_size ≥` the largest interaction radius
//! any parameter profile uses — checked once at construction, fail fast.

mod grid;

mod error;


pub use error::{SpatialError, SpatialResult};
pub use grid::NeighborhoodSearch;
