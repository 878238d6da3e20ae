use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("grid cell size {cell_size} is smaller than the interaction range {interaction_range}; radius queries would miss neighbors")]
    CellSizeTooSmall {
        cell_size: f64,
        interaction_range: f64,
    },

    #[error("cell size must be positive, got {0}")]
    NonPositiveCellSize(f64),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
