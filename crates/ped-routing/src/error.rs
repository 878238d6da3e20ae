use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("floor-field cell size must be positive, got {0}")]
    InvalidCellSize(f64),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
