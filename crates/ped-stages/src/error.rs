use ped_core::StageId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("unknown stage id {0}")]
    UnknownStage(StageId),

    #[error("round-robin transition of stage {0} has no arms")]
    EmptyRoundRobin(StageId),

    #[error("round-robin weight for stage {0} must be a positive integer")]
    NonPositiveWeight(StageId),

    #[error("stage needs at least one slot")]
    NoSlots,

    #[error("exit polygon must have at least 3 vertices")]
    DegenerateExit,
}

pub type StageResult<T> = Result<T, StageError>;
