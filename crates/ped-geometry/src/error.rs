use ped_core::{CrossingId, RoomId, SubRoomId, TrackId, TrainId, TransitionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("unknown transition {0}")]
    UnknownTransition(TransitionId),

    #[error("unknown crossing {0}")]
    UnknownCrossing(CrossingId),

    #[error("unknown room {0}")]
    UnknownRoom(RoomId),

    #[error("unknown subroom {0} in room {1}")]
    UnknownSubRoom(SubRoomId, RoomId),

    #[error("unknown track {0}")]
    UnknownTrack(TrackId),

    #[error("no active train {0}")]
    UnknownTrain(TrainId),

    #[error("train {0} is already active")]
    TrainAlreadyActive(TrainId),

    #[error("train door at offset {offset} (width {width}) does not fit the track wall of length {wall_length}")]
    DoorOutsideTrack {
        offset: f64,
        width: f64,
        wall_length: f64,
    },

    #[error("wall to remove not present in subroom {1} of room {0}")]
    WallNotFound(RoomId, SubRoomId),

    #[error("building definition error: {0}")]
    Definition(String),
}

pub type GeometryResult<T> = Result<T, GeometryError>;
