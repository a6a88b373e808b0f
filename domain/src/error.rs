use thiserror::Error;

use crate::{SessionStatus, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("action {action} not valid in status {status:?}")]
    InvalidStatus {
        action: &'static str,
        status: SessionStatus,
    },

    #[error("not your turn, waiting for {current_turn}")]
    NotYourTurn { current_turn: UserId },

    #[error("position ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("cell ({row}, {col}) is already occupied")]
    CellOccupied { row: usize, col: usize },

    #[error("participant {0} is not seated in the room")]
    NotInRoom(UserId),

    #[error("invalid room: {0}")]
    InvalidRoom(String),
}

/// Why an inbound (topic, payload) pair was dropped by the router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("unrecognized message type {0:?}")]
    UnknownType(String),

    #[error("topic {0:?} is not routed")]
    UnknownTopic(String),

    #[error("{kind} is not accepted on topic {topic:?}")]
    WrongTopic { kind: &'static str, topic: String },
}
