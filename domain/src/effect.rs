use std::time::Duration;

use serde::Serialize;

use crate::{PieceType, Position, SessionStatus, UserId, WireMessage};

/// I/O requested by the domain. The application layer performs these in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEffect {
    Publish { topic: String, message: WireMessage },
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    DelayedAction { delay: Duration, action: TimedAction },
    Notify(SessionEvent),
}

/// Work scheduled for later, fed back through `Peer::fire`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimedAction {
    /// Stale when the matchmaker epoch has moved on.
    MatchingTimeout { epoch: u64 },
    ReleaseRoom { topic: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    FiveInRow,
    Timeout,
    OpponentLeft,
    /// Announced by the other participant.
    Remote,
}

/// State changes surfaced to whatever renders the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    StatusChanged {
        status: SessionStatus,
    },
    PiecePlaced {
        user_id: UserId,
        position: Position,
        piece_type: PieceType,
    },
    TurnChanged {
        current_turn: UserId,
    },
    TimerTick {
        remaining: u32,
    },
    GameEnded {
        winner: UserId,
        reason: GameOverReason,
    },
    MatchingTimedOut,
    ConnectionChanged {
        connected: bool,
    },
}
