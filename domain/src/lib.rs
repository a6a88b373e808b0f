mod board;
mod config;
mod effect;
mod error;
mod matchmaker;
mod peer;
mod room;
pub mod router;
mod session;
mod timer;
mod types;
mod wire;

pub use board::{Board, InvalidPieceType, PieceType, Position};
pub use config::{BOARD_SIZE, SessionConfig, SessionStatus, Topics, WIN_LENGTH};
pub use effect::{GameOverReason, SessionEffect, SessionEvent, TimedAction};
pub use error::{RouteError, SessionError};
pub use matchmaker::Matchmaker;
pub use peer::{LocalAction, Peer, SessionSnapshot};
pub use room::{Room, RoomPlayer};
pub use router::{MatchingMessage, RoomMessage, Routed};
pub use session::Session;
pub use timer::TurnTimer;
pub use types::{Millis, RoomId, UserId, UserIdentity};
pub use wire::{Channel, MatchRequest, MessageKind, Move, WireMessage};
