use serde::{Deserialize, Serialize};

use crate::{Millis, PieceType, Position, Room, RouteError, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub user_id: UserId,
    pub username: String,
    pub timestamp: Millis,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub user_id: UserId,
    pub position: Position,
    pub piece_type: PieceType,
    pub timestamp: Millis,
}

/// Every payload exchanged over the transport. The `type` tag selects the variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WireMessage {
    RequestMatch(MatchRequest),
    CancelMatch { user_id: UserId, timestamp: Millis },
    MatchSuccess { room: Room, timestamp: Millis },
    PlacePiece(Move),
    GameOver { winner_id: UserId, timestamp: Millis },
    PlayerLeave { user_id: UserId, timestamp: Millis },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Matching,
    Room,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    RequestMatch,
    CancelMatch,
    MatchSuccess,
    PlacePiece,
    GameOver,
    PlayerLeave,
}

impl MessageKind {
    const ALL: [MessageKind; 6] = [
        MessageKind::RequestMatch,
        MessageKind::CancelMatch,
        MessageKind::MatchSuccess,
        MessageKind::PlacePiece,
        MessageKind::GameOver,
        MessageKind::PlayerLeave,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::RequestMatch => "request_match",
            MessageKind::CancelMatch => "cancel_match",
            MessageKind::MatchSuccess => "match_success",
            MessageKind::PlacePiece => "place_piece",
            MessageKind::GameOver => "game_over",
            MessageKind::PlayerLeave => "player_leave",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// The topic family this kind of message travels on.
    pub fn channel(self) -> Channel {
        match self {
            MessageKind::RequestMatch | MessageKind::CancelMatch | MessageKind::MatchSuccess => Channel::Matching,
            MessageKind::PlacePiece | MessageKind::GameOver | MessageKind::PlayerLeave => Channel::Room,
        }
    }
}

impl WireMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            WireMessage::RequestMatch(_) => MessageKind::RequestMatch,
            WireMessage::CancelMatch { .. } => MessageKind::CancelMatch,
            WireMessage::MatchSuccess { .. } => MessageKind::MatchSuccess,
            WireMessage::PlacePiece(_) => MessageKind::PlacePiece,
            WireMessage::GameOver { .. } => MessageKind::GameOver,
            WireMessage::PlayerLeave { .. } => MessageKind::PlayerLeave,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a payload, telling an unknown `type` apart from a broken known one.
    pub fn decode(payload: &[u8]) -> Result<Self, RouteError> {
        let value: serde_json::Value =
            serde_json::from_slice(payload).map_err(|e| RouteError::Malformed(e.to_string()))?;
        let Some(tag) = value.get("type").and_then(serde_json::Value::as_str) else {
            return Err(RouteError::Malformed("missing string field `type`".to_string()));
        };
        if MessageKind::parse(tag).is_none() {
            return Err(RouteError::UnknownType(tag.to_string()));
        }
        serde_json::from_value(value).map_err(|e| RouteError::Malformed(e.to_string()))
    }
}
