use crate::{Channel, MatchRequest, Move, Room, RouteError, Topics, UserId, WireMessage};

/// Messages accepted on the shared matching topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchingMessage {
    Request(MatchRequest),
    Cancel { user_id: UserId },
    Success { room: Room },
}

/// Messages accepted on a room topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomMessage {
    Move(Move),
    GameOver { winner_id: UserId },
    PlayerLeave { user_id: UserId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Routed {
    Matching(MatchingMessage),
    Room { room_id: String, message: RoomMessage },
}

/// Classifies an inbound payload by topic pattern and `type` tag.
pub fn classify(
    topics: &Topics,
    topic: &str,
    payload: &[u8],
) -> Result<Routed, RouteError> {
    let channel = if topic == topics.matching {
        Channel::Matching
    } else if topic.starts_with(&topics.room_prefix) {
        Channel::Room
    } else {
        return Err(RouteError::UnknownTopic(topic.to_string()));
    };

    let message = WireMessage::decode(payload)?;
    let kind = message.kind();
    if kind.channel() != channel {
        return Err(RouteError::WrongTopic {
            kind: kind.as_str(),
            topic: topic.to_string(),
        });
    }

    let routed = match message {
        WireMessage::RequestMatch(request) => Routed::Matching(MatchingMessage::Request(request)),
        WireMessage::CancelMatch { user_id, .. } => Routed::Matching(MatchingMessage::Cancel { user_id }),
        WireMessage::MatchSuccess { room, .. } => Routed::Matching(MatchingMessage::Success { room }),
        WireMessage::PlacePiece(mv) => room_message(topics, topic, RoomMessage::Move(mv)),
        WireMessage::GameOver { winner_id, .. } => room_message(topics, topic, RoomMessage::GameOver { winner_id }),
        WireMessage::PlayerLeave { user_id, .. } => {
            room_message(topics, topic, RoomMessage::PlayerLeave { user_id })
        }
    };
    Ok(routed)
}

fn room_message(
    topics: &Topics,
    topic: &str,
    message: RoomMessage,
) -> Routed {
    Routed::Room {
        room_id: topic[topics.room_prefix.len()..].to_string(),
        message,
    }
}
