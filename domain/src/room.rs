use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Millis, PieceType, RoomId, SessionError, UserId, UserIdentity};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayer {
    pub user_id: UserId,
    pub username: String,
    pub piece_type: PieceType,
}

/// A two-player match as agreed over the matching topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: RoomId,
    pub players: [RoomPlayer; 2],
    pub current_turn: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<UserId>,
    pub start_time: Millis,
    #[serde(default)]
    pub last_move_time: Millis,
}

impl Room {
    /// Pairs the local participant with a remote one. A fair coin decides who plays
    /// Black, and Black moves first.
    pub fn pair<R: Rng + ?Sized>(
        rng: &mut R,
        local: &UserIdentity,
        remote_id: UserId,
        remote_name: String,
        now: Millis,
    ) -> Self {
        let local_is_black = rng.gen_bool(0.5);
        let (local_piece, remote_piece) = if local_is_black {
            (PieceType::Black, PieceType::White)
        } else {
            (PieceType::White, PieceType::Black)
        };
        let current_turn = if local_is_black {
            local.id.clone()
        } else {
            remote_id.clone()
        };

        Self {
            room_id: RoomId::from_rng(rng),
            players: [
                RoomPlayer {
                    user_id: local.id.clone(),
                    username: local.name.clone(),
                    piece_type: local_piece,
                },
                RoomPlayer {
                    user_id: remote_id,
                    username: remote_name,
                    piece_type: remote_piece,
                },
            ],
            current_turn,
            winner: None,
            start_time: now,
            last_move_time: now,
        }
    }

    /// Checks the invariants a room must satisfy before a session is built on it.
    pub fn validate(&self) -> Result<(), SessionError> {
        let [first, second] = &self.players;
        if first.user_id == second.user_id {
            return Err(SessionError::InvalidRoom(format!(
                "both seats taken by {}",
                first.user_id
            )));
        }
        if first.piece_type == second.piece_type {
            return Err(SessionError::InvalidRoom(format!(
                "both players hold {:?}",
                first.piece_type
            )));
        }
        if !self.contains(&self.current_turn) {
            return Err(SessionError::InvalidRoom(format!(
                "current turn {} is not a player",
                self.current_turn
            )));
        }
        if let Some(winner) = &self.winner
            && !self.contains(winner)
        {
            return Err(SessionError::InvalidRoom(format!("winner {winner} is not a player")));
        }
        Ok(())
    }

    pub fn contains(
        &self,
        user_id: &UserId,
    ) -> bool {
        self.player(user_id).is_some()
    }

    pub fn player(
        &self,
        user_id: &UserId,
    ) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| &p.user_id == user_id)
    }

    pub fn opponent_of(
        &self,
        user_id: &UserId,
    ) -> Option<&RoomPlayer> {
        if !self.contains(user_id) {
            return None;
        }
        self.players.iter().find(|p| &p.user_id != user_id)
    }

    pub fn piece_of(
        &self,
        user_id: &UserId,
    ) -> Option<PieceType> {
        self.player(user_id).map(|p| p.piece_type)
    }
}
