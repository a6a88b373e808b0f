//! The per-match state machine: board, turn pointer, turn timer and termination.
//!
//! Every participant applies moves only when they come back over the room topic, so two
//! peers fed the same message sequence converge on the same board.


use tracing::{debug, info, warn};

use crate::{
    Board, GameOverReason, Millis, Move, PieceType, Position, Room, SessionConfig, SessionEffect, SessionError,
    SessionEvent, SessionStatus, TimedAction, TurnTimer, UserId, UserIdentity, WireMessage,
};

pub struct Session {
    identity: UserIdentity,
    config: SessionConfig,
    status: SessionStatus,
    room: Option<Room>,
    board: Board,
    my_piece: Option<PieceType>,
    timer: TurnTimer,
}

impl Session {
    #[must_use]
    pub fn new(
        identity: UserIdentity,
        config: SessionConfig,
    ) -> Self {
        let timer = TurnTimer::new(config.turn_seconds);
        Self {
            identity,
            config,
            status: SessionStatus::Idle,
            room: None,
            board: Board::new(),
            my_piece: None,
            timer,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn my_piece(&self) -> Option<PieceType> {
        self.my_piece
    }

    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }

    pub fn is_my_turn(&self) -> bool {
        self.room.as_ref().is_some_and(|room| room.current_turn == self.identity.id)
    }

    pub fn room_topic(&self) -> Option<String> {
        self.room.as_ref().map(|room| self.config.topics.room(&room.room_id))
    }

    fn require_status(
        &self,
        required: SessionStatus,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if self.status != required {
            return Err(SessionError::InvalidStatus {
                action,
                status: self.status,
            });
        }
        Ok(())
    }

    fn transition(
        &mut self,
        status: SessionStatus,
    ) -> Option<SessionEffect> {
        if self.status == status {
            return None;
        }
        debug!(from = ?self.status, to = ?status, "Session status change");
        self.status = status;
        Some(SessionEffect::Notify(SessionEvent::StatusChanged { status }))
    }

    /// Idle -> Matching. The only way into the matching region.
    pub fn begin_matching(&mut self) -> Result<Vec<SessionEffect>, SessionError> {
        self.require_status(SessionStatus::Idle, "start_matching")?;
        Ok(self.transition(SessionStatus::Matching).into_iter().collect())
    }

    /// Matching -> Idle.
    pub fn end_matching(&mut self) -> Result<Vec<SessionEffect>, SessionError> {
        self.require_status(SessionStatus::Matching, "cancel_matching")?;
        Ok(self.transition(SessionStatus::Idle).into_iter().collect())
    }

    /// Starts playing in `room`, replacing whatever the session held before.
    pub fn enter_playing(
        &mut self,
        mut room: Room,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        room.validate()?;
        let Some(my_piece) = room.piece_of(&self.identity.id) else {
            return Err(SessionError::NotInRoom(self.identity.id.clone()));
        };

        let topic = self.config.topics.room(&room.room_id);
        let current_turn = room.current_turn.clone();
        info!(room_id = %room.room_id, piece = ?my_piece, "Entering game");

        room.winner = None;
        room.last_move_time = room.start_time;
        self.room = Some(room);
        self.my_piece = Some(my_piece);
        self.board.clear();
        self.timer.start();

        let mut effects = vec![SessionEffect::Subscribe { topic }];
        effects.extend(self.transition(SessionStatus::Playing));
        effects.push(SessionEffect::Notify(SessionEvent::TurnChanged { current_turn }));
        Ok(effects)
    }

    /// Validates a local move and publishes it. The board changes only when the move
    /// comes back from the room topic.
    pub fn place_piece(
        &self,
        row: usize,
        col: usize,
        now: Millis,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        self.require_status(SessionStatus::Playing, "place_piece")?;
        let (Some(room), Some(piece_type)) = (self.room.as_ref(), self.my_piece) else {
            return Err(SessionError::NotInRoom(self.identity.id.clone()));
        };
        if room.current_turn != self.identity.id {
            return Err(SessionError::NotYourTurn {
                current_turn: room.current_turn.clone(),
            });
        }
        let position = Position::new(row, col);
        if !position.in_bounds() {
            return Err(SessionError::OutOfBounds { row, col });
        }
        if !self.board.is_empty_at(position) {
            return Err(SessionError::CellOccupied { row, col });
        }

        Ok(vec![SessionEffect::Publish {
            topic: self.config.topics.room(&room.room_id),
            message: WireMessage::PlacePiece(Move {
                user_id: self.identity.id.clone(),
                position,
                piece_type,
                timestamp: now,
            }),
        }])
    }

    /// Applies a move received over the room topic, hands the turn over and checks for
    /// five in a row.
    pub fn on_move_placed(
        &mut self,
        mv: &Move,
        now: Millis,
    ) -> Vec<SessionEffect> {
        if self.status != SessionStatus::Playing {
            debug!(status = ?self.status, "Not playing, ignoring move");
            return vec![];
        }
        let Some(room) = self.room.as_mut() else {
            return vec![];
        };
        let Some(next) = room.opponent_of(&mv.user_id).map(|p| p.user_id.clone()) else {
            warn!(user_id = %mv.user_id, "Move from a participant outside the room, dropping");
            return vec![];
        };
        if let Err(e) = self.board.place(mv.position, mv.piece_type) {
            warn!(error = %e, "Dropping move");
            return vec![];
        }

        room.current_turn = next.clone();
        room.last_move_time = mv.timestamp;
        self.timer.reset();

        let mut effects = vec![
            SessionEffect::Notify(SessionEvent::PiecePlaced {
                user_id: mv.user_id.clone(),
                position: mv.position,
                piece_type: mv.piece_type,
            }),
            SessionEffect::Notify(SessionEvent::TurnChanged { current_turn: next }),
        ];

        if self.board.is_winning_move(mv.position, mv.piece_type) {
            effects.extend(self.on_game_over(mv.user_id.clone(), GameOverReason::FiveInRow, now));
        }
        effects
    }

    /// Terminates the match once. Later calls are no-ops whatever winner they carry.
    pub fn on_game_over(
        &mut self,
        winner_id: UserId,
        reason: GameOverReason,
        now: Millis,
    ) -> Vec<SessionEffect> {
        if self.status == SessionStatus::GameOver {
            debug!(winner = %winner_id, "Game already over, ignoring");
            return vec![];
        }
        if self.status != SessionStatus::Playing {
            debug!(status = ?self.status, "No game in progress, ignoring game over");
            return vec![];
        }
        let Some(topic) = self.room_topic() else {
            return vec![];
        };
        if !self.room.as_ref().is_some_and(|room| room.contains(&winner_id)) {
            warn!(winner = %winner_id, "Game over names a winner outside the room, dropping");
            return vec![];
        }

        if let Some(room) = self.room.as_mut() {
            room.winner.get_or_insert_with(|| winner_id.clone());
        }
        self.timer.stop();
        info!(winner = %winner_id, reason = ?reason, "Game over");

        let mut effects: Vec<SessionEffect> = self.transition(SessionStatus::GameOver).into_iter().collect();
        effects.push(SessionEffect::Notify(SessionEvent::GameEnded {
            winner: winner_id.clone(),
            reason,
        }));
        effects.push(SessionEffect::Publish {
            topic: topic.clone(),
            message: WireMessage::GameOver {
                winner_id,
                timestamp: now,
            },
        });
        effects.push(SessionEffect::DelayedAction {
            delay: self.config.release_grace,
            action: TimedAction::ReleaseRoom { topic },
        });
        effects
    }

    pub fn on_player_leave(
        &mut self,
        user_id: &UserId,
        now: Millis,
    ) -> Vec<SessionEffect> {
        if self.status != SessionStatus::Playing {
            debug!(status = ?self.status, "Not playing, ignoring player_leave");
            return vec![];
        }
        let Some(remaining) = self
            .room
            .as_ref()
            .and_then(|room| room.opponent_of(user_id))
            .map(|p| p.user_id.clone())
        else {
            debug!(user_id = %user_id, "player_leave for someone outside the room");
            return vec![];
        };
        self.on_game_over(remaining, GameOverReason::OpponentLeft, now)
    }

    /// Counts the turn timer down. Running out on our own turn hands the game to the
    /// opponent; the opponent's clock is theirs to enforce.
    pub fn tick(
        &mut self,
        elapsed_secs: u32,
        now: Millis,
    ) -> Vec<SessionEffect> {
        if self.status != SessionStatus::Playing || !self.timer.tick(elapsed_secs) {
            return vec![];
        }
        let mut effects = vec![SessionEffect::Notify(SessionEvent::TimerTick {
            remaining: self.timer.remaining(),
        })];

        if self.timer.is_expired() && self.is_my_turn() {
            let opponent = self
                .room
                .as_ref()
                .and_then(|room| room.opponent_of(&self.identity.id))
                .map(|p| p.user_id.clone());
            if let Some(opponent) = opponent {
                info!("Turn timer expired, forfeiting");
                effects.extend(self.on_game_over(opponent, GameOverReason::Timeout, now));
            }
        }
        effects
    }

    /// The `player_leave` notice, only while a game is in progress.
    pub fn announce_leave(
        &self,
        now: Millis,
    ) -> Vec<SessionEffect> {
        match (self.status, self.room_topic()) {
            (SessionStatus::Playing, Some(topic)) => vec![SessionEffect::Publish {
                topic,
                message: WireMessage::PlayerLeave {
                    user_id: self.identity.id.clone(),
                    timestamp: now,
                },
            }],
            _ => vec![],
        }
    }

    /// Drops the room subscription and returns to Idle defaults.
    pub fn reset(&mut self) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        if let Some(topic) = self.room_topic() {
            effects.push(SessionEffect::Unsubscribe { topic });
        }
        self.room = None;
        self.board.clear();
        self.my_piece = None;
        self.timer = TurnTimer::new(self.config.turn_seconds);
        effects.extend(self.transition(SessionStatus::Idle));
        effects
    }
}
