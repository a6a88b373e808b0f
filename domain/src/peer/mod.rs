//! One participant: matchmaker and session behind a single event-in, effects-out API.

#[cfg(test)]
mod tests;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::router::{self, MatchingMessage, RoomMessage, Routed};
use crate::{
    Board, GameOverReason, Matchmaker, Millis, PieceType, Room, Session, SessionConfig, SessionEffect, SessionError,
    SessionEvent, SessionStatus, TimedAction, UserIdentity,
};

/// Local commands issued by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalAction {
    StartMatching,
    CancelMatching,
    PlacePiece { row: usize, col: usize },
    LeaveGame,
    StartNewGame,
}

/// Read-only view for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub room: Option<Room>,
    pub board: Board,
    pub my_piece: Option<PieceType>,
    pub remaining_seconds: u32,
    pub connected: bool,
}

pub struct Peer {
    identity: UserIdentity,
    config: SessionConfig,
    matchmaker: Matchmaker,
    session: Session,
    connected: bool,
}

impl Peer {
    #[must_use]
    pub fn new(
        identity: UserIdentity,
        config: SessionConfig,
    ) -> Self {
        Self::with_rng(identity, config, StdRng::from_entropy())
    }

    /// Deterministic pairing, for replayable simulations.
    #[must_use]
    pub fn with_seed(
        identity: UserIdentity,
        config: SessionConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(identity, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        identity: UserIdentity,
        config: SessionConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            matchmaker: Matchmaker::new(identity.clone(), config.clone(), rng),
            session: Session::new(identity.clone(), config.clone()),
            identity,
            config,
            connected: false,
        }
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.session.status(),
            room: self.session.room().cloned(),
            board: self.session.board().clone(),
            my_piece: self.session.my_piece(),
            remaining_seconds: self.session.timer().remaining(),
            connected: self.connected,
        }
    }

    pub fn process_action(
        &mut self,
        action: LocalAction,
        now: Millis,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        match action {
            LocalAction::StartMatching => self.start_matching(now),
            LocalAction::CancelMatching => self.cancel_matching(now),
            LocalAction::PlacePiece { row, col } => self.session.place_piece(row, col, now),
            LocalAction::LeaveGame => Ok(self.leave_game(now)),
            LocalAction::StartNewGame => Ok(self.start_new_game(now)),
        }
    }

    pub fn on_connected(&mut self) -> Vec<SessionEffect> {
        info!(user_id = %self.identity.id, "Transport connected");
        self.connected = true;
        vec![
            SessionEffect::Subscribe {
                topic: self.config.topics.matching.clone(),
            },
            SessionEffect::Notify(SessionEvent::ConnectionChanged { connected: true }),
        ]
    }

    pub fn on_disconnected(&mut self) -> Vec<SessionEffect> {
        if !self.connected {
            return vec![];
        }
        warn!(user_id = %self.identity.id, "Transport disconnected");
        self.connected = false;
        vec![SessionEffect::Notify(SessionEvent::ConnectionChanged { connected: false })]
    }

    pub fn start_matching(
        &mut self,
        now: Millis,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let mut effects = self.session.begin_matching()?;
        effects.extend(self.matchmaker.start(now));
        Ok(effects)
    }

    pub fn cancel_matching(
        &mut self,
        now: Millis,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let mut effects = self.session.end_matching()?;
        effects.extend(self.matchmaker.cancel(now));
        Ok(effects)
    }

    pub fn leave_game(
        &mut self,
        now: Millis,
    ) -> Vec<SessionEffect> {
        let mut effects = self.cancel_matching(now).unwrap_or_default();
        effects.extend(self.session.announce_leave(now));
        effects.extend(self.session.reset());
        effects
    }

    pub fn start_new_game(
        &mut self,
        now: Millis,
    ) -> Vec<SessionEffect> {
        let mut effects = self.cancel_matching(now).unwrap_or_default();
        self.matchmaker.finish();
        effects.extend(self.session.reset());
        effects
    }

    /// Advances the turn timer by whole seconds.
    pub fn tick(
        &mut self,
        elapsed_secs: u32,
        now: Millis,
    ) -> Vec<SessionEffect> {
        self.session.tick(elapsed_secs, now)
    }

    /// Runs a delayed action that has come due.
    pub fn fire(
        &mut self,
        action: TimedAction,
        now: Millis,
    ) -> Vec<SessionEffect> {
        match action {
            TimedAction::MatchingTimeout { epoch } => {
                if self.session.status() != SessionStatus::Matching || !self.matchmaker.is_current(epoch) {
                    debug!(epoch, "Stale matching timeout");
                    return vec![];
                }
                info!("Matching timed out");
                let mut effects = self.cancel_matching(now).unwrap_or_default();
                effects.push(SessionEffect::Notify(SessionEvent::MatchingTimedOut));
                effects
            }
            TimedAction::ReleaseRoom { topic } => {
                let in_use = self.session.status() == SessionStatus::Playing
                    && self.session.room_topic().as_deref() == Some(topic.as_str());
                if in_use {
                    return vec![];
                }
                vec![SessionEffect::Unsubscribe { topic }]
            }
        }
    }

    /// Routes one inbound transport message. Anything that cannot be routed is logged
    /// and dropped.
    pub fn dispatch(
        &mut self,
        topic: &str,
        payload: &[u8],
        now: Millis,
    ) -> Vec<SessionEffect> {
        match router::classify(&self.config.topics, topic, payload) {
            Ok(Routed::Matching(message)) => self.on_matching_message(message, now),
            Ok(Routed::Room { room_id, message }) => self.on_room_message(&room_id, message, now),
            Err(e) => {
                warn!(topic, error = %e, "Dropping inbound message");
                vec![]
            }
        }
    }

    fn on_matching_message(
        &mut self,
        message: MatchingMessage,
        now: Millis,
    ) -> Vec<SessionEffect> {
        match message {
            MatchingMessage::Request(request) => self.matchmaker.on_match_request(&request, now),
            MatchingMessage::Cancel { user_id } => {
                self.matchmaker.on_cancel_match(&user_id);
                vec![]
            }
            MatchingMessage::Success { room } => self.on_match_success(room),
        }
    }

    fn on_match_success(
        &mut self,
        room: Room,
    ) -> Vec<SessionEffect> {
        if !self.matchmaker.is_addressed_to_me(&room) {
            debug!(room_id = %room.room_id, "match_success for other players");
            return vec![];
        }
        if let Err(e) = room.validate() {
            warn!(room_id = %room.room_id, error = %e, "Dropping match_success");
            return vec![];
        }
        if self.session.status() == SessionStatus::Playing {
            let current = self.session.room().map(|r| r.room_id.to_string()).unwrap_or_default();
            warn!(room_id = %room.room_id, current = %current, "Already playing, ignoring duplicate pairing");
            return vec![];
        }

        self.matchmaker.finish();
        match self.session.enter_playing(room) {
            Ok(effects) => effects,
            Err(e) => {
                warn!(error = %e, "Could not enter game");
                vec![]
            }
        }
    }

    fn on_room_message(
        &mut self,
        room_id: &str,
        message: RoomMessage,
        now: Millis,
    ) -> Vec<SessionEffect> {
        if self.session.status() == SessionStatus::GameOver {
            debug!(room_id, "Game over, ignoring room message");
            return vec![];
        }
        let current = self.session.room().map(|room| room.room_id.to_string());
        if current.as_deref() != Some(room_id) {
            debug!(room_id, "Message for a room we are not in");
            return vec![];
        }

        match message {
            RoomMessage::Move(mv) => self.session.on_move_placed(&mv, now),
            RoomMessage::GameOver { winner_id } => self.session.on_game_over(winner_id, GameOverReason::Remote, now),
            RoomMessage::PlayerLeave { user_id } => self.session.on_player_leave(&user_id, now),
        }
    }
}
