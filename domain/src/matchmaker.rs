use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::{
    MatchRequest, Millis, Room, SessionConfig, SessionEffect, TimedAction, UserId, UserIdentity, WireMessage,
};

/// Coordinator-free pairing over the shared matching topic.
///
/// Holds nothing but the "currently matching" flag and an epoch that invalidates
/// matching timeouts armed by earlier attempts.
pub struct Matchmaker {
    identity: UserIdentity,
    config: SessionConfig,
    rng: StdRng,
    matching: bool,
    epoch: u64,
}

impl Matchmaker {
    #[must_use]
    pub fn new(
        identity: UserIdentity,
        config: SessionConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            identity,
            config,
            rng,
            matching: false,
            epoch: 0,
        }
    }

    #[must_use]
    pub fn with_seed(
        identity: UserIdentity,
        config: SessionConfig,
        seed: u64,
    ) -> Self {
        Self::new(identity, config, StdRng::seed_from_u64(seed))
    }

    pub fn is_matching(&self) -> bool {
        self.matching
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Broadcasts a match request and arms the matching timeout.
    pub fn start(
        &mut self,
        now: Millis,
    ) -> Vec<SessionEffect> {
        self.matching = true;
        self.epoch += 1;
        info!(user_id = %self.identity.id, epoch = self.epoch, "Looking for an opponent");

        vec![
            SessionEffect::Publish {
                topic: self.config.topics.matching.clone(),
                message: WireMessage::RequestMatch(MatchRequest {
                    user_id: self.identity.id.clone(),
                    username: self.identity.name.clone(),
                    timestamp: now,
                }),
            },
            SessionEffect::DelayedAction {
                delay: self.config.matching_timeout,
                action: TimedAction::MatchingTimeout { epoch: self.epoch },
            },
        ]
    }

    /// Disarms the timeout and tells everyone we stopped looking.
    pub fn cancel(
        &mut self,
        now: Millis,
    ) -> Vec<SessionEffect> {
        self.finish();
        vec![SessionEffect::Publish {
            topic: self.config.topics.matching.clone(),
            message: WireMessage::CancelMatch {
                user_id: self.identity.id.clone(),
                timestamp: now,
            },
        }]
    }

    /// Ends the current attempt without publishing anything; any armed timeout goes stale.
    pub fn finish(&mut self) {
        self.matching = false;
        self.epoch += 1;
    }

    pub fn is_current(
        &self,
        epoch: u64,
    ) -> bool {
        self.epoch == epoch
    }

    /// Treats the first foreign request seen while matching as an acceptance and
    /// announces the synthesized room.
    ///
    /// Two participants matching at the same time can both land here for each other
    /// before either announcement propagates, producing two rooms for one pair. Clearing
    /// the flag right away only narrows that window.
    ///
    /// With three or more participants matching at once, a room synthesized here can
    /// seat someone who has already accepted a different room. The local side then
    /// plays against an absent opponent; if that opponent holds the turn, only leaving
    /// or starting a new game ends the session.
    pub fn on_match_request(
        &mut self,
        request: &MatchRequest,
        now: Millis,
    ) -> Vec<SessionEffect> {
        if request.user_id == self.identity.id {
            debug!("Ignoring own match request");
            return vec![];
        }
        if !self.matching {
            debug!(from = %request.user_id, "Not matching, ignoring match request");
            return vec![];
        }

        let room = Room::pair(
            &mut self.rng,
            &self.identity,
            request.user_id.clone(),
            request.username.clone(),
            now,
        );
        info!(room_id = %room.room_id, opponent = %request.username, "Paired, announcing room");

        // Only the flag: the timeout stays armed until our own announcement comes back.
        self.matching = false;

        vec![SessionEffect::Publish {
            topic: self.config.topics.matching.clone(),
            message: WireMessage::MatchSuccess { room, timestamp: now },
        }]
    }

    pub fn on_cancel_match(
        &self,
        user_id: &UserId,
    ) {
        debug!(from = %user_id, "Opponent candidate cancelled matching");
    }

    /// Whether an announced room seats the local participant.
    pub fn is_addressed_to_me(
        &self,
        room: &Room,
    ) -> bool {
        room.contains(&self.identity.id)
    }
}
