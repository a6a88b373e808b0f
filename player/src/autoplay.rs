use rand::Rng;
use tracing::{debug, info, warn};

use application::ports::out_::SessionNotification;
use domain::{LocalAction, SessionEvent, SessionSnapshot, SessionStatus, UserId};

use crate::strategy::choose_move;

/// Decides what to do next from session notifications: match on connect, retry when
/// matching times out, move on its own turn, and queue up again until enough games are
/// played.
pub struct AutoPlayer<R> {
    me: UserId,
    games: u32,
    played: u32,
    won: u32,
    done: bool,
    rng: R,
}

impl<R: Rng> AutoPlayer<R> {
    pub fn new(
        me: UserId,
        games: u32,
        rng: R,
    ) -> Self {
        Self {
            me,
            games,
            played: 0,
            won: 0,
            done: games == 0,
            rng,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn played(&self) -> u32 {
        self.played
    }

    pub fn won(&self) -> u32 {
        self.won
    }

    pub fn react(
        &mut self,
        notification: &SessionNotification,
        snapshot: &SessionSnapshot,
    ) -> Vec<LocalAction> {
        let event = match notification {
            SessionNotification::SessionEvent(event) => event,
            SessionNotification::ActionRefused(reason) => {
                debug!(reason = %reason, "Action refused");
                return vec![];
            }
        };

        match event {
            SessionEvent::ConnectionChanged { connected: true } => {
                info!("Connected, looking for an opponent");
                vec![LocalAction::StartMatching]
            }
            SessionEvent::ConnectionChanged { connected: false } => {
                warn!("Lost the relay connection");
                self.done = true;
                vec![]
            }
            SessionEvent::MatchingTimedOut => {
                info!("Nobody answered, asking again");
                vec![LocalAction::StartMatching]
            }
            SessionEvent::TurnChanged { current_turn }
                if *current_turn == self.me && snapshot.status == SessionStatus::Playing =>
            {
                choose_move(&snapshot.board, &mut self.rng)
                    .map(|position| LocalAction::PlacePiece {
                        row: position.row,
                        col: position.col,
                    })
                    .into_iter()
                    .collect()
            }
            SessionEvent::GameEnded { winner, reason } => {
                self.played += 1;
                let won = *winner == self.me;
                if won {
                    self.won += 1;
                }
                info!(won, reason = ?reason, played = self.played, "Game finished");
                if self.played >= self.games {
                    self.done = true;
                    return vec![];
                }
                vec![LocalAction::StartNewGame, LocalAction::StartMatching]
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use domain::{Board, GameOverReason};

    use super::*;

    fn player(games: u32) -> AutoPlayer<StdRng> {
        AutoPlayer::new(UserId::from("me"), games, StdRng::seed_from_u64(1))
    }

    fn snapshot(status: SessionStatus) -> SessionSnapshot {
        SessionSnapshot {
            status,
            room: None,
            board: Board::new(),
            my_piece: None,
            remaining_seconds: 30,
            connected: true,
        }
    }

    fn event(event: SessionEvent) -> SessionNotification {
        SessionNotification::SessionEvent(event)
    }

    #[test]
    fn test_matches_on_connect_and_after_timeout() {
        let mut p = player(1);
        let idle = snapshot(SessionStatus::Idle);

        let actions = p.react(&event(SessionEvent::ConnectionChanged { connected: true }), &idle);
        assert_eq!(actions, vec![LocalAction::StartMatching]);

        let actions = p.react(&event(SessionEvent::MatchingTimedOut), &idle);
        assert_eq!(actions, vec![LocalAction::StartMatching]);
    }

    #[test]
    fn test_moves_only_on_own_turn() {
        let mut p = player(1);
        let playing = snapshot(SessionStatus::Playing);

        let mine = p.react(
            &event(SessionEvent::TurnChanged {
                current_turn: UserId::from("me"),
            }),
            &playing,
        );
        assert_eq!(mine, vec![LocalAction::PlacePiece { row: 7, col: 7 }]);

        let theirs = p.react(
            &event(SessionEvent::TurnChanged {
                current_turn: UserId::from("them"),
            }),
            &playing,
        );
        assert!(theirs.is_empty());

        let over = p.react(
            &event(SessionEvent::TurnChanged {
                current_turn: UserId::from("me"),
            }),
            &snapshot(SessionStatus::GameOver),
        );
        assert!(over.is_empty());
    }

    #[test]
    fn test_counts_games_and_stops() {
        let mut p = player(2);
        let over = snapshot(SessionStatus::GameOver);
        let ended = |winner: &str| {
            event(SessionEvent::GameEnded {
                winner: UserId::from(winner),
                reason: GameOverReason::FiveInRow,
            })
        };

        let again = p.react(&ended("me"), &over);
        assert_eq!(again, vec![LocalAction::StartNewGame, LocalAction::StartMatching]);
        assert!(!p.is_done());

        assert!(p.react(&ended("them"), &over).is_empty());
        assert!(p.is_done());
        assert_eq!((p.played(), p.won()), (2, 1));
    }

    #[test]
    fn test_disconnect_and_refusals() {
        let mut p = player(3);
        let idle = snapshot(SessionStatus::Idle);

        assert!(p.react(&SessionNotification::ActionRefused("no".to_string()), &idle).is_empty());
        assert!(!p.is_done());

        p.react(&event(SessionEvent::ConnectionChanged { connected: false }), &idle);
        assert!(p.is_done());
    }
}
