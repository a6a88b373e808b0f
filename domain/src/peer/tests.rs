//! Multi-participant scenarios over a simulated broker that keeps one publish order per
//! topic and echoes publishes back to the publisher, like the real transport.

use std::collections::{HashSet, VecDeque};

use crate::*;

const MATCHING: &str = "wuziqi/matching_channel";

struct Net {
    peers: Vec<Peer>,
    subscriptions: Vec<HashSet<String>>,
    in_flight: VecDeque<(String, String)>,
    published: Vec<(usize, String, WireMessage)>,
    delayed: Vec<(usize, TimedAction)>,
    events: Vec<(usize, SessionEvent)>,
    now: Millis,
}

impl Net {
    fn new(names: &[&str]) -> Self {
        let peers: Vec<Peer> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Peer::with_seed(UserIdentity::new(*name, name.to_uppercase()), SessionConfig::default(), i as u64 + 1)
            })
            .collect();
        let mut net = Self {
            subscriptions: vec![HashSet::new(); peers.len()],
            peers,
            in_flight: VecDeque::new(),
            published: Vec::new(),
            delayed: Vec::new(),
            events: Vec::new(),
            now: 1_000,
        };
        for idx in 0..net.peers.len() {
            let effects = net.peers[idx].on_connected();
            net.apply(idx, effects);
        }
        net
    }

    fn id(
        &self,
        idx: usize,
    ) -> UserId {
        self.peers[idx].identity().id.clone()
    }

    fn apply(
        &mut self,
        idx: usize,
        effects: Vec<SessionEffect>,
    ) {
        for effect in effects {
            match effect {
                SessionEffect::Publish { topic, message } => {
                    let payload = message.encode().unwrap();
                    self.published.push((idx, topic.clone(), message));
                    self.in_flight.push_back((topic, payload));
                }
                SessionEffect::Subscribe { topic } => {
                    self.subscriptions[idx].insert(topic);
                }
                SessionEffect::Unsubscribe { topic } => {
                    self.subscriptions[idx].remove(&topic);
                }
                SessionEffect::DelayedAction { action, .. } => self.delayed.push((idx, action)),
                SessionEffect::Notify(event) => self.events.push((idx, event)),
            }
        }
    }

    fn act(
        &mut self,
        idx: usize,
        action: LocalAction,
    ) -> Result<(), SessionError> {
        self.now += 1;
        let effects = self.peers[idx].process_action(action, self.now)?;
        self.apply(idx, effects);
        Ok(())
    }

    /// Delivers the oldest in-flight message to every current subscriber.
    fn deliver_one(&mut self) -> bool {
        let Some((topic, payload)) = self.in_flight.pop_front() else {
            return false;
        };
        self.now += 1;
        for idx in 0..self.peers.len() {
            if self.subscriptions[idx].contains(&topic) {
                let effects = self.peers[idx].dispatch(&topic, payload.as_bytes(), self.now);
                self.apply(idx, effects);
            }
        }
        true
    }

    fn deliver_all(&mut self) {
        while self.deliver_one() {}
    }

    fn tick(
        &mut self,
        idx: usize,
        secs: u32,
    ) {
        self.now += u64::from(secs) * 1_000;
        let effects = self.peers[idx].tick(secs, self.now);
        self.apply(idx, effects);
    }

    fn fire_delayed(&mut self) {
        for (idx, action) in std::mem::take(&mut self.delayed) {
            let effects = self.peers[idx].fire(action, self.now);
            self.apply(idx, effects);
        }
    }

    fn rooms_announced(&self) -> usize {
        self.published
            .iter()
            .filter(|(_, _, m)| matches!(m, WireMessage::MatchSuccess { .. }))
            .count()
    }

    fn published_by(
        &self,
        idx: usize,
    ) -> Vec<&WireMessage> {
        self.published.iter().filter(|(i, _, _)| *i == idx).map(|(_, _, m)| m).collect()
    }

    /// Plays a started match between peers 0 and 1 by feeding moves until the game ends.
    fn play_move(
        &mut self,
        row: usize,
        col: usize,
    ) {
        let mover = (0..2).find(|&i| self.peers[i].session().is_my_turn()).expect("nobody to move");
        self.act(mover, LocalAction::PlacePiece { row, col }).expect("legal move");
        self.deliver_all();
    }

    fn matched_pair() -> Self {
        let mut net = Net::new(&["alice", "bob"]);
        net.act(0, LocalAction::StartMatching).unwrap();
        net.deliver_all();
        net.act(1, LocalAction::StartMatching).unwrap();
        net.deliver_all();
        net
    }
}

/// Describes how two participants' views of their shared match differ, if they do.
fn divergence(
    a: &Peer,
    b: &Peer,
) -> Option<String> {
    let (sa, sb) = (a.snapshot(), b.snapshot());
    match (&sa.room, &sb.room) {
        (Some(ra), Some(rb)) if ra.room_id != rb.room_id => {
            Some(format!("rooms differ: {} vs {}", ra.room_id, rb.room_id))
        }
        (Some(ra), Some(rb)) if ra.current_turn != rb.current_turn => {
            Some(format!("turns differ: {} vs {}", ra.current_turn, rb.current_turn))
        }
        (Some(ra), Some(rb)) if ra.winner != rb.winner => Some(format!("winners differ: {:?} vs {:?}", ra.winner, rb.winner)),
        (Some(_), Some(_)) if sa.board != sb.board => Some("boards differ".to_string()),
        (Some(_), None) | (None, Some(_)) => Some("only one side has a room".to_string()),
        _ => None,
    }
}

#[track_caller]
fn assert_consistent(net: &Net) {
    if let Some(diff) = divergence(&net.peers[0], &net.peers[1]) {
        panic!("participants diverged: {diff}");
    }
}

#[test]
fn test_sequential_matching_forms_one_room() {
    let net = Net::matched_pair();

    assert_eq!(net.rooms_announced(), 1);
    assert_eq!(net.peers[0].status(), SessionStatus::Playing);
    assert_eq!(net.peers[1].status(), SessionStatus::Playing);
    assert_consistent(&net);

    let room = net.peers[0].snapshot().room.unwrap();
    let pieces: HashSet<_> = room.players.iter().map(|p| p.piece_type).collect();
    assert_eq!(pieces.len(), 2);
    assert_ne!(net.peers[0].session().my_piece(), net.peers[1].session().my_piece());
}

#[test]
fn test_simultaneous_matching_race_converges_on_first_announcement() {
    let mut net = Net::new(&["alice", "bob"]);
    net.act(0, LocalAction::StartMatching).unwrap();
    net.act(1, LocalAction::StartMatching).unwrap();
    net.deliver_all();

    // Both requests crossed before either announcement: each side built its own room.
    assert_eq!(net.rooms_announced(), 2, "expected the double-pairing race to occur");

    assert_eq!(net.peers[0].status(), SessionStatus::Playing);
    assert_eq!(net.peers[1].status(), SessionStatus::Playing);
    assert_consistent(&net);

    let first_announced = net
        .published
        .iter()
        .find_map(|(_, _, m)| match m {
            WireMessage::MatchSuccess { room, .. } => Some(room.room_id),
            _ => None,
        })
        .unwrap();
    assert_eq!(net.peers[0].snapshot().room.unwrap().room_id, first_announced);
}

#[test]
fn test_divergence_is_flagged_when_announcements_arrive_in_different_orders() {
    let mut net = Net::new(&["alice", "bob"]);
    net.act(0, LocalAction::StartMatching).unwrap();
    net.act(1, LocalAction::StartMatching).unwrap();
    // Deliver only the two requests; keep the announcements back.
    net.deliver_one();
    net.deliver_one();
    let announcements: Vec<(String, String)> = net.in_flight.drain(..).collect();
    assert_eq!(announcements.len(), 2);

    // A transport without a common per-topic order hands each side a different first room.
    let (first, second) = (&announcements[0], &announcements[1]);
    net.now += 1;
    let now = net.now;
    let fx = net.peers[0].dispatch(&first.0, first.1.as_bytes(), now);
    net.apply(0, fx);
    let fx = net.peers[1].dispatch(&second.0, second.1.as_bytes(), now);
    net.apply(1, fx);

    let diff = divergence(&net.peers[0], &net.peers[1]);
    assert!(diff.is_some(), "expected divergent rooms to be detected");
    assert!(diff.unwrap().starts_with("rooms differ"));
}

#[test]
fn test_match_success_for_others_is_ignored() {
    let mut net = Net::new(&["alice", "bob", "carol"]);
    net.act(0, LocalAction::StartMatching).unwrap();
    net.deliver_all();
    net.act(1, LocalAction::StartMatching).unwrap();
    net.deliver_all();

    assert_eq!(net.peers[2].status(), SessionStatus::Idle);
    assert!(net.peers[2].snapshot().room.is_none());

    // Carol starts looking later; nobody is matching anymore, so she stays matching.
    net.act(2, LocalAction::StartMatching).unwrap();
    net.deliver_all();
    assert_eq!(net.peers[2].status(), SessionStatus::Matching);
}

#[test]
fn test_full_game_to_five_in_a_row() {
    let mut net = Net::matched_pair();
    let black = (0..2)
        .find(|&i| net.peers[i].session().my_piece() == Some(PieceType::Black))
        .unwrap();
    let white = 1 - black;

    for col in 0..4 {
        net.play_move(7, col); // black
        net.play_move(9, col); // white
        assert_consistent(&net);
    }
    net.play_move(7, 4);

    assert_consistent(&net);
    for idx in 0..2 {
        assert_eq!(net.peers[idx].status(), SessionStatus::GameOver);
        assert_eq!(net.peers[idx].snapshot().room.unwrap().winner, Some(net.id(black)));
    }
    assert_eq!(net.peers[0].session().board().occupied(), 9);

    // Both sides announce the result once; the second announcement is absorbed.
    for idx in [black, white] {
        let announced = net
            .published_by(idx)
            .into_iter()
            .filter(|m| matches!(m, WireMessage::GameOver { .. }))
            .count();
        assert_eq!(announced, 1);
    }

    // Grace period over: both drop the room topic.
    net.fire_delayed();
    assert!(net.subscriptions.iter().all(|subs| subs.len() == 1 && subs.contains(MATCHING)));
}

#[test]
fn test_turn_timeout_forfeits_for_both_sides() {
    let mut net = Net::matched_pair();
    let to_move = (0..2).find(|&i| net.peers[i].session().is_my_turn()).unwrap();
    let other = 1 - to_move;

    net.tick(other, 30);
    assert_eq!(net.peers[other].status(), SessionStatus::Playing);

    net.tick(to_move, 30);
    net.deliver_all();

    for idx in 0..2 {
        assert_eq!(net.peers[idx].status(), SessionStatus::GameOver);
        assert_eq!(net.peers[idx].snapshot().room.unwrap().winner, Some(net.id(other)));
    }
}

#[test]
fn test_leave_game_publishes_leave_and_resets() {
    let mut net = Net::matched_pair();
    let room_topic = net.peers[0].session().room_topic().unwrap();

    net.act(0, LocalAction::LeaveGame).unwrap();
    assert!(matches!(
        net.published.last(),
        Some((0, topic, WireMessage::PlayerLeave { user_id, .. })) if *topic == room_topic && *user_id == net.id(0)
    ));

    let snapshot = net.peers[0].snapshot();
    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert!(snapshot.room.is_none());
    assert_eq!(snapshot.board, Board::new());
    assert!(!net.subscriptions[0].contains(&room_topic));

    net.deliver_all();
    assert_eq!(net.peers[1].status(), SessionStatus::GameOver);
    assert_eq!(net.peers[1].snapshot().room.unwrap().winner, Some(net.id(1)));
}

#[test]
fn test_start_matching_guarded_by_status() {
    let mut net = Net::new(&["alice"]);
    net.act(0, LocalAction::StartMatching).unwrap();
    let again = net.act(0, LocalAction::StartMatching);
    assert_eq!(
        again,
        Err(SessionError::InvalidStatus {
            action: "start_matching",
            status: SessionStatus::Matching,
        })
    );
    let requests = net
        .published
        .iter()
        .filter(|(_, _, m)| matches!(m, WireMessage::RequestMatch(_)))
        .count();
    assert_eq!(requests, 1);

    let not_matching = Net::new(&["bob"]).act(0, LocalAction::CancelMatching);
    assert!(matches!(not_matching, Err(SessionError::InvalidStatus { .. })));
}

#[test]
fn test_matching_timeout_and_stale_timeouts() {
    let mut net = Net::new(&["alice"]);
    net.act(0, LocalAction::StartMatching).unwrap();
    net.act(0, LocalAction::CancelMatching).unwrap();
    net.act(0, LocalAction::StartMatching).unwrap();
    assert_eq!(net.delayed.len(), 2);

    net.fire_delayed();
    assert_eq!(net.peers[0].status(), SessionStatus::Idle);
    let timeouts = net.events.iter().filter(|(_, e)| *e == SessionEvent::MatchingTimedOut).count();
    assert_eq!(timeouts, 1, "only the latest attempt may time out");
    assert!(matches!(net.published.last(), Some((_, _, WireMessage::CancelMatch { .. }))));
}

#[test]
fn test_new_match_after_game_over() {
    let mut net = Net::matched_pair();
    let to_move = (0..2).find(|&i| net.peers[i].session().is_my_turn()).unwrap();
    net.tick(to_move, 30);
    net.deliver_all();
    let first_room = net.peers[0].snapshot().room.unwrap().room_id;

    for idx in 0..2 {
        net.act(idx, LocalAction::StartNewGame).unwrap();
        assert_eq!(net.peers[idx].status(), SessionStatus::Idle);
    }
    net.act(1, LocalAction::StartMatching).unwrap();
    net.deliver_all();
    net.act(0, LocalAction::StartMatching).unwrap();
    net.deliver_all();

    assert_consistent(&net);
    let second_room = net.peers[0].snapshot().room.unwrap().room_id;
    assert_ne!(first_room, second_room);
    assert_eq!(net.peers[0].status(), SessionStatus::Playing);
}

#[test]
fn test_unrecognized_and_stale_room_messages_are_dropped() {
    let mut net = Net::matched_pair();
    let before = net.peers[0].snapshot();

    let fx = net.peers[0].dispatch(MATCHING, br#"{"type":"test","message":"hi"}"#, 0);
    assert!(fx.is_empty());
    let fx = net.peers[0].dispatch("wuziqi/room_channel/not-our-room", br#"{"type":"game_over","winnerId":"bob","timestamp":0}"#, 0);
    assert!(fx.is_empty());
    let fx = net.peers[0].dispatch(MATCHING, b"\xff\xfe", 0);
    assert!(fx.is_empty());

    assert_eq!(net.peers[0].snapshot(), before);
}

#[test]
fn test_connection_flag() {
    let mut net = Net::new(&["alice"]);
    assert!(net.peers[0].is_connected());
    assert!(net.subscriptions[0].contains(MATCHING));

    let fx = net.peers[0].on_disconnected();
    assert_eq!(fx, vec![SessionEffect::Notify(SessionEvent::ConnectionChanged { connected: false })]);
    assert!(!net.peers[0].snapshot().connected);
    assert!(net.peers[0].on_disconnected().is_empty());
}

/// A room seating peers 0 and 1, announced by someone else.
fn crafted_room(
    net: &Net,
    seed: u128,
) -> Room {
    Room {
        room_id: RoomId(uuid::Uuid::from_u128(seed)),
        players: [
            RoomPlayer {
                user_id: net.id(0),
                username: "ALICE".to_string(),
                piece_type: PieceType::Black,
            },
            RoomPlayer {
                user_id: net.id(1),
                username: "BOB".to_string(),
                piece_type: PieceType::White,
            },
        ],
        current_turn: net.id(0),
        winner: None,
        start_time: net.now,
        last_move_time: net.now,
    }
}

fn announce(
    net: &mut Net,
    room: Room,
) {
    let message = WireMessage::MatchSuccess {
        room,
        timestamp: net.now,
    };
    net.in_flight.push_back((MATCHING.to_string(), message.encode().unwrap()));
    net.deliver_all();
}

#[test]
fn test_match_success_accepted_while_idle() {
    let mut net = Net::new(&["alice", "bob"]);
    let room = crafted_room(&net, 0xa11ce);

    announce(&mut net, room.clone());

    for idx in 0..2 {
        assert_eq!(net.peers[idx].status(), SessionStatus::Playing);
        assert!(net.subscriptions[idx].contains(&Topics::default().room(&room.room_id)));
    }
    assert_eq!(net.peers[0].snapshot().room, Some(room));
    assert!(net.peers[0].session().is_my_turn());
    assert_consistent(&net);
}

#[test]
fn test_match_success_while_game_over_starts_a_new_session() {
    let mut net = Net::matched_pair();
    net.play_move(7, 7);
    let to_move = (0..2).find(|&i| net.peers[i].session().is_my_turn()).unwrap();
    net.tick(to_move, 30);
    net.deliver_all();
    assert!(net.peers.iter().all(|p| p.status() == SessionStatus::GameOver));

    let room = crafted_room(&net, 0xb0b);
    announce(&mut net, room.clone());

    for idx in 0..2 {
        let snapshot = net.peers[idx].snapshot();
        assert_eq!(snapshot.status, SessionStatus::Playing);
        assert_eq!(snapshot.room.map(|r| r.room_id), Some(room.room_id));
        assert_eq!(snapshot.board.occupied(), 0);
        assert_eq!(snapshot.remaining_seconds, 30);
    }
    assert_consistent(&net);
}

#[test]
fn test_game_over_for_a_stranger_is_dropped() {
    let mut net = Net::matched_pair();
    let room_topic = net.peers[0].session().room_topic().unwrap();
    let before = net.peers[0].snapshot();

    let payload = br#"{"type":"game_over","winnerId":"mallory","timestamp":0}"#;
    let fx = net.peers[0].dispatch(&room_topic, payload, net.now);

    assert!(fx.is_empty());
    assert_eq!(net.peers[0].snapshot(), before);
    assert_eq!(net.peers[0].status(), SessionStatus::Playing);
}
