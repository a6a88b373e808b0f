use std::time::Duration;

use serde::Serialize;

use crate::RoomId;

pub const BOARD_SIZE: usize = 15;
pub const WIN_LENGTH: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Matching,
    Playing,
    GameOver,
}

/// Topic names shared by every participant of a deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topics {
    pub matching: String,
    pub room_prefix: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            matching: "wuziqi/matching_channel".to_string(),
            room_prefix: "wuziqi/room_channel/".to_string(),
        }
    }
}

impl Topics {
    pub fn room(
        &self,
        room_id: &RoomId,
    ) -> String {
        format!("{}{}", self.room_prefix, room_id)
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub turn_seconds: u32,
    pub matching_timeout: Duration,
    /// Delay between broadcasting `game_over` and dropping the room subscription.
    pub release_grace: Duration,
    pub tick_interval: Duration,
    pub topics: Topics,
}

impl SessionConfig {
    /// Seconds credited to the turn timer per tick: `tick_interval` rounded to the nearest
    /// whole second, at least one. The client ticks at exactly this many seconds.
    pub fn tick_seconds(&self) -> u32 {
        let rounded = (self.tick_interval.as_millis() + 500) / 1_000;
        u32::try_from(rounded).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_seconds: 30,
            matching_timeout: Duration::from_secs(30),
            release_grace: Duration::from_secs(1),
            tick_interval: Duration::from_secs(1),
            topics: Topics::default(),
        }
    }
}
