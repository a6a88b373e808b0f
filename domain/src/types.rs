use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch, as carried on the wire.
pub type Millis = u64;

/// Opaque, stable participant id supplied by the identity provider.
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub uuid::Uuid);

impl RoomId {
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Draws a v4 id from the given generator so pairing can be replayed from a seed.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 16];
        rng.fill(&mut bytes);
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        RoomId::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Who the local process is. Immutable for the lifetime of the process.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub name: String,
}

impl UserIdentity {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
        }
    }
}
