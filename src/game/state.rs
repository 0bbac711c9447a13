//! Replicated Value Types
//!
//! Every type in this module crosses the fabric boundary and therefore
//! derives `Serialize`/`Deserialize`. Internal code works with these fixed
//! types only; the string-keyed encoding lives in `fabric::keys`.

use serde::{Deserialize, Serialize};

// =============================================================================
// ENTITY ID
// =============================================================================

/// Unique participant/avatar identifier (UUID as bytes), assigned by the
/// fabric at join time.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct EntityId(pub [u8; 16]);

impl EntityId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// Public identity of a participant: display name and color.
///
/// Supplied by the caller at join time and immutable afterwards. A missing
/// or malformed profile on a remote avatar degrades to [`Profile::default`]
/// rather than failing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name shown above the avatar and in the winner banner.
    pub name: String,
    /// Tint color as a hex string, e.g. `"#e63946"`.
    pub color: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
            color: "#ff0000".to_string(),
        }
    }
}

impl Profile {
    /// Create a profile from name and color.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

// =============================================================================
// STAGE
// =============================================================================

/// Match lifecycle stage.
///
/// Cycles Lobby → Countdown → Active → Winner → Lobby and never skips.
/// Written only by the host; observed by everyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Stage {
    /// Waiting for the host to start a round.
    #[default]
    Lobby,
    /// Pre-round countdown (3 ticks).
    Countdown,
    /// Round in progress.
    Active,
    /// Winner announcement (5 ticks), then back to lobby.
    Winner,
}

impl Stage {
    /// The stage that follows this one in the cycle.
    pub fn next(self) -> Stage {
        match self {
            Stage::Lobby => Stage::Countdown,
            Stage::Countdown => Stage::Active,
            Stage::Active => Stage::Winner,
            Stage::Winner => Stage::Lobby,
        }
    }

    /// Timer value loaded when this stage is entered.
    ///
    /// Countdown and Winner count down to zero; Active counts up from zero
    /// as a heartbeat; Lobby holds an inert sentinel.
    pub fn initial_timer(self) -> i32 {
        match self {
            Stage::Lobby => -1,
            Stage::Countdown => 3,
            Stage::Active => 0,
            Stage::Winner => 5,
        }
    }

    /// Does the timer count down in this stage?
    pub fn counts_down(self) -> bool {
        matches!(self, Stage::Countdown | Stage::Winner)
    }
}

// =============================================================================
// ANIMATION
// =============================================================================

/// Avatar animation state, owner-computed each frame and replicated
/// alongside the transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Animation {
    /// Standing still.
    #[default]
    Idle,
    /// Slow horizontal movement.
    Walk,
    /// Fast horizontal movement (or generic airborne).
    Run,
    /// Rising quickly after a jump.
    JumpUp,
    /// Falling fast.
    Fall,
    /// Dive intent held while grounded.
    Dive,
}

// =============================================================================
// SPAWN POINT
// =============================================================================

/// Starting position on the arena's top floor, chosen once per round by the
/// host. Only the horizontal components are randomized; spawn height is a
/// fixed constant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Horizontal X coordinate.
    pub x: f32,
    /// Horizontal Z coordinate.
    pub z: f32,
}

impl SpawnPoint {
    /// Create a spawn point.
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Randomize a spawn point within the spawn area.
    pub fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        Self {
            x: rng.gen_range(-crate::SPAWN_RANGE..crate::SPAWN_RANGE),
            z: rng.gen_range(-crate::SPAWN_RANGE..crate::SPAWN_RANGE),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
