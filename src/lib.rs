//! # Tumble Arena Session Core
//!
//! Replicated session state machine and per-avatar physics replication for
//! Tumble Arena, a round-based multiplayer knockout game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TUMBLE ARENA CORE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Session and avatar logic                  │
//! │  ├── state.rs    - Replicated value types (Stage, Profile..) │
//! │  ├── session.rs  - Host-driven match lifecycle               │
//! │  ├── roster.rs   - Locally-observed avatar set               │
//! │  ├── avatar.rs   - Per-frame owner/replica controller        │
//! │  ├── input.rs    - Keyboard + joystick input frames          │
//! │  ├── physics.rs  - Physics body boundary and contacts        │
//! │  ├── camera.rs   - Follow camera contract                    │
//! │  ├── chat.rs     - Chat relay over fabric RPC                │
//! │  ├── events.rs   - Side-effect hook events                   │
//! │  └── world.rs    - Per-participant composition root          │
//! │                                                              │
//! │  fabric/         - Replicated state substrate boundary       │
//! │  ├── store.rs    - In-process LocalFabric hub                │
//! │  └── keys.rs     - Typed serialization boundary              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Model
//!
//! Every per-avatar field has exactly one writer (its owning participant);
//! the session fields have exactly one writer (the host). Everything else is
//! a replica fed by last-write-wins snapshots. There is no rollback and no
//! interpolation: a replica freezes on its last-known value until the next
//! snapshot arrives.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod fabric;
pub mod game;

// Re-export commonly used types
pub use fabric::{FabricHub, LocalFabric, SharedFabric, StateFabric};
pub use game::input::InputFrame;
pub use game::session::SESSION_TICK_INTERVAL;
pub use game::state::{Animation, EntityId, Profile, SpawnPoint, Stage};
pub use game::world::{GameWorld, HostTicker};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Height of one arena floor (world units).
pub const FLOOR_HEIGHT: f32 = 8.0;

/// Number of stacked arena floors.
pub const FLOOR_COUNT: usize = 3;

/// Half-extent of the square spawn area on the top floor.
pub const SPAWN_RANGE: f32 = 5.0;

/// Height above the floor at which avatars are placed on spawn.
pub const SPAWN_HEIGHT: f32 = 1.0;

/// Vertical coordinate below which an avatar is considered fallen out.
///
/// An avatar whose position drops below this plane dies for the rest of
/// the round.
pub fn kill_plane_y() -> f32 {
    -(FLOOR_HEIGHT * FLOOR_COUNT as f32)
}
