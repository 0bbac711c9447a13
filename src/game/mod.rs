//! Game Logic
//!
//! Session lifecycle, avatar simulation and replication, and the
//! per-participant composition root.

pub mod avatar;
pub mod camera;
pub mod chat;
pub mod events;
pub mod input;
pub mod physics;
pub mod roster;
pub mod session;
pub mod state;
pub mod world;

pub use avatar::AvatarController;
pub use camera::FollowCamera;
pub use chat::{ChatChannel, ChatMessage};
pub use events::{EventQueue, GameEvent};
pub use input::{InputFrame, JoystickFrame};
pub use physics::{ContactEvent, KinematicBody, PhysicsBody, SurfaceTag};
pub use roster::{AvatarEntity, Roster};
pub use state::{Animation, EntityId, Profile, SpawnPoint, Stage};
pub use world::{GameWorld, HostTicker, WorldError};
