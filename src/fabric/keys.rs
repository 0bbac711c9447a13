//! Typed Serialization Boundary
//!
//! The only place in the crate where replicated values are encoded to or
//! decoded from the fabric's string-keyed `serde_json::Value` form. Internal
//! code never touches the open-ended bag; it goes through the typed views
//! and writers below.
//!
//! Ownership is enforced by construction: [`AvatarWriter`] can only be
//! created by the roster, and only for the locally-owned entity, so a
//! non-owner has no way to mutate another avatar's simulated fields.

use std::sync::Arc;

use glam::{Quat, Vec3};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::fabric::StateFabric;
use crate::game::state::{Animation, EntityId, Profile, SpawnPoint, Stage};

// Per-entity keys.

/// Public profile, written once by the fabric at join.
pub const PROFILE: &str = "profile";
/// Dead flag (`false` = alive). Owner sets true on fall-out; host clears.
pub const DEAD: &str = "dead";
/// World-space position (Vec3), owner-published each frame.
pub const POS: &str = "pos";
/// World-space rotation (Quat), owner-published each frame.
pub const ROT: &str = "rot";
/// Animation state, owner-published each frame.
pub const ANIMATION: &str = "animation";
/// Host-assigned spawn point for the current round.
pub const STARTING_POS: &str = "startingPos";

// Global session keys.

/// Current lifecycle stage.
pub const STAGE: &str = "gameStage";
/// Stage timer (see [`Stage::initial_timer`]).
pub const TIMER: &str = "timer";
/// Winning profile, set at Active→Winner.
pub const WINNER: &str = "winner";
/// Solo-round latch, set at Lobby→Countdown.
pub const SOLO: &str = "solo";
/// Profile of the most recently fallen avatar.
pub const LAST_DEAD: &str = "lastDead";

fn encode<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn decode<T: DeserializeOwned>(value: Value) -> Option<T> {
    serde_json::from_value(value).ok()
}

// =============================================================================
// AVATAR VIEW (read-only, any entity)
// =============================================================================

/// Read-only typed view of one avatar's replicated state.
///
/// Every accessor that can be "not yet replicated" returns `Option`; absence
/// is a not-ready condition, never an error.
pub struct AvatarView<'a> {
    fabric: &'a dyn StateFabric,
    id: EntityId,
}

impl<'a> AvatarView<'a> {
    /// View `id` through `fabric`.
    pub fn new(fabric: &'a dyn StateFabric, id: EntityId) -> Self {
        Self { fabric, id }
    }

    /// Entity this view reads.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Public profile; placeholder identity when absent or malformed.
    pub fn profile(&self) -> Profile {
        self.fabric
            .read(self.id, PROFILE)
            .and_then(decode)
            .unwrap_or_default()
    }

    /// Dead flag; unset reads as alive.
    pub fn is_dead(&self) -> bool {
        self.fabric
            .read(self.id, DEAD)
            .and_then(decode)
            .unwrap_or(false)
    }

    /// Last-published position, if any has arrived.
    pub fn pos(&self) -> Option<Vec3> {
        self.fabric.read(self.id, POS).and_then(decode)
    }

    /// Last-published rotation, if any has arrived.
    pub fn rot(&self) -> Option<Quat> {
        self.fabric.read(self.id, ROT).and_then(decode)
    }

    /// Last-published animation state, if any has arrived.
    pub fn animation(&self) -> Option<Animation> {
        self.fabric.read(self.id, ANIMATION).and_then(decode)
    }

    /// Host-assigned spawn point for the current round, if assigned.
    pub fn starting_pos(&self) -> Option<SpawnPoint> {
        self.fabric.read(self.id, STARTING_POS).and_then(decode)
    }
}

// =============================================================================
// AVATAR WRITER (owner only)
// =============================================================================

/// Write handle for the locally-owned avatar's simulated fields.
///
/// Constructed by the roster exclusively for the entity whose id matches
/// `fabric.local_id()`; there is no public constructor.
pub struct AvatarWriter {
    fabric: Arc<dyn StateFabric>,
    id: EntityId,
}

impl AvatarWriter {
    pub(crate) fn new(fabric: Arc<dyn StateFabric>, id: EntityId) -> Self {
        debug_assert_eq!(fabric.local_id(), id);
        Self { fabric, id }
    }

    /// Entity this writer publishes for.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Publish the post-integration position.
    pub fn set_pos(&self, pos: Vec3) {
        self.fabric.write(self.id, POS, encode(&pos), false);
    }

    /// Publish the post-integration rotation.
    pub fn set_rot(&self, rot: Quat) {
        self.fabric.write(self.id, ROT, encode(&rot), false);
    }

    /// Publish the animation state.
    pub fn set_animation(&self, animation: Animation) {
        self.fabric.write(self.id, ANIMATION, encode(&animation), false);
    }

    /// Mark the avatar dead for the rest of the round. Broadcast immediately
    /// so the host's next elimination check sees it.
    pub fn set_dead(&self) {
        self.fabric.write(self.id, DEAD, encode(&true), true);
    }

    /// Record this avatar's profile as the most recent death.
    pub fn mark_last_dead(&self, profile: &Profile) {
        self.fabric.write_global(LAST_DEAD, encode(profile), true);
    }
}

// =============================================================================
// SESSION VIEW (read-only, everyone)
// =============================================================================

/// Read-only typed view of the replicated session fields.
pub struct SessionView<'a> {
    fabric: &'a dyn StateFabric,
}

impl<'a> SessionView<'a> {
    /// View the session through `fabric`.
    pub fn new(fabric: &'a dyn StateFabric) -> Self {
        Self { fabric }
    }

    /// Current stage; a fresh session reads as Lobby.
    pub fn stage(&self) -> Stage {
        self.fabric
            .read_global(STAGE)
            .and_then(decode)
            .unwrap_or_default()
    }

    /// Current timer; a fresh session reads the Lobby sentinel.
    pub fn timer(&self) -> i32 {
        self.fabric
            .read_global(TIMER)
            .and_then(decode)
            .unwrap_or_else(|| Stage::Lobby.initial_timer())
    }

    /// Winning profile of the last concluded round, if any.
    pub fn winner(&self) -> Option<Profile> {
        self.fabric.read_global(WINNER).and_then(decode)
    }

    /// Solo-round latch.
    pub fn solo(&self) -> bool {
        self.fabric
            .read_global(SOLO)
            .and_then(decode)
            .unwrap_or(false)
    }

    /// Profile of the most recently fallen avatar, if any.
    pub fn last_dead(&self) -> Option<Profile> {
        self.fabric.read_global(LAST_DEAD).and_then(decode)
    }
}

// =============================================================================
// HOST WRITERS (session machine only)
// =============================================================================

/// Host-side write handle for session fields and round resets.
///
/// Only the session machine constructs one, and only on the host. This is
/// the single sanctioned exception to per-entity single-writer: the host
/// clears every avatar's round state when a round ends.
pub(crate) struct HostWriter<'a> {
    fabric: &'a dyn StateFabric,
}

impl<'a> HostWriter<'a> {
    pub(crate) fn new(fabric: &'a dyn StateFabric) -> Self {
        debug_assert!(fabric.is_host());
        Self { fabric }
    }

    pub(crate) fn set_stage(&self, stage: Stage) {
        self.fabric.write_global(STAGE, encode(&stage), true);
    }

    pub(crate) fn set_timer(&self, timer: i32) {
        self.fabric.write_global(TIMER, encode(&timer), true);
    }

    pub(crate) fn set_winner(&self, winner: Option<&Profile>) {
        self.fabric.write_global(WINNER, encode(&winner), true);
    }

    pub(crate) fn set_solo(&self, solo: bool) {
        self.fabric.write_global(SOLO, encode(&solo), true);
    }

    pub(crate) fn set_dead(&self, id: EntityId, dead: bool) {
        self.fabric.write(id, DEAD, encode(&dead), false);
    }

    pub(crate) fn clear_transform(&self, id: EntityId) {
        self.fabric.clear(id, POS);
        self.fabric.clear(id, ROT);
    }

    pub(crate) fn set_starting_pos(&self, id: EntityId, spawn: SpawnPoint) {
        self.fabric.write(id, STARTING_POS, encode(&spawn), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fabric::FabricHub;

    #[test]
    fn test_view_defaults_when_unset() {
        let hub = FabricHub::new();
        let fabric = hub.join(Profile::new("Ayu", "#e63946"));
        let other = EntityId::new([9; 16]);

        let view = AvatarView::new(&fabric, other);
        assert_eq!(view.profile(), Profile::default());
        assert!(!view.is_dead());
        assert!(view.pos().is_none());
        assert!(view.rot().is_none());
        assert!(view.animation().is_none());
        assert!(view.starting_pos().is_none());

        let session = SessionView::new(&fabric);
        assert_eq!(session.stage(), Stage::Lobby);
        assert_eq!(session.timer(), -1);
        assert!(session.winner().is_none());
        assert!(!session.solo());
    }

    #[test]
    fn test_malformed_profile_degrades_to_placeholder() {
        let hub = FabricHub::new();
        let fabric = hub.join(Profile::default());
        let id = fabric.local_id();

        fabric.write(id, PROFILE, serde_json::json!(42), false);
        let view = AvatarView::new(&fabric, id);
        assert_eq!(view.profile(), Profile::default());
    }

    #[test]
    fn test_writer_roundtrip() {
        let hub = FabricHub::new();
        let fabric: Arc<dyn StateFabric> = Arc::new(hub.join(Profile::new("Ayu", "#e63946")));
        let id = fabric.local_id();
        let writer = AvatarWriter::new(Arc::clone(&fabric), id);

        let pos = Vec3::new(1.0, 2.0, 3.0);
        let rot = Quat::from_axis_angle(Vec3::Y, 0.5);
        writer.set_pos(pos);
        writer.set_rot(rot);
        writer.set_animation(Animation::Run);
        writer.set_dead();

        let view = AvatarView::new(&*fabric, id);
        assert_eq!(view.pos(), Some(pos));
        assert_eq!(view.rot(), Some(rot));
        assert_eq!(view.animation(), Some(Animation::Run));
        assert!(view.is_dead());
    }

    #[test]
    fn test_profile_written_at_join() {
        let hub = FabricHub::new();
        let fabric = hub.join(Profile::new("Bima", "#457b9d"));
        let view = AvatarView::new(&fabric, fabric.local_id());
        assert_eq!(view.profile(), Profile::new("Bima", "#457b9d"));
    }
}
