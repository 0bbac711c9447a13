//! Avatar Roster
//!
//! Mirrors fabric membership into local avatar entities. Each participant
//! gets one entity; the locally-owned one carries a write handle and a
//! dynamic body, remote ones are kinematic replicas driven by snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::fabric::keys::HostWriter;
use crate::fabric::{AvatarView, AvatarWriter, SessionView, SharedFabric, StateFabric};
use crate::game::avatar::AvatarController;
use crate::game::events::{EventQueue, GameEvent};
use crate::game::physics::PhysicsBody;
use crate::game::state::{EntityId, Profile, SpawnPoint, Stage};

/// Builds a physics body for a new avatar; `is_local` distinguishes the
/// owner's dynamic body from a replica.
pub type BodyFactory = Box<dyn Fn(bool) -> Box<dyn PhysicsBody> + Send + Sync>;

/// One avatar in the session, local or remote.
pub struct AvatarEntity {
    /// The entity this avatar mirrors.
    pub id: EntityId,
    /// Public identity, read once at join.
    pub profile: Profile,
    /// Is this the locally-owned avatar?
    pub is_local: bool,
    /// Simulated (local) or snapshot-driven (remote) body.
    pub body: Box<dyn PhysicsBody>,
    /// Per-avatar controller state.
    pub controller: AvatarController,
    /// Present only on the locally-owned avatar.
    pub writer: Option<AvatarWriter>,
}

/// The set of avatars currently in the session.
pub struct Roster {
    avatars: BTreeMap<EntityId, AvatarEntity>,
    factory: BodyFactory,
}

impl Roster {
    /// Create an empty roster that builds bodies with `factory`.
    pub fn new(factory: BodyFactory) -> Self {
        Self {
            avatars: BTreeMap::new(),
            factory,
        }
    }

    /// Reconcile the roster against current fabric membership.
    ///
    /// Joins spawn an entity (and, on the host, deal the newcomer its round
    /// state); departures drop it. Emits [`GameEvent::AvatarJoined`] and
    /// [`GameEvent::AvatarLeft`].
    pub fn sync(&mut self, fabric: &SharedFabric, events: &mut EventQueue) {
        let present = fabric.participants();

        for &id in &present {
            if self.avatars.contains_key(&id) {
                continue;
            }
            let is_local = id == fabric.local_id();
            let profile = AvatarView::new(&**fabric, id).profile();
            let writer = is_local.then(|| AvatarWriter::new(Arc::clone(fabric), id));

            if fabric.is_host() {
                let host = HostWriter::new(&**fabric);
                // A mid-round joiner sits out until the next round.
                let mid_round = SessionView::new(&**fabric).stage() == Stage::Active;
                host.set_dead(id, mid_round);
                host.set_starting_pos(id, SpawnPoint::random());
            }

            info!(id = %id.short(), name = %profile.name, is_local, "avatar joined");
            self.avatars.insert(
                id,
                AvatarEntity {
                    id,
                    profile,
                    is_local,
                    body: (self.factory)(is_local),
                    controller: AvatarController::new(),
                    writer,
                },
            );
            events.push(GameEvent::AvatarJoined { id });
        }

        let departed: Vec<EntityId> = self
            .avatars
            .keys()
            .copied()
            .filter(|id| !present.contains(id))
            .collect();
        for id in departed {
            info!(id = %id.short(), "avatar left");
            self.avatars.remove(&id);
            events.push(GameEvent::AvatarLeft { id });
        }
    }

    /// Number of avatars.
    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    /// Is the roster empty?
    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    /// Iterate avatars in entity order.
    pub fn iter(&self) -> impl Iterator<Item = &AvatarEntity> {
        self.avatars.values()
    }

    /// Iterate avatars mutably in entity order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AvatarEntity> {
        self.avatars.values_mut()
    }

    /// Look up one avatar.
    pub fn get(&self, id: EntityId) -> Option<&AvatarEntity> {
        self.avatars.get(&id)
    }

    /// Look up one avatar mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut AvatarEntity> {
        self.avatars.get_mut(&id)
    }

    /// The locally-owned avatar, if membership has been synced.
    pub fn local(&self) -> Option<&AvatarEntity> {
        self.avatars.values().find(|a| a.is_local)
    }
}
