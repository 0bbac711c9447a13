//! Game World
//!
//! Composition root tying the fabric, roster, session machine, chat and the
//! local follow camera together behind one per-participant handle. The
//! embedding drives it with [`GameWorld::frame`] at render rate; on the host,
//! [`HostTicker`] drives the session machine on its own cadence.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::fabric::{AvatarView, SessionView, SharedFabric, StateFabric};
use crate::game::camera::FollowCamera;
use crate::game::chat::ChatChannel;
use crate::game::events::{EventQueue, GameEvent};
use crate::game::input::InputFrame;
use crate::game::physics::{BodyMode, KinematicBody, SurfaceTag};
use crate::game::roster::{AvatarEntity, BodyFactory, Roster};
use crate::game::session::{self, SESSION_TICK_INTERVAL};
use crate::game::state::{EntityId, Profile, Stage};

/// World-level failures.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A host-only facility was requested on a non-host participant.
    #[error("participant is not the session host")]
    NotHost,
}

/// One participant's complete view of the running game.
pub struct GameWorld {
    fabric: SharedFabric,
    roster: Roster,
    camera: FollowCamera,
    chat: ChatChannel,
    events: EventQueue,
    left: bool,
}

impl GameWorld {
    /// Create a world over `fabric` with the built-in arena floor: the local
    /// avatar gets a dynamic body over a breakable floor plane, remotes get
    /// kinematic replicas.
    pub fn new(fabric: SharedFabric) -> Self {
        Self::with_bodies(
            fabric,
            Box::new(|is_local| {
                if is_local {
                    Box::new(
                        KinematicBody::new(BodyMode::Dynamic).with_ground(0.0, SurfaceTag::Hexagon),
                    )
                } else {
                    Box::new(KinematicBody::new(BodyMode::KinematicPosition))
                }
            }),
        )
    }

    /// Create a world with a custom body factory, e.g. one backed by a real
    /// physics engine.
    pub fn with_bodies(fabric: SharedFabric, factory: BodyFactory) -> Self {
        Self {
            chat: ChatChannel::new(Arc::clone(&fabric)),
            roster: Roster::new(factory),
            camera: FollowCamera::new(),
            events: EventQueue::new(),
            left: false,
            fabric,
        }
    }

    /// Advance the world by one render frame.
    ///
    /// Syncs membership, then updates every avatar; `input` applies to the
    /// locally-owned one only. After the local participant leaves (H key or
    /// [`Self::leave`]) frames become no-ops.
    pub fn frame(&mut self, dt: f32, input: &InputFrame) {
        if self.left {
            return;
        }
        self.roster.sync(&self.fabric, &mut self.events);

        let stage = SessionView::new(&*self.fabric).stage();
        let idle = InputFrame::idle();
        let mut wants_leave = false;
        for avatar in self.roster.iter_mut() {
            let view = AvatarView::new(&*self.fabric, avatar.id);
            let frame = if avatar.is_local { input } else { &idle };
            let camera = avatar.is_local.then_some(&mut self.camera);
            wants_leave |= avatar.controller.update(
                stage,
                dt,
                frame,
                &view,
                avatar.writer.as_ref(),
                &mut *avatar.body,
                camera,
                &mut self.events,
            );
        }

        if wants_leave {
            self.leave();
        }
    }

    /// Run one host session tick. No-op off the host.
    pub fn session_tick(&mut self) {
        session::tick(&*self.fabric, &mut self.events);
    }

    /// Start a round from the lobby. No-op off the host or mid-round.
    pub fn start_match(&mut self) {
        session::start_match(&*self.fabric, &mut self.events);
    }

    /// Leave the session and stop simulating.
    pub fn leave(&mut self) {
        if !self.left {
            debug!(id = %self.fabric.local_id().short(), "leaving session");
            self.fabric.leave();
            self.left = true;
        }
    }

    /// Events accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.take()
    }

    /// Is this participant the session host?
    pub fn is_host(&self) -> bool {
        self.fabric.is_host()
    }

    /// The local participant's entity.
    pub fn local_id(&self) -> EntityId {
        self.fabric.local_id()
    }

    /// Current replicated stage.
    pub fn stage(&self) -> Stage {
        SessionView::new(&*self.fabric).stage()
    }

    /// Current replicated timer.
    pub fn timer(&self) -> i32 {
        SessionView::new(&*self.fabric).timer()
    }

    /// Winner of the last concluded round, if any.
    pub fn winner(&self) -> Option<Profile> {
        SessionView::new(&*self.fabric).winner()
    }

    /// Most recent death, if any this round.
    pub fn last_dead(&self) -> Option<Profile> {
        SessionView::new(&*self.fabric).last_dead()
    }

    /// The chat channel.
    pub fn chat(&self) -> &ChatChannel {
        &self.chat
    }

    /// The local follow camera.
    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    /// Avatars in entity order.
    pub fn avatars(&self) -> impl Iterator<Item = &AvatarEntity> {
        self.roster.iter()
    }

    /// Look up one avatar mutably, e.g. to attach it to engine objects.
    pub fn avatar_mut(&mut self, id: EntityId) -> Option<&mut AvatarEntity> {
        self.roster.get_mut(id)
    }
}

// =============================================================================
// HOST TICKER
// =============================================================================

/// Background task driving the host's session tick on its fixed cadence.
pub struct HostTicker {
    handle: tokio::task::JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl HostTicker {
    /// Spawn the ticker for a host world.
    ///
    /// Fails with [`WorldError::NotHost`] elsewhere; non-host participants
    /// only observe the session fields.
    pub async fn spawn(world: Arc<RwLock<GameWorld>>) -> Result<Self, WorldError> {
        if !world.read().await.is_host() {
            return Err(WorldError::NotHost);
        }

        let (shutdown, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        world.write().await.session_tick();
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self { handle, shutdown })
    }

    /// Stop the ticker and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
