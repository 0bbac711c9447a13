//! Physics Body Abstraction
//!
//! The controller drives avatars through the [`PhysicsBody`] trait rather
//! than a concrete engine, so the same code runs against a real rigid-body
//! backend or the built-in [`KinematicBody`]. Landing is detected from
//! collision contacts keyed by a stable [`SurfaceTag`], never from object
//! identity.

use glam::{Quat, Vec3};

/// Baseline gravitational acceleration, scaled per body.
pub const GRAVITY: f32 = -9.81;

/// Stable classification of a contacted surface.
///
/// Tags survive object churn across rounds, unlike engine handles, so the
/// landing latch keys off them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceTag {
    /// Breakable arena floor tile.
    Hexagon,
    /// Horizontally oscillating platform.
    SideMovePlatform,
    /// Vertically oscillating platform.
    VerticalMovePlatform,
    /// Spinning flat platform.
    RotatePlatform,
    /// Spinning drum obstacle.
    RotationDrum,
    /// Another avatar's collider.
    Avatar,
    /// Anything else (walls, props).
    Other,
}

impl SurfaceTag {
    /// Does contact with this surface confirm a landing?
    pub fn is_landable(self) -> bool {
        matches!(
            self,
            SurfaceTag::Hexagon
                | SurfaceTag::SideMovePlatform
                | SurfaceTag::VerticalMovePlatform
                | SurfaceTag::RotatePlatform
                | SurfaceTag::RotationDrum
        )
    }
}

/// A collision begin event, reported once per new contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEvent {
    /// What the body touched.
    pub tag: SurfaceTag,
}

/// Minimal rigid-body interface the avatar controller needs.
///
/// `Send + Sync` so a world full of bodies can live behind an async lock.
pub trait PhysicsBody: Send + Sync {
    /// Current world-space position.
    fn translation(&self) -> Vec3;

    /// Teleport to a world-space position.
    fn set_translation(&mut self, pos: Vec3);

    /// Current world-space rotation.
    fn rotation(&self) -> Quat;

    /// Set the world-space rotation.
    fn set_rotation(&mut self, rot: Quat);

    /// Current linear velocity.
    fn linvel(&self) -> Vec3;

    /// Set the linear velocity.
    fn set_linvel(&mut self, vel: Vec3);

    /// Scale applied to [`GRAVITY`] during integration.
    fn set_gravity_scale(&mut self, scale: f32);

    /// Advance the body by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Contacts begun since the last call, in occurrence order.
    fn take_contacts(&mut self) -> Vec<ContactEvent>;
}

// =============================================================================
// KINEMATIC BODY
// =============================================================================

/// Integration mode for [`KinematicBody`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyMode {
    /// Velocity and gravity integrate each step.
    Dynamic,
    /// Position is set externally; `step` does nothing. Remote replicas use
    /// this mode so snapshot application is verbatim.
    KinematicPosition,
}

/// Self-contained body with analytic gravity and an optional flat ground.
///
/// Good enough for the demo binary and the tests; a production embedding
/// would implement [`PhysicsBody`] over a real engine instead.
pub struct KinematicBody {
    mode: BodyMode,
    translation: Vec3,
    rotation: Quat,
    linvel: Vec3,
    gravity_scale: f32,
    ground: Option<(f32, SurfaceTag)>,
    on_ground: bool,
    contacts: Vec<ContactEvent>,
}

impl KinematicBody {
    /// Create a body at the origin.
    pub fn new(mode: BodyMode) -> Self {
        Self {
            mode,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            gravity_scale: 1.0,
            ground: None,
            on_ground: false,
            contacts: Vec::new(),
        }
    }

    /// Add an infinite flat ground at height `y` carrying `tag`. Crossing it
    /// from above clamps the body, zeroes vertical velocity and reports a
    /// contact.
    pub fn with_ground(mut self, y: f32, tag: SurfaceTag) -> Self {
        self.ground = Some((y, tag));
        self
    }

    /// Remove the ground plane, e.g. to simulate a tile breaking away.
    pub fn remove_ground(&mut self) {
        self.ground = None;
        self.on_ground = false;
    }

    /// Inject a contact, for driving the landing latch in tests.
    pub fn push_contact(&mut self, tag: SurfaceTag) {
        self.contacts.push(ContactEvent { tag });
    }
}

impl PhysicsBody for KinematicBody {
    fn translation(&self) -> Vec3 {
        self.translation
    }

    fn set_translation(&mut self, pos: Vec3) {
        self.translation = pos;
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn set_rotation(&mut self, rot: Quat) {
        self.rotation = rot;
    }

    fn linvel(&self) -> Vec3 {
        self.linvel
    }

    fn set_linvel(&mut self, vel: Vec3) {
        self.linvel = vel;
    }

    fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
    }

    fn step(&mut self, dt: f32) {
        if self.mode == BodyMode::KinematicPosition {
            return;
        }

        self.linvel.y += GRAVITY * self.gravity_scale * dt;
        self.translation += self.linvel * dt;

        if let Some((ground_y, tag)) = self.ground {
            if self.translation.y <= ground_y && self.linvel.y <= 0.0 {
                self.translation.y = ground_y;
                self.linvel.y = 0.0;
                // A contact fires on the transition only, not every step.
                if !self.on_ground {
                    self.on_ground = true;
                    self.contacts.push(ContactEvent { tag });
                }
            } else if self.translation.y > ground_y {
                self.on_ground = false;
            }
        }
    }

    fn take_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }
}
