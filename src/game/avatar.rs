//! Avatar Controller
//!
//! Per-frame avatar behavior. The owner branch turns input into velocity and
//! rotation on a dynamic body, then publishes the post-integration transform
//! so replicas render what the owner simulated. The remote branch applies
//! replicated snapshots verbatim onto a kinematic replica; it writes nothing.

use glam::{Quat, Vec3};
use tracing::info;

use crate::fabric::{AvatarView, AvatarWriter};
use crate::game::camera::FollowCamera;
use crate::game::events::{EventQueue, GameEvent};
use crate::game::input::InputFrame;
use crate::game::physics::PhysicsBody;
use crate::game::state::{Animation, SpawnPoint, Stage};
use crate::{kill_plane_y, SPAWN_HEIGHT};

/// Base horizontal speed, world units per second.
pub const MOVEMENT_SPEED: f32 = 2.2;
/// Vertical velocity added by a jump.
pub const JUMP_FORCE: f32 = 8.0;
/// Keyboard yaw rate, radians per second.
pub const ROTATION_SPEED: f32 = 2.5;
/// Joystick yaw rate, radians per second.
pub const ROTATION_SPEED_JOYSTICK: f32 = 1.8;
/// Sprint speed multiplier on top of [`MOVEMENT_SPEED`].
pub const SPRINT_MULTIPLIER: f32 = 1.5;

/// Gravity scale applied to the owner body while a round is running.
const ACTIVE_GRAVITY_SCALE: f32 = 2.5;

/// Vertical speed above which the avatar counts as airborne.
const AIRBORNE_SPEED: f32 = 1.0;

/// Per-avatar controller state surviving across frames.
pub struct AvatarController {
    /// Airborne flag, derived from vertical speed each frame.
    in_the_air: bool,
    /// Collision-confirmed landing latch. Jumping requires it; it clears on
    /// takeoff and only a landable contact sets it again.
    landed: bool,
    /// Spawn point the body was last placed at, to detect fresh deals.
    placed_at: Option<SpawnPoint>,
    /// Current animation, local-side cache of the replicated key.
    animation: Animation,
}

impl Default for AvatarController {
    fn default() -> Self {
        Self::new()
    }
}

impl AvatarController {
    /// A controller for a freshly spawned avatar: airborne until its first
    /// confirmed landing.
    pub fn new() -> Self {
        Self {
            in_the_air: true,
            landed: false,
            placed_at: None,
            animation: Animation::Idle,
        }
    }

    /// Current animation state (owner-computed or replica-adopted).
    pub fn animation(&self) -> Animation {
        self.animation
    }

    /// Is the avatar airborne?
    pub fn in_the_air(&self) -> bool {
        self.in_the_air
    }

    /// Has the avatar landed since its last takeoff?
    pub fn landed(&self) -> bool {
        self.landed
    }

    /// Advance this avatar by one frame.
    ///
    /// `writer` is present exactly for the locally-owned avatar; its absence
    /// selects the remote branch. Returns true when the local participant
    /// asked to leave the session.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        stage: Stage,
        dt: f32,
        input: &InputFrame,
        view: &AvatarView,
        writer: Option<&AvatarWriter>,
        body: &mut dyn PhysicsBody,
        camera: Option<&mut FollowCamera>,
        events: &mut EventQueue,
    ) -> bool {
        if writer.is_some() && input.wants_hide() {
            return true;
        }
        if stage == Stage::Lobby || view.is_dead() {
            return false;
        }

        // Not ready until the host has dealt a spawn point.
        let Some(spawn) = view.starting_pos() else {
            return false;
        };
        if self.placed_at != Some(spawn) {
            self.place(body, spawn);
        }

        match writer {
            Some(writer) => self.update_owner(stage, dt, input, view, writer, body, camera, events),
            None => self.update_remote(stage, view, body),
        }
        false
    }

    /// Teleport the body to a freshly dealt spawn and reset round latches.
    fn place(&mut self, body: &mut dyn PhysicsBody, spawn: SpawnPoint) {
        body.set_translation(Vec3::new(spawn.x, SPAWN_HEIGHT, spawn.z));
        body.set_rotation(Quat::IDENTITY);
        body.set_linvel(Vec3::ZERO);
        self.in_the_air = true;
        self.landed = false;
        self.placed_at = Some(spawn);
    }

    #[allow(clippy::too_many_arguments)]
    fn update_owner(
        &mut self,
        stage: Stage,
        dt: f32,
        input: &InputFrame,
        view: &AvatarView,
        writer: &AvatarWriter,
        body: &mut dyn PhysicsBody,
        camera: Option<&mut FollowCamera>,
        events: &mut EventQueue,
    ) {
        if let Some(camera) = camera {
            camera.update(body.translation(), body.rotation());
        }

        // The body free-falls only while a round is running.
        body.set_gravity_scale(if stage == Stage::Active {
            ACTIVE_GRAVITY_SCALE
        } else {
            0.0
        });
        if stage != Stage::Active {
            return;
        }

        // A landable contact confirms the landing and arms the jump latch.
        for contact in body.take_contacts() {
            if contact.tag.is_landable() {
                self.in_the_air = false;
                self.landed = true;
                let mut vel = body.linvel();
                vel.y = 0.0;
                body.set_linvel(vel);
            }
        }

        let current_vy = body.linvel().y;
        if current_vy.abs() > AIRBORNE_SPEED {
            self.in_the_air = true;
            self.landed = false;
        } else {
            self.in_the_air = false;
        }

        // Intents are additive: sprint stacks on top of the base forward
        // speed, and opposing intents cancel.
        let mut vel = Vec3::ZERO;
        if input.wants_forward() {
            vel.z += MOVEMENT_SPEED;
            if input.sprinting() {
                vel.z += MOVEMENT_SPEED * SPRINT_MULTIPLIER;
            }
        }
        if input.wants_back() {
            vel.z -= MOVEMENT_SPEED;
        }

        let mut yaw_vel = 0.0;
        if input.turns_left() {
            yaw_vel += ROTATION_SPEED;
        }
        if input.turns_right() {
            yaw_vel -= ROTATION_SPEED;
        }
        if input.joystick_turns_left() {
            yaw_vel += ROTATION_SPEED_JOYSTICK;
        }
        if input.joystick_turns_right() {
            yaw_vel -= ROTATION_SPEED_JOYSTICK;
        }

        let rot = Quat::from_axis_angle(Vec3::Y, yaw_vel * dt) * body.rotation();
        body.set_rotation(rot);
        let mut vel = rot * vel;

        if input.wants_jump() && !self.in_the_air && self.landed {
            vel.y = current_vy + JUMP_FORCE;
            self.in_the_air = true;
            self.landed = false;
        } else {
            vel.y = current_vy;
        }

        body.set_linvel(vel);
        body.step(dt);

        writer.set_pos(body.translation());
        writer.set_rot(body.rotation());
        let animation = select_animation(self.in_the_air, body.linvel(), input.wants_dive());
        if animation != self.animation {
            self.animation = animation;
            writer.set_animation(animation);
        }

        if body.translation().y < kill_plane_y() {
            let profile = view.profile();
            info!(name = %profile.name, "avatar fell out");
            writer.set_dead();
            writer.mark_last_dead(&profile);
            events.push(GameEvent::AvatarDied {
                id: view.id(),
                profile,
            });
        }
    }

    /// Apply the owner's latest snapshot verbatim. Position and rotation are
    /// independent keys; either may arrive without the other.
    fn update_remote(&mut self, stage: Stage, view: &AvatarView, body: &mut dyn PhysicsBody) {
        if stage != Stage::Active {
            return;
        }
        if let Some(pos) = view.pos() {
            body.set_translation(pos);
        }
        if let Some(rot) = view.rot() {
            body.set_rotation(rot);
        }
        if let Some(animation) = view.animation() {
            self.animation = animation;
        }
    }
}

/// Animation from airborne state, post-integration velocity and dive intent.
fn select_animation(in_the_air: bool, vel: Vec3, diving: bool) -> Animation {
    let planar = vel.x.abs() + vel.z.abs();
    if in_the_air && vel.y > 2.0 {
        Animation::JumpUp
    } else if in_the_air && vel.y < -5.0 {
        Animation::Fall
    } else if planar > 4.0 || in_the_air {
        Animation::Run
    } else if planar > 1.0 {
        Animation::Walk
    } else if diving {
        Animation::Dive
    } else {
        Animation::Idle
    }
}
