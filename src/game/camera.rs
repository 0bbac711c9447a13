//! Follow Camera
//!
//! Third-person chase camera for the local avatar. Pure math over the
//! avatar's transform; it never reads replicated state and remote avatars
//! never get one.

use glam::{Quat, Vec3};

/// Camera offset behind and above the avatar, in the avatar's local frame.
const OFFSET: Vec3 = Vec3::new(0.0, 8.0, -16.0);

/// Exponential smoothing factor applied once per frame.
const LERP_FACTOR: f32 = 0.05;

/// Smoothed chase camera.
#[derive(Clone, Copy, Debug)]
pub struct FollowCamera {
    position: Vec3,
    look_at: Vec3,
    initialized: bool,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowCamera {
    /// Create a camera that will snap to its target on the first update.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            look_at: Vec3::ZERO,
            initialized: false,
        }
    }

    /// Advance toward the pose dictated by the avatar's transform.
    pub fn update(&mut self, target_pos: Vec3, target_rot: Quat) {
        let desired = target_pos + target_rot * OFFSET;
        if !self.initialized {
            self.position = desired;
            self.look_at = target_pos;
            self.initialized = true;
            return;
        }
        self.position = self.position.lerp(desired, LERP_FACTOR);
        self.look_at = self.look_at.lerp(target_pos, LERP_FACTOR);
    }

    /// Current camera position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current look-at target.
    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_snaps() {
        let mut cam = FollowCamera::new();
        let pos = Vec3::new(3.0, 1.0, 4.0);
        cam.update(pos, Quat::IDENTITY);

        assert_eq!(cam.position(), pos + OFFSET);
        assert_eq!(cam.look_at(), pos);
    }

    #[test]
    fn test_updates_converge_on_target() {
        let mut cam = FollowCamera::new();
        cam.update(Vec3::ZERO, Quat::IDENTITY);

        let target = Vec3::new(10.0, 1.0, 0.0);
        for _ in 0..600 {
            cam.update(target, Quat::IDENTITY);
        }

        assert!((cam.look_at() - target).length() < 0.01);
        assert!((cam.position() - (target + OFFSET)).length() < 0.01);
    }

    #[test]
    fn test_offset_rotates_with_avatar() {
        let mut cam = FollowCamera::new();
        // Yaw +90 deg turns local +Z forward onto +X, so the behind-offset
        // lands on the -X side.
        let rot = Quat::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_2);
        cam.update(Vec3::ZERO, rot);

        assert!(cam.position().x < 0.0);
        assert!((cam.position().z).abs() < 0.01);
    }
}
