//! Input Frames
//!
//! Ephemeral per-frame abstraction over keyboard intents and an angular
//! virtual joystick. Never replicated; consumed once per frame by the avatar
//! controller, and only for the locally-owned entity.

/// Joystick dead-zone on the sin/cos axes.
const JOYSTICK_DEADZONE: f32 = 0.1;

/// State of the angular virtual joystick for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JoystickFrame {
    /// Heading angle in radians; forward is `cos(angle) < 0`.
    pub angle: f32,
    /// Is the stick deflected this frame?
    pub active: bool,
    /// Jump button held.
    pub jump: bool,
    /// Dive button held.
    pub dive: bool,
    /// Sprint button held.
    pub sprint: bool,
}

impl JoystickFrame {
    fn axes(&self) -> (f32, f32) {
        (self.angle.sin(), self.angle.cos())
    }
}

/// All input intents for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    /// Move forward (W / ArrowUp).
    pub forward: bool,
    /// Move backward (S / ArrowDown).
    pub back: bool,
    /// Turn left (A / ArrowLeft).
    pub left: bool,
    /// Turn right (D / ArrowRight).
    pub right: bool,
    /// Jump (Space).
    pub jump: bool,
    /// Sprint modifier (Shift).
    pub sprint: bool,
    /// Dive (E).
    pub dive: bool,
    /// Hide / quit the session (H).
    pub hide: bool,
    /// Virtual joystick state, when one is attached.
    pub joystick: Option<JoystickFrame>,
}

impl InputFrame {
    /// A frame with nothing pressed.
    pub const fn idle() -> Self {
        Self {
            forward: false,
            back: false,
            left: false,
            right: false,
            jump: false,
            sprint: false,
            dive: false,
            hide: false,
            joystick: None,
        }
    }

    fn joystick_axes(&self) -> Option<(f32, f32)> {
        self.joystick.filter(|j| j.active).map(|j| j.axes())
    }

    /// Forward intent from either source.
    pub fn wants_forward(&self) -> bool {
        self.forward
            || self
                .joystick_axes()
                .is_some_and(|(_, y)| y < -JOYSTICK_DEADZONE)
    }

    /// Backward intent from either source.
    pub fn wants_back(&self) -> bool {
        self.back
            || self
                .joystick_axes()
                .is_some_and(|(_, y)| y > JOYSTICK_DEADZONE)
    }

    /// Sprint applies only on top of an active forward intent.
    pub fn sprinting(&self) -> bool {
        (self.forward && self.sprint)
            || (self
                .joystick_axes()
                .is_some_and(|(_, y)| y < -JOYSTICK_DEADZONE)
                && self.joystick.is_some_and(|j| j.sprint))
    }

    /// Discrete keyboard turn intents.
    pub fn turns_left(&self) -> bool {
        self.left
    }

    /// Discrete keyboard turn intents.
    pub fn turns_right(&self) -> bool {
        self.right
    }

    /// Analog left-turn intent from the joystick heading.
    pub fn joystick_turns_left(&self) -> bool {
        self.joystick_axes()
            .is_some_and(|(x, _)| x < -JOYSTICK_DEADZONE)
    }

    /// Analog right-turn intent from the joystick heading.
    pub fn joystick_turns_right(&self) -> bool {
        self.joystick_axes()
            .is_some_and(|(x, _)| x > JOYSTICK_DEADZONE)
    }

    /// Jump intent from either source.
    pub fn wants_jump(&self) -> bool {
        self.jump || self.joystick.is_some_and(|j| j.jump)
    }

    /// Dive intent from either source.
    pub fn wants_dive(&self) -> bool {
        self.dive || self.joystick.is_some_and(|j| j.dive)
    }

    /// Hide/quit intent (keyboard only).
    pub fn wants_hide(&self) -> bool {
        self.hide
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_idle_frame() {
        let f = InputFrame::idle();
        assert!(!f.wants_forward());
        assert!(!f.wants_back());
        assert!(!f.wants_jump());
        assert!(!f.sprinting());
    }

    #[test]
    fn test_keyboard_sprint_requires_forward() {
        let mut f = InputFrame::idle();
        f.sprint = true;
        assert!(!f.sprinting());

        f.forward = true;
        assert!(f.sprinting());
        assert!(f.wants_forward());
    }

    #[test]
    fn test_joystick_forward_is_negative_cos() {
        // angle = PI puts cos at -1: full forward.
        let mut f = InputFrame::idle();
        f.joystick = Some(JoystickFrame {
            angle: PI,
            active: true,
            ..Default::default()
        });
        assert!(f.wants_forward());
        assert!(!f.wants_back());

        // angle = 0 puts cos at +1: full back.
        f.joystick = Some(JoystickFrame {
            angle: 0.0,
            active: true,
            ..Default::default()
        });
        assert!(f.wants_back());
        assert!(!f.wants_forward());
    }

    #[test]
    fn test_joystick_deadzone() {
        // cos(1.65) ~ -0.08: inside the dead-zone, no forward intent.
        let mut f = InputFrame::idle();
        f.joystick = Some(JoystickFrame {
            angle: 1.65,
            active: true,
            ..Default::default()
        });
        assert!(!f.wants_forward());
        assert!(!f.wants_back());
    }

    #[test]
    fn test_joystick_turn_sides() {
        let mut f = InputFrame::idle();
        // sin(PI/2) = 1: heading right of center.
        f.joystick = Some(JoystickFrame {
            angle: PI / 2.0,
            active: true,
            ..Default::default()
        });
        assert!(f.joystick_turns_right());
        assert!(!f.joystick_turns_left());

        f.joystick = Some(JoystickFrame {
            angle: -PI / 2.0,
            active: true,
            ..Default::default()
        });
        assert!(f.joystick_turns_left());
    }

    #[test]
    fn test_inactive_joystick_is_ignored() {
        let mut f = InputFrame::idle();
        f.joystick = Some(JoystickFrame {
            angle: PI,
            active: false,
            jump: true,
            ..Default::default()
        });
        assert!(!f.wants_forward());
        // Buttons still register even with the stick centered.
        assert!(f.wants_jump());
    }

    #[test]
    fn test_joystick_sprint_requires_forward_heading() {
        let mut f = InputFrame::idle();
        f.joystick = Some(JoystickFrame {
            angle: 0.0,
            active: true,
            sprint: true,
            ..Default::default()
        });
        assert!(!f.sprinting());

        f.joystick = Some(JoystickFrame {
            angle: PI,
            active: true,
            sprint: true,
            ..Default::default()
        });
        assert!(f.sprinting());
    }
}
