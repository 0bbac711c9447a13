//! Game Events
//!
//! Locally-observed happenings, accumulated during a frame or session tick
//! and drained by the embedding (UI, audio, logging). Events are not
//! replicated; each participant derives its own from the state it observes.

use crate::game::state::{EntityId, Profile, Stage};

/// Something that happened this frame.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// The session moved to a new lifecycle stage.
    StageChanged {
        /// Stage before the transition.
        from: Stage,
        /// Stage after the transition.
        to: Stage,
    },
    /// A round concluded; `None` means everyone fell before it resolved.
    WinnerDeclared {
        /// The surviving avatar's profile, if any survived.
        profile: Option<Profile>,
    },
    /// A participant appeared in the roster.
    AvatarJoined {
        /// The new avatar.
        id: EntityId,
    },
    /// A participant left the roster.
    AvatarLeft {
        /// The departed avatar.
        id: EntityId,
    },
    /// The local avatar fell past the kill plane.
    AvatarDied {
        /// The fallen avatar.
        id: EntityId,
        /// Its profile, for the death banner.
        profile: Profile,
    },
}

/// Frame-scoped event accumulator.
#[derive(Default)]
pub struct EventQueue {
    pending: Vec<GameEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    /// Take all pending events, leaving the queue empty.
    pub fn take(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Are any events pending?
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
