//! Chat Relay
//!
//! Session-wide text chat over the fabric's broadcast channel. Messages are
//! fire-and-forget and unordered across senders; each participant drains its
//! own inbox once per frame.

use serde::{Deserialize, Serialize};

use crate::fabric::{SharedFabric, StateFabric};
use crate::game::state::EntityId;

/// Broadcast topic carrying chat messages.
pub const CHAT_TOPIC: &str = "chat";

/// One chat line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent it.
    pub sender: EntityId,
    /// What they said.
    pub text: String,
}

/// A participant's handle on the chat channel.
pub struct ChatChannel {
    fabric: SharedFabric,
}

impl ChatChannel {
    /// Attach to the chat channel through `fabric`.
    pub fn new(fabric: SharedFabric) -> Self {
        Self { fabric }
    }

    /// Broadcast a line to every participant, the sender included.
    pub fn send(&self, text: impl Into<String>) {
        let message = ChatMessage {
            sender: self.fabric.local_id(),
            text: text.into(),
        };
        match serde_json::to_value(&message) {
            Ok(payload) => self.fabric.broadcast(CHAT_TOPIC, payload),
            Err(err) => tracing::warn!(%err, "chat message not serializable"),
        }
    }

    /// Messages received since the last drain. Undecodable payloads are
    /// dropped silently.
    pub fn drain(&self) -> Vec<ChatMessage> {
        self.fabric
            .drain(CHAT_TOPIC)
            .into_iter()
            .filter_map(|payload| serde_json::from_value(payload).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fabric::FabricHub;
    use crate::game::state::Profile;
    use std::sync::Arc;

    #[test]
    fn test_send_reaches_every_participant() {
        let hub = FabricHub::new();
        let a: SharedFabric = Arc::new(hub.join(Profile::new("Ayu", "#e63946")));
        let b: SharedFabric = Arc::new(hub.join(Profile::new("Bima", "#457b9d")));
        let a_id = a.local_id();

        let chat_a = ChatChannel::new(Arc::clone(&a));
        let chat_b = ChatChannel::new(Arc::clone(&b));

        chat_a.send("ready?");

        let expected = ChatMessage {
            sender: a_id,
            text: "ready?".to_string(),
        };
        assert_eq!(chat_a.drain(), vec![expected.clone()]);
        assert_eq!(chat_b.drain(), vec![expected]);
        assert!(chat_b.drain().is_empty());
    }

    #[test]
    fn test_undecodable_payloads_are_dropped() {
        let hub = FabricHub::new();
        let a: SharedFabric = Arc::new(hub.join(Profile::default()));
        a.broadcast(CHAT_TOPIC, serde_json::json!("not a chat message"));

        let chat = ChatChannel::new(Arc::clone(&a));
        assert!(chat.drain().is_empty());
    }
}
