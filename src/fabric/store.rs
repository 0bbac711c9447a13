//! In-Process Fabric Implementation
//!
//! `LocalFabric` connects any number of participants within one process
//! through a shared hub. Writes become visible to all participants
//! immediately, which is the degenerate (fastest) case of the fabric's
//! asynchronous last-write-wins contract. The demo binary and the tests use
//! it to stand in for a networked fabric.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::fabric::{keys, StateFabric};
use crate::game::state::{EntityId, Profile};

/// Per-entity key/value bags, keyed by entity identity.
type EntityBags = BTreeMap<EntityId, BTreeMap<String, Value>>;

/// Per-participant, per-topic RPC inboxes.
type Inboxes = BTreeMap<EntityId, BTreeMap<String, Vec<Value>>>;

#[derive(Default)]
struct HubState {
    entities: RwLock<EntityBags>,
    globals: RwLock<BTreeMap<String, Value>>,
    /// Join order; the first present participant is the host.
    order: RwLock<Vec<EntityId>>,
    inboxes: RwLock<Inboxes>,
}

/// Shared hub that `LocalFabric` participants connect through.
#[derive(Clone, Default)]
pub struct FabricHub {
    inner: Arc<HubState>,
}

impl FabricHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the hub as a new participant with the given public profile.
    ///
    /// The hub assigns a fresh entity identity; the first participant to
    /// join (and remain) is the host.
    pub fn join(&self, profile: Profile) -> LocalFabric {
        let id = EntityId::new(*uuid::Uuid::new_v4().as_bytes());

        let mut bag = BTreeMap::new();
        bag.insert(
            keys::PROFILE.to_string(),
            serde_json::to_value(&profile).unwrap_or(Value::Null),
        );

        self.inner
            .entities
            .write()
            .expect("fabric lock poisoned")
            .insert(id, bag);
        self.inner
            .order
            .write()
            .expect("fabric lock poisoned")
            .push(id);
        self.inner
            .inboxes
            .write()
            .expect("fabric lock poisoned")
            .insert(id, BTreeMap::new());

        LocalFabric {
            hub: Arc::clone(&self.inner),
            id,
        }
    }

    /// Number of currently-connected participants.
    pub fn participant_count(&self) -> usize {
        self.inner.order.read().expect("fabric lock poisoned").len()
    }
}

/// One participant's connection to a [`FabricHub`].
pub struct LocalFabric {
    hub: Arc<HubState>,
    id: EntityId,
}

impl StateFabric for LocalFabric {
    fn local_id(&self) -> EntityId {
        self.id
    }

    fn is_host(&self) -> bool {
        self.hub
            .order
            .read()
            .expect("fabric lock poisoned")
            .first()
            .is_some_and(|first| *first == self.id)
    }

    fn participants(&self) -> Vec<EntityId> {
        self.hub.order.read().expect("fabric lock poisoned").clone()
    }

    fn read(&self, entity: EntityId, key: &str) -> Option<Value> {
        self.hub
            .entities
            .read()
            .expect("fabric lock poisoned")
            .get(&entity)
            .and_then(|bag| bag.get(key).cloned())
    }

    fn write(&self, entity: EntityId, key: &str, value: Value, _broadcast_immediate: bool) {
        // Writes to a departed entity are dropped, matching a networked
        // fabric racing a leave notification.
        if let Some(bag) = self
            .hub
            .entities
            .write()
            .expect("fabric lock poisoned")
            .get_mut(&entity)
        {
            bag.insert(key.to_string(), value);
        }
    }

    fn clear(&self, entity: EntityId, key: &str) {
        if let Some(bag) = self
            .hub
            .entities
            .write()
            .expect("fabric lock poisoned")
            .get_mut(&entity)
        {
            bag.remove(key);
        }
    }

    fn read_global(&self, key: &str) -> Option<Value> {
        self.hub
            .globals
            .read()
            .expect("fabric lock poisoned")
            .get(key)
            .cloned()
    }

    fn write_global(&self, key: &str, value: Value, _broadcast_immediate: bool) {
        self.hub
            .globals
            .write()
            .expect("fabric lock poisoned")
            .insert(key.to_string(), value);
    }

    fn broadcast(&self, topic: &str, payload: Value) {
        let mut inboxes = self.hub.inboxes.write().expect("fabric lock poisoned");
        for inbox in inboxes.values_mut() {
            inbox
                .entry(topic.to_string())
                .or_default()
                .push(payload.clone());
        }
    }

    fn drain(&self, topic: &str) -> Vec<Value> {
        self.hub
            .inboxes
            .write()
            .expect("fabric lock poisoned")
            .get_mut(&self.id)
            .and_then(|inbox| inbox.remove(topic))
            .unwrap_or_default()
    }

    fn leave(&self) {
        self.hub
            .order
            .write()
            .expect("fabric lock poisoned")
            .retain(|id| *id != self.id);
        self.hub
            .entities
            .write()
            .expect("fabric lock poisoned")
            .remove(&self.id);
        self.hub
            .inboxes
            .write()
            .expect("fabric lock poisoned")
            .remove(&self.id);
    }
}
