//! Replicated State Fabric Boundary
//!
//! The fabric is an external collaborator: a per-entity string-keyed value
//! store with asynchronous propagation, plus global session keys, membership
//! observation and a broadcast RPC channel. This module defines the trait the
//! core consumes, the typed serialization boundary (`keys`), and an
//! in-process reference implementation (`store::LocalFabric`) used by the
//! demo binary and the tests.

pub mod keys;
pub mod store;

use std::sync::Arc;

use serde_json::Value;

use crate::game::state::EntityId;

pub use keys::{AvatarView, AvatarWriter, SessionView};
pub use store::{FabricHub, LocalFabric};

/// Shared handle to a fabric participant connection.
pub type SharedFabric = Arc<dyn StateFabric>;

/// A participant's connection to the replicated state fabric.
///
/// All writes are fire-and-forget: propagation to other participants is
/// asynchronous and last-write-wins per key. Nothing in this trait enforces
/// ownership; the single-writer discipline is imposed by the typed layer in
/// [`keys`], which only hands out a writer for the locally-owned entity.
pub trait StateFabric: Send + Sync {
    /// Identity of the local participant's own entity.
    fn local_id(&self) -> EntityId;

    /// Is this participant the session host?
    ///
    /// Stable for the lifetime of the process barring host disconnect, which
    /// this core does not handle.
    fn is_host(&self) -> bool;

    /// Currently-observed membership, in join order.
    fn participants(&self) -> Vec<EntityId>;

    /// Read one key of one entity. Absent key or departed entity yields None.
    fn read(&self, entity: EntityId, key: &str) -> Option<Value>;

    /// Write one key of one entity.
    ///
    /// `broadcast_immediate` requests out-of-band propagation instead of the
    /// next batched sync (advisory; LocalFabric propagates immediately
    /// either way).
    fn write(&self, entity: EntityId, key: &str, value: Value, broadcast_immediate: bool);

    /// Remove one key of one entity, so readers observe it as unset.
    fn clear(&self, entity: EntityId, key: &str);

    /// Read a global session key.
    fn read_global(&self, key: &str) -> Option<Value>;

    /// Write a global session key.
    fn write_global(&self, key: &str, value: Value, broadcast_immediate: bool);

    /// Broadcast an RPC payload to every participant (including the sender).
    fn broadcast(&self, topic: &str, payload: Value);

    /// Drain payloads received on `topic` since the last drain.
    fn drain(&self, topic: &str) -> Vec<Value>;

    /// Leave the session. Departure propagates to other participants as a
    /// membership change; no graceful handshake.
    fn leave(&self);
}
