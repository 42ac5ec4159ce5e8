//! Double-buffered transform output for render/game threads.
//!
//! The scene writes every simulated actor's pose after each tick, then
//! swaps. Readers only ever see the last fully committed tick; a swap never
//! exposes a half-written map. Removals are deferred to the swap so a
//! reader holding a snapshot never observes an actor vanish mid-tick.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use glam::{Quat, Vec3};

use crate::collider::ActorId;

/// A body pose as published to the rest of the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub rotation: Quat,
}

struct SyncInner {
    maps: [HashMap<ActorId, Transform>; 2],
    write: usize,
    pending_removals: Vec<ActorId>,
}

/// Thread-safe, double-buffered map of actor transforms.
pub struct TransformSyncBuffer {
    inner: Mutex<SyncInner>,
}

impl Default for TransformSyncBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformSyncBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SyncInner {
                maps: [HashMap::new(), HashMap::new()],
                write: 0,
                pending_removals: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SyncInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write an actor's pose into the staging map.
    pub fn write(&self, actor: ActorId, transform: Transform) {
        let mut inner = self.lock();
        let write = inner.write;
        inner.maps[write].insert(actor, transform);
    }

    /// Schedule an actor's entry for removal at the next swap.
    pub fn mark_to_remove(&self, actor: ActorId) {
        self.lock().pending_removals.push(actor);
    }

    /// Publish the staging map and apply pending removals to both maps.
    /// Called once at the end of each tick.
    pub fn swap(&self) {
        let mut inner = self.lock();
        inner.write ^= 1;
        let removals = std::mem::take(&mut inner.pending_removals);
        for actor in removals {
            inner.maps[0].remove(&actor);
            inner.maps[1].remove(&actor);
        }
    }

    /// Read one actor's last published pose.
    pub fn get(&self, actor: ActorId) -> Option<Transform> {
        let inner = self.lock();
        inner.maps[inner.write ^ 1].get(&actor).copied()
    }

    /// Clone the full published map.
    pub fn snapshot(&self) -> HashMap<ActorId, Transform> {
        let inner = self.lock();
        inner.maps[inner.write ^ 1].clone()
    }
}
