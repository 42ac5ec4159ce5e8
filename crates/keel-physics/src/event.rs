//! Contact events published to game logic.

use std::sync::{Mutex, PoisonError};

use glam::Vec3;

use crate::collider::ActorId;

/// A trigger overlap reported during a tick. Trigger pairs generate events
/// instead of collision response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactEvent {
    /// First actor of the pair.
    pub actor_a: ActorId,
    /// Second actor of the pair.
    pub actor_b: ActorId,
    /// World-space contact point.
    pub point: Vec3,
    /// Unit normal pointing from B toward A.
    pub normal: Vec3,
    /// Penetration depth at detection time.
    pub penetration: f32,
}

/// Thread-safe queue of contact events, owned by the scene.
///
/// The scene pushes during the tick; game logic drains between ticks.
/// Undrained events accumulate, so consumers should drain every frame.
#[derive(Default)]
pub struct PhysicsEventQueue {
    events: Mutex<Vec<ContactEvent>>,
}

impl PhysicsEventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ContactEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event.
    pub fn push(&self, event: ContactEvent) {
        self.lock().push(event);
    }

    /// Take all queued events.
    pub fn drain(&self) -> Vec<ContactEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
