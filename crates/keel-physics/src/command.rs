//! Double-buffered command queue for cross-thread scene mutation.
//!
//! Game threads enqueue into the write queue at any time; the scene swaps
//! the buffers at the top of each tick and drains the read queue without
//! holding the lock against producers. Commands therefore apply at the
//! start of the tick after the one in flight when they were enqueued.

use std::sync::{Mutex, PoisonError};

use glam::{Quat, Vec3};

use crate::body::RigidBody;
use crate::collider::{ActorId, Collider};

/// A deferred mutation of the physics scene, addressed by actor id.
#[derive(Debug)]
pub enum PhysicsCommand {
    /// Register a body for an actor at an initial pose. Replaces any body
    /// already registered for the actor.
    AddBody {
        /// Owning actor.
        actor: ActorId,
        /// The body to insert.
        body: Box<RigidBody>,
        /// Initial position.
        position: Vec3,
        /// Initial orientation.
        rotation: Quat,
    },
    /// Remove an actor's body, unlinking its colliders.
    RemoveBody(ActorId),
    /// Register a collider; binds to the actor's body if one exists.
    AddCollider(Box<Collider>),
    /// Remove an actor's collider.
    RemoveCollider(ActorId),
    /// Teleport an actor's body without generating velocity.
    SetPosition(ActorId, Vec3),
    /// Reorient an actor's body without generating angular velocity.
    SetRotation(ActorId, Quat),
}

struct Buffers {
    queues: [Vec<PhysicsCommand>; 2],
    write: usize,
}

/// Thread-safe, double-buffered queue of [`PhysicsCommand`]s.
pub struct PhysicsCommandBuffer {
    inner: Mutex<Buffers>,
}

impl Default for PhysicsCommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsCommandBuffer {
    /// Create an empty command buffer.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Buffers {
                queues: [Vec::new(), Vec::new()],
                write: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Buffers> {
        // A panicked producer leaves the queue intact; keep simulating.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a command to the write queue.
    pub fn enqueue(&self, command: PhysicsCommand) {
        let mut inner = self.lock();
        let write = inner.write;
        inner.queues[write].push(command);
    }

    /// Flip write and read queues. Called once at the top of each tick.
    pub fn swap_buffers(&self) {
        self.lock().write ^= 1;
    }

    /// Take the contents of the read queue.
    pub fn drain(&self) -> Vec<PhysicsCommand> {
        let mut inner = self.lock();
        let read = inner.write ^ 1;
        std::mem::take(&mut inner.queues[read])
    }

    /// Number of commands waiting in the write queue.
    pub fn pending(&self) -> usize {
        let inner = self.lock();
        inner.queues[inner.write].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_become_visible_after_swap() {
        let buffer = PhysicsCommandBuffer::new();
        buffer.enqueue(PhysicsCommand::RemoveBody(ActorId(1)));
        assert_eq!(buffer.pending(), 1);

        // Not yet swapped: the read queue is empty.
        assert!(buffer.drain().is_empty());

        buffer.swap_buffers();
        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert!(matches!(drained[0], PhysicsCommand::RemoveBody(ActorId(1))));

        // Drain empties the queue.
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn enqueue_during_drain_lands_in_next_tick() {
        let buffer = PhysicsCommandBuffer::new();
        buffer.enqueue(PhysicsCommand::RemoveBody(ActorId(1)));
        buffer.swap_buffers();
        // Enqueued mid-tick: goes to the write queue, untouched by drain.
        buffer.enqueue(PhysicsCommand::RemoveBody(ActorId(2)));
        assert_eq!(buffer.drain().len(), 1);

        buffer.swap_buffers();
        let next = buffer.drain();
        assert_eq!(next.len(), 1);
        assert!(matches!(next[0], PhysicsCommand::RemoveBody(ActorId(2))));
    }

    #[test]
    fn preserves_enqueue_order() {
        let buffer = PhysicsCommandBuffer::new();
        for i in 0..5 {
            buffer.enqueue(PhysicsCommand::RemoveBody(ActorId(i)));
        }
        buffer.swap_buffers();
        let drained = buffer.drain();
        for (i, cmd) in drained.iter().enumerate() {
            assert!(matches!(cmd, PhysicsCommand::RemoveBody(a) if a.0 == i as u64));
        }
    }
}
