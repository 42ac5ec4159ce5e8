//! Colliders and the identifier types that tie physics objects to game
//! actors.

use glam::Vec3;
use slotmap::new_key_type;

use crate::shape::{Aabb, Shape};

/// Stable identifier assigned by the game layer to each actor. All command
/// buffer operations address bodies and colliders by actor, never by
/// internal key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u64);

new_key_type! {
    /// Arena key for a [`RigidBody`](crate::RigidBody) in the scene.
    pub struct BodyKey;
    /// Arena key for a [`Collider`] in the scene.
    pub struct ColliderKey;
}

/// Binds a local-space [`Shape`] to an actor, optionally attached to a
/// rigid body.
///
/// A collider with no body is a static obstacle: it takes its pose from the
/// offset alone, never moves, and responds to contacts with infinite mass.
#[derive(Clone, Debug)]
pub struct Collider {
    /// Local collision shape.
    pub shape: Shape,
    /// Offset from the body origin (or the world origin when unattached).
    pub offset: Vec3,
    /// Body this collider follows, resolved by actor id when the collider
    /// is registered.
    pub body: Option<BodyKey>,
    /// Triggers report contact events but generate no collision response.
    pub is_trigger: bool,
    /// Disabled colliders are skipped by the broad phase entirely.
    pub enabled: bool,
    /// World-space bounds, refreshed each substep.
    pub aabb: Aabb,
    /// Owning actor.
    pub actor: ActorId,
}

impl Collider {
    /// Create an enabled, non-trigger collider for an actor.
    pub fn new(actor: ActorId, shape: Shape) -> Self {
        Self {
            shape,
            offset: Vec3::ZERO,
            body: None,
            is_trigger: false,
            enabled: true,
            aabb: Aabb::ZERO,
            actor,
        }
    }

    /// Offset the shape from the body origin.
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Mark as a trigger (events only, no response).
    pub fn with_trigger(mut self, is_trigger: bool) -> Self {
        self.is_trigger = is_trigger;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collider_defaults() {
        let c = Collider::new(ActorId(7), Shape::sphere(1.0));
        assert!(c.enabled);
        assert!(!c.is_trigger);
        assert!(c.body.is_none());
        assert_eq!(c.offset, Vec3::ZERO);
        assert_eq!(c.actor, ActorId(7));
    }

    #[test]
    fn builder_methods() {
        let c = Collider::new(ActorId(1), Shape::box_shape(Vec3::ONE))
            .with_offset(Vec3::Y)
            .with_trigger(true);
        assert_eq!(c.offset, Vec3::Y);
        assert!(c.is_trigger);
    }
}
