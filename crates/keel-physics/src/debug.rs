//! Debug visualization hook.

use glam::{Quat, Vec3};

/// Sink for per-tick debug geometry.
///
/// The scene clears the sink at the top of each tick, then emits collider
/// bounds and contact normals as it simulates. Implement this on the
/// renderer's line-drawing layer and register it with
/// [`PhysicsScene::set_debug_draw`](crate::PhysicsScene::set_debug_draw).
pub trait DebugDraw: Send + Sync {
    /// Discard last tick's geometry.
    fn clear(&self);

    /// Draw a wireframe box.
    fn add_cube(&self, center: Vec3, half_extents: Vec3, rotation: Quat);

    /// Draw a ray, length encoded in `direction`.
    fn add_ray(&self, origin: Vec3, direction: Vec3);
}
