//! Broad-phase candidate pair generation.
//!
//! Brute-force AABB sweep over every collider pair. Quadratic, which holds
//! up fine at the scene sizes this targets; the interface stays the same if
//! a sweep-and-prune or grid replaces it later.

use slotmap::SlotMap;

use crate::body::RigidBody;
use crate::collider::{BodyKey, Collider, ColliderKey};

/// Collect collider pairs whose fattened AABBs overlap.
///
/// Pairs where both colliders sit on the same body, and pairs where neither
/// side has a simulated body, are skipped before the AABB test.
pub fn compute_pairs(
    colliders: &SlotMap<ColliderKey, Collider>,
    bodies: &SlotMap<BodyKey, RigidBody>,
    margin: f32,
) -> Vec<(ColliderKey, ColliderKey)> {
    let is_dynamic = |c: &Collider| {
        c.body
            .and_then(|k| bodies.get(k))
            .is_some_and(|b| b.simulate_physics)
    };

    let active: Vec<_> = colliders
        .iter()
        .filter(|(_, c)| c.enabled)
        .map(|(key, c)| (key, c, c.aabb.fattened(margin)))
        .collect();

    let mut pairs = Vec::new();
    for (i, (key_a, col_a, aabb_a)) in active.iter().enumerate() {
        for (key_b, col_b, aabb_b) in &active[i + 1..] {
            if col_a.body.is_some() && col_a.body == col_b.body {
                continue;
            }
            if !is_dynamic(col_a) && !is_dynamic(col_b) {
                continue;
            }
            if aabb_a.overlaps(aabb_b) {
                pairs.push((*key_a, *key_b));
            }
        }
    }
    pairs
}
