//! XPBD contact solver.
//!
//! Two passes per substep. The position pass projects predicted poses out of
//! penetration through compliance-weighted corrections, accumulating the
//! Lagrange multiplier on each contact. After velocities are derived from
//! the corrected poses, the velocity pass restores restitution and applies
//! Coulomb friction bounded by the normal force the position pass implied.

use glam::{Quat, Vec3};
use slotmap::SlotMap;

use crate::body::RigidBody;
use crate::collider::BodyKey;
use crate::collision::Contact;
use crate::shape::PhysicalMaterial;

/// Tangential speeds below this are treated as already sticking.
const FRICTION_EPSILON: f32 = 1e-6;

/// Kinetic friction as a fraction of static friction.
const KINETIC_FRICTION_RATIO: f32 = 0.8;

/// Mutable views of the (up to two) bodies behind a contact.
enum PairMut<'a> {
    Both(&'a mut RigidBody, &'a mut RigidBody),
    OnlyA(&'a mut RigidBody),
    OnlyB(&'a mut RigidBody),
    Neither,
}

fn fetch_pair<'a>(
    bodies: &'a mut SlotMap<BodyKey, RigidBody>,
    a: Option<BodyKey>,
    b: Option<BodyKey>,
) -> PairMut<'a> {
    match (a, b) {
        (Some(ka), Some(kb)) => match bodies.get_disjoint_mut([ka, kb]) {
            Some([ba, bb]) => PairMut::Both(ba, bb),
            // Same key or a stale key; nothing sane to solve.
            None => PairMut::Neither,
        },
        (Some(ka), None) => match bodies.get_mut(ka) {
            Some(ba) => PairMut::OnlyA(ba),
            None => PairMut::Neither,
        },
        (None, Some(kb)) => match bodies.get_mut(kb) {
            Some(bb) => PairMut::OnlyB(bb),
            None => PairMut::Neither,
        },
        (None, None) => PairMut::Neither,
    }
}

/// Rotate a predicted orientation by half the correction vector, the
/// first-order quaternion update used throughout position-based dynamics.
fn apply_rotation_delta(rotation: Quat, delta: Vec3) -> Quat {
    let dq = Quat::from_xyzw(delta.x, delta.y, delta.z, 0.0) * rotation;
    Quat::from_xyzw(
        rotation.x + 0.5 * dq.x,
        rotation.y + 0.5 * dq.y,
        rotation.z + 0.5 * dq.z,
        rotation.w + 0.5 * dq.w,
    )
    .normalize()
}

fn correct_body(body: &mut RigidBody, point: Vec3, impulse: Vec3) {
    if !body.simulate_physics {
        return;
    }
    let r = point - body.predicted_position;
    body.predicted_position += impulse * body.inv_mass();
    if body.simulate_rotation {
        let delta = body.inv_world_inertia() * r.cross(impulse);
        body.predicted_rotation = apply_rotation_delta(body.predicted_rotation, delta);
    }
}

/// Position pass: push each contact's predicted poses apart along the
/// normal, weighted by generalized inverse masses. `compliance` of zero is
/// a rigid contact; larger values soften it.
pub fn solve_contacts(
    bodies: &mut SlotMap<BodyKey, RigidBody>,
    contacts: &mut [Contact],
    h: f32,
    compliance: f32,
) {
    let alpha = compliance / (h * h);

    for contact in contacts.iter_mut() {
        if contact.penetration <= 0.0 {
            continue;
        }
        let n = contact.normal;
        let point = contact.point;

        match fetch_pair(bodies, contact.body_a, contact.body_b) {
            PairMut::Both(ba, bb) => {
                let wa = ba.generalized_inverse_mass(point - ba.predicted_position, n);
                let wb = bb.generalized_inverse_mass(point - bb.predicted_position, n);
                let w_sum = wa + wb;
                if w_sum <= 0.0 {
                    continue;
                }
                let d_lambda = contact.penetration / (w_sum + alpha);
                contact.lambda += d_lambda;
                correct_body(ba, point, n * d_lambda);
                correct_body(bb, point, -n * d_lambda);
            }
            PairMut::OnlyA(ba) => {
                let wa = ba.generalized_inverse_mass(point - ba.predicted_position, n);
                if wa <= 0.0 {
                    continue;
                }
                let d_lambda = contact.penetration / (wa + alpha);
                contact.lambda += d_lambda;
                correct_body(ba, point, n * d_lambda);
            }
            PairMut::OnlyB(bb) => {
                let wb = bb.generalized_inverse_mass(point - bb.predicted_position, n);
                if wb <= 0.0 {
                    continue;
                }
                let d_lambda = contact.penetration / (wb + alpha);
                contact.lambda += d_lambda;
                correct_body(bb, point, -n * d_lambda);
            }
            PairMut::Neither => {}
        }
    }
}

/// Snapshot of one side of a contact for the velocity pass. A missing body
/// contributes zero velocity, infinite mass, and the default material.
struct Side {
    velocity_at_point: Vec3,
    material: PhysicalMaterial,
}

impl Side {
    fn from_body(body: Option<&RigidBody>, point: Vec3) -> Self {
        match body {
            Some(b) => Self {
                velocity_at_point: b.velocity_at_point(point),
                material: b.material,
            },
            None => Self {
                velocity_at_point: Vec3::ZERO,
                material: PhysicalMaterial::default(),
            },
        }
    }
}

fn apply_velocity_impulse(body: &mut RigidBody, point: Vec3, impulse: Vec3) {
    if !body.simulate_physics {
        return;
    }
    body.velocity += impulse * body.inv_mass();
    if body.simulate_rotation {
        let r = point - body.position;
        body.angular_velocity += body.inv_world_inertia() * r.cross(impulse);
    }
}

/// Velocity pass: restitution and friction, run after velocities have been
/// derived from the corrected poses.
///
/// Restitution reflects the residual approach velocity scaled by the pair's
/// smaller restitution coefficient. Friction opposes tangential motion up to
/// the Coulomb cone around the position-pass normal force `lambda / h`;
/// inside the cone the contact sticks, outside it slips at the kinetic
/// coefficient.
pub fn velocity_pass(bodies: &mut SlotMap<BodyKey, RigidBody>, contacts: &[Contact], h: f32) {
    for contact in contacts {
        if contact.lambda <= 0.0 {
            continue;
        }
        let n = contact.normal;
        let point = contact.point;

        let side_a = Side::from_body(contact.body_a.and_then(|k| bodies.get(k)), point);
        let side_b = Side::from_body(contact.body_b.and_then(|k| bodies.get(k)), point);

        let (wa, wb) = {
            let w_of = |key: Option<BodyKey>| {
                key.and_then(|k| bodies.get(k))
                    .map_or(0.0, |b| b.generalized_inverse_mass(point - b.position, n))
            };
            (w_of(contact.body_a), w_of(contact.body_b))
        };
        let w_sum = wa + wb;
        if w_sum <= 0.0 {
            continue;
        }

        let v_rel = side_a.velocity_at_point - side_b.velocity_at_point;
        let vn = v_rel.dot(n);
        // Already separating: nothing to restore and no normal force left
        // to rub against.
        if vn > 0.0 {
            continue;
        }

        // Normal response: kill residual approach velocity, reflected by
        // the pair's restitution.
        if vn < 0.0 {
            let e = side_a.material.restitution.min(side_b.material.restitution);
            let jn_impulse = n * (-(1.0 + e) * vn / w_sum);
            if let Some(ba) = contact.body_a.and_then(|k| bodies.get_mut(k)) {
                apply_velocity_impulse(ba, point, jn_impulse);
            }
            if let Some(bb) = contact.body_b.and_then(|k| bodies.get_mut(k)) {
                apply_velocity_impulse(bb, point, -jn_impulse);
            }
        }

        // Friction against the updated relative velocity.
        let va = Side::from_body(contact.body_a.and_then(|k| bodies.get(k)), point)
            .velocity_at_point;
        let vb = Side::from_body(contact.body_b.and_then(|k| bodies.get(k)), point)
            .velocity_at_point;
        let v_rel = va - vb;
        let vt = v_rel - n * v_rel.dot(n);
        let vt_len = vt.length();
        if vt_len < FRICTION_EPSILON {
            continue;
        }
        let t = vt / vt_len;

        let (wa_t, wb_t) = {
            let w_of = |key: Option<BodyKey>| {
                key.and_then(|k| bodies.get(k))
                    .map_or(0.0, |b| b.generalized_inverse_mass(point - b.position, t))
            };
            (w_of(contact.body_a), w_of(contact.body_b))
        };
        let wt_sum = wa_t + wb_t;
        if wt_sum <= 0.0 {
            continue;
        }

        // Impulse that would stop all tangential motion, clamped to the
        // friction cone around the normal force from the position pass.
        let jt_stick = vt_len / wt_sum;
        let jn = contact.lambda / h;
        let mu_s = side_a.material.friction.max(side_b.material.friction);
        let jt = if jt_stick <= mu_s * jn {
            jt_stick
        } else {
            KINETIC_FRICTION_RATIO * mu_s * jn
        };

        let friction_impulse = -t * jt;
        if let Some(ba) = contact.body_a.and_then(|k| bodies.get_mut(k)) {
            apply_velocity_impulse(ba, point, friction_impulse);
        }
        if let Some(bb) = contact.body_b.and_then(|k| bodies.get_mut(k)) {
            apply_velocity_impulse(bb, point, -friction_impulse);
        }
    }
}
