//! Narrow-phase collision detection.
//!
//! Every routine takes two resolved [`WorldShape`]s and produces at most one
//! contact. The normal convention throughout is "from B toward A": pushing A
//! along the normal by the penetration depth separates the pair.
//!
//! Oriented boxes use the separating axis test over the 15 candidate axes
//! (three face normals each plus the nine edge cross products); the axis of
//! minimum overlap becomes the contact normal.

use glam::Vec3;

use crate::collider::{BodyKey, ColliderKey};
use crate::world_shape::{Obb, WorldShape};

/// Cross-product axes below this squared length are near-parallel edge
/// pairs and are skipped.
const AXIS_EPSILON: f32 = 1e-8;

/// A single contact point between two colliders.
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    /// World-space contact point.
    pub point: Vec3,
    /// Unit normal pointing from B toward A.
    pub normal: Vec3,
    /// Penetration depth along the normal, positive when overlapping.
    pub penetration: f32,
    /// Accumulated position-solve Lagrange multiplier, filled by the solver.
    pub lambda: f32,
    /// First collider of the pair.
    pub collider_a: ColliderKey,
    /// Second collider of the pair.
    pub collider_b: ColliderKey,
    /// Body behind collider A, if any.
    pub body_a: Option<BodyKey>,
    /// Body behind collider B, if any.
    pub body_b: Option<BodyKey>,
}

/// Raw geometric contact before collider/body keys are attached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactGeom {
    /// World-space contact point.
    pub point: Vec3,
    /// Unit normal pointing from B toward A.
    pub normal: Vec3,
    /// Penetration depth, positive when overlapping.
    pub penetration: f32,
}

impl ContactGeom {
    /// Swap the roles of A and B.
    pub fn flip(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Test two world shapes for contact.
///
/// Unsupported pairings (mixed aligned/oriented boxes, plane against plane)
/// log once per occurrence and report no contact rather than guessing.
pub fn collide(a: &WorldShape, b: &WorldShape) -> Option<ContactGeom> {
    use WorldShape::*;
    match (a, b) {
        (Sphere { center: ca, radius: ra }, Sphere { center: cb, radius: rb }) => {
            sphere_sphere(*ca, *ra, *cb, *rb)
        }
        (Sphere { center, radius }, Aabb(bx)) => sphere_aabb(*center, *radius, bx),
        (Aabb(bx), Sphere { center, radius }) => {
            sphere_aabb(*center, *radius, bx).map(ContactGeom::flip)
        }
        (Sphere { center, radius }, Obb(bx)) => sphere_obb(*center, *radius, bx),
        (Obb(bx), Sphere { center, radius }) => {
            sphere_obb(*center, *radius, bx).map(ContactGeom::flip)
        }
        (Sphere { center, radius }, Plane { normal, distance }) => {
            sphere_plane(*center, *radius, *normal, *distance)
        }
        (Plane { normal, distance }, Sphere { center, radius }) => {
            sphere_plane(*center, *radius, *normal, *distance).map(ContactGeom::flip)
        }
        (Aabb(a), Aabb(b)) => aabb_aabb(a, b),
        (Aabb(bx), Plane { normal, distance }) => aabb_plane(bx, *normal, *distance),
        (Plane { normal, distance }, Aabb(bx)) => {
            aabb_plane(bx, *normal, *distance).map(ContactGeom::flip)
        }
        (Obb(a), Obb(b)) => obb_obb(a, b),
        (Obb(bx), Plane { normal, distance }) => obb_plane(bx, *normal, *distance),
        (Plane { normal, distance }, Obb(bx)) => {
            obb_plane(bx, *normal, *distance).map(ContactGeom::flip)
        }
        (Aabb(_), Obb(_)) | (Obb(_), Aabb(_)) => {
            log::warn!("aligned/oriented box pairing not supported; no contact generated");
            None
        }
        (Plane { .. }, Plane { .. }) => {
            log::warn!("plane/plane pairing not supported; no contact generated");
            None
        }
        (Empty, _) | (_, Empty) => None,
    }
}

// ============================================================
// Sphere tests
// ============================================================

fn sphere_sphere(ca: Vec3, ra: f32, cb: Vec3, rb: f32) -> Option<ContactGeom> {
    let delta = ca - cb;
    let dist_sq = delta.length_squared();
    let sum = ra + rb;
    if dist_sq >= sum * sum {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 {
        delta / dist
    } else {
        // Concentric spheres have no separating direction; pick one.
        log::warn!("concentric spheres; using +Y as contact normal");
        Vec3::Y
    };
    let surface_a = ca - normal * ra;
    let surface_b = cb + normal * rb;
    Some(ContactGeom {
        point: (surface_a + surface_b) * 0.5,
        normal,
        penetration: sum - dist,
    })
}

fn sphere_plane(center: Vec3, radius: f32, normal: Vec3, distance: f32) -> Option<ContactGeom> {
    let signed = center.dot(normal) - distance;
    let penetration = radius - signed;
    if penetration <= 0.0 {
        return None;
    }
    Some(ContactGeom {
        point: center - normal * signed,
        normal,
        penetration,
    })
}

fn sphere_aabb(center: Vec3, radius: f32, bx: &crate::shape::Aabb) -> Option<ContactGeom> {
    let closest = center.clamp(bx.min, bx.max);
    let delta = center - closest;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }
    if dist_sq > 1e-12 {
        let dist = dist_sq.sqrt();
        let normal = delta / dist;
        return Some(ContactGeom {
            point: closest,
            normal,
            penetration: radius - dist,
        });
    }
    // Center inside the box: push out along the nearest face.
    let he = bx.half_extents();
    let local = center - bx.center();
    let gaps = he - local.abs();
    let (axis, gap) = min_axis(gaps);
    let sign = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
    let mut normal = Vec3::ZERO;
    normal[axis] = sign;
    Some(ContactGeom {
        point: center - normal * gap,
        normal,
        penetration: radius + gap,
    })
}

fn sphere_obb(center: Vec3, radius: f32, bx: &Obb) -> Option<ContactGeom> {
    // Work in the box's local frame, then rotate the result back.
    let rel = center - bx.center;
    let local = Vec3::new(
        rel.dot(bx.axes.col(0)),
        rel.dot(bx.axes.col(1)),
        rel.dot(bx.axes.col(2)),
    );
    let clamped = local.clamp(-bx.half_extents, bx.half_extents);
    let delta = local - clamped;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }
    if dist_sq > 1e-12 {
        let dist = dist_sq.sqrt();
        let normal = bx.axes * (delta / dist);
        return Some(ContactGeom {
            point: bx.center + bx.axes * clamped,
            normal,
            penetration: radius - dist,
        });
    }
    let gaps = bx.half_extents - local.abs();
    let (axis, gap) = min_axis(gaps);
    let sign = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
    let normal = bx.axes.col(axis) * sign;
    Some(ContactGeom {
        point: center - normal * gap,
        normal,
        penetration: radius + gap,
    })
}

/// Index and value of the smallest component.
fn min_axis(v: Vec3) -> (usize, f32) {
    let mut axis = 0;
    let mut min = v.x;
    if v.y < min {
        axis = 1;
        min = v.y;
    }
    if v.z < min {
        axis = 2;
        min = v.z;
    }
    (axis, min)
}

// ============================================================
// Box tests
// ============================================================

fn aabb_aabb(a: &crate::shape::Aabb, b: &crate::shape::Aabb) -> Option<ContactGeom> {
    let overlap_min = a.min.max(b.min);
    let overlap_max = a.max.min(b.max);
    let overlap = overlap_max - overlap_min;
    if overlap.x <= 0.0 || overlap.y <= 0.0 || overlap.z <= 0.0 {
        return None;
    }
    let (axis, penetration) = min_axis(overlap);
    let dir = a.center() - b.center();
    let sign = if dir[axis] >= 0.0 { 1.0 } else { -1.0 };
    let mut normal = Vec3::ZERO;
    normal[axis] = sign;
    Some(ContactGeom {
        point: (overlap_min + overlap_max) * 0.5,
        normal,
        penetration,
    })
}

fn aabb_plane(bx: &crate::shape::Aabb, normal: Vec3, distance: f32) -> Option<ContactGeom> {
    let he = bx.half_extents();
    let radius = he.x * normal.x.abs() + he.y * normal.y.abs() + he.z * normal.z.abs();
    let signed = bx.center().dot(normal) - distance;
    let penetration = radius - signed;
    if penetration <= 0.0 {
        return None;
    }
    Some(ContactGeom {
        // Deepest corner, projected onto the plane.
        point: bx.center() - normal * signed,
        normal,
        penetration,
    })
}

fn obb_plane(bx: &Obb, normal: Vec3, distance: f32) -> Option<ContactGeom> {
    let mut sum = Vec3::ZERO;
    let mut count = 0;
    let mut min_dist = f32::MAX;
    for v in bx.vertices() {
        let d = v.dot(normal) - distance;
        min_dist = min_dist.min(d);
        if d < 0.0 {
            sum += v - normal * d;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some(ContactGeom {
        point: sum / count as f32,
        normal,
        penetration: -min_dist,
    })
}

/// Separating axis test between two oriented boxes.
fn obb_obb(a: &Obb, b: &Obb) -> Option<ContactGeom> {
    let delta = a.center - b.center;

    let mut best_overlap = f32::MAX;
    let mut best_axis = Vec3::ZERO;

    let mut test = |axis: Vec3| -> bool {
        let len_sq = axis.length_squared();
        if len_sq < AXIS_EPSILON {
            // Near-parallel edges; this axis carries no information.
            return true;
        }
        let axis = axis / len_sq.sqrt();
        let span = a.projected_radius(axis) + b.projected_radius(axis);
        let dist = delta.dot(axis).abs();
        let overlap = span - dist;
        if overlap <= 0.0 {
            return false;
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = axis;
        }
        true
    };

    for i in 0..3 {
        if !test(a.axes.col(i)) {
            return None;
        }
    }
    for i in 0..3 {
        if !test(b.axes.col(i)) {
            return None;
        }
    }
    for i in 0..3 {
        for j in 0..3 {
            if !test(a.axes.col(i).cross(b.axes.col(j))) {
                return None;
            }
        }
    }

    // Orient the minimum-overlap axis from B toward A.
    let normal = if delta.dot(best_axis) >= 0.0 {
        best_axis
    } else {
        -best_axis
    };

    // Deepest point of each box toward the other, averaged.
    let support_a = a.support(-normal);
    let support_b = b.support(normal);
    Some(ContactGeom {
        point: (support_a + support_b) * 0.5,
        normal,
        penetration: best_overlap,
    })
}
