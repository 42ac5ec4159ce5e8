//! World-space shape instances produced each substep.
//!
//! The narrow phase never looks at local shapes or body poses directly;
//! it dispatches on these resolved variants. A box collapses to an AABB
//! only when its body cannot rotate and sits at identity orientation, so
//! the cheaper axis-aligned tests apply without discarding a real tilt.

use glam::{Mat3, Quat, Vec3};

use crate::body::RigidBody;
use crate::collider::Collider;
use crate::shape::{Aabb, Shape};

/// Rotation is treated as identity when the quaternion is this close to it.
const IDENTITY_W_THRESHOLD: f32 = 0.999_999;

/// Planes are given this half-thickness for bounding purposes.
const PLANE_HALF_THICKNESS: f32 = 0.01;

/// Oriented bounding box in world space.
#[derive(Clone, Copy, Debug)]
pub struct Obb {
    /// World-space center.
    pub center: Vec3,
    /// Columns are the box's unit axes in world space.
    pub axes: Mat3,
    /// Half-extents along each axis.
    pub half_extents: Vec3,
}

impl Obb {
    /// The eight corner vertices.
    pub fn vertices(&self) -> [Vec3; 8] {
        let ax = self.axes.col(0) * self.half_extents.x;
        let ay = self.axes.col(1) * self.half_extents.y;
        let az = self.axes.col(2) * self.half_extents.z;
        [
            self.center - ax - ay - az,
            self.center + ax - ay - az,
            self.center - ax + ay - az,
            self.center + ax + ay - az,
            self.center - ax - ay + az,
            self.center + ax - ay + az,
            self.center - ax + ay + az,
            self.center + ax + ay + az,
        ]
    }

    /// The vertex farthest along a world-space direction.
    pub fn support(&self, dir: Vec3) -> Vec3 {
        let mut p = self.center;
        for i in 0..3 {
            let axis = self.axes.col(i);
            let sign = if axis.dot(dir) >= 0.0 { 1.0 } else { -1.0 };
            p += axis * (sign * self.half_extents[i]);
        }
        p
    }

    /// Half the box's projected extent along a world-space direction.
    pub fn projected_radius(&self, dir: Vec3) -> f32 {
        self.half_extents.x * self.axes.col(0).dot(dir).abs()
            + self.half_extents.y * self.axes.col(1).dot(dir).abs()
            + self.half_extents.z * self.axes.col(2).dot(dir).abs()
    }

    /// Tightest AABB enclosing the box.
    pub fn enclosing_aabb(&self) -> Aabb {
        let half = Vec3::new(
            self.projected_radius(Vec3::X),
            self.projected_radius(Vec3::Y),
            self.projected_radius(Vec3::Z),
        );
        Aabb::from_center_half_extents(self.center, half)
    }
}

/// A collider's shape resolved to the predicted world pose of its body.
#[derive(Clone, Copy, Debug)]
pub enum WorldShape {
    /// Sphere at a world position.
    Sphere {
        /// World-space center.
        center: Vec3,
        /// Sphere radius.
        radius: f32,
    },
    /// Axis-aligned box (unrotated or rotation-locked bodies).
    Aabb(Aabb),
    /// Oriented box.
    Obb(Obb),
    /// Infinite plane `normal . x = distance`. The shape's finite extents
    /// only bound the broad-phase AABB.
    Plane {
        /// Unit plane normal.
        normal: Vec3,
        /// Signed distance from the origin along the normal.
        distance: f32,
    },
    /// Disabled or degenerate; never collides.
    Empty,
}

impl WorldShape {
    /// Resolve a collider against its body's predicted pose. Unattached
    /// colliders use the offset alone with identity rotation.
    ///
    /// Returns the world shape and its broad-phase AABB.
    pub fn resolve(collider: &Collider, body: Option<&RigidBody>) -> (WorldShape, Aabb) {
        let (pos, rot, can_rotate) = match body {
            Some(b) => (
                b.predicted_position,
                b.predicted_rotation,
                b.simulate_physics && b.simulate_rotation,
            ),
            None => (Vec3::ZERO, Quat::IDENTITY, false),
        };
        let center = pos + rot * collider.offset;

        match collider.shape {
            Shape::Sphere { radius } => {
                let aabb = Aabb::from_center_half_extents(center, Vec3::splat(radius));
                (WorldShape::Sphere { center, radius }, aabb)
            }
            Shape::Box { half_extents } => {
                // Axis-aligned only for a non-rotating body at (near)
                // identity orientation. A rotatable body keeps the Obb
                // variant even at identity so the variant stays stable as
                // it spins up; a tilted static box keeps its tilt.
                let axis_aligned = !can_rotate && rot.w.abs() > IDENTITY_W_THRESHOLD;
                if axis_aligned {
                    let aabb = Aabb::from_center_half_extents(center, half_extents);
                    (WorldShape::Aabb(aabb), aabb)
                } else {
                    let obb = Obb {
                        center,
                        axes: Mat3::from_quat(rot),
                        half_extents,
                    };
                    let aabb = obb.enclosing_aabb();
                    (WorldShape::Obb(obb), aabb)
                }
            }
            Shape::Plane { width, height } => {
                let normal = (rot * Vec3::Y).normalize();
                let distance = normal.dot(center);
                let obb = Obb {
                    center,
                    axes: Mat3::from_quat(rot),
                    half_extents: Vec3::new(width * 0.5, PLANE_HALF_THICKNESS, height * 0.5),
                };
                (WorldShape::Plane { normal, distance }, obb.enclosing_aabb())
            }
        }
    }
}
