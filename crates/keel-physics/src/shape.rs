//! Collision shapes, physical materials, and inertia tensors.
//!
//! Shapes are pure local-space data; they gain a pose only when a
//! [`Collider`](crate::Collider) pairs them with a body during the tick.

use glam::{Mat3, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// Local-space collision shape.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// Finite plane in the local XZ plane, facing local +Y.
    Plane {
        /// Extent along local X.
        width: f32,
        /// Extent along local Z.
        height: f32,
    },
    /// Sphere centered on the collider origin.
    Sphere {
        /// Sphere radius.
        radius: f32,
    },
    /// Box centered on the collider origin.
    Box {
        /// Half-extents along each local axis.
        half_extents: Vec3,
    },
}

impl Shape {
    /// Create a plane shape.
    pub fn plane(width: f32, height: f32) -> Self {
        Shape::Plane { width, height }
    }

    /// Create a sphere shape.
    pub fn sphere(radius: f32) -> Self {
        Shape::Sphere { radius }
    }

    /// Create a box shape from half-extents.
    pub fn box_shape(half_extents: Vec3) -> Self {
        Shape::Box { half_extents }
    }

    /// Check that all dimensions are positive and finite.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        match *self {
            Shape::Plane { width, height } => {
                if !(width > 0.0 && width.is_finite() && height > 0.0 && height.is_finite()) {
                    return Err(PhysicsError::InvalidShape {
                        shape: "plane",
                        reason: "width and height must be positive and finite",
                    });
                }
            }
            Shape::Sphere { radius } => {
                if !(radius > 0.0 && radius.is_finite()) {
                    return Err(PhysicsError::InvalidShape {
                        shape: "sphere",
                        reason: "radius must be positive and finite",
                    });
                }
            }
            Shape::Box { half_extents } => {
                if !(half_extents.cmpgt(Vec3::ZERO).all() && half_extents.is_finite()) {
                    return Err(PhysicsError::InvalidShape {
                        shape: "box",
                        reason: "half extents must be positive and finite",
                    });
                }
            }
        }
        Ok(())
    }
}

/// Surface response parameters shared by a body's contacts.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicalMaterial {
    /// Bounciness, 0 (dead) to 1 (elastic).
    pub restitution: f32,
    /// Static friction coefficient; kinetic is derived as 0.8x.
    pub friction: f32,
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
        }
    }
}

/// Compute the local-space inertia tensor for a shape of the given mass.
///
/// Closed forms exist for spheres and boxes. Shapes without one (planes are
/// static by design) fall back to the zero tensor, which the body layer
/// treats as "no rotational response" rather than an error.
pub fn inertia_tensor(shape: &Shape, mass: f32) -> Mat3 {
    if mass <= 0.0 {
        return Mat3::ZERO;
    }

    match *shape {
        Shape::Sphere { radius } => {
            // Solid sphere: 2/5 m r^2 on the diagonal.
            let i = 0.4 * mass * radius * radius;
            Mat3::from_diagonal(Vec3::splat(i))
        }
        Shape::Box { half_extents } => {
            let e = half_extents * 2.0;
            let factor = mass / 12.0;
            Mat3::from_diagonal(Vec3::new(
                factor * (e.y * e.y + e.z * e.z),
                factor * (e.x * e.x + e.z * e.z),
                factor * (e.x * e.x + e.y * e.y),
            ))
        }
        Shape::Plane { .. } => {
            log::warn!("no inertia tensor for plane shapes; using zero tensor (no rotation)");
            Mat3::ZERO
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Zero-size box at the origin.
    pub const ZERO: Self = Self {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    /// Create an AABB from min and max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from center and half-extents.
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box center.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Box half-extents.
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow the box by a uniform margin on all sides.
    pub fn fattened(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Check overlap with another AABB (inclusive of touching faces).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_inertia_closed_form() {
        let i = inertia_tensor(&Shape::sphere(2.0), 5.0);
        // 2/5 * 5 * 4 = 8
        assert!((i.col(0).x - 8.0).abs() < 1e-6);
        assert!((i.col(1).y - 8.0).abs() < 1e-6);
        assert!((i.col(2).z - 8.0).abs() < 1e-6);
    }

    #[test]
    fn box_inertia_closed_form() {
        let i = inertia_tensor(&Shape::box_shape(Vec3::new(0.5, 1.0, 1.5)), 12.0);
        // Full extents (1, 2, 3), factor = 1.
        assert!((i.col(0).x - (4.0 + 9.0)).abs() < 1e-5);
        assert!((i.col(1).y - (1.0 + 9.0)).abs() < 1e-5);
        assert!((i.col(2).z - (1.0 + 4.0)).abs() < 1e-5);
    }

    #[test]
    fn plane_inertia_falls_back_to_zero() {
        let i = inertia_tensor(&Shape::plane(10.0, 10.0), 3.0);
        assert_eq!(i, Mat3::ZERO);
    }

    #[test]
    fn shape_validation() {
        assert!(Shape::sphere(1.0).validate().is_ok());
        assert!(Shape::sphere(0.0).validate().is_err());
        assert!(Shape::sphere(f32::NAN).validate().is_err());
        assert!(Shape::box_shape(Vec3::ONE).validate().is_ok());
        assert!(Shape::box_shape(Vec3::new(1.0, -1.0, 1.0)).validate().is_err());
        assert!(Shape::plane(10.0, 0.0).validate().is_err());
    }

    #[test]
    fn aabb_overlap() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center_half_extents(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let c = Aabb::from_center_half_extents(Vec3::new(3.5, 0.0, 0.0), Vec3::ONE);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        // Fattening closes a near-miss.
        assert!(a.fattened(0.8).overlaps(&c));
    }
}
