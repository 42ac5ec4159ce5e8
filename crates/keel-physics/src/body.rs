//! Rigid body state and force operations.
//!
//! Bodies carry the full XPBD state: the committed pose, the predicted pose
//! the solver corrects, and the previous pose used to recover velocities
//! after correction. The world-space inertia tensor is cached and recomputed
//! whenever the orientation changes.

use glam::{Mat3, Quat, Vec3};

use crate::error::PhysicsError;
use crate::shape::{inertia_tensor, PhysicalMaterial, Shape};

/// A rigid body participating in the simulation.
///
/// Construct with [`RigidBody::new`] (dynamic) or [`RigidBody::new_static`],
/// then register through the scene's command buffer. Pose fields are mutated
/// by the tick; external code must route teleports through
/// [`PhysicsScene::set_position`](crate::PhysicsScene::set_position) rather
/// than writing them directly.
#[derive(Clone, Debug)]
pub struct RigidBody {
    /// Committed position (center of mass).
    pub position: Vec3,
    /// Position predicted by integration, corrected by the solver.
    pub predicted_position: Vec3,
    /// Position at the start of the substep, for velocity recovery.
    pub previous_position: Vec3,

    /// Committed orientation.
    pub rotation: Quat,
    /// Orientation predicted by integration, corrected by the solver.
    pub predicted_rotation: Quat,
    /// Orientation at the start of the substep.
    pub previous_rotation: Quat,

    /// Linear velocity.
    pub velocity: Vec3,
    /// Angular velocity.
    pub angular_velocity: Vec3,

    /// Force accumulated this tick, consumed by integration.
    force: Vec3,
    /// Pre-scaled force (F*dt) accumulated this tick, applied directly as a
    /// velocity delta at integration.
    force_rate: Vec3,

    mass: f32,
    inv_mass: f32,

    local_inertia: Mat3,
    world_inertia: Mat3,
    inv_world_inertia: Mat3,

    /// Per-tick linear velocity decay factor, 0 = none.
    pub linear_damping: f32,
    /// Per-tick angular velocity decay factor, 0 = none.
    pub angular_damping: f32,

    /// Surface response parameters.
    pub material: PhysicalMaterial,

    /// False makes the body static: conceptually infinite mass, skipped by
    /// integration and never corrected.
    pub simulate_physics: bool,
    /// False freezes orientation; contacts then use the plain inverse mass.
    pub simulate_rotation: bool,
    /// Snap tiny angular deltas to zero to avoid jitter at rest.
    pub fast_stable: bool,

    /// Debug name, empty by default.
    pub name: String,
}

impl RigidBody {
    /// Create a dynamic body. Fails if the mass is not positive and finite.
    ///
    /// The inertia tensor defaults to a unit sphere; call [`set_shape`]
    /// (or use [`with_shape`]) before the first tick for correct rotation.
    ///
    /// [`set_shape`]: RigidBody::set_shape
    /// [`with_shape`]: RigidBody::with_shape
    pub fn new(mass: f32) -> Result<Self, PhysicsError> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(PhysicsError::InvalidMass(mass));
        }
        let local_inertia = inertia_tensor(&Shape::sphere(1.0), mass);
        let mut body = Self {
            position: Vec3::ZERO,
            predicted_position: Vec3::ZERO,
            previous_position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            predicted_rotation: Quat::IDENTITY,
            previous_rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            force_rate: Vec3::ZERO,
            mass,
            inv_mass: 1.0 / mass,
            local_inertia,
            world_inertia: local_inertia,
            inv_world_inertia: Mat3::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.0,
            material: PhysicalMaterial::default(),
            simulate_physics: true,
            simulate_rotation: true,
            fast_stable: false,
            name: String::new(),
        };
        body.update_world_inertia();
        Ok(body)
    }

    /// Create a dynamic body with its inertia tensor derived from a shape.
    pub fn with_shape(mass: f32, shape: &Shape) -> Result<Self, PhysicsError> {
        let mut body = Self::new(mass)?;
        body.set_shape(shape);
        Ok(body)
    }

    /// Create a static (immovable) body.
    pub fn new_static() -> Self {
        Self {
            position: Vec3::ZERO,
            predicted_position: Vec3::ZERO,
            previous_position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            predicted_rotation: Quat::IDENTITY,
            previous_rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            force_rate: Vec3::ZERO,
            mass: 0.0,
            inv_mass: 0.0,
            local_inertia: Mat3::ZERO,
            world_inertia: Mat3::ZERO,
            inv_world_inertia: Mat3::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.0,
            material: PhysicalMaterial::default(),
            simulate_physics: false,
            simulate_rotation: false,
            fast_stable: false,
            name: String::new(),
        }
    }

    /// Set the debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the material.
    pub fn with_material(mut self, material: PhysicalMaterial) -> Self {
        self.material = material;
        self
    }

    /// Body mass. Zero for static bodies.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Inverse mass. Zero for static bodies.
    pub fn inv_mass(&self) -> f32 {
        if self.simulate_physics {
            self.inv_mass
        } else {
            0.0
        }
    }

    /// World-space inverse inertia tensor, valid for the cached orientation.
    pub fn inv_world_inertia(&self) -> Mat3 {
        self.inv_world_inertia
    }

    /// Whether the body is excluded from integration and correction.
    pub fn is_static(&self) -> bool {
        !self.simulate_physics
    }

    /// Change the mass, rescaling the local inertia tensor.
    pub fn set_mass(&mut self, mass: f32) -> Result<(), PhysicsError> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(PhysicsError::InvalidMass(mass));
        }
        if self.mass > 0.0 {
            self.local_inertia *= mass / self.mass;
        }
        self.mass = mass;
        self.inv_mass = 1.0 / mass;
        self.update_world_inertia();
        Ok(())
    }

    /// Recompute the local inertia tensor from a shape and the current mass.
    pub fn set_shape(&mut self, shape: &Shape) {
        self.local_inertia = inertia_tensor(shape, self.mass);
        self.update_world_inertia();
    }

    /// Accumulate an instantaneous force for this tick.
    pub fn apply_force(&mut self, force: Vec3) {
        if self.simulate_physics {
            self.force += force;
        }
    }

    /// Accumulate a pre-scaled force (F*dt); integration applies it directly
    /// as a velocity delta without multiplying by dt again.
    pub fn apply_force_rate(&mut self, force_rate: Vec3) {
        if self.simulate_physics {
            self.force_rate += force_rate;
        }
    }

    /// Apply an impulse as an immediate velocity change.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        if self.simulate_physics {
            self.velocity += impulse * self.inv_mass;
        }
    }

    /// Take the accumulated force and force-rate, leaving both zeroed.
    pub(crate) fn consume_forces(&mut self) -> (Vec3, Vec3) {
        let out = (self.force, self.force_rate);
        self.force = Vec3::ZERO;
        self.force_rate = Vec3::ZERO;
        out
    }

    /// Move the body without generating velocity: all three position slots
    /// land on the target so PostPBD derives a zero delta.
    pub(crate) fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.predicted_position = position;
        self.previous_position = position;
    }

    /// Reorient the body without generating angular velocity.
    pub(crate) fn teleport_rotation(&mut self, rotation: Quat) {
        let rotation = rotation.normalize();
        self.rotation = rotation;
        self.predicted_rotation = rotation;
        self.previous_rotation = rotation;
        self.update_world_inertia();
    }

    /// Recompute the world-space inertia tensor and its inverse from the
    /// committed orientation: `I_w = R I_l R^T`.
    pub(crate) fn update_world_inertia(&mut self) {
        self.update_world_inertia_for(self.rotation);
    }

    /// Recompute the world-space inertia for an explicit orientation (used
    /// with the predicted rotation during a substep).
    pub(crate) fn update_world_inertia_for(&mut self, rotation: Quat) {
        if self.local_inertia == Mat3::ZERO {
            self.world_inertia = Mat3::ZERO;
            self.inv_world_inertia = Mat3::ZERO;
            return;
        }
        let r = Mat3::from_quat(rotation);
        self.world_inertia = r * self.local_inertia * r.transpose();
        let det = self.world_inertia.determinant();
        if det.abs() < f32::EPSILON {
            log::warn!(
                "singular world inertia tensor on body '{}'; disabling rotational response",
                self.name
            );
            self.inv_world_inertia = Mat3::ZERO;
        } else {
            self.inv_world_inertia = self.world_inertia.inverse();
        }
    }

    /// Generalized inverse mass along a contact normal with lever arm `r`:
    /// the plain inverse mass plus the rotational term when rotation is
    /// simulated. Zero for static bodies.
    pub(crate) fn generalized_inverse_mass(&self, r: Vec3, normal: Vec3) -> f32 {
        if !self.simulate_physics {
            return 0.0;
        }
        if self.simulate_rotation {
            let rn = r.cross(normal);
            self.inv_mass + rn.dot(self.inv_world_inertia * rn)
        } else {
            self.inv_mass
        }
    }

    /// Velocity of a world-space point on the body.
    pub(crate) fn velocity_at_point(&self, point: Vec3) -> Vec3 {
        let r = point - self.position;
        self.velocity + self.angular_velocity.cross(r)
    }
}
