//! The physics scene: owns all simulation state and drives the per-tick
//! pipeline.
//!
//! Each tick runs a fixed sequence: drain the command buffer, decay
//! velocities, accumulate gravity, then per substep integrate, detect,
//! solve, and commit poses; the velocity pass (restitution + friction) runs
//! once over the final substep's contacts, and the committed transforms are
//! published through the sync buffer at the end.
//!
//! The tick itself is single-threaded and never blocks. Other threads
//! interact only through the command buffer, the transform sync buffer,
//! and the event queue, all of which are internally locked.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::{Quat, Vec3};
use slotmap::{SecondaryMap, SlotMap};

use crate::body::RigidBody;
use crate::broad_phase;
use crate::collider::{ActorId, BodyKey, Collider, ColliderKey};
use crate::collision::{self, Contact};
use crate::command::{PhysicsCommand, PhysicsCommandBuffer};
use crate::debug::DebugDraw;
use crate::error::PhysicsError;
use crate::event::{ContactEvent, PhysicsEventQueue};
use crate::solver;
use crate::sync::{Transform, TransformSyncBuffer};
use crate::world_shape::WorldShape;

/// Angular deltas with a half-angle vector shorter than this snap a
/// `fast_stable` body's angular velocity to zero.
const FAST_STABLE_EPSILON_SQ: f32 = 1e-10;

/// Tunable simulation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicsConfig {
    /// Gravitational acceleration applied to every dynamic body.
    pub gravity: Vec3,
    /// Substeps per tick. One is plenty for simple scenes.
    pub substeps: u32,
    /// XPBD contact compliance; zero is fully rigid.
    pub contact_compliance: f32,
    /// AABB fattening applied in the broad phase.
    pub broad_phase_margin: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -0.98, 0.0),
            substeps: 1,
            contact_compliance: 0.0,
            broad_phase_margin: 0.015,
        }
    }
}

/// Simulation container. See the [crate docs](crate) for an end-to-end
/// example.
pub struct PhysicsScene {
    /// Simulation parameters, mutable between ticks.
    pub config: PhysicsConfig,

    bodies: SlotMap<BodyKey, RigidBody>,
    colliders: SlotMap<ColliderKey, Collider>,
    body_by_actor: HashMap<ActorId, BodyKey>,
    collider_by_actor: HashMap<ActorId, ColliderKey>,

    commands: Arc<PhysicsCommandBuffer>,
    transforms: Arc<TransformSyncBuffer>,
    events: Arc<PhysicsEventQueue>,
    debug_draw: Option<Arc<dyn DebugDraw>>,

    world_shapes: SecondaryMap<ColliderKey, WorldShape>,
    contacts: Vec<Contact>,
    // Trigger pairs already reported this tick; detection runs per substep
    // but each overlapping pair raises one event per tick.
    fired_triggers: HashSet<(ColliderKey, ColliderKey)>,
}

impl Default for PhysicsScene {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsScene {
    /// Create a scene with default configuration.
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a scene with explicit configuration.
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            config,
            bodies: SlotMap::with_key(),
            colliders: SlotMap::with_key(),
            body_by_actor: HashMap::new(),
            collider_by_actor: HashMap::new(),
            commands: Arc::new(PhysicsCommandBuffer::new()),
            transforms: Arc::new(TransformSyncBuffer::new()),
            events: Arc::new(PhysicsEventQueue::new()),
            debug_draw: None,
            world_shapes: SecondaryMap::new(),
            contacts: Vec::new(),
            fired_triggers: HashSet::new(),
        }
    }

    // ============================================================
    // Deferred mutation API (applies at the top of the next tick)
    // ============================================================

    /// Register a body for an actor at an initial pose.
    pub fn add_rigid_body(&self, actor: ActorId, body: RigidBody, position: Vec3, rotation: Quat) {
        self.commands.enqueue(PhysicsCommand::AddBody {
            actor,
            body: Box::new(body),
            position,
            rotation,
        });
    }

    /// Remove an actor's body.
    pub fn remove_rigid_body(&self, actor: ActorId) {
        self.commands.enqueue(PhysicsCommand::RemoveBody(actor));
    }

    /// Register a collider. Fails immediately on a degenerate shape rather
    /// than letting it into the narrow phase.
    pub fn add_collider(&self, collider: Collider) -> Result<(), PhysicsError> {
        collider.shape.validate()?;
        self.commands
            .enqueue(PhysicsCommand::AddCollider(Box::new(collider)));
        Ok(())
    }

    /// Remove an actor's collider.
    pub fn remove_collider(&self, actor: ActorId) {
        self.commands.enqueue(PhysicsCommand::RemoveCollider(actor));
    }

    /// Teleport an actor's body without generating velocity.
    pub fn set_position(&self, actor: ActorId, position: Vec3) {
        self.commands
            .enqueue(PhysicsCommand::SetPosition(actor, position));
    }

    /// Reorient an actor's body without generating angular velocity.
    pub fn set_rotation(&self, actor: ActorId, rotation: Quat) {
        self.commands
            .enqueue(PhysicsCommand::SetRotation(actor, rotation));
    }

    // ============================================================
    // Accessors
    // ============================================================

    /// Shared handle to the command buffer, for producer threads.
    pub fn commands(&self) -> Arc<PhysicsCommandBuffer> {
        Arc::clone(&self.commands)
    }

    /// Shared handle to the published transforms, for consumer threads.
    pub fn transform_buffer(&self) -> Arc<TransformSyncBuffer> {
        Arc::clone(&self.transforms)
    }

    /// Shared handle to the trigger event queue.
    pub fn events(&self) -> Arc<PhysicsEventQueue> {
        Arc::clone(&self.events)
    }

    /// Attach a debug geometry sink, cleared and refilled every tick.
    pub fn set_debug_draw(&mut self, draw: Arc<dyn DebugDraw>) {
        self.debug_draw = Some(draw);
    }

    /// Look up an actor's body.
    pub fn body(&self, actor: ActorId) -> Option<&RigidBody> {
        self.body_by_actor
            .get(&actor)
            .and_then(|&key| self.bodies.get(key))
    }

    /// Look up an actor's body mutably. Pose changes from outside the tick
    /// must still go through [`set_position`](Self::set_position); this is
    /// for forces, impulses, and flags.
    pub fn body_mut(&mut self, actor: ActorId) -> Option<&mut RigidBody> {
        let key = *self.body_by_actor.get(&actor)?;
        self.bodies.get_mut(key)
    }

    /// Look up an actor's collider.
    pub fn collider(&self, actor: ActorId) -> Option<&Collider> {
        self.collider_by_actor
            .get(&actor)
            .and_then(|&key| self.colliders.get(key))
    }

    /// Number of registered bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of registered colliders.
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Contacts from the last substep of the last tick.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    // ============================================================
    // Tick pipeline
    // ============================================================

    /// Advance the simulation by one fixed step.
    pub fn tick(&mut self, dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            log::warn!("ignoring tick with non-positive dt {dt}");
            return;
        }

        self.pre_simulation();
        self.apply_external_forces();

        let substeps = self.config.substeps.max(1);
        let h = dt / substeps as f32;
        for _ in 0..substeps {
            self.integrate(h);
            self.detect_collisions();
            solver::solve_contacts(
                &mut self.bodies,
                &mut self.contacts,
                h,
                self.config.contact_compliance,
            );
            self.post_pbd(h);
        }
        solver::velocity_pass(&mut self.bodies, &self.contacts, h);

        self.post_simulation();
    }

    /// Drain deferred commands, decay velocities, clear debug geometry.
    fn pre_simulation(&mut self) {
        self.commands.swap_buffers();
        for command in self.commands.drain() {
            self.execute(command);
        }
        self.fired_triggers.clear();
        for body in self.bodies.values_mut() {
            if body.simulate_physics {
                body.velocity *= 1.0 - body.linear_damping;
                body.angular_velocity *= 1.0 - body.angular_damping;
            }
        }
        if let Some(draw) = &self.debug_draw {
            draw.clear();
        }
    }

    /// Accumulate gravity as a force so it integrates like any other.
    fn apply_external_forces(&mut self) {
        let gravity = self.config.gravity;
        for body in self.bodies.values_mut() {
            let weight = gravity * body.mass();
            body.apply_force(weight);
        }
    }

    /// Semi-implicit Euler: velocities from forces, predicted poses from
    /// velocities. Forces are consumed by the first substep.
    fn integrate(&mut self, h: f32) {
        for body in self.bodies.values_mut() {
            if !body.simulate_physics {
                body.predicted_position = body.position;
                body.predicted_rotation = body.rotation;
                continue;
            }
            body.previous_position = body.position;
            body.previous_rotation = body.rotation;

            let (force, force_rate) = body.consume_forces();
            body.velocity += (force * h + force_rate) * body.inv_mass();
            body.predicted_position = body.position + body.velocity * h;

            if body.simulate_rotation {
                // predRot = normalize(rot + 0.5 h (w, 0) * rot)
                let w = body.angular_velocity;
                let dq = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * body.rotation;
                body.predicted_rotation = Quat::from_xyzw(
                    body.rotation.x + 0.5 * h * dq.x,
                    body.rotation.y + 0.5 * h * dq.y,
                    body.rotation.z + 0.5 * h * dq.z,
                    body.rotation.w + 0.5 * h * dq.w,
                )
                .normalize();
                body.update_world_inertia_for(body.predicted_rotation);
            } else {
                body.predicted_rotation = body.rotation;
            }
        }
    }

    /// Resolve world shapes, prune with the broad phase, run the narrow
    /// phase. Trigger hits become events; the rest become solver contacts.
    fn detect_collisions(&mut self) {
        self.contacts.clear();
        self.world_shapes.clear();

        let keys: Vec<ColliderKey> = self.colliders.keys().collect();
        for key in keys {
            let collider = &self.colliders[key];
            if !collider.enabled {
                continue;
            }
            let body = collider.body.and_then(|k| self.bodies.get(k));
            let (shape, aabb) = WorldShape::resolve(collider, body);
            self.world_shapes.insert(key, shape);
            self.colliders[key].aabb = aabb;
        }

        let pairs = broad_phase::compute_pairs(
            &self.colliders,
            &self.bodies,
            self.config.broad_phase_margin,
        );
        for (key_a, key_b) in pairs {
            let shape_a = self.world_shapes[key_a];
            let shape_b = self.world_shapes[key_b];
            let Some(geom) = collision::collide(&shape_a, &shape_b) else {
                continue;
            };
            let collider_a = &self.colliders[key_a];
            let collider_b = &self.colliders[key_b];
            if collider_a.is_trigger || collider_b.is_trigger {
                if self.fired_triggers.insert((key_a, key_b)) {
                    self.events.push(ContactEvent {
                        actor_a: collider_a.actor,
                        actor_b: collider_b.actor,
                        point: geom.point,
                        normal: geom.normal,
                        penetration: geom.penetration,
                    });
                }
                continue;
            }
            self.contacts.push(Contact {
                point: geom.point,
                normal: geom.normal,
                penetration: geom.penetration,
                lambda: 0.0,
                collider_a: key_a,
                collider_b: key_b,
                body_a: collider_a.body,
                body_b: collider_b.body,
            });
        }

        if let Some(draw) = &self.debug_draw {
            for collider in self.colliders.values() {
                if collider.enabled {
                    draw.add_cube(
                        collider.aabb.center(),
                        collider.aabb.half_extents(),
                        Quat::IDENTITY,
                    );
                }
            }
            for contact in &self.contacts {
                draw.add_ray(contact.point, contact.normal * contact.penetration.max(0.1));
            }
        }
    }

    /// Commit predicted poses and derive velocities from the correction,
    /// the position-based dynamics convention.
    fn post_pbd(&mut self, h: f32) {
        for body in self.bodies.values_mut() {
            if !body.simulate_physics {
                continue;
            }
            body.position = body.predicted_position;
            body.velocity = (body.position - body.previous_position) / h;

            if body.simulate_rotation {
                body.rotation = body.predicted_rotation;
                let dq = body.previous_rotation.inverse() * body.rotation;
                let mut v = Vec3::new(dq.x, dq.y, dq.z);
                if dq.w < 0.0 {
                    // Shortest path.
                    v = -v;
                }
                if body.fast_stable && v.length_squared() < FAST_STABLE_EPSILON_SQ {
                    body.angular_velocity = Vec3::ZERO;
                } else {
                    body.angular_velocity = v * (2.0 / h);
                }
            }
            body.update_world_inertia();
        }
    }

    /// Publish committed poses to consumers.
    fn post_simulation(&mut self) {
        for (&actor, &key) in &self.body_by_actor {
            if let Some(body) = self.bodies.get(key) {
                self.transforms.write(
                    actor,
                    Transform {
                        position: body.position,
                        rotation: body.rotation,
                    },
                );
            }
        }
        self.transforms.swap();
    }

    fn execute(&mut self, command: PhysicsCommand) {
        match command {
            PhysicsCommand::AddBody {
                actor,
                body,
                position,
                rotation,
            } => {
                let mut body = *body;
                body.teleport(position);
                body.teleport_rotation(rotation);
                if let Some(old) = self.body_by_actor.remove(&actor) {
                    log::warn!("actor {actor:?} already has a body; replacing it");
                    self.bodies.remove(old);
                }
                let key = self.bodies.insert(body);
                self.body_by_actor.insert(actor, key);
                // Back-link any collider registered before its body.
                if let Some(&collider_key) = self.collider_by_actor.get(&actor) {
                    if let Some(collider) = self.colliders.get_mut(collider_key) {
                        collider.body = Some(key);
                    }
                }
            }
            PhysicsCommand::RemoveBody(actor) => {
                let Some(key) = self.body_by_actor.remove(&actor) else {
                    log::warn!("remove for unknown body on actor {actor:?}");
                    return;
                };
                self.bodies.remove(key);
                for collider in self.colliders.values_mut() {
                    if collider.body == Some(key) {
                        collider.body = None;
                    }
                }
                self.transforms.mark_to_remove(actor);
            }
            PhysicsCommand::AddCollider(collider) => {
                let mut collider = *collider;
                let actor = collider.actor;
                collider.body = self.body_by_actor.get(&actor).copied();
                if let Some(old) = self.collider_by_actor.remove(&actor) {
                    log::warn!("actor {actor:?} already has a collider; replacing it");
                    self.colliders.remove(old);
                }
                let key = self.colliders.insert(collider);
                self.collider_by_actor.insert(actor, key);
            }
            PhysicsCommand::RemoveCollider(actor) => {
                let Some(key) = self.collider_by_actor.remove(&actor) else {
                    log::warn!("remove for unknown collider on actor {actor:?}");
                    return;
                };
                self.colliders.remove(key);
            }
            PhysicsCommand::SetPosition(actor, position) => {
                match self.actor_body_mut(actor) {
                    Some(body) => body.teleport(position),
                    None => log::warn!("teleport for unknown actor {actor:?}"),
                }
            }
            PhysicsCommand::SetRotation(actor, rotation) => {
                match self.actor_body_mut(actor) {
                    Some(body) => body.teleport_rotation(rotation),
                    None => log::warn!("teleport for unknown actor {actor:?}"),
                }
            }
        }
    }

    fn actor_body_mut(&mut self, actor: ActorId) -> Option<&mut RigidBody> {
        let key = *self.body_by_actor.get(&actor)?;
        self.bodies.get_mut(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{PhysicalMaterial, Shape};
    use std::sync::Mutex;

    const DT: f32 = 1.0 / 60.0;

    fn scene_with_floor() -> PhysicsScene {
        let scene = PhysicsScene::new();
        let floor = ActorId(0);
        scene.add_rigid_body(floor, RigidBody::new_static(), Vec3::ZERO, Quat::IDENTITY);
        scene
            .add_collider(Collider::new(floor, Shape::plane(100.0, 100.0)))
            .unwrap();
        scene
    }

    fn add_ball(scene: &PhysicsScene, actor: ActorId, y: f32, restitution: f32) {
        let body = RigidBody::with_shape(1.0, &Shape::sphere(1.0))
            .unwrap()
            .with_material(PhysicalMaterial {
                restitution,
                friction: 0.5,
            });
        scene.add_rigid_body(actor, body, Vec3::new(0.0, y, 0.0), Quat::IDENTITY);
        scene
            .add_collider(Collider::new(actor, Shape::sphere(1.0)))
            .unwrap();
    }

    #[test]
    fn commands_apply_on_next_tick() {
        let mut scene = PhysicsScene::new();
        let actor = ActorId(1);
        scene.add_rigid_body(actor, RigidBody::new(1.0).unwrap(), Vec3::Y, Quat::IDENTITY);
        assert!(scene.body(actor).is_none());

        scene.tick(DT);
        assert!(scene.body(actor).is_some());
        assert_eq!(scene.body_count(), 1);
    }

    #[test]
    fn gravity_pulls_bodies_down() {
        let mut scene = PhysicsScene::new();
        let actor = ActorId(1);
        scene.add_rigid_body(
            actor,
            RigidBody::with_shape(1.0, &Shape::sphere(0.5)).unwrap(),
            Vec3::new(0.0, 10.0, 0.0),
            Quat::IDENTITY,
        );
        for _ in 0..60 {
            scene.tick(DT);
        }
        let body = scene.body(actor).unwrap();
        assert!(body.position.y < 10.0);
        assert!(body.velocity.y < 0.0);
    }

    #[test]
    fn static_bodies_never_move() {
        let mut scene = scene_with_floor();
        for _ in 0..30 {
            scene.tick(DT);
        }
        let floor = scene.body(ActorId(0)).unwrap();
        assert_eq!(floor.position, Vec3::ZERO);
        assert_eq!(floor.velocity, Vec3::ZERO);
    }

    #[test]
    fn dropped_ball_comes_to_rest_on_plane() {
        // Unit sphere dropped from y=5 onto the ground plane settles at
        // y = radius with negligible velocity within 300 steps.
        let mut scene = scene_with_floor();
        add_ball(&scene, ActorId(1), 5.0, 0.4);

        for _ in 0..300 {
            scene.tick(DT);
        }

        let ball = scene.body(ActorId(1)).unwrap();
        assert!(
            (ball.position.y - 1.0).abs() < 0.05,
            "ball rests at y={}, expected ~1.0",
            ball.position.y
        );
        assert!(
            ball.velocity.y.abs() < 0.05,
            "ball still moving at vy={}",
            ball.velocity.y
        );
    }

    #[test]
    fn resting_contact_does_not_gain_energy() {
        let mut scene = scene_with_floor();
        add_ball(&scene, ActorId(1), 1.0, 0.0);
        for _ in 0..120 {
            scene.tick(DT);
        }
        let ball = scene.body(ActorId(1)).unwrap();
        // Normal relative velocity at rest must not be (meaningfully)
        // negative, and the ball must not sink.
        assert!(ball.velocity.y > -0.01);
        assert!((ball.position.y - 1.0).abs() < 0.02);
    }

    #[test]
    fn stacked_spheres_separate() {
        let mut scene = PhysicsScene::new();
        scene.config.gravity = Vec3::ZERO;
        add_ball(&scene, ActorId(1), 0.5, 0.0);
        add_ball(&scene, ActorId(2), -0.5, 0.0);
        for _ in 0..10 {
            scene.tick(DT);
        }
        let a = scene.body(ActorId(1)).unwrap().position.y;
        let b = scene.body(ActorId(2)).unwrap().position.y;
        assert!(a - b >= 2.0 - 0.01, "spheres still overlap: {a} vs {b}");
    }

    #[test]
    fn teleport_moves_without_velocity() {
        let mut scene = PhysicsScene::new();
        scene.config.gravity = Vec3::ZERO;
        let actor = ActorId(1);
        scene.add_rigid_body(
            actor,
            RigidBody::new(1.0).unwrap(),
            Vec3::ZERO,
            Quat::IDENTITY,
        );
        scene.tick(DT);

        scene.set_position(actor, Vec3::new(7.0, 0.0, 0.0));
        scene.tick(DT);

        let body = scene.body(actor).unwrap();
        assert_eq!(body.position.x, 7.0);
        assert!(body.velocity.length() < 1e-5);
    }

    #[test]
    fn remove_body_clears_transform_at_swap() {
        let mut scene = PhysicsScene::new();
        let actor = ActorId(1);
        scene.add_rigid_body(
            actor,
            RigidBody::new(1.0).unwrap(),
            Vec3::Y,
            Quat::IDENTITY,
        );
        scene.tick(DT);
        assert!(scene.transform_buffer().get(actor).is_some());

        scene.remove_rigid_body(actor);
        scene.tick(DT);
        assert!(scene.body(actor).is_none());
        assert!(scene.transform_buffer().get(actor).is_none());
    }

    #[test]
    fn trigger_overlap_raises_event_without_response() {
        let mut scene = PhysicsScene::new();
        scene.config.gravity = Vec3::ZERO;
        let probe = ActorId(1);
        let zone = ActorId(2);

        let mut body = RigidBody::with_shape(1.0, &Shape::sphere(1.0)).unwrap();
        body.velocity = Vec3::ZERO;
        scene.add_rigid_body(probe, body, Vec3::ZERO, Quat::IDENTITY);
        scene
            .add_collider(Collider::new(probe, Shape::sphere(1.0)))
            .unwrap();
        scene
            .add_collider(Collider::new(zone, Shape::sphere(1.0)).with_trigger(true))
            .unwrap();

        scene.tick(DT);
        scene.tick(DT);

        let events = scene.events().drain();
        assert!(!events.is_empty());
        // No response: the probe was not pushed out of the trigger.
        assert!(scene.body(probe).unwrap().position.length() < 1e-4);
    }

    #[test]
    fn trigger_event_fires_once_per_tick_across_substeps() {
        let mut scene = PhysicsScene::new();
        scene.config.gravity = Vec3::ZERO;
        scene.config.substeps = 4;
        let probe = ActorId(1);
        let zone = ActorId(2);

        let body = RigidBody::with_shape(1.0, &Shape::sphere(1.0)).unwrap();
        scene.add_rigid_body(probe, body, Vec3::ZERO, Quat::IDENTITY);
        scene
            .add_collider(Collider::new(probe, Shape::sphere(1.0)))
            .unwrap();
        scene
            .add_collider(Collider::new(zone, Shape::sphere(1.0)).with_trigger(true))
            .unwrap();

        scene.tick(DT);
        assert_eq!(scene.events().drain().len(), 1);

        // Still overlapping: one event per tick, not per substep.
        scene.tick(DT);
        assert_eq!(scene.events().drain().len(), 1);
    }

    #[test]
    fn collider_without_body_blocks_dynamic_bodies() {
        // A bare collider acts as an immovable obstacle at its offset.
        let mut scene = PhysicsScene::new();
        let wall = ActorId(1);
        scene
            .add_collider(
                Collider::new(wall, Shape::sphere(1.0)).with_offset(Vec3::new(0.0, -1.0, 0.0)),
            )
            .unwrap();
        add_ball(&scene, ActorId(2), 1.5, 0.0);

        for _ in 0..120 {
            scene.tick(DT);
        }
        let ball = scene.body(ActorId(2)).unwrap();
        // Resting on the obstacle sphere: two radii above its center.
        assert!((ball.position.y - 1.0).abs() < 0.05);
    }

    #[test]
    fn collider_added_before_body_gets_linked() {
        let mut scene = scene_with_floor();
        let actor = ActorId(1);
        scene
            .add_collider(Collider::new(actor, Shape::sphere(1.0)))
            .unwrap();
        scene.tick(DT);

        scene.add_rigid_body(
            actor,
            RigidBody::with_shape(1.0, &Shape::sphere(1.0)).unwrap(),
            Vec3::new(0.0, 3.0, 0.0),
            Quat::IDENTITY,
        );
        scene.tick(DT);
        assert!(scene.collider(actor).unwrap().body.is_some());

        for _ in 0..300 {
            scene.tick(DT);
        }
        // Linked collider follows the body down to the floor.
        assert!((scene.body(actor).unwrap().position.y - 1.0).abs() < 0.05);
    }

    #[test]
    fn invalid_collider_shape_is_rejected() {
        let scene = PhysicsScene::new();
        let result = scene.add_collider(Collider::new(ActorId(1), Shape::sphere(-1.0)));
        assert!(result.is_err());
    }

    #[test]
    fn spin_is_preserved_for_free_body() {
        let mut scene = PhysicsScene::new();
        scene.config.gravity = Vec3::ZERO;
        let actor = ActorId(1);
        let mut body = RigidBody::with_shape(1.0, &Shape::sphere(1.0)).unwrap();
        body.angular_velocity = Vec3::new(0.0, 2.0, 0.0);
        scene.add_rigid_body(actor, body, Vec3::ZERO, Quat::IDENTITY);
        scene.tick(DT);

        for _ in 0..60 {
            scene.tick(DT);
        }
        let body = scene.body(actor).unwrap();
        assert!((body.angular_velocity.y - 2.0).abs() < 0.05);
        // And the orientation has actually advanced.
        assert!(body.rotation.angle_between(Quat::IDENTITY) > 0.5);
    }

    #[test]
    fn fast_stable_snaps_tiny_spin_to_zero() {
        let mut scene = PhysicsScene::new();
        scene.config.gravity = Vec3::ZERO;
        let actor = ActorId(1);
        let mut body = RigidBody::with_shape(1.0, &Shape::sphere(1.0)).unwrap();
        body.fast_stable = true;
        body.angular_velocity = Vec3::new(0.0, 1e-4, 0.0);
        scene.add_rigid_body(actor, body, Vec3::ZERO, Quat::IDENTITY);
        for _ in 0..2 {
            scene.tick(DT);
        }
        assert_eq!(scene.body(actor).unwrap().angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn published_transforms_match_committed_pose() {
        let mut scene = PhysicsScene::new();
        let actor = ActorId(1);
        scene.add_rigid_body(
            actor,
            RigidBody::new(1.0).unwrap(),
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
        );
        scene.tick(DT);
        scene.tick(DT);

        let body_pos = scene.body(actor).unwrap().position;
        let published = scene.transform_buffer().get(actor).unwrap();
        assert_eq!(published.position, body_pos);
    }

    #[test]
    fn damping_decays_velocity() {
        let mut scene = PhysicsScene::new();
        scene.config.gravity = Vec3::ZERO;
        let actor = ActorId(1);
        let mut body = RigidBody::new(1.0).unwrap();
        body.linear_damping = 0.1;
        body.velocity = Vec3::X;
        scene.add_rigid_body(actor, body, Vec3::ZERO, Quat::IDENTITY);
        scene.tick(DT);
        for _ in 0..20 {
            scene.tick(DT);
        }
        assert!(scene.body(actor).unwrap().velocity.x < 0.2);
    }

    #[derive(Default)]
    struct CountingDraw {
        cubes: Mutex<usize>,
        clears: Mutex<usize>,
    }

    impl DebugDraw for CountingDraw {
        fn clear(&self) {
            *self.clears.lock().unwrap() += 1;
        }
        fn add_cube(&self, _center: Vec3, _half_extents: Vec3, _rotation: Quat) {
            *self.cubes.lock().unwrap() += 1;
        }
        fn add_ray(&self, _origin: Vec3, _direction: Vec3) {}
    }

    #[test]
    fn debug_draw_cleared_and_fed_each_tick() {
        let mut scene = scene_with_floor();
        let draw = Arc::new(CountingDraw::default());
        scene.set_debug_draw(draw.clone());

        scene.tick(DT);
        scene.tick(DT);

        assert_eq!(*draw.clears.lock().unwrap(), 2);
        // Floor collider bounds drawn on the tick after registration.
        assert!(*draw.cubes.lock().unwrap() >= 1);
    }
}
