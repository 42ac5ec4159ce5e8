//! Rigid body physics simulation for the keel engine.
//!
//! Fixed-step rigid body dynamics with shape-variant collision detection and
//! an XPBD (compliance-based position) constraint solver:
//! - [`RigidBody`] - dynamic or static rigid body with mass and inertia
//! - [`Collider`] - binds a local [`Shape`] (sphere, box, plane) to a body
//! - [`PhysicsScene`] - simulation container driving the per-tick pipeline
//!
//! The scene is single-threaded per tick and meant to be driven by an
//! external fixed-step scheduler. Other threads interact through two
//! double-buffered structures: [`PhysicsCommandBuffer`] for deferred
//! mutations (add/remove/teleport) and [`TransformSyncBuffer`] for reading
//! simulation results without blocking the tick.
//!
//! # Example
//! ```
//! use glam::{Quat, Vec3};
//! use keel_physics::{ActorId, Collider, PhysicsScene, RigidBody, Shape};
//!
//! let mut scene = PhysicsScene::new();
//!
//! let floor = ActorId(1);
//! scene.add_rigid_body(floor, RigidBody::new_static(), Vec3::ZERO, Quat::IDENTITY);
//! scene.add_collider(Collider::new(floor, Shape::plane(100.0, 100.0)));
//!
//! let ball = ActorId(2);
//! let body = RigidBody::with_shape(1.0, &Shape::sphere(0.5)).unwrap();
//! scene.add_rigid_body(ball, body, Vec3::new(0.0, 5.0, 0.0), Quat::IDENTITY);
//! scene.add_collider(Collider::new(ball, Shape::sphere(0.5)));
//!
//! // Commands apply at the top of the next tick.
//! for _ in 0..60 {
//!     scene.tick(1.0 / 60.0);
//! }
//! let transforms = scene.transform_buffer().snapshot();
//! assert!(transforms[&ball].position.y < 5.0);
//! ```

pub mod body;
pub mod broad_phase;
pub mod collider;
pub mod collision;
pub mod command;
pub mod debug;
pub mod error;
pub mod event;
pub mod scene;
pub mod shape;
pub mod solver;
pub mod sync;
pub mod world_shape;

pub use body::RigidBody;
pub use collider::{ActorId, BodyKey, Collider, ColliderKey};
pub use collision::Contact;
pub use command::{PhysicsCommand, PhysicsCommandBuffer};
pub use debug::DebugDraw;
pub use error::PhysicsError;
pub use event::{ContactEvent, PhysicsEventQueue};
pub use scene::{PhysicsConfig, PhysicsScene};
pub use shape::{Aabb, PhysicalMaterial, Shape};
pub use sync::{Transform, TransformSyncBuffer};
pub use world_shape::{Obb, WorldShape};
