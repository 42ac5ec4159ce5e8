//! Benchmarks for physics simulation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Mat3, Quat, Vec3};
use keel_physics::collision::collide;
use keel_physics::world_shape::Obb;
use keel_physics::{ActorId, Collider, PhysicsScene, RigidBody, Shape, WorldShape};

const DT: f32 = 1.0 / 60.0;

fn grid_scene(count: usize) -> PhysicsScene {
    let mut scene = PhysicsScene::new();

    let floor = ActorId(0);
    scene.add_rigid_body(floor, RigidBody::new_static(), Vec3::ZERO, Quat::IDENTITY);
    scene
        .add_collider(Collider::new(floor, Shape::plane(200.0, 200.0)))
        .unwrap();

    // Dynamic spheres in a loose grid above the floor.
    for i in 0..count {
        let actor = ActorId(i as u64 + 1);
        let pos = Vec3::new(
            (i % 25) as f32 * 2.0,
            ((i / 25) % 20) as f32 * 2.0 + 5.0,
            (i / 500) as f32 * 2.0,
        );
        let body = RigidBody::with_shape(1.0, &Shape::sphere(0.5)).unwrap();
        scene.add_rigid_body(actor, body, pos, Quat::IDENTITY);
        scene
            .add_collider(Collider::new(actor, Shape::sphere(0.5)))
            .unwrap();
    }

    // Apply the registrations before measuring.
    scene.tick(DT);
    scene
}

fn bench_scene_tick(c: &mut Criterion) {
    c.bench_function("scene_tick_100_bodies", |b| {
        let mut scene = grid_scene(100);
        b.iter(|| {
            scene.tick(DT);
            black_box(&scene);
        })
    });

    c.bench_function("scene_tick_500_bodies", |b| {
        let mut scene = grid_scene(500);
        b.iter(|| {
            scene.tick(DT);
            black_box(&scene);
        })
    });
}

fn bench_narrow_phase(c: &mut Criterion) {
    c.bench_function("collide_sphere_sphere", |b| {
        let x = WorldShape::Sphere {
            center: Vec3::new(1.2, 0.3, 0.0),
            radius: 1.0,
        };
        let y = WorldShape::Sphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        b.iter(|| black_box(collide(black_box(&x), black_box(&y))))
    });

    c.bench_function("collide_obb_obb_sat", |b| {
        let x = WorldShape::Obb(Obb {
            center: Vec3::ZERO,
            axes: Mat3::from_quat(Quat::from_rotation_y(0.4)),
            half_extents: Vec3::ONE,
        });
        let y = WorldShape::Obb(Obb {
            center: Vec3::new(1.5, 0.2, 0.1),
            axes: Mat3::from_quat(Quat::from_rotation_x(0.7)),
            half_extents: Vec3::new(0.8, 1.2, 0.9),
        });
        b.iter(|| black_box(collide(black_box(&x), black_box(&y))))
    });

    c.bench_function("collide_obb_plane", |b| {
        let x = WorldShape::Obb(Obb {
            center: Vec3::new(0.0, 1.2, 0.0),
            axes: Mat3::from_quat(Quat::from_rotation_z(0.8)),
            half_extents: Vec3::ONE,
        });
        let y = WorldShape::Plane {
            normal: Vec3::Y,
            distance: 0.0,
        };
        b.iter(|| black_box(collide(black_box(&x), black_box(&y))))
    });
}

criterion_group!(benches, bench_scene_tick, bench_narrow_phase);
criterion_main!(benches);
