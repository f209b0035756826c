//! End-to-end scenarios over randomized scenes

mod common;

use rand::rngs::StdRng;
use rand::SeedableRng;
use scene_octree::prelude::*;

use common::{brute_force, random_drawable, result_set};

/// 1,000 objects in a 1000^3 region, max depth 4, box query over one octant
#[test]
fn box_query_over_one_octant_matches_brute_force() {
    scene_octree::foundation::logging::init_for_tests();
    let mut rng = StdRng::seed_from_u64(0xA11CE);
    let mut scene = SceneManager::new(OctreeConfig {
        max_depth: 4,
        ..OctreeConfig::with_bounds(Aabb::cube(Vec3::zeros(), 500.0))
    });
    for _ in 0..1000 {
        scene.add(random_drawable(&mut rng, 490.0, 10.0));
    }
    assert!(scene.stats().max_depth > 0);
    assert!(scene.stats().max_depth <= 4);

    let octant = Aabb::new(Vec3::zeros(), Vec3::repeat(500.0));
    let query = BoxQuery::new(octant, DrawableFlags::ANY);

    let expected = brute_force(&scene, &query.filter, |bounds| octant.intersects(bounds));
    let found = result_set(scene.get_objects(&query));
    assert!(!expected.is_empty());
    assert_eq!(found, expected);
}

/// Objects grown past the root stay at the root and remain findable
#[test]
fn object_grown_beyond_root_is_still_found() {
    scene_octree::foundation::logging::init_for_tests();
    let world = Aabb::cube(Vec3::zeros(), 50.0);
    let mut scene = SceneManager::new(OctreeConfig {
        split_threshold: 1,
        ..OctreeConfig::with_bounds(world)
    });
    let id = scene.add(BoundsDrawable::new(Aabb::cube(Vec3::new(20.0, 20.0, 20.0), 1.0)));
    scene.add(BoundsDrawable::new(Aabb::cube(Vec3::new(-20.0, 20.0, 20.0), 1.0)));
    assert_ne!(scene.octree().node_of(id), Some(scene.octree().root()));

    scene.modify_as::<BoundsDrawable, _>(id, |drawable| {
        drawable.set_bounds(Aabb::new(Vec3::new(10.0, 10.0, 10.0), Vec3::new(120.0, 30.0, 30.0)));
    });
    scene.update();

    assert_eq!(scene.octree().node_of(id), Some(scene.octree().root()));
    assert_eq!(scene.octree().world_bounds(), world);

    let root_region = BoxQuery::new(world, DrawableFlags::ANY);
    assert!(scene.get_objects(&root_region).contains(&id));

    // Entirely outside the root: only a query reaching out there sees it
    scene.modify_as::<BoundsDrawable, _>(id, |drawable| {
        drawable.set_bounds(Aabb::cube(Vec3::new(300.0, 0.0, 0.0), 5.0));
    });
    scene.update();
    assert!(!scene.get_objects(&root_region).contains(&id));
    let out_there = SphereQuery::new(Sphere::new(Vec3::new(300.0, 0.0, 0.0), 1.0), DrawableFlags::ANY);
    assert_eq!(scene.get_objects(&out_there), vec![id]);
}

/// An accept-everything frustum equals an unbounded query under the same mask
#[test]
fn accept_all_frustum_returns_every_matching_object() {
    let scene = common::random_scene(0xC0FFEE, 400, 200.0, 8.0);

    for flags in [DrawableFlags::GEOMETRY, DrawableFlags::LIGHT, DrawableFlags::ANY] {
        let frustum = FrustumQuery::new(Frustum::accept_all(), flags);
        let unbounded = BoxQuery::new(Aabb::cube(Vec3::zeros(), f32::MAX / 4.0), flags);

        let expected = brute_force(&scene, &frustum.filter, |_| true);
        let found = result_set(scene.get_objects(&frustum));
        assert_eq!(found, expected);
        assert_eq!(result_set(scene.get_objects(&unbounded)), expected);
    }
}

/// Removal takes effect before the next update
#[test]
fn removed_object_is_never_returned_mid_frame() {
    let mut scene = common::random_scene(0xD00D, 200, 100.0, 5.0);
    let victims: Vec<ObjectId> = scene.iter().map(|(id, _)| id).step_by(7).collect();

    // Dirty some of them first, as a frame in progress would
    for id in victims.iter().step_by(2) {
        scene.modify_as::<BoundsDrawable, _>(*id, |drawable| {
            let moved = drawable.bounds();
            drawable.set_bounds(Aabb::new(moved.min * 0.5, moved.max * 0.5));
        });
    }
    for id in &victims {
        assert!(scene.remove(*id).is_some());
    }

    let everything = FrustumQuery::new(Frustum::accept_all(), DrawableFlags::ANY);
    let found = scene.get_objects(&everything);
    assert!(victims.iter().all(|id| !found.contains(id)));

    let ray = RayOctreeQuery::new(Ray::new(Vec3::repeat(-150.0), Vec3::repeat(1.0)), DrawableFlags::ANY);
    assert!(scene.raycast(&ray).iter().all(|hit| !victims.contains(&hit.object)));

    scene.update();
    assert_eq!(scene.octree().object_count(), scene.len());
    assert!(scene.get_objects(&everything).iter().all(|id| !victims.contains(id)));
}
