//! Shared scene builders for the integration tests

#![allow(dead_code)]

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_octree::prelude::*;
use scene_octree::spatial::NodeKey;

/// Random box with its center in `[-extent, extent]` on every axis
pub fn random_box(rng: &mut StdRng, extent: f32, max_half: f32) -> Aabb {
    let center = Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    );
    let half = Vec3::new(
        rng.gen_range(0.1..max_half),
        rng.gen_range(0.1..max_half),
        rng.gen_range(0.1..max_half),
    );
    Aabb::from_center_half_extents(center, half)
}

/// Random box drawable; roughly one in five is a light
pub fn random_drawable(rng: &mut StdRng, extent: f32, max_half: f32) -> BoundsDrawable {
    let flags = if rng.gen_bool(0.2) {
        DrawableFlags::LIGHT
    } else {
        DrawableFlags::GEOMETRY
    };
    BoundsDrawable::new(random_box(rng, extent, max_half))
        .with_flags(flags)
        .with_occluder(rng.gen_bool(0.3))
        .with_cast_shadows(rng.gen_bool(0.5))
}

/// Scene over `[-extent, extent]` filled with `count` random drawables
pub fn random_scene(seed: u64, count: usize, extent: f32, max_half: f32) -> SceneManager {
    scene_octree::foundation::logging::init_for_tests();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut scene = SceneManager::new(OctreeConfig {
        max_depth: 6,
        ..OctreeConfig::with_bounds(Aabb::cube(Vec3::zeros(), extent))
    });
    for _ in 0..count {
        scene.add(random_drawable(&mut rng, extent, max_half));
    }
    scene
}

/// Ids of every drawable accepted by `filter` and `test`, by linear scan
pub fn brute_force(
    scene: &SceneManager,
    filter: &QueryFilter,
    test: impl Fn(&Aabb) -> bool,
) -> HashSet<ObjectId> {
    scene
        .iter()
        .filter(|(_, drawable)| {
            filter.accepts(
                drawable.drawable_flags(),
                drawable.is_occluder(),
                drawable.casts_shadows(),
            )
        })
        .filter(|(_, drawable)| test(&drawable.world_bounds()))
        .map(|(id, _)| id)
        .collect()
}

/// Query result as a set, asserting it has no duplicates
pub fn result_set(ids: Vec<ObjectId>) -> HashSet<ObjectId> {
    let count = ids.len();
    let set: HashSet<ObjectId> = ids.into_iter().collect();
    assert_eq!(set.len(), count, "query returned an object twice");
    set
}

/// Structural snapshot of the tree: node keys, bounds and sorted residents
pub fn snapshot(octree: &Octree) -> Vec<(NodeKey, Aabb, Vec<ObjectId>)> {
    let mut nodes: Vec<_> = octree
        .nodes()
        .map(|(key, node)| {
            let mut objects = node.objects().to_vec();
            objects.sort();
            (key, node.bounds(), objects)
        })
        .collect();
    nodes.sort_by_key(|node| node.0);
    nodes
}

