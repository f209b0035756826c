//! Box occluders seen from a single eye point
//!
//! Stands in for a rasterized depth buffer: a box is hidden when every one
//! of its corners lies behind the same occluder. The region shadowed by a
//! convex occluder is convex, so this never hides a visible box.

use scene_octree::prelude::*;

/// Occluder boxes and the eye they are seen from
#[derive(Debug, Clone)]
pub struct OccluderSet {
    eye: Vec3,
    occluders: Vec<Aabb>,
}

impl OccluderSet {
    /// Collect every occluder of the scene
    pub fn from_scene(scene: &SceneManager, eye: Vec3) -> Self {
        let filter = QueryFilter::new(DrawableFlags::ANY).occluders_only();
        let occluders = scene
            .get_objects(&FrustumQuery::new(Frustum::accept_all(), filter))
            .into_iter()
            .filter_map(|id| scene.get(id).map(|drawable| drawable.world_bounds()))
            .collect();
        Self { eye, occluders }
    }

    /// Number of occluder boxes
    pub fn len(&self) -> usize {
        self.occluders.len()
    }

    fn hides_point(&self, occluder: &Aabb, point: Vec3) -> bool {
        let to_point = point - self.eye;
        let distance = to_point.magnitude();
        if distance <= f32::EPSILON || occluder.contains_point(self.eye) {
            return false;
        }
        Ray::new(self.eye, to_point).hit_distance_aabb(occluder) < distance
    }
}

impl OcclusionBuffer for OccluderSet {
    fn is_visible(&self, bounds: &Aabb) -> bool {
        let corners = bounds.corners();
        !self.occluders.iter().any(|occluder| {
            // An occluder never hides a box it overlaps
            !occluder.intersects(bounds)
                && corners.iter().all(|corner| self.hides_point(occluder, *corner))
        })
    }
}
