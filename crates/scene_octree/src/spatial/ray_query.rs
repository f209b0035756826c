//! Raycasts through the octree
//!
//! Nodes are culled by the ray's entry distance into their bounds. Objects
//! that pass the filter and whose bounds are entered before the maximum
//! distance are handed to [`Drawable::process_ray_query`] for refinement.

use super::{DrawableSource, NodeKey, ObjectId, Octree, QueryFilter};
use crate::geometry::Ray;
use crate::scene::SceneNodeId;

#[cfg(doc)]
use crate::scene::Drawable;

/// Precision of a raycast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RayQueryLevel {
    /// World bounding box only, reported for the drawable as a whole
    AabbNoSubObjects,
    /// World bounding box only
    Aabb,
    /// Object-space bounding box
    Obb,
    /// Exact triangle test
    #[default]
    Triangle,
}

impl RayQueryLevel {
    /// Whether hits at this level may name a sub-object
    pub fn reports_sub_objects(self) -> bool {
        self != Self::AabbNoSubObjects
    }
}

/// Parameters of a raycast
#[derive(Debug, Clone, PartialEq)]
pub struct RayOctreeQuery {
    /// The ray, with a unit direction so distances are in world units
    pub ray: Ray,
    /// Object filter
    pub filter: QueryFilter,
    /// Hits at or beyond this distance are ignored
    pub max_distance: f32,
    /// Precision of the per-object test
    pub level: RayQueryLevel,
    /// Keep at most this many of the nearest hits
    pub max_results: Option<usize>,
}

impl RayOctreeQuery {
    /// Unbounded triangle-precision raycast
    pub fn new(ray: Ray, filter: impl Into<QueryFilter>) -> Self {
        Self {
            ray,
            filter: filter.into(),
            max_distance: f32::INFINITY,
            level: RayQueryLevel::default(),
            max_results: None,
        }
    }

    /// Builder-style maximum distance
    #[must_use]
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Builder-style precision
    #[must_use]
    pub fn with_level(mut self, level: RayQueryLevel) -> Self {
        self.level = level;
        self
    }

    /// Builder-style result cap
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    // NaN, zero and negative limits match nothing
    fn is_empty(&self) -> bool {
        !(self.max_distance > 0.0)
    }
}

/// A hit reported by a drawable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the ray
    pub distance: f32,
    /// Index of the sub-object (for meshes, the geometry) that was hit
    pub sub_object: Option<usize>,
}

impl RayHit {
    /// Hit on the drawable as a whole
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            sub_object: None,
        }
    }

    /// Hit on one sub-object
    pub fn on_sub_object(distance: f32, sub_object: usize) -> Self {
        Self {
            distance,
            sub_object: Some(sub_object),
        }
    }
}

/// One entry of a raycast result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQueryResult {
    /// Object that was hit
    pub object: ObjectId,
    /// Owning scene node of that object
    pub owner: Option<SceneNodeId>,
    /// Distance along the ray
    pub distance: f32,
    /// Sub-object index, when the drawable reports one
    pub sub_object: Option<usize>,
}

impl Octree {
    /// All hits along a ray, sorted by ascending distance
    ///
    /// Drawables are looked up in `source` for per-object refinement.
    /// Objects missing from `source` are skipped.
    pub fn raycast<S: DrawableSource + ?Sized>(
        &self,
        query: &RayOctreeQuery,
        source: &S,
    ) -> Vec<RayQueryResult> {
        let mut results = Vec::new();
        if query.is_empty() {
            return results;
        }

        self.raycast_node(self.root, query, source, &mut results);
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        if let Some(max_results) = query.max_results {
            results.truncate(max_results);
        }
        results
    }

    /// Closest hit along a ray
    ///
    /// Children are visited front to back and skipped once they start
    /// beyond the best hit so far.
    pub fn raycast_single<S: DrawableSource + ?Sized>(
        &self,
        query: &RayOctreeQuery,
        source: &S,
    ) -> Option<RayQueryResult> {
        if query.is_empty() || query.max_results == Some(0) {
            return None;
        }

        let mut best = None;
        self.raycast_single_node(self.root, query, source, &mut best);
        best
    }

    fn raycast_node<S: DrawableSource + ?Sized>(
        &self,
        key: NodeKey,
        query: &RayOctreeQuery,
        source: &S,
        results: &mut Vec<RayQueryResult>,
    ) {
        let node = &self.nodes[key];
        for &id in &node.objects {
            if let Some(result) = self.hit_object(id, query, source, query.max_distance) {
                results.push(result);
            }
        }

        for child in node.children() {
            let child_node = &self.nodes[child];
            if child_node.subtree_objects > 0
                && query.ray.hit_distance_aabb(&child_node.bounds) < query.max_distance
            {
                self.raycast_node(child, query, source, results);
            }
        }
    }

    fn raycast_single_node<S: DrawableSource + ?Sized>(
        &self,
        key: NodeKey,
        query: &RayOctreeQuery,
        source: &S,
        best: &mut Option<RayQueryResult>,
    ) {
        let limit = |best: &Option<RayQueryResult>| best.map_or(query.max_distance, |hit| hit.distance);

        let node = &self.nodes[key];
        for &id in &node.objects {
            if let Some(result) = self.hit_object(id, query, source, limit(best)) {
                *best = Some(result);
            }
        }

        let mut children: Vec<(f32, NodeKey)> = node
            .children()
            .filter(|child| self.nodes[*child].subtree_objects > 0)
            .map(|child| (query.ray.hit_distance_aabb(&self.nodes[child].bounds), child))
            .filter(|(distance, _)| *distance < limit(best))
            .collect();
        children.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (distance, child) in children {
            if distance >= limit(best) {
                break;
            }
            self.raycast_single_node(child, query, source, best);
        }
    }

    fn hit_object<S: DrawableSource + ?Sized>(
        &self,
        id: ObjectId,
        query: &RayOctreeQuery,
        source: &S,
        limit: f32,
    ) -> Option<RayQueryResult> {
        let entry = self.objects.get(id)?;
        if !query
            .filter
            .accepts(entry.flags, entry.occluder, entry.shadow_caster)
        {
            return None;
        }

        let initial = query.ray.hit_distance_aabb(&entry.bounds);
        if initial >= limit {
            return None;
        }

        let Some(drawable) = source.drawable(id) else {
            log::debug!("Raycast skipped {id:?}: not present in drawable source");
            return None;
        };
        let hit = drawable.process_ray_query(query, initial)?;
        (hit.distance < limit).then(|| RayQueryResult {
            object: id,
            owner: drawable.owner(),
            distance: hit.distance,
            sub_object: hit.sub_object.filter(|_| query.level.reports_sub_objects()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::geometry::Aabb;
    use crate::scene::{BoundsDrawable, Drawable, DrawableFlags};
    use crate::spatial::OctreeConfig;
    use slotmap::SlotMap;

    type Drawables = SlotMap<ObjectId, Box<dyn Drawable>>;

    /// Unit boxes along +X at x = 10, 20, 30, ...
    fn row(count: usize) -> (Octree, Drawables) {
        let mut octree = Octree::new(OctreeConfig {
            split_threshold: 2,
            ..OctreeConfig::with_bounds(Aabb::cube(Vec3::zeros(), 128.0))
        });
        let mut drawables: Drawables = SlotMap::with_key();
        for i in 1..=count {
            let bounds = Aabb::cube(Vec3::new(10.0 * i as f32, 0.0, 0.0), 1.0);
            let id = drawables.insert(Box::new(BoundsDrawable::new(bounds)));
            octree.insert(id, drawables[id].as_ref());
        }
        (octree, drawables)
    }

    fn along_x() -> RayOctreeQuery {
        RayOctreeQuery::new(Ray::new(Vec3::zeros(), Vec3::x()), DrawableFlags::ANY)
    }

    #[test]
    fn test_hits_are_sorted() {
        let (octree, drawables) = row(6);
        let hits = octree.raycast(&along_x(), &drawables);

        assert_eq!(hits.len(), 6);
        assert!(hits.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
        assert!((hits[0].distance - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_max_distance_and_max_results() {
        let (octree, drawables) = row(6);

        let near = octree.raycast(&along_x().with_max_distance(25.0), &drawables);
        assert_eq!(near.len(), 2);

        let capped = octree.raycast(&along_x().with_max_results(3), &drawables);
        assert_eq!(capped.len(), 3);
        assert!((capped[2].distance - 29.0).abs() < 1e-4);
    }

    #[test]
    fn test_single_matches_first_of_all() {
        let (octree, drawables) = row(6);
        let backwards = RayOctreeQuery::new(
            Ray::new(Vec3::new(100.0, 0.0, 0.0), -Vec3::x()),
            DrawableFlags::ANY,
        );

        let all = octree.raycast(&backwards, &drawables);
        let single = octree.raycast_single(&backwards, &drawables).unwrap();
        assert_eq!(single, all[0]);
        assert!((single.distance - 39.0).abs() < 1e-4);
    }

    #[test]
    fn test_non_positive_max_distance_is_empty() {
        let (octree, drawables) = row(3);
        for max_distance in [0.0, -5.0, f32::NAN] {
            let query = along_x().with_max_distance(max_distance);
            assert!(octree.raycast(&query, &drawables).is_empty());
            assert!(octree.raycast_single(&query, &drawables).is_none());
        }
    }

    /// Box drawable made of numbered parts, always reporting part 3
    struct Cluster(Aabb);

    impl Drawable for Cluster {
        fn world_bounds(&self) -> Aabb {
            self.0
        }

        fn drawable_flags(&self) -> DrawableFlags {
            DrawableFlags::GEOMETRY
        }

        fn process_ray_query(
            &self,
            _query: &RayOctreeQuery,
            initial_distance: f32,
        ) -> Option<RayHit> {
            Some(RayHit::on_sub_object(initial_distance, 3))
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn test_no_sub_objects_level_drops_index() {
        let (mut octree, mut drawables) = row(0);
        let id = drawables.insert(Box::new(Cluster(Aabb::cube(Vec3::new(10.0, 0.0, 0.0), 1.0))));
        octree.insert(id, drawables[id].as_ref());

        let boxes = along_x().with_level(RayQueryLevel::Aabb);
        assert_eq!(octree.raycast_single(&boxes, &drawables).unwrap().sub_object, Some(3));

        let whole = along_x().with_level(RayQueryLevel::AabbNoSubObjects);
        let hit = octree.raycast_single(&whole, &drawables).unwrap();
        assert_eq!(hit.object, id);
        assert_eq!(hit.sub_object, None);
        assert!(octree.raycast(&whole, &drawables).iter().all(|hit| hit.sub_object.is_none()));
    }

    #[test]
    fn test_degenerate_direction_hits_nothing() {
        let (octree, drawables) = row(3);
        for direction in [Vec3::zeros(), Vec3::repeat(f32::NAN)] {
            // Origin inside the first box
            let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), direction);
            let query = RayOctreeQuery::new(ray, DrawableFlags::ANY);
            assert!(octree.raycast(&query, &drawables).is_empty());
            assert!(octree.raycast_single(&query, &drawables).is_none());
        }
    }

    #[test]
    fn test_missing_drawable_is_skipped() {
        let (octree, mut drawables) = row(2);
        let first = octree.raycast_single(&along_x(), &drawables).unwrap().object;
        drawables.remove(first);

        let hits = octree.raycast(&along_x(), &drawables);
        assert_eq!(hits.len(), 1);
        assert_ne!(hits[0].object, first);
    }
}
