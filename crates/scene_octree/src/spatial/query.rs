//! Shape queries
//!
//! A query classifies octree regions and candidate objects. Regions report
//! the tri-state [`Intersection`] and narrow a [`PlaneMask`] of the tests
//! still pending below them. Frustum queries clear one bit per plane the
//! region is fully inside; the other shapes clear the whole mask on
//! `Inside`. An empty mask accepts everything below without further shape
//! tests (the occluded frustum query still consults its occlusion buffer).

use super::OcclusionBuffer;
use crate::foundation::math::Vec3;
use crate::geometry::{Aabb, Frustum, Intersection, PlaneMask, Sphere};
use crate::scene::DrawableFlags;

/// Object filter shared by every query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFilter {
    /// Objects must share at least one flag with this mask
    pub flags: DrawableFlags,
    /// Only accept occluders
    pub occluders_only: bool,
    /// Only accept shadow casters
    pub shadow_casters_only: bool,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self::new(DrawableFlags::ANY)
    }
}

impl From<DrawableFlags> for QueryFilter {
    fn from(flags: DrawableFlags) -> Self {
        Self::new(flags)
    }
}

impl QueryFilter {
    /// Filter on a flag mask only
    pub fn new(flags: DrawableFlags) -> Self {
        Self {
            flags,
            occluders_only: false,
            shadow_casters_only: false,
        }
    }

    /// Restrict to occluders
    #[must_use]
    pub fn occluders_only(mut self) -> Self {
        self.occluders_only = true;
        self
    }

    /// Restrict to shadow casters
    #[must_use]
    pub fn shadow_casters_only(mut self) -> Self {
        self.shadow_casters_only = true;
        self
    }

    /// Check an object's attributes against this filter
    pub fn accepts(&self, flags: DrawableFlags, occluder: bool, shadow_caster: bool) -> bool {
        self.flags.intersects(flags)
            && (!self.occluders_only || occluder)
            && (!self.shadow_casters_only || shadow_caster)
    }
}

/// A query the octree can walk
pub trait OctreeQuery {
    /// Object filter applied to every candidate
    fn filter(&self) -> &QueryFilter;

    /// Classify a node region
    ///
    /// `mask` arrives as the parent's mask and is narrowed in place for the
    /// region's contents. It is left untouched when the result is `Outside`.
    fn test_region(&self, bounds: &Aabb, mask: &mut PlaneMask) -> Intersection;

    /// Accept or reject an object's bounds under its node's mask
    fn test_object(&self, bounds: &Aabb, mask: PlaneMask) -> bool;
}

/// Region test for shapes without per-plane state
fn test_region_whole(
    mask: &mut PlaneMask,
    test: impl FnOnce() -> Intersection,
) -> Intersection {
    if *mask == 0 {
        return Intersection::Inside;
    }
    let result = test();
    if result == Intersection::Inside {
        *mask = 0;
    }
    result
}

/// Objects whose bounds contain a point
#[derive(Debug, Clone, PartialEq)]
pub struct PointQuery {
    /// Query point
    pub point: Vec3,
    /// Object filter
    pub filter: QueryFilter,
}

impl PointQuery {
    /// Create a point query
    pub fn new(point: Vec3, filter: impl Into<QueryFilter>) -> Self {
        Self {
            point,
            filter: filter.into(),
        }
    }
}

impl OctreeQuery for PointQuery {
    fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    // A region never fully contains a point, so this never reports Inside
    fn test_region(&self, bounds: &Aabb, _mask: &mut PlaneMask) -> Intersection {
        if bounds.contains_point(self.point) {
            Intersection::Intersects
        } else {
            Intersection::Outside
        }
    }

    fn test_object(&self, bounds: &Aabb, _mask: PlaneMask) -> bool {
        bounds.contains_point(self.point)
    }
}

/// Objects whose bounds overlap a sphere
#[derive(Debug, Clone, PartialEq)]
pub struct SphereQuery {
    /// Query sphere
    pub sphere: Sphere,
    /// Object filter
    pub filter: QueryFilter,
}

impl SphereQuery {
    /// Create a sphere query
    pub fn new(sphere: Sphere, filter: impl Into<QueryFilter>) -> Self {
        Self {
            sphere,
            filter: filter.into(),
        }
    }
}

impl OctreeQuery for SphereQuery {
    fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    fn test_region(&self, bounds: &Aabb, mask: &mut PlaneMask) -> Intersection {
        test_region_whole(mask, || self.sphere.test_aabb(bounds))
    }

    fn test_object(&self, bounds: &Aabb, mask: PlaneMask) -> bool {
        mask == 0 || self.sphere.test_aabb(bounds).is_hit()
    }
}

/// Objects whose bounds overlap a box
#[derive(Debug, Clone, PartialEq)]
pub struct BoxQuery {
    /// Query box
    pub aabb: Aabb,
    /// Object filter
    pub filter: QueryFilter,
}

impl BoxQuery {
    /// Create a box query
    pub fn new(aabb: Aabb, filter: impl Into<QueryFilter>) -> Self {
        Self {
            aabb,
            filter: filter.into(),
        }
    }
}

impl OctreeQuery for BoxQuery {
    fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    fn test_region(&self, bounds: &Aabb, mask: &mut PlaneMask) -> Intersection {
        test_region_whole(mask, || self.aabb.test_aabb(bounds))
    }

    fn test_object(&self, bounds: &Aabb, mask: PlaneMask) -> bool {
        mask == 0 || self.aabb.test_aabb(bounds).is_hit()
    }
}

/// Objects whose bounds are at least partly inside a view frustum
#[derive(Debug, Clone, PartialEq)]
pub struct FrustumQuery {
    /// Query frustum
    pub frustum: Frustum,
    /// Object filter
    pub filter: QueryFilter,
}

impl FrustumQuery {
    /// Create a frustum query
    pub fn new(frustum: Frustum, filter: impl Into<QueryFilter>) -> Self {
        Self {
            frustum,
            filter: filter.into(),
        }
    }
}

impl OctreeQuery for FrustumQuery {
    fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    fn test_region(&self, bounds: &Aabb, mask: &mut PlaneMask) -> Intersection {
        let (result, remaining) = self.frustum.test_aabb_masked(bounds, *mask);
        if result.is_hit() {
            *mask = remaining;
        }
        result
    }

    fn test_object(&self, bounds: &Aabb, mask: PlaneMask) -> bool {
        self.frustum.test_aabb_masked(bounds, mask).0.is_hit()
    }
}

/// Frustum query that also drops boxes hidden behind occluders
///
/// Being inside the frustum says nothing about occlusion, so the buffer is
/// asked for every region and object even under an empty plane mask.
pub struct OccludedFrustumQuery<'a> {
    /// Query frustum
    pub frustum: Frustum,
    /// Visibility oracle
    pub buffer: &'a dyn OcclusionBuffer,
    /// Object filter
    pub filter: QueryFilter,
}

impl<'a> OccludedFrustumQuery<'a> {
    /// Create an occlusion-aware frustum query
    pub fn new(
        frustum: Frustum,
        buffer: &'a dyn OcclusionBuffer,
        filter: impl Into<QueryFilter>,
    ) -> Self {
        Self {
            frustum,
            buffer,
            filter: filter.into(),
        }
    }
}

impl std::fmt::Debug for OccludedFrustumQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OccludedFrustumQuery")
            .field("frustum", &self.frustum)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl OctreeQuery for OccludedFrustumQuery<'_> {
    fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    fn test_region(&self, bounds: &Aabb, mask: &mut PlaneMask) -> Intersection {
        let (result, remaining) = self.frustum.test_aabb_masked(bounds, *mask);
        if !result.is_hit() || !self.buffer.is_visible(bounds) {
            return Intersection::Outside;
        }
        *mask = remaining;
        result
    }

    fn test_object(&self, bounds: &Aabb, mask: PlaneMask) -> bool {
        self.frustum.test_aabb_masked(bounds, mask).0.is_hit() && self.buffer.is_visible(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Mat4Ext};
    use crate::geometry::ALL_PLANES;

    fn unit_at(x: f32) -> Aabb {
        Aabb::cube(Vec3::new(x, 0.0, 0.0), 1.0)
    }

    #[test]
    fn test_filter_accepts() {
        let filter = QueryFilter::new(DrawableFlags::GEOMETRY);
        assert!(filter.accepts(DrawableFlags::GEOMETRY | DrawableFlags::LIGHT, false, false));
        assert!(!filter.accepts(DrawableFlags::LIGHT, true, true));

        let occluders = filter.occluders_only();
        assert!(!occluders.accepts(DrawableFlags::GEOMETRY, false, true));
        assert!(occluders.accepts(DrawableFlags::GEOMETRY, true, false));

        let both = occluders.shadow_casters_only();
        assert!(!both.accepts(DrawableFlags::GEOMETRY, true, false));
        assert!(both.accepts(DrawableFlags::GEOMETRY, true, true));
    }

    #[test]
    fn test_point_query_never_inside() {
        let query = PointQuery::new(Vec3::zeros(), DrawableFlags::ANY);
        let mut mask = ALL_PLANES;
        assert_eq!(query.test_region(&unit_at(0.0), &mut mask), Intersection::Intersects);
        assert_eq!(mask, ALL_PLANES);

        let mut empty = 0;
        assert_eq!(query.test_region(&unit_at(0.0), &mut empty), Intersection::Intersects);
        assert_eq!(query.test_region(&unit_at(5.0), &mut mask), Intersection::Outside);
        assert!(!query.test_object(&unit_at(5.0), 0));
    }

    #[test]
    fn test_inside_clears_mask() {
        let query = BoxQuery::new(Aabb::cube(Vec3::zeros(), 10.0), DrawableFlags::ANY);
        let mut mask = ALL_PLANES;
        assert_eq!(query.test_region(&unit_at(0.0), &mut mask), Intersection::Inside);
        assert_eq!(mask, 0);
        assert_eq!(query.test_region(&unit_at(50.0), &mut mask), Intersection::Inside);
        assert!(query.test_object(&unit_at(50.0), 0));
        assert!(!query.test_object(&unit_at(50.0), ALL_PLANES));

        let sphere = SphereQuery::new(Sphere::new(Vec3::zeros(), 2.0), DrawableFlags::ANY);
        let mut mask = ALL_PLANES;
        assert_eq!(sphere.test_region(&unit_at(20.0), &mut mask), Intersection::Outside);
        assert_eq!(mask, ALL_PLANES);
        assert!(sphere.test_object(&unit_at(2.5), ALL_PLANES));
    }

    #[test]
    fn test_frustum_mask_skips_cleared_planes() {
        let projection = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let query = FrustumQuery::new(Frustum::from_matrix(&projection), DrawableFlags::ANY);

        // The parent straddles only the far plane
        let parent = Aabb::new(Vec3::new(-1.0, -1.0, -120.0), Vec3::new(1.0, 1.0, -80.0));
        let mut mask = ALL_PLANES;
        assert_eq!(query.test_region(&parent, &mut mask), Intersection::Intersects);
        assert_eq!(mask, 1 << 5);

        // Its children are classified against the far plane alone
        let beyond = Aabb::new(Vec3::new(-1.0, -1.0, -120.0), Vec3::new(1.0, 1.0, -101.0));
        let mut beyond_mask = mask;
        assert_eq!(query.test_region(&beyond, &mut beyond_mask), Intersection::Outside);
        assert_eq!(beyond_mask, mask);

        let before = Aabb::new(Vec3::new(-1.0, -1.0, -99.0), Vec3::new(1.0, 1.0, -80.0));
        let mut before_mask = mask;
        assert_eq!(query.test_region(&before, &mut before_mask), Intersection::Inside);
        assert_eq!(before_mask, 0);

        // A side plane cleared by the parent is no longer consulted
        let beside = Aabb::new(Vec3::new(-1000.0, -1.0, -90.0), Vec3::new(-999.0, 1.0, -85.0));
        assert!(!query.test_object(&beside, ALL_PLANES));
        assert!(query.test_object(&beside, mask));
    }

    #[test]
    fn test_occlusion_checked_under_empty_mask() {
        let hide_positive_x = |bounds: &Aabb| bounds.max.x <= 0.0;
        let query =
            OccludedFrustumQuery::new(Frustum::accept_all(), &hide_positive_x, DrawableFlags::ANY);

        let mut mask = ALL_PLANES;
        assert_eq!(query.test_region(&unit_at(-5.0), &mut mask), Intersection::Inside);
        assert_eq!(mask, 0);
        assert_eq!(query.test_region(&unit_at(5.0), &mut mask), Intersection::Outside);
        assert!(query.test_object(&unit_at(-5.0), 0));
        assert!(!query.test_object(&unit_at(5.0), 0));
    }

    #[test]
    fn test_degenerate_shapes_reject_everything() {
        let huge = Aabb::cube(Vec3::zeros(), 1e6);
        let nan = Vec3::repeat(f32::NAN);
        let queries: [Box<dyn OctreeQuery>; 4] = [
            Box::new(PointQuery::new(nan, DrawableFlags::ANY)),
            Box::new(SphereQuery::new(Sphere::new(nan, 1.0), DrawableFlags::ANY)),
            Box::new(BoxQuery::new(
                Aabb::new(Vec3::repeat(1.0), Vec3::repeat(0.5)),
                DrawableFlags::ANY,
            )),
            Box::new(FrustumQuery::new(Frustum::from_matrix(&Mat4::zeros()), DrawableFlags::ANY)),
        ];

        for query in &queries {
            let mut mask = ALL_PLANES;
            assert_eq!(query.test_region(&huge, &mut mask), Intersection::Outside);
            assert!(!query.test_object(&unit_at(0.0), ALL_PLANES));
        }
    }
}
