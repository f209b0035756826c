//! Static triangle meshes with per-geometry detail levels
//!
//! A mesh is a list of geometries, each with one or more LOD triangle
//! lists expressed in mesh-local space. Raycasts are answered at the
//! precision the query asks for:
//!
//! - `Aabb`: the world bounding box entry distance
//! - `Obb`: the ray mapped into local space against the local bounds
//! - `Triangle`: an OBB pre-test, then the triangles of each geometry at
//!   its currently visible LOD (or the forced software LOD)

use std::any::Any;

use super::{Drawable, DrawableFlags, SceneNodeId};
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::geometry::{Aabb, Ray, Triangle};
use crate::spatial::{RayHit, RayOctreeQuery, RayQueryLevel};

/// One detail level of a geometry
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryLod {
    /// Triangles in mesh-local space
    pub triangles: Vec<Triangle>,
    /// View distance from which this level becomes visible
    pub distance: f32,
}

impl GeometryLod {
    /// Detail level that is visible from `distance` onward
    pub fn new(triangles: Vec<Triangle>, distance: f32) -> Self {
        Self { triangles, distance }
    }
}

/// A single geometry, ordered from most to least detailed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    /// Detail levels sorted by ascending view distance
    pub lods: Vec<GeometryLod>,
}

impl MeshGeometry {
    /// Geometry with a single detail level
    pub fn single(triangles: Vec<Triangle>) -> Self {
        Self {
            lods: vec![GeometryLod::new(triangles, 0.0)],
        }
    }

    /// Geometry with several detail levels
    pub fn with_lods(mut lods: Vec<GeometryLod>) -> Self {
        lods.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self { lods }
    }
}

/// A transformed triangle mesh
#[derive(Debug, Clone)]
pub struct StaticMesh {
    transform: Transform,
    world_matrix: Mat4,
    inverse_matrix: Option<Mat4>,
    local_bounds: Aabb,
    geometries: Vec<MeshGeometry>,
    lod_levels: Vec<usize>,
    software_lod_level: Option<usize>,
    flags: DrawableFlags,
    occluder: bool,
    cast_shadows: bool,
    owner: Option<SceneNodeId>,
}

impl StaticMesh {
    /// Create a mesh at the origin
    pub fn new(geometries: Vec<MeshGeometry>) -> Self {
        let local_bounds = Aabb::from_points(
            geometries
                .iter()
                .flat_map(|geometry| &geometry.lods)
                .flat_map(|lod| &lod.triangles)
                .flat_map(|triangle| [triangle.v0, triangle.v1, triangle.v2]),
        )
        .unwrap_or_else(|| Aabb::new(Vec3::zeros(), Vec3::zeros()));
        let lod_levels = vec![0; geometries.len()];
        let transform = Transform::identity();

        Self {
            transform,
            world_matrix: transform.to_matrix(),
            inverse_matrix: transform.inverse_matrix(),
            local_bounds,
            geometries,
            lod_levels,
            software_lod_level: None,
            flags: DrawableFlags::GEOMETRY,
            occluder: false,
            cast_shadows: true,
            owner: None,
        }
    }

    /// Builder-style transform
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.set_transform(transform);
        self
    }

    /// Replace the category mask
    #[must_use]
    pub fn with_flags(mut self, flags: DrawableFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attach an owning scene node
    #[must_use]
    pub fn with_owner(mut self, owner: SceneNodeId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Move, rotate or scale the mesh
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.world_matrix = transform.to_matrix();
        self.inverse_matrix = transform.inverse_matrix();
    }

    /// Current transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Bounds of every LOD in mesh-local space
    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    /// Geometries of this mesh
    pub fn geometries(&self) -> &[MeshGeometry] {
        &self.geometries
    }

    /// Mark this mesh as an occluder
    pub fn set_occluder(&mut self, occluder: bool) {
        self.occluder = occluder;
    }

    /// Enable or disable shadow casting
    pub fn set_cast_shadows(&mut self, cast_shadows: bool) {
        self.cast_shadows = cast_shadows;
    }

    /// Force the LOD used by triangle raycasts
    ///
    /// `None` follows the visible LOD of each geometry. Out-of-range levels
    /// are clamped to the least detailed level.
    pub fn set_software_lod_level(&mut self, level: Option<usize>) {
        self.software_lod_level = level;
    }

    /// Visible LOD of a geometry
    pub fn lod_level(&self, geometry: usize) -> Option<usize> {
        self.lod_levels.get(geometry).copied()
    }

    /// Set the visible LOD of one geometry, clamped to the levels it has
    pub fn set_lod_level(&mut self, geometry: usize, level: usize) {
        let Some(lod_count) = self.geometries.get(geometry).map(|g| g.lods.len()) else {
            return;
        };
        self.lod_levels[geometry] = level.min(lod_count.saturating_sub(1));
    }

    /// Pick the visible LOD of every geometry for a view distance
    pub fn update_lod_levels(&mut self, view_distance: f32) {
        for (level, geometry) in self.lod_levels.iter_mut().zip(&self.geometries) {
            *level = geometry
                .lods
                .iter()
                .rposition(|lod| lod.distance <= view_distance)
                .unwrap_or(0);
        }
    }

    /// Detail level a triangle raycast uses for one geometry
    fn ray_lod(&self, geometry: usize) -> Option<&GeometryLod> {
        let lods = &self.geometries.get(geometry)?.lods;
        let level = match self.software_lod_level {
            Some(level) => level.min(lods.len().checked_sub(1)?),
            None => self.lod_levels[geometry],
        };
        lods.get(level)
    }

    fn local_ray(&self, ray: &Ray) -> Option<Ray> {
        self.inverse_matrix.map(|inverse| ray.transformed(&inverse))
    }

    fn triangle_hit(&self, local_ray: &Ray, max_distance: f32) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        let mut limit = max_distance;

        for index in 0..self.geometries.len() {
            let Some(lod) = self.ray_lod(index) else {
                continue;
            };
            let distance = local_ray.hit_distance_triangles(&lod.triangles);
            if distance < limit {
                limit = distance;
                best = Some(RayHit::on_sub_object(distance, index));
            }
        }
        best
    }
}

impl Drawable for StaticMesh {
    fn world_bounds(&self) -> Aabb {
        self.local_bounds.transformed(&self.world_matrix)
    }

    fn drawable_flags(&self) -> DrawableFlags {
        self.flags
    }

    fn is_occluder(&self) -> bool {
        self.occluder
    }

    fn casts_shadows(&self) -> bool {
        self.cast_shadows
    }

    fn owner(&self) -> Option<SceneNodeId> {
        self.owner
    }

    fn process_ray_query(&self, query: &RayOctreeQuery, initial_distance: f32) -> Option<RayHit> {
        match query.level {
            RayQueryLevel::AabbNoSubObjects | RayQueryLevel::Aabb => {
                (initial_distance < query.max_distance).then(|| RayHit::new(initial_distance))
            }
            RayQueryLevel::Obb => {
                let distance = self.local_ray(&query.ray)?.hit_distance_aabb(&self.local_bounds);
                (distance < query.max_distance).then(|| RayHit::new(distance))
            }
            RayQueryLevel::Triangle => {
                let local_ray = self.local_ray(&query.ray)?;
                if local_ray.hit_distance_aabb(&self.local_bounds) >= query.max_distance {
                    return None;
                }
                self.triangle_hit(&local_ray, query.max_distance)
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
