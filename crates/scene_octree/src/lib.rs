//! # Scene Octree
//!
//! Spatial partitioning and visibility queries for 3D scenes.
//!
//! ## Features
//!
//! - **Loose placement**: every object lives in the deepest node that fully
//!   contains its bounds; nodes split and prune on demand
//! - **Tri-state culling**: whole subtrees are accepted or rejected by a
//!   single region test
//! - **Shape queries**: point, sphere, box, frustum and occlusion-aware
//!   frustum, filtered by category flags, occluders and shadow casters
//! - **Raycasts**: all hits sorted by distance or the closest hit only, at
//!   bounding box, oriented box or triangle precision
//! - **Batched updates**: moved objects are marked dirty and reinserted in
//!   one pass
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_octree::prelude::*;
//!
//! let mut scene = SceneManager::new(OctreeConfig::default());
//! let crate_id = scene.add(BoundsDrawable::new(Aabb::cube(Vec3::new(4.0, 0.0, -20.0), 1.0)));
//!
//! let view = Mat4::perspective(1.2, 16.0 / 9.0, 0.1, 500.0);
//! let visible = scene.get_objects(&FrustumQuery::new(Frustum::from_matrix(&view), DrawableFlags::GEOMETRY));
//! assert!(visible.contains(&crate_id));
//!
//! let pick = RayOctreeQuery::new(Ray::new(Vec3::zeros(), -Vec3::z()), DrawableFlags::ANY);
//! let _closest = scene.raycast_single(&pick);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod geometry;
pub mod scene;
pub mod spatial;

/// Common imports for octree users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        foundation::math::{Mat4, Mat4Ext, Quat, Transform, Vec3},
        geometry::{
            Aabb, Frustum, Intersection, Plane, PlaneMask, Ray, Sphere, Triangle, ALL_PLANES,
        },
        scene::{
            BoundsDrawable, Drawable, DrawableFlags, GeometryLod, MeshGeometry, SceneManager,
            SceneNodeId, StaticMesh,
        },
        spatial::{
            BoxQuery, DrawableSource, FrustumQuery, ObjectId, OccludedFrustumQuery,
            OcclusionBuffer, Octree, OctreeConfig, OctreeQuery, OctreeStats, PointQuery,
            QueryFilter, RayHit, RayOctreeQuery, RayQueryLevel, RayQueryResult, SphereQuery,
        },
    };
}
