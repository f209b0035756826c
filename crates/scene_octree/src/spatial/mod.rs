//! Octree spatial partitioning
//!
//! The octree indexes drawables by their world bounding boxes and answers
//! shape queries (point, sphere, box, frustum, occluded frustum) and
//! raycasts. Nodes live in an arena and are addressed by [`NodeKey`];
//! objects are addressed by [`ObjectId`].

mod config;
mod node;
mod occlusion;
mod octree;
mod query;
mod ray_query;

pub use config::OctreeConfig;
pub use node::{NodeKey, OctreeNode};
pub use occlusion::OcclusionBuffer;
pub use octree::{DrawableSource, Octree, OctreeStats};
pub use query::{
    BoxQuery, FrustumQuery, OccludedFrustumQuery, OctreeQuery, PointQuery, QueryFilter,
    SphereQuery,
};
pub use ray_query::{RayHit, RayOctreeQuery, RayQueryLevel, RayQueryResult};

slotmap::new_key_type! {
    /// Handle of an object registered with an octree
    pub struct ObjectId;
}
