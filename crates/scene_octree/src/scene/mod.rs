//! Scene contents indexed by the octree
//!
//! Drawables, the two concrete kinds shipped with the crate, and the
//! scene manager that owns them.

mod bounds_drawable;
mod drawable;
mod scene_manager;
mod static_mesh;

pub use bounds_drawable::BoundsDrawable;
pub use drawable::{Drawable, DrawableFlags, SceneNodeId};
pub use scene_manager::SceneManager;
pub use static_mesh::{GeometryLod, MeshGeometry, StaticMesh};
