//! Drawable contract
//!
//! Anything the octree indexes implements [`Drawable`]: it reports a
//! world-space bounding box, a category mask and two boolean attributes,
//! and optionally refines raycasts beyond its bounding box.

use std::any::Any;

use bitflags::bitflags;

use crate::geometry::Aabb;
use crate::spatial::{RayHit, RayOctreeQuery};

bitflags! {
    /// Drawable categories, matched against a query's flag mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DrawableFlags: u8 {
        /// Renderable geometry (meshes, billboards, terrain)
        const GEOMETRY = 1 << 0;
        /// Light volumes
        const LIGHT = 1 << 1;
        /// Environment zones
        const ZONE = 1 << 2;
        /// Geometry that is drawn only into reflection or shadow passes
        const AUXILIARY = 1 << 3;
        /// Every category
        const ANY = 0xff;
    }
}

impl Default for DrawableFlags {
    fn default() -> Self {
        Self::GEOMETRY
    }
}

/// Handle of the scene node that owns a drawable
///
/// The octree never dereferences it; it is carried through to ray results
/// so callers can map a hit back to their own hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneNodeId(pub u32);

/// An object that can be indexed by the octree
pub trait Drawable {
    /// Current world-space bounding box
    fn world_bounds(&self) -> Aabb;

    /// Category mask tested against a query's flags
    fn drawable_flags(&self) -> DrawableFlags;

    /// Whether this drawable is rendered into the occlusion buffer
    fn is_occluder(&self) -> bool {
        false
    }

    /// Whether this drawable casts shadows
    fn casts_shadows(&self) -> bool {
        false
    }

    /// Owning scene node, reported with ray hits
    fn owner(&self) -> Option<SceneNodeId> {
        None
    }

    /// Refine a ray hit once the bounding box has been entered
    ///
    /// `initial_distance` is the entry distance into [`Drawable::world_bounds`].
    /// The default reports that distance, which is all a box-shaped
    /// drawable can offer.
    fn process_ray_query(&self, query: &RayOctreeQuery, initial_distance: f32) -> Option<RayHit> {
        (initial_distance < query.max_distance).then(|| RayHit::new(initial_distance))
    }

    /// Downcast to Any for type-specific access
    fn as_any(&self) -> &dyn Any;

    /// Downcast to Any for mutable type-specific access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_covers_every_category() {
        for flag in [
            DrawableFlags::GEOMETRY,
            DrawableFlags::LIGHT,
            DrawableFlags::ZONE,
            DrawableFlags::AUXILIARY,
        ] {
            assert!(DrawableFlags::ANY.intersects(flag));
        }
        assert!(!DrawableFlags::LIGHT.intersects(DrawableFlags::GEOMETRY | DrawableFlags::ZONE));
    }
}
