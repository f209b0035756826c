//! Box-shaped drawable

use std::any::Any;

use super::{Drawable, DrawableFlags, SceneNodeId};
use crate::geometry::Aabb;

/// A drawable that is exactly its bounding box
///
/// Used for lights, zones and proxies where a box test is the most precise
/// answer available. Ray queries hit it at the box entry distance at every
/// detail level.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsDrawable {
    bounds: Aabb,
    flags: DrawableFlags,
    occluder: bool,
    cast_shadows: bool,
    owner: Option<SceneNodeId>,
}

impl BoundsDrawable {
    /// Create a geometry drawable covering `bounds`
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            flags: DrawableFlags::GEOMETRY,
            occluder: false,
            cast_shadows: false,
            owner: None,
        }
    }

    /// Replace the category mask
    #[must_use]
    pub fn with_flags(mut self, flags: DrawableFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mark as an occluder
    #[must_use]
    pub fn with_occluder(mut self, occluder: bool) -> Self {
        self.occluder = occluder;
        self
    }

    /// Mark as a shadow caster
    #[must_use]
    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    /// Attach an owning scene node
    #[must_use]
    pub fn with_owner(mut self, owner: SceneNodeId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Move or resize the box
    ///
    /// The octree only notices after the drawable has been marked dirty.
    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = bounds;
    }

    /// Current box
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

impl Drawable for BoundsDrawable {
    fn world_bounds(&self) -> Aabb {
        self.bounds
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

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
