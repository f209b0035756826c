//! Occlusion buffer contract
//!
//! The octree does not rasterize occluders itself. Whatever renders them
//! (typically a low-resolution software depth buffer filled from
//! drawables flagged as occluders) answers a single visibility question.

use crate::geometry::Aabb;

/// Answers whether a world-space box could be visible past the occluders
pub trait OcclusionBuffer {
    /// `false` only when the box is certainly hidden
    fn is_visible(&self, bounds: &Aabb) -> bool;
}

impl<F> OcclusionBuffer for F
where
    F: Fn(&Aabb) -> bool,
{
    fn is_visible(&self, bounds: &Aabb) -> bool {
        self(bounds)
    }
}
