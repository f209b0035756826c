//! Octree nodes
//!
//! Nodes are stored in a slot map owned by the octree. Children are
//! created lazily: a subdivided node only has the octants that ever
//! received an object.

use super::ObjectId;
use crate::geometry::Aabb;

slotmap::new_key_type! {
    /// Handle of a node inside an octree's node arena
    pub struct NodeKey;
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub(super) bounds: Aabb,
    pub(super) depth: u32,
    pub(super) parent: Option<NodeKey>,
    pub(super) children: [Option<NodeKey>; 8],
    pub(super) subdivided: bool,
    pub(super) objects: Vec<ObjectId>,
    pub(super) subtree_objects: usize,
}

impl OctreeNode {
    pub(super) fn new(bounds: Aabb, depth: u32, parent: Option<NodeKey>) -> Self {
        Self {
            bounds,
            depth,
            parent,
            children: [None; 8],
            subdivided: false,
            objects: Vec::new(),
            subtree_objects: 0,
        }
    }

    /// World-space region covered by this node
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Objects stored directly in this node
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    /// Objects stored in this node and all of its descendants
    pub fn subtree_object_count(&self) -> usize {
        self.subtree_objects
    }

    /// Existing child nodes
    pub fn children(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.children.iter().flatten().copied()
    }

    /// Check if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Octant whose region fully contains `bounds`, if any
    pub(super) fn fitting_octant(&self, bounds: &Aabb) -> Option<usize> {
        let octant = self.bounds.octant_of(bounds.min);
        self.bounds
            .child_octant(octant)
            .contains_aabb(bounds)
            .then_some(octant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_fitting_octant() {
        let node = OctreeNode::new(Aabb::cube(Vec3::zeros(), 8.0), 0, None);

        let small = Aabb::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(node.fitting_octant(&small), Some(7));

        let low = Aabb::new(Vec3::new(-3.0, -3.0, -3.0), Vec3::new(-2.0, -2.0, -2.0));
        assert_eq!(node.fitting_octant(&low), Some(0));

        let straddling = Aabb::new(Vec3::new(-1.0, 1.0, 1.0), Vec3::new(1.0, 2.0, 2.0));
        assert_eq!(node.fitting_octant(&straddling), None);

        let outside = Aabb::cube(Vec3::repeat(50.0), 1.0);
        assert_eq!(node.fitting_octant(&outside), None);
    }

    #[test]
    fn test_new_node_is_leaf() {
        let node = OctreeNode::new(Aabb::cube(Vec3::zeros(), 1.0), 3, None);
        assert!(node.is_leaf());
        assert_eq!(node.depth(), 3);
        assert_eq!(node.children().count(), 0);
    }
}
