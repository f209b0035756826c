//! Tri-state intersection result shared by every bounding volume

/// Classification of a volume against a query shape.
///
/// The ordering matters to the octree traversal: `Outside` rejects a whole
/// subtree, `Inside` accepts it without further shape tests and
/// `Intersects` forces the traversal to descend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intersection {
    /// Completely outside the query shape
    Outside,
    /// Partially overlapping the query shape
    Intersects,
    /// Completely inside the query shape
    Inside,
}

impl Intersection {
    /// True for `Intersects` and `Inside`
    pub fn is_hit(self) -> bool {
        self != Self::Outside
    }
}
