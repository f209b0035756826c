//! Scene Manager - owns drawables and keeps the octree in sync with them
//!
//! The manager is the registration point between drawables and the octree:
//! adding a drawable indexes it, removing it unlinks it immediately, and
//! every mutation made through [`SceneManager::modify`] marks it dirty so
//! the next [`SceneManager::update`] reinserts it in one batch.

use slotmap::SlotMap;

use super::Drawable;
use crate::geometry::Aabb;
use crate::spatial::{
    ObjectId, Octree, OctreeConfig, OctreeQuery, OctreeStats, RayOctreeQuery, RayQueryResult,
};

/// Drawables plus the octree that indexes them
pub struct SceneManager {
    /// Drawable storage; ids double as octree object ids
    drawables: SlotMap<ObjectId, Box<dyn Drawable>>,

    /// Spatial index over `drawables`
    octree: Octree,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(OctreeConfig::default())
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("drawables", &self.drawables.len())
            .field("octree", &self.octree.stats())
            .finish()
    }
}

impl SceneManager {
    /// Create an empty scene
    pub fn new(config: OctreeConfig) -> Self {
        Self {
            drawables: SlotMap::with_key(),
            octree: Octree::new(config),
        }
    }

    /// Add a drawable and index it right away
    pub fn add<D: Drawable + 'static>(&mut self, drawable: D) -> ObjectId {
        self.add_boxed(Box::new(drawable))
    }

    /// Add an already boxed drawable
    pub fn add_boxed(&mut self, drawable: Box<dyn Drawable>) -> ObjectId {
        let id = self.drawables.insert(drawable);
        self.octree.insert(id, self.drawables[id].as_ref());
        id
    }

    /// Remove a drawable; it is gone from every query before this returns
    pub fn remove(&mut self, id: ObjectId) -> Option<Box<dyn Drawable>> {
        self.octree.remove(id);
        self.drawables.remove(id)
    }

    /// Look up a drawable
    pub fn get(&self, id: ObjectId) -> Option<&dyn Drawable> {
        self.drawables.get(id).map(|drawable| drawable.as_ref())
    }

    /// Look up a drawable by concrete type
    pub fn get_as<T: Drawable + 'static>(&self, id: ObjectId) -> Option<&T> {
        self.drawables.get(id)?.as_any().downcast_ref::<T>()
    }

    /// Mutate a drawable and mark it dirty
    pub fn modify<R>(&mut self, id: ObjectId, f: impl FnOnce(&mut dyn Drawable) -> R) -> Option<R> {
        let drawable = self.drawables.get_mut(id)?;
        let result = f(drawable.as_mut());
        self.octree.mark_dirty(id);
        Some(result)
    }

    /// Mutate a drawable of a known concrete type and mark it dirty
    ///
    /// Returns `None` if the id is unknown or the drawable is not a `T`.
    pub fn modify_as<T: Drawable + 'static, R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let drawable = self.drawables.get_mut(id)?.as_any_mut().downcast_mut::<T>()?;
        let result = f(drawable);
        self.octree.mark_dirty(id);
        Some(result)
    }

    /// Mark a drawable dirty after it changed on its own
    pub fn mark_dirty(&mut self, id: ObjectId) {
        self.octree.mark_dirty(id);
    }

    /// Reinsert every dirty drawable, returning how many moved
    pub fn update(&mut self) -> usize {
        self.octree.update(&self.drawables)
    }

    /// Objects accepted by a shape query
    pub fn get_objects<Q: OctreeQuery + ?Sized>(&self, query: &Q) -> Vec<ObjectId> {
        self.octree.get_objects(query)
    }

    /// All hits along a ray, nearest first
    pub fn raycast(&self, query: &RayOctreeQuery) -> Vec<RayQueryResult> {
        self.octree.raycast(query, &self.drawables)
    }

    /// Nearest hit along a ray
    pub fn raycast_single(&self, query: &RayOctreeQuery) -> Option<RayQueryResult> {
        self.octree.raycast_single(query, &self.drawables)
    }

    /// Rebuild the octree over a new root volume
    pub fn resize(&mut self, world_bounds: Aabb) {
        self.octree.resize(world_bounds);
    }

    /// Read access to the octree
    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    /// Tree shape summary
    pub fn stats(&self) -> OctreeStats {
        self.octree.stats()
    }

    /// Iterate over every drawable
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &dyn Drawable)> {
        self.drawables.iter().map(|(id, drawable)| (id, drawable.as_ref()))
    }

    /// Number of drawables
    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    /// Check if the scene has no drawables
    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }
}
