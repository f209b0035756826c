//! Octree spatial partitioning structure
//!
//! Divides 3D space into hierarchical regions for fast spatial queries.
//! Each object lives in exactly one node: the deepest existing node whose
//! region fully contains its bounds. Objects that straddle an octant
//! boundary stay in the parent; objects outside the root volume stay in
//! the root. A leaf subdivides once it holds `split_threshold` objects,
//! and nodes whose subtree becomes empty are pruned.
//!
//! Movement is batched: owners call [`Octree::mark_dirty`] when a drawable
//! changes and [`Octree::update`] reinserts all marked objects at once.
//! Removal is immediate.

use slotmap::{SecondaryMap, SlotMap};

use super::{NodeKey, ObjectId, OctreeConfig, OctreeNode, OctreeQuery};
use crate::geometry::{Aabb, Intersection, PlaneMask, ALL_PLANES};
use crate::scene::{Drawable, DrawableFlags};

/// Lookup of drawables by the id they were registered under
pub trait DrawableSource {
    /// Drawable registered as `id`, if it still exists
    fn drawable(&self, id: ObjectId) -> Option<&dyn Drawable>;
}

impl DrawableSource for SlotMap<ObjectId, Box<dyn Drawable>> {
    fn drawable(&self, id: ObjectId) -> Option<&dyn Drawable> {
        self.get(id).map(|drawable| drawable.as_ref())
    }
}

/// Cached state of an indexed object
#[derive(Debug, Clone, Copy)]
pub(super) struct ObjectEntry {
    pub(super) bounds: Aabb,
    pub(super) flags: DrawableFlags,
    pub(super) occluder: bool,
    pub(super) shadow_caster: bool,
    pub(super) node: NodeKey,
    /// Index into the owning node's object list
    pub(super) slot: usize,
    pub(super) queued: bool,
}

impl ObjectEntry {
    fn new<D: Drawable + ?Sized>(drawable: &D, node: NodeKey) -> Self {
        let mut entry = Self {
            bounds: drawable.world_bounds(),
            flags: DrawableFlags::empty(),
            occluder: false,
            shadow_caster: false,
            node,
            slot: 0,
            queued: false,
        };
        entry.refresh(drawable);
        entry
    }

    fn refresh<D: Drawable + ?Sized>(&mut self, drawable: &D) {
        self.bounds = drawable.world_bounds();
        self.flags = drawable.drawable_flags();
        self.occluder = drawable.is_occluder();
        self.shadow_caster = drawable.casts_shadows();
    }
}

/// Summary of the tree shape, for debugging and visualization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OctreeStats {
    /// Nodes currently allocated, root included
    pub node_count: usize,
    /// Nodes without children
    pub leaf_count: usize,
    /// Indexed objects
    pub object_count: usize,
    /// Deepest node depth
    pub max_depth: u32,
    /// Objects held directly by the root
    pub root_objects: usize,
    /// Objects waiting for the next update
    pub pending_updates: usize,
}

/// Octree for spatial queries over drawables
#[derive(Debug, Clone)]
pub struct Octree {
    pub(super) config: OctreeConfig,
    pub(super) nodes: SlotMap<NodeKey, OctreeNode>,
    pub(super) root: NodeKey,
    pub(super) objects: SecondaryMap<ObjectId, ObjectEntry>,
    pub(super) dirty: Vec<ObjectId>,
}

impl Default for Octree {
    fn default() -> Self {
        Self::new(OctreeConfig::default())
    }
}

impl Octree {
    /// Create an empty octree
    ///
    /// Unusable config values are replaced with defaults and logged.
    pub fn new(config: OctreeConfig) -> Self {
        let config = config.sanitized();
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(OctreeNode::new(config.world_bounds, 0, None));

        log::info!(
            "Created octree over {:?}..{:?} (max depth {}, split threshold {})",
            config.world_bounds.min,
            config.world_bounds.max,
            config.max_depth,
            config.split_threshold
        );

        Self {
            config,
            nodes,
            root,
            objects: SecondaryMap::new(),
            dirty: Vec::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Root volume
    pub fn world_bounds(&self) -> Aabb {
        self.nodes[self.root].bounds
    }

    /// Root node handle
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Node by handle
    pub fn node(&self, key: NodeKey) -> Option<&OctreeNode> {
        self.nodes.get(key)
    }

    /// All nodes with their handles
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &OctreeNode)> {
        self.nodes.iter()
    }

    /// Number of indexed objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of allocated nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` is indexed
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Node currently holding `id`
    pub fn node_of(&self, id: ObjectId) -> Option<NodeKey> {
        self.objects.get(id).map(|entry| entry.node)
    }

    /// Bounds cached at the last insert or update of `id`
    pub fn cached_bounds(&self, id: ObjectId) -> Option<Aabb> {
        self.objects.get(id).map(|entry| entry.bounds)
    }

    /// Number of objects marked dirty since the last update
    pub fn pending_updates(&self) -> usize {
        self.dirty.len()
    }

    /// Index a drawable under `id`
    ///
    /// The drawable's bounds and attributes are cached until the next
    /// update that includes it. Inserting an id that is already indexed
    /// re-reads the drawable and reinserts it.
    pub fn insert<D: Drawable + ?Sized>(&mut self, id: ObjectId, drawable: &D) {
        if self.objects.contains_key(id) {
            self.remove(id);
        }

        let entry = ObjectEntry::new(drawable, self.root);
        let bounds = entry.bounds;
        self.objects.insert(id, entry);

        let node = self.place(self.root, id, &bounds);
        log::trace!("Inserted {id:?} at depth {}", self.nodes[node].depth);
    }

    /// Remove `id` from the tree immediately
    ///
    /// Returns `false` if it was not indexed. Nodes left empty are pruned
    /// before this returns.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let Some(node) = self.detach(id) else {
            return false;
        };
        self.objects.remove(id);

        let pruned = self.prune_from(node);
        if pruned > 0 {
            log::debug!("Removing {id:?} pruned {pruned} empty nodes");
        }
        true
    }

    /// Queue `id` for reinsertion at the next [`Octree::update`]
    ///
    /// Marking the same object several times queues it once. Unknown ids
    /// are ignored.
    pub fn mark_dirty(&mut self, id: ObjectId) {
        if let Some(entry) = self.objects.get_mut(id) {
            if !entry.queued {
                entry.queued = true;
                self.dirty.push(id);
            }
        }
    }

    /// Reinsert every object marked dirty since the last update
    ///
    /// Bounds and attributes are re-read from `source`. An object that
    /// still fits its current node without fitting any of its children
    /// stays where it is. Objects missing from `source` are removed.
    /// Returns the number of objects that moved.
    pub fn update<S: DrawableSource + ?Sized>(&mut self, source: &S) -> usize {
        if self.dirty.is_empty() {
            return 0;
        }

        let dirty = std::mem::take(&mut self.dirty);
        let mut vacated = Vec::new();
        let mut moved = 0;

        for id in dirty {
            let Some(entry) = self.objects.get_mut(id) else {
                continue;
            };
            entry.queued = false;

            let Some(drawable) = source.drawable(id) else {
                log::warn!("Dirty object {id:?} has no drawable, removing it from the octree");
                if let Some(node) = self.detach(id) {
                    vacated.push(node);
                }
                self.objects.remove(id);
                continue;
            };
            entry.refresh(drawable);
            let (bounds, node) = (entry.bounds, entry.node);

            if self.still_fits(node, &bounds) {
                continue;
            }
            if let Some(old) = self.detach(id) {
                vacated.push(old);
            }
            let new = self.place(self.root, id, &bounds);
            log::trace!(
                "Moved {id:?} from depth {} to depth {}",
                self.nodes.get(node).map_or(0, |n| n.depth),
                self.nodes[new].depth
            );
            moved += 1;
        }

        let pruned: usize = vacated.into_iter().map(|node| self.prune_from(node)).sum();
        log::debug!("Octree update moved {moved} objects, pruned {pruned} nodes");
        moved
    }

    /// Rebuild the tree over a new root volume
    pub fn resize(&mut self, world_bounds: Aabb) {
        let config = OctreeConfig {
            world_bounds,
            ..self.config.clone()
        }
        .sanitized();
        let entries: Vec<(ObjectId, Aabb)> =
            self.objects.iter().map(|(id, entry)| (id, entry.bounds)).collect();

        self.config = config;
        self.nodes.clear();
        self.root = self
            .nodes
            .insert(OctreeNode::new(self.config.world_bounds, 0, None));
        for entry in self.objects.values_mut() {
            entry.node = self.root;
        }
        for (id, bounds) in &entries {
            self.place(self.root, *id, bounds);
        }

        log::info!(
            "Resized octree to {:?}..{:?}, reinserted {} objects into {} nodes",
            self.config.world_bounds.min,
            self.config.world_bounds.max,
            entries.len(),
            self.nodes.len()
        );
    }

    /// Remove every object and node except the root
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self
            .nodes
            .insert(OctreeNode::new(self.config.world_bounds, 0, None));
        self.objects.clear();
        self.dirty.clear();
    }

    /// Objects accepted by a shape query, in traversal order
    pub fn get_objects<Q: OctreeQuery + ?Sized>(&self, query: &Q) -> Vec<ObjectId> {
        let mut result = Vec::new();
        self.get_objects_into(query, &mut result);
        result
    }

    /// Append the objects accepted by a shape query to `result`
    pub fn get_objects_into<Q: OctreeQuery + ?Sized>(&self, query: &Q, result: &mut Vec<ObjectId>) {
        let root = &self.nodes[self.root];
        if root.subtree_objects == 0 {
            return;
        }
        // The root is never culled, since it also holds out-of-bounds objects
        let mut mask = ALL_PLANES;
        query.test_region(&root.bounds, &mut mask);
        self.collect_node(self.root, query, ALL_PLANES, result);
        for child in root.children() {
            self.collect_subtree(child, query, mask, result);
        }
    }

    fn collect_subtree<Q: OctreeQuery + ?Sized>(
        &self,
        key: NodeKey,
        query: &Q,
        mut mask: PlaneMask,
        result: &mut Vec<ObjectId>,
    ) {
        let node = &self.nodes[key];
        if node.subtree_objects == 0 {
            return;
        }
        if query.test_region(&node.bounds, &mut mask) == Intersection::Outside {
            return;
        }

        self.collect_node(key, query, mask, result);
        for child in node.children() {
            self.collect_subtree(child, query, mask, result);
        }
    }

    fn collect_node<Q: OctreeQuery + ?Sized>(
        &self,
        key: NodeKey,
        query: &Q,
        mask: PlaneMask,
        result: &mut Vec<ObjectId>,
    ) {
        let filter = query.filter();
        for &id in &self.nodes[key].objects {
            let Some(entry) = self.objects.get(id) else {
                continue;
            };
            // Degenerate bounds match nothing, even under an empty mask
            if entry.bounds.is_valid()
                && filter.accepts(entry.flags, entry.occluder, entry.shadow_caster)
                && query.test_object(&entry.bounds, mask)
            {
                result.push(id);
            }
        }
    }

    /// Tree shape summary
    pub fn stats(&self) -> OctreeStats {
        OctreeStats {
            node_count: self.nodes.len(),
            leaf_count: self.nodes.values().filter(|node| node.is_leaf()).count(),
            object_count: self.objects.len(),
            max_depth: self.nodes.values().map(|node| node.depth).max().unwrap_or(0),
            root_objects: self.nodes[self.root].objects.len(),
            pending_updates: self.dirty.len(),
        }
    }

    /// Nodes at a given depth (for visualization)
    pub fn nodes_at_depth(&self, depth: u32) -> Vec<&OctreeNode> {
        self.nodes.values().filter(|node| node.depth == depth).collect()
    }

    /// Bounds of every leaf node (for visualization)
    pub fn leaf_bounds(&self) -> Vec<Aabb> {
        self.nodes
            .values()
            .filter(|node| node.is_leaf())
            .map(|node| node.bounds)
            .collect()
    }

    /// Descend from `start` to the deepest node that fully contains
    /// `bounds`, splitting full leaves on the way, and attach `id` there
    fn place(&mut self, start: NodeKey, id: ObjectId, bounds: &Aabb) -> NodeKey {
        let mut key = start;
        loop {
            let node = &self.nodes[key];
            if !node.subdivided {
                if node.objects.len() < self.config.split_threshold || !self.can_split(node) {
                    break;
                }
                self.split(key);
            }
            let Some(octant) = self.nodes[key].fitting_octant(bounds) else {
                break;
            };
            key = self.child_or_create(key, octant);
        }
        self.attach(key, id);
        key
    }

    fn can_split(&self, node: &OctreeNode) -> bool {
        node.depth < self.config.max_depth
            && node.bounds.half_extents().min() * 0.5 >= self.config.min_half_size
    }

    /// Push every resident that fits an octant down into it
    fn split(&mut self, key: NodeKey) {
        self.nodes[key].subdivided = true;
        let residents = self.nodes[key].objects.clone();
        let mut pushed = 0;

        for id in residents {
            let Some(bounds) = self.objects.get(id).map(|entry| entry.bounds) else {
                continue;
            };
            let Some(octant) = self.nodes[key].fitting_octant(&bounds) else {
                continue;
            };
            self.detach(id);
            let child = self.child_or_create(key, octant);
            self.place(child, id, &bounds);
            pushed += 1;
        }

        log::debug!(
            "Split octree node at depth {} ({pushed} objects pushed down)",
            self.nodes[key].depth
        );
    }

    fn child_or_create(&mut self, key: NodeKey, octant: usize) -> NodeKey {
        if let Some(child) = self.nodes[key].children[octant] {
            return child;
        }
        let parent = &self.nodes[key];
        let child_node = OctreeNode::new(parent.bounds.child_octant(octant), parent.depth + 1, Some(key));
        let child = self.nodes.insert(child_node);
        self.nodes[key].children[octant] = Some(child);
        child
    }

    /// An object stays put if reinserting it would land in the same node
    fn still_fits(&self, key: NodeKey, bounds: &Aabb) -> bool {
        let Some(node) = self.nodes.get(key) else {
            return false;
        };
        let contained = key == self.root || node.bounds.contains_aabb(bounds);
        contained && (!node.subdivided || node.fitting_octant(bounds).is_none())
    }

    fn attach(&mut self, key: NodeKey, id: ObjectId) {
        let node = &mut self.nodes[key];
        let slot = node.objects.len();
        node.objects.push(id);
        if let Some(entry) = self.objects.get_mut(id) {
            entry.node = key;
            entry.slot = slot;
        }

        let mut current = Some(key);
        while let Some(k) = current {
            let node = &mut self.nodes[k];
            node.subtree_objects += 1;
            current = node.parent;
        }
    }

    /// Unlink `id` from its node, returning that node
    fn detach(&mut self, id: ObjectId) -> Option<NodeKey> {
        let entry = self.objects.get(id)?;
        let (key, slot) = (entry.node, entry.slot);

        let node = self.nodes.get_mut(key)?;
        if node.objects.get(slot) != Some(&id) {
            log::error!("Octree slot of {id:?} is stale, object left unlinked");
            return None;
        }
        node.objects.swap_remove(slot);
        if let Some(&swapped) = node.objects.get(slot) {
            if let Some(entry) = self.objects.get_mut(swapped) {
                entry.slot = slot;
            }
        }

        let mut current = Some(key);
        while let Some(k) = current {
            let node = &mut self.nodes[k];
            node.subtree_objects -= 1;
            current = node.parent;
        }
        Some(key)
    }

    /// Free empty nodes from `key` upward, returning how many were freed
    fn prune_from(&mut self, mut key: NodeKey) -> usize {
        let mut pruned = 0;
        loop {
            let Some(node) = self.nodes.get(key) else {
                break;
            };
            if key == self.root
                || node.subtree_objects > 0
                || node.depth <= self.config.min_retained_depth
            {
                break;
            }
            let Some(parent) = node.parent else {
                break;
            };

            pruned += self.free_subtree(key);
            let parent_node = &mut self.nodes[parent];
            for child in &mut parent_node.children {
                if *child == Some(key) {
                    *child = None;
                }
            }
            if parent_node.is_leaf() {
                parent_node.subdivided = false;
            }
            key = parent;
        }
        pruned
    }

    fn free_subtree(&mut self, key: NodeKey) -> usize {
        let mut stack = vec![key];
        let mut freed = 0;
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.remove(k) {
                stack.extend(node.children());
                freed += 1;
            }
        }
        freed
    }
}
