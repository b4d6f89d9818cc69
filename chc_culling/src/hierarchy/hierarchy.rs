/// Hierarchy: node arena and tree-level operations.
///
/// Owns every node of one bounding-volume hierarchy in a `SlotMap`, so
/// `NodeKey`s stay valid for the lifetime of the tree. The shape is fixed
/// at build time; only node visibility changes afterwards.

use std::ops::Index;
use glam::Vec3;
use slotmap::SlotMap;
use crate::query::{QueryHandle, QueryPool};
use super::aabb::AxisAlignedBox;
use super::builder::GridLayout;
use super::node::{HierarchyNode, NodeKey};

/// Bounding-volume hierarchy over a grid of instances.
pub struct Hierarchy {
    nodes: SlotMap<NodeKey, HierarchyNode>,
    root: NodeKey,
    /// Leaf of each instance, indexed by instance
    leaves: Vec<NodeKey>,
    layout: GridLayout,
    footprint: Vec3,
}

impl Hierarchy {
    pub(crate) fn from_parts(
        nodes: SlotMap<NodeKey, HierarchyNode>,
        root: NodeKey,
        leaves: Vec<NodeKey>,
        layout: GridLayout,
        footprint: Vec3,
    ) -> Self {
        debug_assert!(nodes.contains_key(root));
        debug_assert_eq!(nodes.len(), 2 * leaves.len() - 1, "strict binary tree");
        Self { nodes, root, leaves, layout, footprint }
    }

    // ===== GETTERS =====

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn node(&self, key: NodeKey) -> Option<&HierarchyNode> {
        self.nodes.get(key)
    }

    /// Total node count (`2 * instance_count - 1`).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: building a hierarchy requires at least one instance.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn instance_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Per-instance footprint the leaves were built with.
    pub fn footprint(&self) -> Vec3 {
        self.footprint
    }

    /// Leaf node of an instance.
    pub fn leaf(&self, instance: u32) -> Option<NodeKey> {
        self.leaves.get(instance as usize).copied()
    }

    /// Bounds of an instance's leaf.
    pub fn instance_bounds(&self, instance: u32) -> Option<AxisAlignedBox> {
        self.leaf(instance).map(|key| *self.nodes[key].bounds())
    }

    pub fn is_leaf(&self, key: NodeKey) -> bool {
        self.nodes[key].is_leaf()
    }

    pub fn children(&self, key: NodeKey) -> Option<[NodeKey; 2]> {
        self.nodes[key].children()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes[key].parent()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &HierarchyNode)> {
        self.nodes.iter()
    }

    /// Query handles of every node, for returning them to their pool.
    pub fn query_handles(&self) -> impl Iterator<Item = QueryHandle> + '_ {
        self.nodes.values().map(|node| node.query())
    }

    /// Consume the hierarchy and give its query handles back.
    pub fn release_queries(self, pool: &mut QueryPool) {
        for handle in self.query_handles() {
            pool.free(handle);
        }
    }

    // ===== VISIBILITY =====

    pub fn is_visible(&self, key: NodeKey) -> bool {
        self.nodes[key].is_visible()
    }

    pub fn set_visible(&mut self, key: NodeKey, visible: bool) {
        self.nodes[key].set_visible(visible);
    }

    /// Forget all temporal coherence (every node invisible).
    pub fn reset_visibility(&mut self) {
        for node in self.nodes.values_mut() {
            node.set_visible(false);
        }
    }

    /// Mark `key` visible, then every ancestor up to the first one that
    /// already is.
    ///
    /// Returns the number of ancestors that changed.
    pub fn pull_up_visibility(&mut self, key: NodeKey) -> usize {
        self.nodes[key].set_visible(true);

        let mut changed = 0;
        let mut current = self.nodes[key].parent();
        while let Some(ancestor) = current {
            let node = &mut self.nodes[ancestor];
            if node.is_visible() {
                break;
            }
            node.set_visible(true);
            changed += 1;
            current = node.parent();
        }
        changed
    }

    // ===== TRAVERSAL =====

    /// Distance from the root (root = 0).
    pub fn node_depth(&self, key: NodeKey) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[key].parent();
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent].parent();
        }
        depth
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        self.leaves
            .iter()
            .map(|&leaf| self.node_depth(leaf))
            .max()
            .unwrap_or(0)
    }

    /// Nodes exactly `depth` levels below the root, plus leaves that end
    /// above that level, left to right.
    ///
    /// Together they partition the instances, which makes this the set of
    /// boxes to draw when inspecting one level of the tree.
    pub fn nodes_at_depth(&self, depth: usize) -> Vec<NodeKey> {
        let mut result = Vec::new();
        let mut stack = vec![(self.root, 0usize)];

        while let Some((key, level)) = stack.pop() {
            match self.nodes[key].children() {
                Some([first, second]) if level < depth => {
                    stack.push((second, level + 1));
                    stack.push((first, level + 1));
                }
                _ => result.push(key),
            }
        }
        result
    }

    /// Leaves under `key` (itself when it is a leaf), left to right.
    pub fn descendant_leaves(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut leaves = Vec::new();
        let mut stack = vec![key];

        while let Some(current) = stack.pop() {
            match self.nodes[current].children() {
                Some([first, second]) => {
                    stack.push(second);
                    stack.push(first);
                }
                None => leaves.push(current),
            }
        }
        leaves
    }
}

impl Index<NodeKey> for Hierarchy {
    type Output = HierarchyNode;

    /// Panics on a key from another hierarchy.
    fn index(&self, key: NodeKey) -> &HierarchyNode {
        &self.nodes[key]
    }
}

#[cfg(test)]
#[path = "hierarchy_tests.rs"]
mod tests;
