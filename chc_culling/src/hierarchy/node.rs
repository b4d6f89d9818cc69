/// HierarchyNode: one node of the strict binary bounding-volume hierarchy.
///
/// Nodes live in the `Hierarchy` arena and refer to each other through
/// stable `NodeKey` handles. An interior node exclusively owns its two
/// children; the parent link is a non-owning back reference used only to
/// propagate visibility upward.

use slotmap::new_key_type;
use crate::query::QueryHandle;
use super::aabb::AxisAlignedBox;

new_key_type! {
    /// Stable handle of a node inside its `Hierarchy`.
    pub struct NodeKey;
}

/// Grid axis along which two cells were merged.
///
/// `X` runs along world X, `Y` along world Z (the grid lies on the ground plane).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    X,
    Y,
}

impl GridAxis {
    /// The other grid axis.
    pub fn other(self) -> Self {
        match self {
            GridAxis::X => GridAxis::Y,
            GridAxis::Y => GridAxis::X,
        }
    }
}

/// A leaf (one instance) or an interior node (two children).
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    bounds: AxisAlignedBox,
    children: Option<[NodeKey; 2]>,
    parent: Option<NodeKey>,
    split_axis: Option<GridAxis>,
    /// Sorted, duplicate-free instance indices covered by the subtree
    members: Vec<u32>,
    /// Visibility as of the last completed frame
    visible: bool,
    query: QueryHandle,
}

impl HierarchyNode {
    pub(crate) fn leaf(instance: u32, bounds: AxisAlignedBox, query: QueryHandle) -> Self {
        Self {
            bounds,
            children: None,
            parent: None,
            split_axis: None,
            members: vec![instance],
            visible: false,
            query,
        }
    }

    pub(crate) fn interior(
        axis: GridAxis,
        children: [NodeKey; 2],
        bounds: AxisAlignedBox,
        members: Vec<u32>,
        query: QueryHandle,
    ) -> Self {
        debug_assert!(members.windows(2).all(|w| w[0] < w[1]), "members must be strictly sorted");
        Self {
            bounds,
            children: Some(children),
            parent: None,
            split_axis: Some(axis),
            members,
            visible: false,
            query,
        }
    }

    /// Set once, when the owning interior node is created.
    pub(crate) fn set_parent(&mut self, parent: NodeKey) {
        debug_assert!(self.parent.is_none(), "node already has a parent");
        self.parent = Some(parent);
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    // ===== GETTERS =====

    /// World-space bounds (union of the children for interior nodes).
    pub fn bounds(&self) -> &AxisAlignedBox {
        &self.bounds
    }

    /// A node is a leaf iff it has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn children(&self) -> Option<[NodeKey; 2]> {
        self.children
    }

    /// `None` for the root.
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Merge axis of an interior node, `None` for leaves.
    pub fn split_axis(&self) -> Option<GridAxis> {
        self.split_axis
    }

    pub fn members(&self) -> &[u32] {
        &self.members
    }

    /// Instance index of a leaf.
    pub fn instance(&self) -> Option<u32> {
        if self.is_leaf() {
            self.members.first().copied()
        } else {
            None
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Occlusion query bound to this node.
    pub fn query(&self) -> QueryHandle {
        self.query
    }
}

/// Merge two strictly sorted member lists into one.
pub(crate) fn merge_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            merged.push(a[i]);
            i += 1;
        } else if b[j] < a[i] {
            merged.push(b[j]);
            j += 1;
        } else {
            merged.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}
