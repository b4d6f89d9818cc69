//! Bounding-volume hierarchy over an instance grid.
//!
//! Built once per placement of instances; afterwards only node visibility
//! changes, driven by the visibility scheduler.

mod aabb;
mod builder;
mod hierarchy;
mod node;

pub use aabb::AxisAlignedBox;
pub use builder::{GridLayout, HierarchyBuilder};
pub use hierarchy::Hierarchy;
pub use node::{GridAxis, HierarchyNode, NodeKey};
