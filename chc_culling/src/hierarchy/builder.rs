/// HierarchyBuilder: bottom-up BVH construction over an instance grid.
///
/// Leaves are laid out row-major on an `x_res × y_res` grid
/// (index `i * y_res + j`, `i` along X). Each pass pairs adjacent cells
/// along one axis into interior nodes, alternating X and Y, until a single
/// root remains. An unpaired last cell passes through to the next pass.

use glam::{Vec2, Vec3};
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::query::QueryPool;
use super::aabb::AxisAlignedBox;
use super::hierarchy::Hierarchy;
use super::node::{merge_sorted, GridAxis, HierarchyNode, NodeKey};

const SOURCE: &str = "chc::HierarchyBuilder";

/// Grid dimensions of the instance layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Cells along X
    pub x_res: u32,
    /// Cells along Y (world Z)
    pub y_res: u32,
}

impl GridLayout {
    /// Explicit layout; both extents must be at least 1.
    pub fn new(x_res: u32, y_res: u32) -> Result<Self> {
        if x_res == 0 || y_res == 0 {
            crate::chc_bail!(SOURCE, "grid layout {}x{} has an empty axis", x_res, y_res);
        }
        Ok(Self { x_res, y_res })
    }

    /// Square layout for `instance_count` cells.
    ///
    /// Fails unless `instance_count` is a non-zero perfect square.
    pub fn square(instance_count: usize) -> Result<Self> {
        if instance_count == 0 {
            crate::chc_bail!(SOURCE, "cannot lay out zero instances");
        }
        let resolution = integer_sqrt(instance_count);
        if resolution * resolution != instance_count {
            crate::chc_bail!(SOURCE,
                "{} instances do not form a square grid ({}x{} leaves {} over); pass an explicit layout",
                instance_count, resolution, resolution,
                instance_count - resolution * resolution);
        }
        let resolution = u32::try_from(resolution)
            .map_err(|_| crate::chc_err!(SOURCE, "grid resolution {} overflows u32", resolution))?;
        Ok(Self { x_res: resolution, y_res: resolution })
    }

    pub fn cell_count(&self) -> usize {
        self.x_res as usize * self.y_res as usize
    }
}

/// `floor(sqrt(n))`, exact for every `usize`.
fn integer_sqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

/// Builds a `Hierarchy` from instance positions and the mesh footprint.
///
/// # Example
///
/// ```
/// use chc_culling::chc::hierarchy::HierarchyBuilder;
/// use chc_culling::glam::{Vec2, Vec3};
///
/// let positions = vec![
///     Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0),
///     Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0),
/// ];
/// let hierarchy = HierarchyBuilder::new()
///     .footprint(Vec3::ONE)
///     .positions(&positions)
///     .build()?;
/// assert_eq!(hierarchy.len(), 7);
/// # Ok::<(), chc_culling::chc::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder<'a> {
    footprint: Option<Vec3>,
    positions: Option<&'a [Vec2]>,
    layout: Option<GridLayout>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-instance box extent (the mesh size).
    pub fn footprint(mut self, footprint: Vec3) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// Instance positions on the ground plane, row-major.
    pub fn positions(mut self, positions: &'a [Vec2]) -> Self {
        self.positions = Some(positions);
        self
    }

    /// Explicit grid layout. Without one the positions must form a square grid.
    pub fn layout(mut self, layout: GridLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Build with a private query pool (handles `0..2N-1`).
    pub fn build(&self) -> Result<Hierarchy> {
        let mut pool = QueryPool::new();
        self.build_with_pool(&mut pool)
    }

    /// Build, drawing one query handle per node from `pool`.
    pub fn build_with_pool(&self, pool: &mut QueryPool) -> Result<Hierarchy> {
        let (footprint, positions, layout) = self.validate()?;

        let n = positions.len();
        let mut nodes: SlotMap<NodeKey, HierarchyNode> =
            SlotMap::with_capacity_and_key(2 * n - 1);
        let mut leaves = Vec::with_capacity(n);

        for (instance, position) in positions.iter().enumerate() {
            let origin = Vec3::new(position.x, 0.0, position.y);
            let bounds = AxisAlignedBox::from_origin_size(origin, footprint);
            let key = nodes.insert(HierarchyNode::leaf(instance as u32, bounds, pool.alloc()));
            leaves.push(key);
        }

        let mut grid = leaves.clone();
        let mut x_res = layout.x_res as usize;
        let mut y_res = layout.y_res as usize;
        let mut axis = GridAxis::X;

        while grid.len() != 1 {
            let (step_x, step_y) = match axis {
                GridAxis::X => (2, 1),
                GridAxis::Y => (1, 2),
            };
            let mut next = Vec::with_capacity(grid.len() / 2 + x_res.max(y_res));

            for i in (0..x_res).step_by(step_x) {
                for j in (0..y_res).step_by(step_y) {
                    let first = grid[i * y_res + j];
                    let partner = match axis {
                        GridAxis::X if i + 1 < x_res => Some(grid[(i + 1) * y_res + j]),
                        GridAxis::Y if j + 1 < y_res => Some(grid[i * y_res + j + 1]),
                        _ => None,
                    };
                    next.push(match partner {
                        Some(second) => Self::merge(&mut nodes, axis, first, second, pool),
                        None => first,
                    });
                }
            }

            match axis {
                GridAxis::X => x_res = x_res.div_ceil(2),
                GridAxis::Y => y_res = y_res.div_ceil(2),
            }
            debug_assert_eq!(next.len(), x_res * y_res);

            grid = next;
            axis = axis.other();
        }

        let root = grid[0];
        let hierarchy = Hierarchy::from_parts(nodes, root, leaves, layout, footprint);

        crate::chc_info!(SOURCE,
            "Built hierarchy over {}x{} grid: {} nodes, depth {}",
            layout.x_res, layout.y_res, hierarchy.len(), hierarchy.depth());

        Ok(hierarchy)
    }

    /// Create the interior node owning `first` and `second`.
    fn merge(
        nodes: &mut SlotMap<NodeKey, HierarchyNode>,
        axis: GridAxis,
        first: NodeKey,
        second: NodeKey,
        pool: &mut QueryPool,
    ) -> NodeKey {
        let bounds = nodes[first].bounds().union(nodes[second].bounds());
        let members = merge_sorted(nodes[first].members(), nodes[second].members());
        let parent = nodes.insert(HierarchyNode::interior(
            axis,
            [first, second],
            bounds,
            members,
            pool.alloc(),
        ));
        nodes[first].set_parent(parent);
        nodes[second].set_parent(parent);
        parent
    }

    /// Check every precondition before anything is allocated.
    fn validate(&self) -> Result<(Vec3, &'a [Vec2], GridLayout)> {
        let footprint = self.footprint.ok_or_else(|| {
            crate::chc_error!(SOURCE, "build requested before the footprint was set");
            Error::InitializationFailed("instance footprint not set".to_string())
        })?;
        let positions = self.positions.ok_or_else(|| {
            crate::chc_error!(SOURCE, "build requested before the positions were set");
            Error::InitializationFailed("instance positions not set".to_string())
        })?;

        if !footprint.is_finite() || footprint.cmplt(Vec3::ZERO).any() {
            crate::chc_bail!(SOURCE, "footprint {} must be finite and non-negative", footprint);
        }
        if positions.is_empty() {
            crate::chc_bail!(SOURCE, "cannot build a hierarchy over zero instances");
        }
        if let Some(bad) = positions.iter().position(|p| !p.is_finite()) {
            crate::chc_bail!(SOURCE, "position {} is not finite: {}", bad, positions[bad]);
        }

        let layout = match self.layout {
            Some(layout) => {
                if layout.x_res == 0 || layout.y_res == 0 {
                    crate::chc_bail!(SOURCE,
                        "grid layout {}x{} has an empty axis", layout.x_res, layout.y_res);
                }
                if layout.cell_count() != positions.len() {
                    crate::chc_bail!(SOURCE,
                        "grid layout {}x{} has {} cells but {} positions were given",
                        layout.x_res, layout.y_res, layout.cell_count(), positions.len());
                }
                layout
            }
            None => GridLayout::square(positions.len())?,
        };

        if u32::try_from(positions.len()).is_err() {
            crate::chc_bail!(SOURCE, "{} instances exceed the u32 index range", positions.len());
        }

        Ok((footprint, positions, layout))
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
