use glam::{Vec2, Vec3};
use crate::error::Error;
use crate::query::QueryPool;
use super::*;

/// Row-major grid positions, like the demo generates them.
fn grid_positions(x_res: u32, y_res: u32) -> Vec<Vec2> {
    let mut positions = Vec::new();
    for i in 0..x_res {
        for j in 0..y_res {
            positions.push(Vec2::new(i as f32, j as f32));
        }
    }
    positions
}

fn footprint() -> Vec3 {
    Vec3::new(0.8, 1.5, 0.6)
}

fn build_square(k: u32) -> Hierarchy {
    let positions = grid_positions(k, k);
    HierarchyBuilder::new()
        .footprint(footprint())
        .positions(&positions)
        .build()
        .unwrap()
}

// ============================================================================
// Shape guarantees
// ============================================================================

#[test]
fn test_square_grids_have_one_leaf_per_instance() {
    for k in 1..=9u32 {
        let hierarchy = build_square(k);
        let n = (k * k) as usize;
        let leaf_count = hierarchy.iter().filter(|(_, node)| node.is_leaf()).count();
        assert_eq!(leaf_count, n, "k = {}", k);
        assert_eq!(hierarchy.len(), 2 * n - 1, "k = {}", k);
        assert_eq!(hierarchy.instance_count(), n);
    }
}

#[test]
fn test_leaf_bounds_match_position_plus_footprint() {
    let positions = grid_positions(4, 4);
    let hierarchy = HierarchyBuilder::new()
        .footprint(footprint())
        .positions(&positions)
        .build()
        .unwrap();

    for (instance, position) in positions.iter().enumerate() {
        let leaf = hierarchy.leaf(instance as u32).unwrap();
        let node = &hierarchy[leaf];
        let origin = Vec3::new(position.x, 0.0, position.y);
        assert!(node.is_leaf());
        assert_eq!(node.instance(), Some(instance as u32));
        assert_eq!(node.members(), &[instance as u32]);
        assert_eq!(*node.bounds(), AxisAlignedBox::new(origin, origin + footprint()));
    }
}

#[test]
fn test_root_bounds_is_union_of_all_leaves() {
    let hierarchy = build_square(5);
    let mut expected = AxisAlignedBox::empty();
    for instance in 0..25 {
        expected += hierarchy.instance_bounds(instance).unwrap();
    }
    assert_eq!(*hierarchy[hierarchy.root()].bounds(), expected);
    assert!(hierarchy.parent(hierarchy.root()).is_none());
}

#[test]
fn test_interior_nodes_aggregate_children_exactly() {
    let hierarchy = build_square(6);
    for (_, node) in hierarchy.iter() {
        let Some([a, b]) = node.children() else { continue };
        let (a, b) = (&hierarchy[a], &hierarchy[b]);

        assert_eq!(*node.bounds(), a.bounds().union(b.bounds()));

        let mut expected: Vec<u32> = a.members().iter().chain(b.members()).copied().collect();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(node.members(), expected.as_slice());
        assert_eq!(a.members().len() + b.members().len(), node.members().len(), "no duplicates");
    }
}

#[test]
fn test_parent_links_are_consistent() {
    let hierarchy = build_square(7);
    for (key, node) in hierarchy.iter() {
        if let Some([a, b]) = node.children() {
            assert_eq!(hierarchy.parent(a), Some(key));
            assert_eq!(hierarchy.parent(b), Some(key));
        }
    }
}

#[test]
fn test_every_leaf_reachable_from_root() {
    let hierarchy = build_square(8);
    let leaves = hierarchy.descendant_leaves(hierarchy.root());
    let mut instances: Vec<u32> = leaves.iter().map(|&l| hierarchy[l].instance().unwrap()).collect();
    instances.sort_unstable();
    assert_eq!(instances, (0..64).collect::<Vec<u32>>());
    assert_eq!(hierarchy[hierarchy.root()].members(), instances.as_slice());
}

#[test]
fn test_depth_is_logarithmic() {
    // 2^k x 2^k grid → perfectly balanced, depth 2k
    assert_eq!(build_square(1).depth(), 0);
    assert_eq!(build_square(2).depth(), 2);
    assert_eq!(build_square(4).depth(), 4);
    assert_eq!(build_square(8).depth(), 6);
    // Odd extents pass cells through, adding at most one level per axis
    assert!(build_square(5).depth() <= 6);
}

#[test]
fn test_first_merge_is_along_x() {
    let hierarchy = build_square(2);
    // 2x2: X pass pairs (0,2) and (1,3), Y pass joins them under the root
    let root = &hierarchy[hierarchy.root()];
    assert_eq!(root.split_axis(), Some(GridAxis::Y));
    let [a, b] = root.children().unwrap();
    assert_eq!(hierarchy[a].split_axis(), Some(GridAxis::X));
    assert_eq!(hierarchy[a].members(), &[0, 2]);
    assert_eq!(hierarchy[b].members(), &[1, 3]);
    assert_eq!(hierarchy[hierarchy.leaf(0).unwrap()].split_axis(), None);
}

#[test]
fn test_single_instance_root_is_leaf() {
    let hierarchy = build_square(1);
    assert_eq!(hierarchy.len(), 1);
    assert!(hierarchy.is_leaf(hierarchy.root()));
    assert_eq!(hierarchy.leaf(0), Some(hierarchy.root()));
}

#[test]
fn test_build_is_deterministic() {
    let a = build_square(5);
    let b = build_square(5);
    let members_a: Vec<Vec<u32>> = a.nodes_at_depth(3).iter().map(|&k| a[k].members().to_vec()).collect();
    let members_b: Vec<Vec<u32>> = b.nodes_at_depth(3).iter().map(|&k| b[k].members().to_vec()).collect();
    assert_eq!(members_a, members_b);
}

// ============================================================================
// Explicit layouts
// ============================================================================

#[test]
fn test_explicit_rectangular_layout() {
    let positions = grid_positions(3, 5);
    let hierarchy = HierarchyBuilder::new()
        .footprint(Vec3::ONE)
        .positions(&positions)
        .layout(GridLayout::new(3, 5).unwrap())
        .build()
        .unwrap();
    assert_eq!(hierarchy.len(), 29);
    assert_eq!(hierarchy[hierarchy.root()].members().len(), 15);
    assert_eq!(hierarchy.layout(), GridLayout { x_res: 3, y_res: 5 });
}

#[test]
fn test_layout_must_match_position_count() {
    let positions = grid_positions(3, 5);
    let result = HierarchyBuilder::new()
        .footprint(Vec3::ONE)
        .positions(&positions)
        .layout(GridLayout { x_res: 4, y_res: 4 })
        .build();
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_grid_layout_rejects_empty_axis() {
    assert!(GridLayout::new(0, 3).is_err());
    assert!(GridLayout::new(3, 0).is_err());
}

#[test]
fn test_grid_layout_square() {
    assert_eq!(GridLayout::square(49).unwrap(), GridLayout { x_res: 7, y_res: 7 });
    assert_eq!(GridLayout::square(1).unwrap().cell_count(), 1);
    assert!(GridLayout::square(0).is_err());
    assert!(GridLayout::square(50).is_err());
}

// ============================================================================
// Preconditions
// ============================================================================

#[test]
fn test_non_square_count_is_rejected() {
    let positions = grid_positions(2, 3);
    let result = HierarchyBuilder::new().footprint(Vec3::ONE).positions(&positions).build();
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_zero_instances_rejected() {
    let positions: Vec<Vec2> = Vec::new();
    let result = HierarchyBuilder::new().footprint(Vec3::ONE).positions(&positions).build();
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_missing_footprint_fails_initialization() {
    let positions = grid_positions(2, 2);
    let result = HierarchyBuilder::new().positions(&positions).build();
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_missing_positions_fails_initialization() {
    let result = HierarchyBuilder::new().footprint(Vec3::ONE).build();
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_bad_footprint_rejected() {
    let positions = grid_positions(2, 2);
    for bad in [Vec3::new(-1.0, 1.0, 1.0), Vec3::new(1.0, f32::NAN, 1.0)] {
        let result = HierarchyBuilder::new().footprint(bad).positions(&positions).build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}

#[test]
fn test_non_finite_position_rejected() {
    let mut positions = grid_positions(2, 2);
    positions[3] = Vec2::new(f32::INFINITY, 0.0);
    let result = HierarchyBuilder::new().footprint(Vec3::ONE).positions(&positions).build();
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_failed_build_allocates_no_queries() {
    let positions = grid_positions(2, 3);
    let mut pool = QueryPool::new();
    let result = HierarchyBuilder::new()
        .footprint(Vec3::ONE)
        .positions(&positions)
        .build_with_pool(&mut pool);
    assert!(result.is_err());
    assert!(pool.is_empty());
}

// ============================================================================
// Query handles
// ============================================================================

#[test]
fn test_each_node_gets_a_unique_query_handle() {
    let mut pool = QueryPool::new();
    let _offset = pool.alloc_many(3);
    let positions = grid_positions(4, 4);
    let hierarchy = HierarchyBuilder::new()
        .footprint(Vec3::ONE)
        .positions(&positions)
        .build_with_pool(&mut pool)
        .unwrap();

    let mut ids: Vec<u32> = hierarchy.query_handles().map(|h| h.id()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (3..34).collect::<Vec<u32>>());

    hierarchy.release_queries(&mut pool);
    assert_eq!(pool.len(), 3);
}
