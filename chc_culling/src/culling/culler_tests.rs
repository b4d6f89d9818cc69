use glam::{Vec2, Vec3};
use crate::camera::Camera;
use crate::error::Error;
use crate::hierarchy::{Hierarchy, HierarchyBuilder};
use crate::query::mock_query_service::{MockQueryService, QueryCommand};
use crate::query::QueryPool;
use super::*;

/// 2×2 grid with spacing 10; the camera sees only instances 0 and 1.
fn create_scene(pool: &mut QueryPool) -> (Hierarchy, Camera) {
    let positions = [
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 10.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(10.0, 10.0),
    ];
    let hierarchy = HierarchyBuilder::new()
        .footprint(Vec3::ONE)
        .positions(&positions)
        .build_with_pool(pool)
        .unwrap();
    let camera = Camera::look_at(
        Vec3::new(0.5, 0.5, 14.0),
        Vec3::new(0.5, 0.5, 0.0),
        std::f32::consts::FRAC_PI_4,
        1.0,
        0.1,
        100.0,
    );
    (hierarchy, camera)
}

fn last_drawn(service: &MockQueryService) -> Vec<u32> {
    service.drawn_sets().pop().unwrap()
}

// ============================================================================
// CullingMode
// ============================================================================

#[test]
fn test_mode_from_u32() {
    assert_eq!(CullingMode::try_from(0).unwrap(), CullingMode::Unoptimized);
    assert_eq!(CullingMode::try_from(1).unwrap(), CullingMode::Frustum);
    assert_eq!(CullingMode::try_from(2).unwrap(), CullingMode::Occlusion);
    assert_eq!(CullingMode::try_from(3).unwrap(), CullingMode::Chc);
    assert!(matches!(CullingMode::try_from(4), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_mode_display() {
    assert_eq!(CullingMode::Chc.to_string(), "chc (3)");
    assert_eq!(CullingMode::Unoptimized.name(), "unoptimized");
}

#[test]
fn test_create_culler_for_every_mode() {
    let mut pool = QueryPool::new();
    let (hierarchy, _) = create_scene(&mut pool);
    for mode in CullingMode::ALL {
        let culler = create_culler(mode, &hierarchy, &mut pool, &SchedulerConfig::default()).unwrap();
        assert_eq!(culler.mode(), mode);
    }
}

#[test]
fn test_create_culler_propagates_config_errors() {
    let mut pool = QueryPool::new();
    let (hierarchy, _) = create_scene(&mut pool);
    let result = create_culler(CullingMode::Chc, &hierarchy, &mut pool, &SchedulerConfig { batch_size: 0 });
    assert!(result.is_err());
}

// ============================================================================
// BruteForceCuller / FrustumCuller
// ============================================================================

#[test]
fn test_brute_force_draws_everything() {
    let mut pool = QueryPool::new();
    let (mut hierarchy, camera) = create_scene(&mut pool);
    let mut service = MockQueryService::new();

    let stats = BruteForceCuller::new().render_frame(&mut hierarchy, &camera, &mut service);

    assert_eq!(last_drawn(&service), vec![0, 1, 2, 3]);
    assert_eq!(stats.instances_drawn, 4);
    assert!(service.issued_queries().is_empty());
    assert_eq!(service.commands.last(), Some(&QueryCommand::SyncCompletion));
}

#[test]
fn test_frustum_culler_draws_in_frustum_instances() {
    let mut pool = QueryPool::new();
    let (mut hierarchy, camera) = create_scene(&mut pool);
    let mut service = MockQueryService::new();

    let stats = FrustumCuller::new().render_frame(&mut hierarchy, &camera, &mut service);

    assert_eq!(last_drawn(&service), vec![0, 1]);
    assert_eq!(stats.frustum_culled, 2);
    assert!(service.issued_queries().is_empty());
}

// ============================================================================
// OcclusionCuller
// ============================================================================

#[test]
fn test_occlusion_culler_first_frame_draws_all() {
    let mut pool = QueryPool::new();
    let (mut hierarchy, camera) = create_scene(&mut pool);
    let mut culler = OcclusionCuller::new(4, &mut pool);
    let mut service = MockQueryService::new().with_default_result(false);

    let stats = culler.render_frame(&mut hierarchy, &camera, &mut service);

    assert_eq!(last_drawn(&service), vec![0, 1, 2, 3]);
    assert_eq!(stats.queries_issued, 4);
    assert_eq!(stats.queries_passed + stats.queries_occluded, 0);
    assert_eq!(service.flush_count(), 1);
}

#[test]
fn test_occlusion_culler_uses_previous_frame_results() {
    let mut pool = QueryPool::new();
    let (mut hierarchy, camera) = create_scene(&mut pool);
    let mut culler = OcclusionCuller::new(4, &mut pool);
    let mut service = MockQueryService::new();

    culler.render_frame(&mut hierarchy, &camera, &mut service);
    let first_buffer = service.issued_queries();
    assert_eq!(first_buffer.len(), 4);

    // Instance 2 of the first buffer occluded
    service.set_result(first_buffer[2], false);
    service.clear_commands();
    let stats = culler.render_frame(&mut hierarchy, &camera, &mut service);

    assert_eq!(last_drawn(&service), vec![0, 1, 3]);
    assert_eq!(stats.queries_passed, 3);
    assert_eq!(stats.queries_occluded, 1);

    // Second frame issues into the other buffer
    let second_buffer = service.issued_queries();
    assert!(second_buffer.iter().all(|h| !first_buffer.contains(h)));
}

#[test]
fn test_occlusion_culler_alternates_buffers() {
    let mut pool = QueryPool::new();
    let (mut hierarchy, camera) = create_scene(&mut pool);
    let mut culler = OcclusionCuller::new(4, &mut pool);
    let mut service = MockQueryService::new();

    culler.render_frame(&mut hierarchy, &camera, &mut service);
    let first = service.issued_queries();
    service.clear_commands();
    culler.render_frame(&mut hierarchy, &camera, &mut service);
    service.clear_commands();
    culler.render_frame(&mut hierarchy, &camera, &mut service);
    let third = service.issued_queries();

    assert_eq!(&third[..4], first.as_slice());
}

#[test]
fn test_occlusion_culler_handles_do_not_collide_with_nodes() {
    let mut pool = QueryPool::new();
    let (hierarchy, _) = create_scene(&mut pool);
    let culler = OcclusionCuller::new(4, &mut pool);

    let node_ids: Vec<u32> = hierarchy.query_handles().map(|h| h.id()).collect();
    assert!(culler.handles.iter().flatten().all(|h| !node_ids.contains(&h.id())));
    assert_eq!(pool.len(), 7 + 8);

    culler.release_queries(&mut pool);
    assert_eq!(pool.len(), 7);
}

// ============================================================================
// ChcCuller
// ============================================================================

#[test]
fn test_chc_culler_matches_scheduler() {
    let mut pool = QueryPool::new();
    let (mut hierarchy, camera) = create_scene(&mut pool);
    let mut culler = ChcCuller::new(SchedulerConfig::default()).unwrap();
    let mut service = MockQueryService::new();
    // Boxes outside the view fail their queries
    for instance in [2, 3] {
        let leaf = hierarchy.leaf(instance).unwrap();
        service.set_result(hierarchy[leaf].query(), false);
    }

    let stats = culler.render_frame(&mut hierarchy, &camera, &mut service);

    let mut drawn = last_drawn(&service);
    drawn.sort_unstable();
    assert_eq!(drawn, vec![0, 1]);
    assert_eq!(stats.instances_drawn, 2);
    assert_eq!(culler.scheduler().config().batch_size, 4);
}
