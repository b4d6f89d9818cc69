/// Instance culling strategies.
///
/// An InstanceCuller decides which instances of a hierarchy are drawn
/// from a given camera and submits them through a `QueryService`.
/// Implementations range from brute force (draw everything) to CHC++.

use std::fmt;
use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::hierarchy::Hierarchy;
use crate::query::{QueryHandle, QueryPool, QueryService};
use super::frame_stats::FrameStats;
use super::scheduler::{SchedulerConfig, VisibilityScheduler};

const SOURCE: &str = "chc::InstanceCuller";

/// Available culling strategies, numbered as on the demo command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullingMode {
    /// Draw every instance
    Unoptimized = 0,
    /// Per-instance frustum test
    Frustum = 1,
    /// Per-instance occlusion queries, read one frame late
    Occlusion = 2,
    /// Hierarchical coherent culling
    Chc = 3,
}

impl CullingMode {
    pub const ALL: [CullingMode; 4] = [
        CullingMode::Unoptimized,
        CullingMode::Frustum,
        CullingMode::Occlusion,
        CullingMode::Chc,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CullingMode::Unoptimized => "unoptimized",
            CullingMode::Frustum => "frustum",
            CullingMode::Occlusion => "occlusion",
            CullingMode::Chc => "chc",
        }
    }
}

impl TryFrom<u32> for CullingMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        CullingMode::ALL
            .into_iter()
            .find(|mode| *mode as u32 == value)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown culling mode {} (expected 0..=3)", value)))
    }
}

impl fmt::Display for CullingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), *self as u32)
    }
}

/// Strategy for culling and drawing one frame.
///
/// Called once per frame. `&mut self` lets strategies keep state across
/// frames (query buffers, scheduler queues).
pub trait InstanceCuller {
    fn mode(&self) -> CullingMode;

    /// Cull the instances of `hierarchy` against `camera`, draw the
    /// survivors through `service`, and wait for the frame to complete.
    fn render_frame(
        &mut self,
        hierarchy: &mut Hierarchy,
        camera: &Camera,
        service: &mut dyn QueryService,
    ) -> FrameStats;
}

/// Create the culler for `mode`.
///
/// Query handles are drawn from `pool`, which must be the pool the
/// hierarchy was built with.
pub fn create_culler(
    mode: CullingMode,
    hierarchy: &Hierarchy,
    pool: &mut QueryPool,
    config: &SchedulerConfig,
) -> Result<Box<dyn InstanceCuller>> {
    crate::chc_info!(SOURCE, "Using culling mode {}", mode);
    Ok(match mode {
        CullingMode::Unoptimized => Box::new(BruteForceCuller::new()),
        CullingMode::Frustum => Box::new(FrustumCuller::new()),
        CullingMode::Occlusion => Box::new(OcclusionCuller::new(hierarchy.instance_count(), pool)),
        CullingMode::Chc => Box::new(ChcCuller::new(*config)?),
    })
}

/// Draw `instances` with full writes and finish the frame.
fn submit(service: &mut dyn QueryService, instances: &[u32], stats: &mut FrameStats) {
    service.set_occlusion_test_mode(false);
    service.draw_visible_set(instances);
    service.sync_completion();
    stats.instances_drawn = instances.len() as u32;
}

// ============================================================================
// BruteForceCuller
// ============================================================================

/// Brute-force culler: draws ALL instances (no actual culling).
///
/// Baseline for comparison.
#[derive(Debug, Default)]
pub struct BruteForceCuller;

impl BruteForceCuller {
    pub fn new() -> Self {
        Self
    }
}

impl InstanceCuller for BruteForceCuller {
    fn mode(&self) -> CullingMode {
        CullingMode::Unoptimized
    }

    fn render_frame(&mut self, hierarchy: &mut Hierarchy, _camera: &Camera, service: &mut dyn QueryService) -> FrameStats {
        let mut stats = FrameStats::default();
        let all: Vec<u32> = (0..hierarchy.instance_count() as u32).collect();
        submit(service, &all, &mut stats);
        stats
    }
}

// ============================================================================
// FrustumCuller
// ============================================================================

/// Frustum culler: tests every instance box against the camera frustum.
#[derive(Debug, Default)]
pub struct FrustumCuller {
    visible: Vec<u32>,
}

impl FrustumCuller {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstanceCuller for FrustumCuller {
    fn mode(&self) -> CullingMode {
        CullingMode::Frustum
    }

    fn render_frame(&mut self, hierarchy: &mut Hierarchy, camera: &Camera, service: &mut dyn QueryService) -> FrameStats {
        let mut stats = FrameStats::default();
        let frustum = camera.frustum();

        self.visible.clear();
        for instance in 0..hierarchy.instance_count() as u32 {
            match hierarchy.instance_bounds(instance) {
                Some(bounds) if frustum.intersects_box(&bounds) => self.visible.push(instance),
                _ => stats.frustum_culled += 1,
            }
        }

        submit(service, &self.visible, &mut stats);
        stats
    }
}

// ============================================================================
// OcclusionCuller
// ============================================================================

/// Per-instance occlusion culler with double-buffered queries.
///
/// Every frame issues one query per instance into the current buffer, then
/// reads the other buffer, filled the frame before, to decide what to draw.
/// Results are therefore one frame late but never waited on. Instances
/// whose previous query was never issued (the first frame) are drawn.
pub struct OcclusionCuller {
    handles: [Vec<QueryHandle>; 2],
    issued: [Vec<bool>; 2],
    current: usize,
    visible: Vec<u32>,
}

impl OcclusionCuller {
    pub fn new(instance_count: usize, pool: &mut QueryPool) -> Self {
        Self {
            handles: [pool.alloc_many(instance_count), pool.alloc_many(instance_count)],
            issued: [vec![false; instance_count], vec![false; instance_count]],
            current: 0,
            visible: Vec::with_capacity(instance_count),
        }
    }

    /// Give both query buffers back to `pool`.
    pub fn release_queries(self, pool: &mut QueryPool) {
        for handle in self.handles.into_iter().flatten() {
            pool.free(handle);
        }
    }
}

impl InstanceCuller for OcclusionCuller {
    fn mode(&self) -> CullingMode {
        CullingMode::Occlusion
    }

    fn render_frame(&mut self, hierarchy: &mut Hierarchy, _camera: &Camera, service: &mut dyn QueryService) -> FrameStats {
        let mut stats = FrameStats::default();
        let current = self.current;
        let previous = 1 - current;
        let count = self.handles[current].len().min(hierarchy.instance_count());

        service.set_occlusion_test_mode(true);
        for instance in 0..count {
            let Some(bounds) = hierarchy.instance_bounds(instance as u32) else { continue };
            let handle = self.handles[current][instance];
            service.begin_query(handle);
            service.draw_proxy(&bounds);
            service.end_query(handle);
            self.issued[current][instance] = true;
            stats.queries_issued += 1;
        }
        service.flush_commands();
        stats.batch_flushes += 1;

        self.visible.clear();
        for instance in 0..count {
            if !self.issued[previous][instance] {
                self.visible.push(instance as u32);
            } else if service.read_query_result(self.handles[previous][instance]) {
                stats.queries_passed += 1;
                self.visible.push(instance as u32);
            } else {
                stats.queries_occluded += 1;
            }
        }
        self.current = previous;

        submit(service, &self.visible, &mut stats);
        stats
    }
}

// ============================================================================
// ChcCuller
// ============================================================================

/// Hierarchical culler driven by a `VisibilityScheduler`.
pub struct ChcCuller {
    scheduler: VisibilityScheduler,
}

impl ChcCuller {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        Ok(Self { scheduler: VisibilityScheduler::new(config)? })
    }

    pub fn scheduler(&self) -> &VisibilityScheduler {
        &self.scheduler
    }
}

impl InstanceCuller for ChcCuller {
    fn mode(&self) -> CullingMode {
        CullingMode::Chc
    }

    fn render_frame(&mut self, hierarchy: &mut Hierarchy, camera: &Camera, service: &mut dyn QueryService) -> FrameStats {
        self.scheduler.run_frame(
            hierarchy,
            service,
            camera.position(),
            &camera.view_projection_matrix(),
        )
    }
}

#[cfg(test)]
#[path = "culler_tests.rs"]
mod tests;
