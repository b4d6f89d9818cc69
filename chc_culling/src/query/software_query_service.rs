/// SoftwareQueryService: headless `QueryService` backed by a CPU depth buffer.
///
/// Boxes are rasterized as 12 triangles into a coarse depth buffer.
/// Queries test against the depth of the last completed frame (the front
/// buffer); draws with depth writes enabled go to the frame in progress (the
/// back buffer). `sync_completion` swaps the two, so a frame's visible set
/// becomes the occluder set of the next frame.
///
/// Results become available after `poll_latency` unsuccessful polls, which
/// lets the scheduler's latency hiding be exercised without a GPU.

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3};
use rustc_hash::FxHashMap;
use crate::camera::frustum_intersects;
use crate::error::{Error, Result};
use crate::hierarchy::{AxisAlignedBox, Hierarchy};
use super::query_service::{QueryHandle, QueryService};

const SOURCE: &str = "chc::SoftwareQueryService";

/// Largest accepted depth buffer extent
pub const MAX_DIMENSION: u32 = 4096;

/// Clip-space `w` below which a corner counts as behind the eye
const NEAR_W_EPSILON: f32 = 1e-5;

/// Corner indices of each box face (corner bits: X = 1, Y = 2, Z = 4)
const BOX_FACES: [[usize; 4]; 6] = [
    [0, 2, 6, 4],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 1, 3, 2],
    [4, 5, 7, 6],
];

bitflags! {
    /// Buffers written by draws.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WriteMask: u8 {
        const COLOR = 0b0000_0001;
        const DEPTH = 0b0000_0010;
    }
}

impl Default for WriteMask {
    fn default() -> Self {
        Self::COLOR | Self::DEPTH
    }
}

/// Software service configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareServiceConfig {
    /// Depth buffer width in samples
    pub width: u32,
    /// Depth buffer height in samples
    pub height: u32,
    /// Polls answering "not ready" before a result is available
    pub poll_latency: u32,
}

impl Default for SoftwareServiceConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 120,
            poll_latency: 1,
        }
    }
}

impl SoftwareServiceConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 || value > MAX_DIMENSION {
                crate::chc_error!(SOURCE, "depth buffer {} {} outside 1..={}", name, value, MAX_DIMENSION);
                return Err(Error::InvalidConfig(format!(
                    "depth buffer {} must be in 1..={}, got {}",
                    name, MAX_DIMENSION, value
                )));
            }
        }
        Ok(())
    }
}

/// Counters since creation or the last `reset_stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftwareServiceStats {
    pub proxies_drawn: u64,
    pub queries_issued: u64,
    pub polls: u64,
    pub flushes: u64,
    pub instances_drawn: u64,
    pub frames: u64,
}

#[derive(Debug, Clone, Copy)]
struct QueryState {
    passed: bool,
    remaining_polls: u32,
}

/// Where a box lands relative to the eye.
enum Projection {
    /// Every corner behind the eye
    Behind,
    /// Some corners behind the eye; not rasterized
    CrossesNear,
    /// Screen-space corners: x, y in samples, z in NDC depth
    Screen([Vec3; 8]),
}

pub struct SoftwareQueryService {
    config: SoftwareServiceConfig,
    instance_bounds: Vec<AxisAlignedBox>,
    view_projection: Mat4,
    /// Depth of the last completed frame, tested by queries
    front_depth: Vec<f32>,
    /// Depth of the frame in progress, written by draws
    back_depth: Vec<f32>,
    write_mask: WriteMask,
    queries: FxHashMap<QueryHandle, QueryState>,
    open_query: Option<QueryHandle>,
    open_query_passed: bool,
    stats: SoftwareServiceStats,
}

impl SoftwareQueryService {
    /// Create a service drawing `instance_bounds[i]` for instance `i`.
    pub fn new(config: SoftwareServiceConfig, instance_bounds: Vec<AxisAlignedBox>) -> Result<Self> {
        config.validate()?;
        let samples = config.width as usize * config.height as usize;

        crate::chc_debug!(SOURCE, "Created {}x{} depth buffer for {} instances",
            config.width, config.height, instance_bounds.len());

        Ok(Self {
            config,
            instance_bounds,
            view_projection: Mat4::IDENTITY,
            front_depth: vec![1.0; samples],
            back_depth: vec![1.0; samples],
            write_mask: WriteMask::default(),
            queries: FxHashMap::default(),
            open_query: None,
            open_query_passed: false,
            stats: SoftwareServiceStats::default(),
        })
    }

    /// Create a service drawing the leaf boxes of `hierarchy`.
    pub fn from_hierarchy(config: SoftwareServiceConfig, hierarchy: &Hierarchy) -> Result<Self> {
        let bounds = (0..hierarchy.instance_count() as u32)
            .filter_map(|instance| hierarchy.instance_bounds(instance))
            .collect();
        Self::new(config, bounds)
    }

    // ===== GETTERS =====

    pub fn config(&self) -> &SoftwareServiceConfig {
        &self.config
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn write_mask(&self) -> WriteMask {
        self.write_mask
    }

    pub fn stats(&self) -> &SoftwareServiceStats {
        &self.stats
    }

    /// Depth of the last completed frame at sample `(x, y)`.
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.config.width || y >= self.config.height {
            return None;
        }
        self.front_depth.get((y * self.config.width + x) as usize).copied()
    }

    // ===== SETTERS =====

    /// Set the camera used for every subsequent draw.
    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = view_projection;
    }

    /// Reset both depth buffers to the far plane.
    pub fn clear_depth(&mut self) {
        self.front_depth.fill(1.0);
        self.back_depth.fill(1.0);
    }

    pub fn reset_stats(&mut self) {
        self.stats = SoftwareServiceStats::default();
    }

    // ===== RASTERIZATION =====

    fn project_box(&self, bounds: &AxisAlignedBox) -> Projection {
        let size = Vec2::new(self.config.width as f32, self.config.height as f32);
        let mut screen = [Vec3::ZERO; 8];
        let mut behind = 0;

        for (corner, out) in bounds.corners().iter().zip(screen.iter_mut()) {
            let clip = self.view_projection * corner.extend(1.0);
            if clip.w <= NEAR_W_EPSILON {
                behind += 1;
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            *out = Vec3::new(
                (ndc.x * 0.5 + 0.5) * size.x,
                (ndc.y * 0.5 + 0.5) * size.y,
                ndc.z,
            );
        }

        match behind {
            0 => Projection::Screen(screen),
            8 => Projection::Behind,
            _ => Projection::CrossesNear,
        }
    }

    /// Rasterize `bounds`; returns true if any sample passed the depth test
    /// against the front buffer.
    ///
    /// Boxes rejected by the frustum test produce no samples, matching the
    /// culling code's view of the scene. Boxes crossing the near plane, or
    /// too small to cover a sample while overlapping the viewport, count as
    /// passing.
    fn rasterize(&mut self, bounds: &AxisAlignedBox) -> bool {
        if !frustum_intersects(bounds.min, bounds.max, &self.view_projection) {
            return false;
        }
        let corners = match self.project_box(bounds) {
            Projection::Behind => return false,
            Projection::CrossesNear => return true,
            Projection::Screen(corners) => corners,
        };

        let (width, height) = (self.config.width, self.config.height);
        let write_depth = self.write_mask.contains(WriteMask::DEPTH);
        let front = &self.front_depth;
        let back = &mut self.back_depth;
        let mut covered = false;
        let mut passed = false;

        for face in BOX_FACES {
            let [a, b, c, d] = face.map(|i| corners[i]);
            for (p0, p1, p2) in [(a, b, c), (a, c, d)] {
                rasterize_triangle(p0, p1, p2, width, height, &mut |sample: usize, z: f32| {
                    covered = true;
                    if z <= front[sample] {
                        passed = true;
                    }
                    if write_depth && z < back[sample] {
                        back[sample] = z;
                    }
                });
            }
        }

        passed || (!covered && overlaps_viewport(&corners, width, height))
    }
}

/// Twice the signed area of `(a, b, p)` in screen space.
fn edge(a: Vec3, b: Vec3, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Visit every sample centre covered by the triangle, with its interpolated depth.
/// Fragments outside the `[0, 1]` depth range are clipped.
fn rasterize_triangle(
    a: Vec3,
    b: Vec3,
    c: Vec3,
    width: u32,
    height: u32,
    visit: &mut impl FnMut(usize, f32),
) {
    let area = edge(a, b, Vec2::new(c.x, c.y));
    if area.abs() <= f32::EPSILON {
        return;
    }

    // Negative floats saturate to 0 in the casts
    let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
    let max_x = a.x.max(b.x).max(c.x).ceil().min(width as f32) as u32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
    let max_y = a.y.max(b.y).max(c.y).ceil().min(height as f32) as u32;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b, c, p);
            let w1 = edge(c, a, p);
            let w2 = edge(a, b, p);
            let inside = if area > 0.0 {
                w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
            } else {
                w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
            };
            if !inside {
                continue;
            }
            let z = (w0 * a.z + w1 * b.z + w2 * c.z) / area;
            if (0.0..=1.0).contains(&z) {
                visit((y * width + x) as usize, z);
            }
        }
    }
}

fn overlaps_viewport(corners: &[Vec3; 8], width: u32, height: u32) -> bool {
    let min = corners.iter().fold(Vec3::splat(f32::INFINITY), |m, c| m.min(*c));
    let max = corners.iter().fold(Vec3::splat(f32::NEG_INFINITY), |m, c| m.max(*c));
    max.x >= 0.0 && min.x <= width as f32
        && max.y >= 0.0 && min.y <= height as f32
        && max.z >= 0.0 && min.z <= 1.0
}

impl QueryService for SoftwareQueryService {
    fn draw_proxy(&mut self, bounds: &AxisAlignedBox) {
        self.stats.proxies_drawn += 1;
        let passed = self.rasterize(bounds);
        if self.open_query.is_some() {
            self.open_query_passed |= passed;
        }
    }

    fn begin_query(&mut self, handle: QueryHandle) {
        if let Some(open) = self.open_query {
            crate::chc_warn!(SOURCE, "{} begun while {} is still open", handle, open);
        }
        self.open_query = Some(handle);
        self.open_query_passed = false;
    }

    fn end_query(&mut self, handle: QueryHandle) {
        if self.open_query != Some(handle) {
            crate::chc_warn!(SOURCE, "{} ended without a matching begin", handle);
        }
        self.queries.insert(handle, QueryState {
            passed: self.open_query_passed,
            remaining_polls: self.config.poll_latency,
        });
        self.open_query = None;
        self.open_query_passed = false;
        self.stats.queries_issued += 1;
    }

    fn poll_query(&mut self, handle: QueryHandle) -> bool {
        self.stats.polls += 1;
        match self.queries.get_mut(&handle) {
            Some(state) if state.remaining_polls > 0 => {
                state.remaining_polls -= 1;
                false
            }
            Some(_) => true,
            None => {
                crate::chc_warn!(SOURCE, "polled {} which was never issued", handle);
                true
            }
        }
    }

    fn read_query_result(&mut self, handle: QueryHandle) -> bool {
        match self.queries.get_mut(&handle) {
            Some(state) => {
                state.remaining_polls = 0;
                state.passed
            }
            None => {
                crate::chc_warn!(SOURCE, "read {} which was never issued, assuming visible", handle);
                true
            }
        }
    }

    fn flush_commands(&mut self) {
        self.stats.flushes += 1;
    }

    fn set_occlusion_test_mode(&mut self, enabled: bool) {
        self.write_mask = if enabled {
            WriteMask::empty()
        } else {
            WriteMask::COLOR | WriteMask::DEPTH
        };
    }

    fn draw_visible_set(&mut self, instances: &[u32]) {
        for &instance in instances {
            let Some(bounds) = self.instance_bounds.get(instance as usize).copied() else {
                crate::chc_warn!(SOURCE, "skipping unknown instance {}", instance);
                continue;
            };
            self.rasterize(&bounds);
            self.stats.instances_drawn += 1;
        }
    }

    fn sync_completion(&mut self) {
        std::mem::swap(&mut self.front_depth, &mut self.back_depth);
        self.back_depth.fill(1.0);
        for state in self.queries.values_mut() {
            state.remaining_polls = 0;
        }
        self.stats.frames += 1;
    }
}

#[cfg(test)]
#[path = "software_query_service_tests.rs"]
mod tests;
