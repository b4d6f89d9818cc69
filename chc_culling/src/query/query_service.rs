/// QueryService: the GPU-side collaborator of the visibility scheduler.
///
/// The scheduler never touches a graphics API directly. Every proxy draw,
/// occlusion query and final draw goes through this trait, implemented by
/// a backend (OpenGL, Vulkan, a software rasterizer, a test mock).
///
/// All calls are total: a backend reports its own failures and returns a
/// conservative answer (e.g. "samples passed") rather than an error.

use std::fmt;
use crate::hierarchy::AxisAlignedBox;

/// Opaque identifier of one occlusion query object.
///
/// Bound 1:1 to a hierarchy node (or a culled instance) for its lifetime,
/// so results can be matched with the node that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryHandle(u32);

impl QueryHandle {
    /// Wrap a backend query id.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Backend query id.
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query#{}", self.0)
    }
}

/// Draw and occlusion-query operations requested by the culling strategies.
pub trait QueryService {
    /// Draw the bounding-box proxy of a node or instance.
    ///
    /// Honors the current write mask: in occlusion-test mode nothing is written.
    fn draw_proxy(&mut self, bounds: &AxisAlignedBox);

    /// Open a query region bound to `handle`.
    fn begin_query(&mut self, handle: QueryHandle);

    /// Close the query region opened by `begin_query`.
    fn end_query(&mut self, handle: QueryHandle);

    /// Non-blocking: true once the result of `handle` is available.
    fn poll_query(&mut self, handle: QueryHandle) -> bool;

    /// True if any rasterized sample of the query passed the depth test.
    ///
    /// May block if the result is not available yet.
    fn read_query_result(&mut self, handle: QueryHandle) -> bool;

    /// Make previously submitted commands start executing.
    fn flush_commands(&mut self);

    /// Toggle color/depth writes off (`true`) for the query phase, or back on.
    fn set_occlusion_test_mode(&mut self, enabled: bool);

    /// Draw the accepted instances with full writes enabled.
    fn draw_visible_set(&mut self, instances: &[u32]);

    /// Block until all GPU work submitted for the frame has completed.
    fn sync_completion(&mut self);
}
