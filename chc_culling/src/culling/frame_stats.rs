use std::fmt;
use std::ops::AddAssign;

/// Work done by one culling frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes popped from the distance queue
    pub nodes_traversed: u32,
    /// Nodes or instances rejected by the frustum test
    pub frustum_culled: u32,
    /// Occlusion queries issued (including individual fallbacks)
    pub queries_issued: u32,
    /// Leaf queries issued after an aggregate query unexpectedly passed
    pub individual_queries: u32,
    pub queries_passed: u32,
    pub queries_occluded: u32,
    /// Submissions of batched queries
    pub batch_flushes: u32,
    pub instances_drawn: u32,
}

impl AddAssign for FrameStats {
    fn add_assign(&mut self, other: FrameStats) {
        self.nodes_traversed = self.nodes_traversed.saturating_add(other.nodes_traversed);
        self.frustum_culled = self.frustum_culled.saturating_add(other.frustum_culled);
        self.queries_issued = self.queries_issued.saturating_add(other.queries_issued);
        self.individual_queries = self.individual_queries.saturating_add(other.individual_queries);
        self.queries_passed = self.queries_passed.saturating_add(other.queries_passed);
        self.queries_occluded = self.queries_occluded.saturating_add(other.queries_occluded);
        self.batch_flushes = self.batch_flushes.saturating_add(other.batch_flushes);
        self.instances_drawn = self.instances_drawn.saturating_add(other.instances_drawn);
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "drawn {} | queries {} ({} passed, {} occluded, {} individual) | flushes {} | traversed {} | frustum culled {}",
            self.instances_drawn,
            self.queries_issued,
            self.queries_passed,
            self.queries_occluded,
            self.individual_queries,
            self.batch_flushes,
            self.nodes_traversed,
            self.frustum_culled,
        )
    }
}

#[cfg(test)]
#[path = "frame_stats_tests.rs"]
mod tests;
