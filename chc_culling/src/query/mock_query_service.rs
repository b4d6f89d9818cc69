/// Mock QueryService for unit tests (no GPU required)
///
/// Records every command in order and answers queries from a script:
/// per-handle results, falling back to a default. A handle becomes
/// available after `poll_latency` unsuccessful polls.

use rustc_hash::FxHashMap;
use crate::hierarchy::AxisAlignedBox;
use super::query_service::{QueryHandle, QueryService};

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryCommand {
    DrawProxy(AxisAlignedBox),
    BeginQuery(QueryHandle),
    EndQuery(QueryHandle),
    ReadResult(QueryHandle),
    Flush,
    OcclusionTestMode(bool),
    DrawVisibleSet(Vec<u32>),
    SyncCompletion,
}

// ============================================================================
// Mock QueryService
// ============================================================================

#[derive(Debug, Default)]
pub struct MockQueryService {
    pub commands: Vec<QueryCommand>,
    /// Scripted results; handles not listed use `default_result`
    pub results: FxHashMap<QueryHandle, bool>,
    pub default_result: bool,
    /// Polls that answer "not ready" before a query becomes available
    pub poll_latency: u32,
    /// Remaining "not ready" polls per issued query
    pending: FxHashMap<QueryHandle, u32>,
    occlusion_test_mode: bool,
}

impl MockQueryService {
    /// Every query passes, results are available immediately.
    pub fn new() -> Self {
        Self {
            default_result: true,
            ..Self::default()
        }
    }

    pub fn with_default_result(mut self, passed: bool) -> Self {
        self.default_result = passed;
        self
    }

    pub fn with_poll_latency(mut self, polls: u32) -> Self {
        self.poll_latency = polls;
        self
    }

    pub fn set_result(&mut self, handle: QueryHandle, passed: bool) {
        self.results.insert(handle, passed);
    }

    pub fn occlusion_test_mode(&self) -> bool {
        self.occlusion_test_mode
    }

    /// Handles passed to `end_query`, in issue order.
    pub fn issued_queries(&self) -> Vec<QueryHandle> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                QueryCommand::EndQuery(h) => Some(*h),
                _ => None,
            })
            .collect()
    }

    /// Instance lists passed to `draw_visible_set`, one per call.
    pub fn drawn_sets(&self) -> Vec<Vec<u32>> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                QueryCommand::DrawVisibleSet(set) => Some(set.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn flush_count(&self) -> usize {
        self.commands.iter().filter(|c| **c == QueryCommand::Flush).count()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    fn result_of(&self, handle: QueryHandle) -> bool {
        self.results.get(&handle).copied().unwrap_or(self.default_result)
    }
}

impl QueryService for MockQueryService {
    fn draw_proxy(&mut self, bounds: &AxisAlignedBox) {
        self.commands.push(QueryCommand::DrawProxy(*bounds));
    }

    fn begin_query(&mut self, handle: QueryHandle) {
        self.commands.push(QueryCommand::BeginQuery(handle));
    }

    fn end_query(&mut self, handle: QueryHandle) {
        self.pending.insert(handle, self.poll_latency);
        self.commands.push(QueryCommand::EndQuery(handle));
    }

    fn poll_query(&mut self, handle: QueryHandle) -> bool {
        match self.pending.get_mut(&handle) {
            Some(0) | None => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
        }
    }

    fn read_query_result(&mut self, handle: QueryHandle) -> bool {
        self.pending.remove(&handle);
        self.commands.push(QueryCommand::ReadResult(handle));
        self.result_of(handle)
    }

    fn flush_commands(&mut self) {
        self.commands.push(QueryCommand::Flush);
    }

    fn set_occlusion_test_mode(&mut self, enabled: bool) {
        self.occlusion_test_mode = enabled;
        self.commands.push(QueryCommand::OcclusionTestMode(enabled));
    }

    fn draw_visible_set(&mut self, instances: &[u32]) {
        self.commands.push(QueryCommand::DrawVisibleSet(instances.to_vec()));
    }

    fn sync_completion(&mut self) {
        self.commands.push(QueryCommand::SyncCompletion);
    }
}
