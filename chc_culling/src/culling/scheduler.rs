/// VisibilityScheduler: CHC++ traversal of a `Hierarchy`.
///
/// Each frame walks the hierarchy front to back, reusing last frame's
/// visibility so that most nodes never wait for a query result:
///
/// - visible-last-frame leaves are drawn at once and re-verified with a
///   query whose result only updates the flags for the next frame;
/// - not-visible-last-frame nodes are batched and queried, and traversal
///   continues with other nodes while their results are outstanding;
/// - a query that passes on a leaf draws it and pulls visibility up the tree;
///   one that passes on an interior node falls back to one query per leaf.
///
/// The scheduler never reads a result before `poll_query` reports it
/// available. Pending verification queries are issued while waiting, which
/// hides query latency.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use glam::{Mat4, Vec3};
use crate::camera::Frustum;
use crate::error::{Error, Result};
use crate::hierarchy::{Hierarchy, NodeKey};
use crate::query::QueryService;
use super::frame_stats::FrameStats;

const SOURCE: &str = "chc::VisibilityScheduler";

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Not-visible-last-frame nodes collected before their queries are issued
    pub batch_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { batch_size: 4 }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            crate::chc_error!(SOURCE, "query batch size must be at least 1");
            return Err(Error::InvalidConfig("query batch size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Distance queue entry, ordered nearest first then by insertion.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    distance: f32,
    sequence: u64,
    node: NodeKey,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        other.distance
            .total_cmp(&self.distance)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

/// Per-frame CHC++ state. Empty between frames; only the hierarchy's
/// visibility flags carry over.
pub struct VisibilityScheduler {
    config: SchedulerConfig,
    distance_queue: BinaryHeap<QueueEntry>,
    sequence: u64,
    /// Nodes with an issued query, oldest first
    query_queue: VecDeque<NodeKey>,
    /// Visible-last-frame leaves awaiting their confirmation query
    pending_verify: VecDeque<NodeKey>,
    /// Not-visible-last-frame nodes, at most `batch_size`
    pending_invisible: Vec<NodeKey>,
    render_set: Vec<u32>,
    camera_position: Vec3,
    frustum: Frustum,
    stats: FrameStats,
}

impl VisibilityScheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pending_invisible: Vec::with_capacity(config.batch_size),
            ..Self::default()
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Cull and draw one frame.
    ///
    /// Updates the visibility flags of `hierarchy` for the next frame and
    /// hands the accepted instances to `service.draw_visible_set`.
    pub fn run_frame(
        &mut self,
        hierarchy: &mut Hierarchy,
        service: &mut dyn QueryService,
        camera_position: Vec3,
        view_projection: &Mat4,
    ) -> FrameStats {
        self.begin_frame(camera_position, view_projection);

        self.push_node(hierarchy, hierarchy.root());
        service.set_occlusion_test_mode(true);

        loop {
            while !self.distance_queue.is_empty() || !self.query_queue.is_empty() {
                self.drain_query_queue(hierarchy, service);

                if let Some(entry) = self.distance_queue.pop() {
                    self.visit_node(hierarchy, service, entry.node);

                    if self.distance_queue.is_empty() {
                        self.flush_pending_invisible(hierarchy, service);
                    }
                }
            }

            if self.pending_verify.is_empty() {
                break;
            }
            while let Some(node) = self.pending_verify.pop_front() {
                self.issue_query(hierarchy, service, node);
            }
        }

        debug_assert!(self.pending_invisible.is_empty());

        service.set_occlusion_test_mode(false);
        self.stats.instances_drawn = self.render_set.len() as u32;
        service.draw_visible_set(&self.render_set);
        self.render_set.clear();
        service.sync_completion();

        crate::chc_trace!(SOURCE, "Frame done: {}", self.stats);
        self.stats
    }

    fn begin_frame(&mut self, camera_position: Vec3, view_projection: &Mat4) {
        self.distance_queue.clear();
        self.sequence = 0;
        self.query_queue.clear();
        self.pending_verify.clear();
        self.pending_invisible.clear();
        self.render_set.clear();
        self.camera_position = camera_position;
        self.frustum = Frustum::from_view_projection(view_projection);
        self.stats = FrameStats::default();
    }

    fn push_node(&mut self, hierarchy: &Hierarchy, node: NodeKey) {
        let distance = hierarchy[node].bounds().squared_distance_to(self.camera_position);
        self.distance_queue.push(QueueEntry { distance, sequence: self.sequence, node });
        self.sequence += 1;
    }

    /// Handle a node popped from the distance queue.
    fn visit_node(&mut self, hierarchy: &mut Hierarchy, service: &mut dyn QueryService, node: NodeKey) {
        self.stats.nodes_traversed += 1;

        if !self.frustum.intersects_box(hierarchy[node].bounds()) {
            hierarchy.set_visible(node, false);
            self.stats.frustum_culled += 1;
            return;
        }

        if !hierarchy.is_visible(node) {
            self.pending_invisible.push(node);
            if self.pending_invisible.len() >= self.config.batch_size {
                self.flush_pending_invisible(hierarchy, service);
            }
            return;
        }

        if hierarchy.is_leaf(node) {
            self.pending_verify.push_back(node);
        }
        self.traverse_node(hierarchy, node);
    }

    /// Handle every finished query at the front of the query queue, issuing
    /// verification queries while the front is still in flight.
    ///
    /// A result is only read after `poll_query` reported it available. With
    /// nothing else to do, `run_frame` comes back here and polls again.
    fn drain_query_queue(&mut self, hierarchy: &mut Hierarchy, service: &mut dyn QueryService) {
        while let Some(&front) = self.query_queue.front() {
            if service.poll_query(hierarchy[front].query()) {
                self.query_queue.pop_front();
                self.handle_returned_query(hierarchy, service, front);
            } else if let Some(node) = self.pending_verify.pop_front() {
                self.issue_query(hierarchy, service, node);
            } else {
                break;
            }
        }
    }

    fn handle_returned_query(&mut self, hierarchy: &mut Hierarchy, service: &mut dyn QueryService, node: NodeKey) {
        if !service.read_query_result(hierarchy[node].query()) {
            self.stats.queries_occluded += 1;
            hierarchy.set_visible(node, false);
            return;
        }

        self.stats.queries_passed += 1;
        if hierarchy.is_leaf(node) {
            if !hierarchy.is_visible(node) {
                self.traverse_node(hierarchy, node);
            }
            hierarchy.pull_up_visibility(node);
        } else {
            self.query_individual_nodes(hierarchy, service, node);
        }
    }

    /// Leaf: draw it. Interior: schedule both children and revoke the node's
    /// visibility until a descendant proves it visible again.
    fn traverse_node(&mut self, hierarchy: &mut Hierarchy, node: NodeKey) {
        match hierarchy.children(node) {
            Some([first, second]) => {
                self.push_node(hierarchy, first);
                self.push_node(hierarchy, second);
                hierarchy.set_visible(node, false);
            }
            None => {
                if let Some(instance) = hierarchy[node].instance() {
                    self.render_set.push(instance);
                }
            }
        }
    }

    /// Fallback after an aggregate query passed: query every leaf below
    /// `node` on its own.
    fn query_individual_nodes(&mut self, hierarchy: &mut Hierarchy, service: &mut dyn QueryService, node: NodeKey) {
        for leaf in hierarchy.descendant_leaves(node) {
            // Flags under a not-visible node are stale; the result decides
            hierarchy.set_visible(leaf, false);
            self.issue_query(hierarchy, service, leaf);
            self.stats.individual_queries += 1;
        }
    }

    fn issue_query(&mut self, hierarchy: &Hierarchy, service: &mut dyn QueryService, node: NodeKey) {
        let query = hierarchy[node].query();
        service.begin_query(query);
        service.draw_proxy(hierarchy[node].bounds());
        service.end_query(query);
        self.query_queue.push_back(node);
        self.stats.queries_issued += 1;
    }

    fn flush_pending_invisible(&mut self, hierarchy: &Hierarchy, service: &mut dyn QueryService) {
        if self.pending_invisible.is_empty() {
            return;
        }
        let mut batch = std::mem::take(&mut self.pending_invisible);
        for &node in &batch {
            self.issue_query(hierarchy, service, node);
        }
        batch.clear();
        self.pending_invisible = batch;

        service.flush_commands();
        self.stats.batch_flushes += 1;
    }
}

impl Default for VisibilityScheduler {
    fn default() -> Self {
        let config = SchedulerConfig::default();
        Self {
            config,
            distance_queue: BinaryHeap::new(),
            sequence: 0,
            query_queue: VecDeque::new(),
            pending_verify: VecDeque::new(),
            pending_invisible: Vec::with_capacity(config.batch_size),
            render_set: Vec::new(),
            camera_position: Vec3::ZERO,
            frustum: Frustum::from_view_projection(&Mat4::IDENTITY),
            stats: FrameStats::default(),
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
