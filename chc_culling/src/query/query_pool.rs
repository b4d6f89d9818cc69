/// QueryPool: occlusion query ids shared by every user of one `QueryService`.
///
/// Hierarchy nodes take one handle each at build time, per-instance cullers
/// take two buffers of them. Released ids are handed out again lowest
/// first, so ids stay dense after a hierarchy is rebuilt.

use std::collections::BTreeSet;
use super::query_service::QueryHandle;

const SOURCE: &str = "chc::QueryPool";

#[derive(Debug, Default)]
pub struct QueryPool {
    /// Released ids waiting for reuse
    recycled: BTreeSet<u32>,
    /// One past the highest id ever handed out
    high_water_mark: u32,
    /// Handles currently held by callers
    live: u32,
}

impl QueryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a handle, reusing the lowest released id if there is one.
    pub fn alloc(&mut self) -> QueryHandle {
        let id = match self.recycled.pop_first() {
            Some(id) => id,
            None => {
                let id = self.high_water_mark;
                self.high_water_mark += 1;
                id
            }
        };
        self.live += 1;
        QueryHandle::new(id)
    }

    /// Take `count` handles. On a pool without released ids they are
    /// contiguous.
    pub fn alloc_many(&mut self, count: usize) -> Vec<QueryHandle> {
        let mut handles = Vec::with_capacity(count);
        handles.extend((0..count).map(|_| self.alloc()));
        handles
    }

    /// Give `handle` back. Returns false, and changes nothing, for a handle
    /// this pool never issued or one already released.
    pub fn free(&mut self, handle: QueryHandle) -> bool {
        let id = handle.id();
        if id >= self.high_water_mark || !self.recycled.insert(id) {
            crate::chc_warn!(SOURCE, "ignoring release of {} which is not live", handle);
            return false;
        }
        self.live -= 1;
        true
    }

    pub fn high_water_mark(&self) -> u32 {
        self.high_water_mark
    }

    /// Handles currently held by callers
    pub fn len(&self) -> u32 {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
#[path = "query_pool_tests.rs"]
mod tests;
