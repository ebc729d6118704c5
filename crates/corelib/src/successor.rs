//! Successor list: cached next-`r` successors for failure resilience.

use crate::node::NodeHandle;

/// Ordered list of up to `r` successors. `entries[0]` is the immediate
/// successor and must never be absent for a node that believes itself part
/// of a ring; trailing entries may be absent if the ring is smaller than
/// `r`.
#[derive(Debug)]
pub struct SuccessorList {
    capacity: usize,
    entries: Vec<Option<NodeHandle>>,
}

impl SuccessorList {
    pub fn new(capacity: usize, first: NodeHandle) -> Self {
        let capacity = capacity.max(1);
        let mut entries = vec![None; capacity];
        entries[0] = Some(first);
        Self { capacity, entries }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn first(&self) -> Option<NodeHandle> {
        self.entries[0].clone()
    }

    pub fn set_first(&mut self, handle: NodeHandle) {
        self.entries[0] = Some(handle);
    }

    pub fn as_slice(&self) -> &[Option<NodeHandle>] {
        &self.entries
    }

    /// Replaces the whole list. Truncates or pads with `None` to capacity.
    pub fn replace_all(&mut self, mut new_entries: Vec<Option<NodeHandle>>) {
        new_entries.truncate(self.capacity);
        new_entries.resize(self.capacity, None);
        self.entries = new_entries;
    }

    /// Drops the first entry (believed dead) and shifts the rest up,
    /// returning the new first successor if any entry survives. Used by
    /// `stabilize`'s serial failover.
    pub fn advance(&mut self) -> Option<NodeHandle> {
        self.entries.remove(0);
        self.entries.push(None);
        self.first()
    }

    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}
