//! Document placement: the payload that gets routed onto the ring.

use crate::ident::{self, Key};
use crate::node::NodeHandle;
use std::collections::HashMap;

/// An immutable document keyed by the hash of its filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub key: Key,
    pub data: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let key = ident::hash(filename.as_bytes());
        Self { filename, key, data }
    }
}

/// Per-node document map, keyed by filename. Insertion order is irrelevant.
///
/// Repeated inserts with the same filename overwrite the existing entry, a
/// single entry per filename, which makes idempotent insert a testable
/// property rather than an accident of storage order.
#[derive(Default, Debug)]
pub struct DocumentStore {
    by_filename: HashMap<String, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, doc: Document) {
        self.by_filename.insert(doc.filename.clone(), doc);
    }

    pub fn get(&self, filename: &str) -> Option<&Document> {
        self.by_filename.get(filename)
    }

    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.by_filename.values()
    }

    pub fn drain_all(&mut self) -> Vec<Document> {
        self.by_filename.drain().map(|(_, d)| d).collect()
    }

    /// Removes and returns every document whose key falls in `(lo, hi]` on
    /// the ring (wraparound-aware via [`crate::ident::in_interval`]). Used
    /// by `notify`'s lazy migration hand-off to a new predecessor.
    pub fn drain_in_range(&mut self, lo: Key, hi: Key) -> Vec<Document> {
        let matching: Vec<String> = self
            .by_filename
            .values()
            .filter(|d| ident::in_interval(d.key, lo, hi, true))
            .map(|d| d.filename.clone())
            .collect();
        matching
            .into_iter()
            .filter_map(|f| self.by_filename.remove(&f))
            .collect()
    }
}

/// Result of `document_query`: found/not-found, the node it was resolved
/// against, and the lookup path taken. The path is reported for diagnostic
/// output, not used by routing itself.
#[derive(Clone, Debug)]
pub struct DocumentQueryResult {
    pub found: Option<Document>,
    pub resolved_at: NodeHandle,
    pub path: Vec<NodeHandle>,
}
