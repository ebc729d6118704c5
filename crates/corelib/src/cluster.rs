//! In-process [`NodeRpc`] provider: resolves a [`NodeHandle`] against the
//! ring directory and talks to the target's actor mailbox.
//!
//! This is the "in-process peer" half of the RPC abstraction's promise that
//! the lookup/maintenance engines run unchanged against local or networked
//! peers; a networked provider would implement the same two traits over a
//! real socket instead of an `mpsc` channel, but that provider is the
//! out-of-scope concrete transport.

use crate::actor::{ActorHandle, Command};
use crate::document::Document;
use crate::finger::Finger;
use crate::ident::Key;
use crate::node::{LifecycleState, NodeHandle, NodeId};
use crate::rpc::{LifecycleReport, NodeRpc, PingReply, RpcError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Process-wide (or test-scoped) map from node id to its actor mailbox.
/// Mutated only by the ring facade; readers take a snapshot via `get`.
#[derive(Default)]
pub struct Directory {
    entries: RwLock<HashMap<NodeId, ActorHandle>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: NodeId, handle: ActorHandle) {
        self.entries.write().insert(id, handle);
    }

    pub fn remove(&self, id: &NodeId) -> Option<ActorHandle> {
        self.entries.write().remove(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<ActorHandle> {
        self.entries.read().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// A read-only view of a node's state for diagnostics, fetched across the
/// actor mailbox rather than touching another node's memory.
#[derive(Clone, Debug)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub key: Key,
    pub predecessor: Option<NodeHandle>,
    pub successors: Vec<Option<NodeHandle>>,
    pub fingers: Vec<Finger>,
    pub lifecycle: LifecycleState,
    pub document_filenames: Vec<String>,
}

/// Extras the document layer, ring facade and lifecycle control need that
/// were never part of the fixed [`NodeRpc`] routing contract: document
/// hand-off, diagnostics, and direct splice-in during `leave`.
#[async_trait]
pub trait ClusterOps: NodeRpc {
    async fn push_documents(&self, target: NodeHandle, docs: Vec<Document>) -> Result<(), RpcError>;
    async fn fetch_document(
        &self,
        target: NodeHandle,
        filename: String,
    ) -> Result<Option<Document>, RpcError>;
    async fn force_set_successor(
        &self,
        target: NodeHandle,
        new_successor: NodeHandle,
    ) -> Result<(), RpcError>;
    async fn force_set_predecessor(
        &self,
        target: NodeHandle,
        new_predecessor: Option<NodeHandle>,
    ) -> Result<(), RpcError>;
    async fn snapshot(&self, target: NodeHandle) -> Result<NodeSnapshot, RpcError>;
    async fn mark_dead(&self, target: NodeHandle) -> Result<(), RpcError>;
}

/// The in-process [`NodeRpc`]/[`ClusterOps`] provider used by the ring
/// facade, the scheduler, and the test suite.
pub struct ClusterRpc {
    directory: Arc<Directory>,
    timeout: Duration,
}

impl ClusterRpc {
    pub fn new(directory: Arc<Directory>, timeout: Duration) -> Self {
        Self { directory, timeout }
    }

    async fn call<T: Send + 'static>(
        &self,
        target: &NodeHandle,
        make_cmd: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RpcError> {
        let actor = self.directory.get(&target.id).ok_or(RpcError::NotFound)?;
        let (tx, rx) = oneshot::channel();
        actor
            .send(make_cmd(tx))
            .await
            .map_err(|_| RpcError::NotFound)?;
        tokio::time::timeout(self.timeout, rx)
            .await
            .map_err(|_| RpcError::Timeout)?
            .map_err(|_| RpcError::NotFound)
    }
}

#[async_trait]
impl NodeRpc for ClusterRpc {
    async fn find_successor(&self, target: NodeHandle, key: Key) -> Result<NodeHandle, RpcError> {
        self.call(&target, |reply| Command::FindSuccessor { key, reply })
            .await?
    }

    async fn get_predecessor(&self, target: NodeHandle) -> Result<Option<NodeHandle>, RpcError> {
        self.call(&target, |reply| Command::GetPredecessor { reply })
            .await
    }

    async fn get_successor(&self, target: NodeHandle) -> Result<NodeHandle, RpcError> {
        self.call(&target, |reply| Command::GetSuccessor { reply })
            .await?
    }

    async fn notify(&self, target: NodeHandle, candidate: NodeHandle) -> Result<(), RpcError> {
        self.call(&target, |reply| Command::Notify { candidate, reply })
            .await
    }

    async fn closest_preceding(&self, target: NodeHandle, key: Key) -> Result<NodeHandle, RpcError> {
        self.call(&target, |reply| Command::ClosestPreceding { key, reply })
            .await
    }

    async fn ping(&self, target: NodeHandle) -> Result<PingReply, RpcError> {
        match self.call(&target, |reply| Command::Ping { reply }).await {
            Ok(state) => Ok(PingReply { state }),
            Err(RpcError::NotFound) => Ok(PingReply {
                state: LifecycleReport::Dead,
            }),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ClusterOps for ClusterRpc {
    async fn push_documents(&self, target: NodeHandle, docs: Vec<Document>) -> Result<(), RpcError> {
        self.call(&target, |reply| Command::PushDocuments { docs, reply })
            .await
    }

    async fn fetch_document(
        &self,
        target: NodeHandle,
        filename: String,
    ) -> Result<Option<Document>, RpcError> {
        self.call(&target, |reply| Command::FetchDocument { filename, reply })
            .await
    }

    async fn force_set_successor(
        &self,
        target: NodeHandle,
        new_successor: NodeHandle,
    ) -> Result<(), RpcError> {
        self.call(&target, |reply| Command::ForceSetSuccessor {
            handle: new_successor,
            reply,
        })
        .await
    }

    async fn force_set_predecessor(
        &self,
        target: NodeHandle,
        new_predecessor: Option<NodeHandle>,
    ) -> Result<(), RpcError> {
        self.call(&target, |reply| Command::ForceSetPredecessor {
            handle: new_predecessor,
            reply,
        })
        .await
    }

    async fn snapshot(&self, target: NodeHandle) -> Result<NodeSnapshot, RpcError> {
        self.call(&target, |reply| Command::Snapshot { reply })
            .await
    }

    async fn mark_dead(&self, target: NodeHandle) -> Result<(), RpcError> {
        self.call(&target, |reply| Command::Fail { reply }).await
    }
}
