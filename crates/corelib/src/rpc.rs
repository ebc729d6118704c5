//! The narrow capability set the core calls on remote (or local) peers.
//!
//! A [`NodeHandle`] is the triple `(id, key, endpoint)`, never a raw
//! in-process pointer, so [`NodeRpc`] can be satisfied identically by an
//! in-process peer (see [`crate::cluster::ClusterRpc`], used for tests and
//! single-process simulation) and, in principle, a networked one. The
//! concrete network transport is out of scope here: nothing in this
//! workspace dials `Endpoint::Tcp`/`Endpoint::Ipc`.

use crate::ident::Key;
use crate::node::NodeHandle;
use async_trait::async_trait;
use thiserror::Error;

/// Liveness as reported by `ping`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LifecycleReport {
    Alive,
    Dead,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PingReply {
    pub state: LifecycleReport,
}

/// Errors an RPC call can fail with. Every call carries an implicit
/// deadline (`RingConfig::rpc_timeout`); on timeout the caller treats the
/// peer as possibly-dead for that operation only (eviction needs a second
/// signal: `check_predecessor`'s ping, or serial successor-list failure).
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("rpc timed out")]
    Timeout,
    #[error("lookup diverged")]
    LookupDiverged,
    #[error("target node not found")]
    NotFound,
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// The exact capability set the routing and maintenance engines depend on,
/// per the Chord paper's RPC surface (`find_successor`, `get_predecessor`,
/// notify, closest-preceding-finger, ping). This set is closed; document
/// hand-off, diagnostics and lifecycle control use a separate internal
/// channel (see [`crate::cluster`]) because they were never part of the
/// routing contract.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Full resolution of `key` as seen from `target`, not a single hop:
    /// this is what `join` calls on a bootstrap node to learn its new
    /// successor.
    async fn find_successor(&self, target: NodeHandle, key: Key) -> Result<NodeHandle, RpcError>;

    async fn get_predecessor(&self, target: NodeHandle) -> Result<Option<NodeHandle>, RpcError>;

    async fn get_successor(&self, target: NodeHandle) -> Result<NodeHandle, RpcError>;

    async fn notify(&self, target: NodeHandle, candidate: NodeHandle) -> Result<(), RpcError>;

    /// Single local finger-table hop on `target`, no further forwarding.
    async fn closest_preceding(&self, target: NodeHandle, key: Key) -> Result<NodeHandle, RpcError>;

    async fn ping(&self, target: NodeHandle) -> Result<PingReply, RpcError>;
}
