//! Node identity and the local state a running node owns.

use crate::document::DocumentStore;
use crate::finger::FingerTable;
use crate::ident::{self, Key};
use crate::successor::SuccessorList;
use std::fmt;

/// Opaque, immutable node identifier. The hash input for `key = H(id)`.
///
/// Lowercase hex up to `m/4` characters on the wire; internally kept as the
/// raw bytes so the id can come from a hex string, a hostname, or anything
/// else deterministic.
#[derive(Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub Vec<u8>);

impl NodeId {
    pub fn from_hex(hex: &str) -> Result<Self, crate::error::Error> {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(crate::error::Error::InvalidInput(format!(
                "node id must be non-empty lowercase hex: {hex:?}"
            )));
        }
        let mut bytes = Vec::with_capacity(hex.len().div_ceil(2));
        let padded;
        let hex = if hex.len() % 2 == 1 {
            padded = format!("0{hex}");
            padded.as_str()
        } else {
            hex
        };
        for chunk in hex.as_bytes().chunks(2) {
            let s = std::str::from_utf8(chunk).unwrap();
            bytes.push(u8::from_str_radix(s, 16).map_err(|_| {
                crate::error::Error::InvalidInput(format!("invalid hex byte in {hex:?}"))
            })?);
        }
        Ok(NodeId(bytes))
    }

    pub fn key(&self) -> Key {
        ident::hash(&self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

/// Where a node's RPC capability can be reached.
///
/// `InProcess` addresses a directory entry in the local simulation;
/// `Tcp`/`Ipc` are the wire shapes a future networked transport would dial
/// (nothing in this workspace dials them, since the concrete transport is
/// out of scope).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Endpoint {
    InProcess,
    Tcp(String),
    Ipc(String),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::InProcess => write!(f, "inproc://local"),
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
            Endpoint::Ipc(path) => write!(f, "ipc://{path}"),
        }
    }
}

/// A transport-addressable, non-owning reference to a node: `(id, key,
/// endpoint)`. Never a raw in-process pointer, which is what lets the
/// routing engine treat in-process peers and networked peers identically.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NodeHandle {
    pub id: NodeId,
    pub key: Key,
    pub endpoint: Endpoint,
}

impl NodeHandle {
    pub fn new(id: NodeId, endpoint: Endpoint) -> Self {
        let key = id.key();
        Self { id, key, endpoint }
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for NodeHandle {}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.key)
    }
}

/// Whether a node is still answering RPCs truthfully.
///
/// Only `Running` nodes participate; `Dead` models failure in the
/// simulation so neighbors can discover it via `check_predecessor` or
/// successor-list failover, without the node object actually being dropped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Dead,
}

/// Local state a single node owns exclusively: predecessor, successor list,
/// finger table, and document store. Inter-node references here are
/// [`NodeHandle`]s, never pointers into another node's state.
pub struct NodeState {
    pub id: NodeId,
    pub key: Key,
    pub endpoint: Endpoint,
    pub predecessor: Option<NodeHandle>,
    pub successors: SuccessorList,
    pub fingers: FingerTable,
    pub lifecycle: LifecycleState,
    pub documents: DocumentStore,
}

impl NodeState {
    /// Constructs a node with its finger table filled with self-references
    /// and no successor list entries yet. Callers must follow with either
    /// [`crate::maintenance::create`] or [`crate::maintenance::join`] before
    /// the node is considered part of a ring.
    pub fn new(id: NodeId, endpoint: Endpoint, successor_list_len: usize) -> Self {
        let key = id.key();
        let self_handle = NodeHandle {
            id: id.clone(),
            key,
            endpoint: endpoint.clone(),
        };
        Self {
            id,
            key,
            endpoint,
            predecessor: None,
            successors: SuccessorList::new(successor_list_len, self_handle.clone()),
            fingers: FingerTable::new(key, self_handle),
            lifecycle: LifecycleState::Running,
            documents: DocumentStore::new(),
        }
    }

    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            id: self.id.clone(),
            key: self.key,
            endpoint: self.endpoint.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == LifecycleState::Running
    }
}
