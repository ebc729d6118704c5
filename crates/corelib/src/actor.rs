//! One logical task per node: the single-writer actor that serializes every
//! mutation to a node's own state.
//!
//! Inbound RPC handlers and the periodic maintenance tick for a given node
//! share this one mailbox, so they can never interleave. A lookup that hops
//! through *other* nodes awaits their mailboxes instead of touching their
//! memory directly; a hop that lands back on this node is served from
//! `self.state` without round-tripping through its own mailbox, which would
//! deadlock a task that is, by construction, busy processing the very
//! request that triggered the hop.

use crate::cluster::{ClusterOps, ClusterRpc, NodeSnapshot};
use crate::document::{Document, DocumentQueryResult};
use crate::error::Error;
use crate::ident::Key;
use crate::lookup;
use crate::maintenance;
use crate::node::{NodeHandle, NodeId, NodeState};
use crate::rpc::{LifecycleReport, RpcError};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Which periodic pass a [`Command::Tick`] should run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickKind {
    Stabilize,
    FixFingers,
    CheckPredecessor,
}

pub(crate) enum Command {
    FindSuccessor {
        key: Key,
        reply: oneshot::Sender<Result<NodeHandle, RpcError>>,
    },
    GetPredecessor {
        reply: oneshot::Sender<Option<NodeHandle>>,
    },
    GetSuccessor {
        reply: oneshot::Sender<Result<NodeHandle, RpcError>>,
    },
    Notify {
        candidate: NodeHandle,
        reply: oneshot::Sender<()>,
    },
    ClosestPreceding {
        key: Key,
        reply: oneshot::Sender<NodeHandle>,
    },
    Ping {
        reply: oneshot::Sender<LifecycleReport>,
    },
    PushDocuments {
        docs: Vec<Document>,
        reply: oneshot::Sender<()>,
    },
    FetchDocument {
        filename: String,
        reply: oneshot::Sender<Option<Document>>,
    },
    ForceSetSuccessor {
        handle: NodeHandle,
        reply: oneshot::Sender<()>,
    },
    ForceSetPredecessor {
        handle: Option<NodeHandle>,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<NodeSnapshot>,
    },
    AddDocument {
        doc: Document,
        reply: oneshot::Sender<Result<NodeHandle, Error>>,
    },
    QueryDocument {
        filename: String,
        reply: oneshot::Sender<Result<DocumentQueryResult, Error>>,
    },
    Tick {
        kind: TickKind,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    Leave {
        reply: oneshot::Sender<Result<(), Error>>,
    },
    Fail {
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Cheap, cloneable mailbox reference. Registered in the [`crate::cluster::Directory`].
#[derive(Clone)]
pub struct ActorHandle {
    pub id: NodeId,
    tx: mpsc::Sender<Command>,
}

impl ActorHandle {
    pub(crate) async fn send(&self, cmd: Command) -> Result<(), mpsc::error::SendError<Command>> {
        self.tx.send(cmd).await
    }
}

/// The task body: owns [`NodeState`] exclusively and shares a
/// [`ClusterRpc`] handle to reach other actors.
pub struct NodeActor {
    state: NodeState,
    cluster: Arc<ClusterRpc>,
    rx: mpsc::Receiver<Command>,
}

impl NodeActor {
    /// Spawns the actor and returns a handle to its mailbox. The caller
    /// (the ring facade) is responsible for registering the handle in the
    /// directory before anyone can reach it.
    pub fn spawn(state: NodeState, cluster: Arc<ClusterRpc>) -> ActorHandle {
        let id = state.id.clone();
        let (tx, rx) = mpsc::channel(64);
        let actor = NodeActor { state, cluster, rx };
        tokio::spawn(actor.run());
        ActorHandle { id, tx }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            if matches!(cmd, Command::Shutdown) {
                break;
            }
            self.handle(cmd).await;
        }
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::FindSuccessor { key, reply } => {
                let home = self.state.handle();
                let result = lookup::find_successor(&home, &self.state, self.cluster.as_ref(), key)
                    .await
                    .map_err(to_rpc_error);
                let _ = reply.send(result);
            }
            Command::GetPredecessor { reply } => {
                let _ = reply.send(self.state.predecessor.clone());
            }
            Command::GetSuccessor { reply } => {
                let result = self
                    .state
                    .successors
                    .first()
                    .ok_or(RpcError::Protocol("node has no successor".into()));
                let _ = reply.send(result);
            }
            Command::Notify { candidate, reply } => {
                let migrated = maintenance::notify(&mut self.state, candidate.clone());
                if !migrated.is_empty() {
                    let _ = self.cluster.push_documents(candidate, migrated).await;
                }
                let _ = reply.send(());
            }
            Command::ClosestPreceding { key, reply } => {
                let _ = reply.send(lookup::closest_preceding_node(&self.state, key));
            }
            Command::Ping { reply } => {
                let state = if self.state.is_running() {
                    LifecycleReport::Alive
                } else {
                    LifecycleReport::Dead
                };
                let _ = reply.send(state);
            }
            Command::PushDocuments { docs, reply } => {
                for doc in docs {
                    self.state.documents.store(doc);
                }
                let _ = reply.send(());
            }
            Command::FetchDocument { filename, reply } => {
                let _ = reply.send(self.state.documents.get(&filename).cloned());
            }
            Command::ForceSetSuccessor { handle, reply } => {
                self.state.successors.set_first(handle);
                let _ = reply.send(());
            }
            Command::ForceSetPredecessor { handle, reply } => {
                self.state.predecessor = handle;
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let snapshot = NodeSnapshot {
                    id: self.state.id.clone(),
                    key: self.state.key,
                    predecessor: self.state.predecessor.clone(),
                    successors: self.state.successors.as_slice().to_vec(),
                    fingers: self.state.fingers.iter().cloned().collect(),
                    lifecycle: self.state.lifecycle,
                    document_filenames: self.state.documents.iter().map(|d| d.filename.clone()).collect(),
                };
                let _ = reply.send(snapshot);
            }
            Command::AddDocument { doc, reply } => {
                let home = self.state.handle();
                let result = async {
                    let target =
                        lookup::find_successor(&home, &self.state, self.cluster.as_ref(), doc.key)
                            .await?;
                    if target.id == home.id {
                        self.state.documents.store(doc);
                    } else {
                        self.cluster.push_documents(target.clone(), vec![doc]).await?;
                    }
                    Ok(target)
                }
                .await;
                let _ = reply.send(result);
            }
            Command::QueryDocument { filename, reply } => {
                let home = self.state.handle();
                let key = crate::ident::hash(filename.as_bytes());
                let result = async {
                    let (target, path) = lookup::find_successor_with_path(
                        &home,
                        &self.state,
                        self.cluster.as_ref(),
                        key,
                    )
                    .await?;
                    let found = if target.id == home.id {
                        self.state.documents.get(&filename).cloned()
                    } else {
                        self.cluster
                            .fetch_document(target.clone(), filename.clone())
                            .await?
                    };
                    Ok(DocumentQueryResult {
                        found,
                        resolved_at: target,
                        path,
                    })
                }
                .await;
                let _ = reply.send(result);
            }
            Command::Tick { kind, reply } => {
                let home = self.state.handle();
                let result = match kind {
                    TickKind::Stabilize => {
                        maintenance::stabilize(&mut self.state, &home, self.cluster.as_ref()).await
                    }
                    TickKind::FixFingers => {
                        match maintenance::fix_fingers(&self.state, &home, self.cluster.as_ref()).await
                        {
                            Ok(computed) => {
                                self.state.fingers.commit(computed);
                                Ok(())
                            }
                            Err(e) => Err(e),
                        }
                    }
                    TickKind::CheckPredecessor => {
                        maintenance::check_predecessor(&mut self.state, self.cluster.as_ref()).await;
                        Ok(())
                    }
                };
                let _ = reply.send(result);
            }
            Command::Leave { reply } => {
                let result = async {
                    let plan = maintenance::leave(&mut self.state)?;
                    if !plan.documents.is_empty() {
                        self.cluster
                            .push_documents(plan.successor.clone(), plan.documents)
                            .await?;
                    }
                    self.cluster
                        .force_set_predecessor(plan.successor.clone(), plan.predecessor.clone())
                        .await?;
                    if let Some(pred) = plan.predecessor {
                        self.cluster
                            .force_set_successor(pred, plan.successor)
                            .await?;
                    }
                    Ok(())
                }
                .await;
                let _ = reply.send(result);
            }
            Command::Fail { reply } => {
                maintenance::fail(&mut self.state);
                let _ = reply.send(());
            }
            Command::Shutdown => unreachable!("handled in run()"),
        }
    }
}

fn to_rpc_error(e: Error) -> RpcError {
    match e {
        Error::LookupDiverged => RpcError::LookupDiverged,
        Error::NodeUnavailable(msg) => RpcError::Protocol(msg),
        Error::ProtocolError(msg) => RpcError::Protocol(msg),
        other => RpcError::Protocol(other.to_string()),
    }
}
