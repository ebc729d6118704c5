//! Process-wide ring facade: the directory of known nodes, bootstrap join,
//! maintenance sweeps, and diagnostic rendering.
//!
//! This replaces the original simulation's global doubly linked node list
//! (`ring_insert`/`ring_get_node` in the source implementation) with an
//! actor-per-node model: the facade holds [`ActorHandle`]s in a
//! [`Directory`], and every operation it exposes is a message sent to one
//! or more of those mailboxes rather than a direct memory walk.

use crate::actor::{Command, NodeActor, TickKind};
use crate::cluster::{ClusterOps, ClusterRpc, Directory, NodeSnapshot};
use crate::config::RingConfig;
use crate::document::{Document, DocumentQueryResult};
use crate::error::Error;
use crate::ident::M;
use crate::node::{Endpoint, NodeHandle, NodeId, NodeState};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Builds a [`Ring`] with a chosen [`RingConfig`] before any node exists.
#[derive(Default)]
pub struct RingBuilder {
    config: RingConfig,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: RingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Ring {
        let directory = Arc::new(Directory::new());
        let cluster = Arc::new(ClusterRpc::new(directory.clone(), self.config.rpc_timeout));
        Ring {
            directory,
            cluster,
            config: self.config,
            order: parking_lot::Mutex::new(Vec::new()),
        }
    }
}

/// The directory of known nodes plus the RPC provider shared by every
/// lookup and maintenance call issued against them. Mutations (spawning or
/// removing a node) happen only through the facade's own methods; readers
/// may enumerate a consistent snapshot via [`Ring::describe`].
pub struct Ring {
    directory: Arc<Directory>,
    cluster: Arc<ClusterRpc>,
    config: RingConfig,
    /// Insertion order, for `node_by_index`'s O(1) access by position. The
    /// directory itself is keyed by id, not position.
    order: parking_lot::Mutex<Vec<NodeId>>,
}

impl Ring {
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn directory(&self) -> Arc<Directory> {
        self.directory.clone()
    }

    /// Spawns the first node of a brand-new ring.
    pub fn create_node(&self, id: NodeId) -> Result<NodeHandle, Error> {
        if self.directory.get(&id).is_some() {
            return Err(Error::DuplicateId(id.to_string()));
        }
        let mut state = NodeState::new(id.clone(), Endpoint::InProcess, self.config.successor_list_len);
        crate::maintenance::create(&mut state);
        let handle = state.handle();
        let actor = NodeActor::spawn(state, self.cluster.clone());
        self.directory.insert(id.clone(), actor);
        self.order.lock().push(id);
        Ok(handle)
    }

    /// Spawns a new node and joins it to the ring through `bootstrap`.
    pub async fn join_node(&self, id: NodeId, bootstrap: NodeId) -> Result<NodeHandle, Error> {
        if self.directory.get(&id).is_some() {
            return Err(Error::DuplicateId(id.to_string()));
        }
        if self.directory.get(&bootstrap).is_none() {
            return Err(Error::InvalidInput(format!(
                "unknown bootstrap node {bootstrap}"
            )));
        }
        let bootstrap_handle = NodeHandle::new(bootstrap.clone(), Endpoint::InProcess);

        let mut state = NodeState::new(id.clone(), Endpoint::InProcess, self.config.successor_list_len);
        crate::maintenance::join(&mut state, self.cluster.as_ref(), bootstrap_handle).await?;
        let handle = state.handle();
        let actor = NodeActor::spawn(state, self.cluster.clone());
        self.directory.insert(id.clone(), actor);
        self.order.lock().push(id);
        Ok(handle)
    }

    /// Runs `document_add` against `ctx`: computes the key, resolves the
    /// responsible node, and stores the document there.
    pub async fn add_document(&self, ctx: &NodeId, doc: Document) -> Result<NodeHandle, Error> {
        let (reply, rx) = oneshot::channel();
        self.send(ctx, Command::AddDocument { doc, reply }).await?;
        rx.await.map_err(|_| actor_gone(ctx))?
    }

    /// Runs `document_query` against `ctx`.
    pub async fn query_document(
        &self,
        ctx: &NodeId,
        filename: impl Into<String>,
    ) -> Result<DocumentQueryResult, Error> {
        let (reply, rx) = oneshot::channel();
        self.send(
            ctx,
            Command::QueryDocument {
                filename: filename.into(),
                reply,
            },
        )
        .await?;
        rx.await.map_err(|_| actor_gone(ctx))?
    }

    /// Runs one `stabilize` pass on every node currently in the directory.
    pub async fn stabilize_all(&self) {
        self.tick_all(TickKind::Stabilize).await;
    }

    /// Runs one `fix_fingers` pass on every node currently in the directory.
    pub async fn fix_fingers_all(&self) {
        self.tick_all(TickKind::FixFingers).await;
    }

    /// Runs one `check_predecessor` pass on every node currently in the
    /// directory.
    pub async fn check_predecessors_all(&self) {
        self.tick_all(TickKind::CheckPredecessor).await;
    }

    async fn tick_all(&self, kind: TickKind) {
        for id in self.directory.ids() {
            let (reply, rx) = oneshot::channel();
            if self.send(&id, Command::Tick { kind, reply }).await.is_err() {
                continue;
            }
            if let Ok(Err(e)) = rx.await {
                tracing::warn!(node = %id, error = %e, "maintenance tick failed");
            }
        }
    }

    /// Runs a single maintenance tick on one node, for fine-grained control
    /// over the menu's separate `stabilize-node` / `fix-fingers-node` /
    /// `check-predecessor-node` operations and for tests that need to drive
    /// one node at a time rather than a whole sweep.
    pub async fn tick_node(&self, id: &NodeId, kind: TickKind) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.send(id, Command::Tick { kind, reply }).await?;
        rx.await.map_err(|_| actor_gone(id))?
    }

    /// Voluntary departure: hands off documents, splices predecessor and
    /// successor together, then removes the node from the directory.
    pub async fn leave(&self, id: &NodeId) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.send(id, Command::Leave { reply }).await?;
        rx.await.map_err(|_| actor_gone(id))??;
        self.directory.remove(id);
        self.order.lock().retain(|x| x != id);
        Ok(())
    }

    /// Simulated failure: the node stops answering RPCs truthfully but
    /// stays registered so neighbors can observe the failure through
    /// `ping`. Automatic recovery across a network partition is out of
    /// scope.
    pub async fn fail(&self, id: &NodeId) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.send(id, Command::Fail { reply }).await?;
        rx.await.map_err(|_| actor_gone(id))?;
        Ok(())
    }

    /// O(1) access by insertion position, 1-based to match the CLI's menu
    /// numbering.
    pub fn node_by_index(&self, index: usize) -> Option<NodeId> {
        self.order.lock().get(index.checked_sub(1)?).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.directory.len()
    }

    /// Full diagnostic snapshot of one node's state, for tests and richer
    /// front ends than the line-oriented `describe*` renderers.
    pub async fn snapshot_of(&self, id: &NodeId) -> Result<NodeSnapshot, Error> {
        Ok(self
            .cluster
            .snapshot(NodeHandle::new(id.clone(), Endpoint::InProcess))
            .await?)
    }

    pub async fn successor_of(&self, id: &NodeId) -> Result<Option<NodeHandle>, Error> {
        Ok(self
            .snapshot_of(id)
            .await?
            .successors
            .first()
            .cloned()
            .flatten())
    }

    pub async fn predecessor_of(&self, id: &NodeId) -> Result<Option<NodeHandle>, Error> {
        Ok(self.snapshot_of(id).await?.predecessor)
    }

    async fn send(&self, id: &NodeId, cmd: Command) -> Result<(), Error> {
        let actor = self
            .directory
            .get(id)
            .ok_or_else(|| Error::InvalidInput(format!("unknown node {id}")))?;
        actor.send(cmd).await.map_err(|_| actor_gone(id))
    }

    /// Renders the ring index table: `Key | ID | Pred | Succ | # Docs`, in
    /// insertion order.
    pub async fn describe(&self) -> String {
        let mut out = String::from("Key | ID | Pred | Succ | # Docs\n");
        for id in self.order.lock().clone() {
            let Ok(snap) = self.snapshot_of(&id).await else {
                continue;
            };
            let pred = snap
                .predecessor
                .as_ref()
                .map(|p| p.id.to_string())
                .unwrap_or_else(|| "-".into());
            let succ = snap
                .successors
                .first()
                .and_then(|s| s.as_ref())
                .map(|s| s.id.to_string())
                .unwrap_or_else(|| "-".into());
            out.push_str(&format!(
                "{} | {} | {} | {} | {}\n",
                snap.key,
                snap.id,
                pred,
                succ,
                snap.document_filenames.len()
            ));
        }
        out
    }

    /// Renders a single node's finger table: `i | Start | Succ(id:key)` for
    /// `i` in `[0, m)`.
    pub async fn describe_node(&self, id: &NodeId) -> Result<String, Error> {
        let snap = self.snapshot_of(id).await?;
        let mut out = format!("node {} (key {})\n", snap.id, snap.key);
        out.push_str("i | Start | Succ(id:key)\n");
        for (i, finger) in snap.fingers.iter().enumerate() {
            out.push_str(&format!(
                "{i} | {} | {}:{}\n",
                finger.start, finger.node.id, finger.node.key
            ));
        }
        out.push_str(&format!("documents: {}\n", snap.document_filenames.join(", ")));
        Ok(out)
    }

    /// `m`, the fixed identifier-space bit width, for interfaces that need
    /// to render `[0, m)` without importing `ident` directly.
    pub const fn identifier_bits() -> u32 {
        M
    }
}

fn actor_gone(id: &NodeId) -> Error {
    Error::NodeUnavailable(format!("actor for node {id} is no longer running"))
}
