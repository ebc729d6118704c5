//! The periodic maintenance protocol: `stabilize`, `notify`, `fix_fingers`,
//! `check_predecessor`, plus the lifecycle transitions `create`, `join`,
//! `leave` and `fail`.
//!
//! The order and batching of these across a ring is an implementation
//! choice; the contracts here hold for a single node and are driven per
//! node by [`crate::scheduler::Scheduler`] or by a test calling them
//! directly.

use crate::document::Document;
use crate::error::Error;
use crate::ident;
use crate::lookup;
use crate::node::{LifecycleState, NodeHandle, NodeState};
use crate::rpc::NodeRpc;

/// First node in a new ring: no predecessor, its own successor.
pub fn create(state: &mut NodeState) {
    state.predecessor = None;
    state.successors.set_first(state.handle());
}

/// Joins an existing ring through `bootstrap`. Document transfer from the
/// new successor happens lazily on the next `stabilize`/`notify` round, not
/// here.
pub async fn join(
    state: &mut NodeState,
    rpc: &dyn NodeRpc,
    bootstrap: NodeHandle,
) -> Result<(), Error> {
    state.predecessor = None;
    let successor = rpc.find_successor(bootstrap, state.key).await?;
    state.successors.set_first(successor);
    Ok(())
}

/// Rebuilds the successor list and attempts to tighten the immediate
/// successor, then notifies it. Serially fails over across the existing
/// successor-list entries: only once every entry has failed is the node
/// considered isolated.
pub async fn stabilize(
    state: &mut NodeState,
    home: &NodeHandle,
    rpc: &dyn NodeRpc,
) -> Result<(), Error> {
    let r = state.successors.capacity();

    let mut live_first = None;
    for candidate in state.successors.as_slice().to_vec().into_iter().flatten() {
        if candidate.id == home.id || ping_ok(rpc, &candidate).await {
            live_first = Some(candidate);
            break;
        }
        state.successors.advance();
    }
    let first = match live_first {
        Some(f) => f,
        None => {
            // Every cached successor has failed: isolated until an
            // operator rejoins this node or a peer's stabilize/notify
            // round discovers it again.
            state.successors.set_first(home.clone());
            return Err(Error::NodeUnavailable(format!(
                "node {} has no live successor left in its list",
                home.id
            )));
        }
    };
    state.successors.set_first(first.clone());

    // Rebuild the rest of the list by chaining single-hop get_successor
    // calls instead of a bulk list transfer, since the RPC capability set
    // only exposes single-hop get_successor.
    let mut rebuilt = vec![Some(first.clone())];
    let mut cursor = first.clone();
    for _ in 1..r {
        let next = if cursor.id == home.id {
            state.successors.first()
        } else {
            rpc.get_successor(cursor.clone()).await.ok()
        };
        match next {
            Some(n) if n.id != home.id => {
                rebuilt.push(Some(n.clone()));
                cursor = n;
            }
            _ => break,
        }
    }
    state.successors.replace_all(rebuilt);

    let x = if first.id == home.id {
        state.predecessor.clone()
    } else {
        rpc.get_predecessor(first.clone()).await.unwrap_or(None)
    };
    if let Some(x) = x {
        if x.id != home.id && ident::in_interval(x.key, home.key, first.key, false) {
            state.successors.set_first(x);
        }
    }

    let target = state.successors.first().expect("set above");
    if target.id == home.id {
        notify(state, home.clone());
    } else {
        let _ = rpc.notify(target, home.clone()).await;
    }
    Ok(())
}

async fn ping_ok(rpc: &dyn NodeRpc, handle: &NodeHandle) -> bool {
    matches!(
        rpc.ping(handle.clone()).await,
        Ok(reply) if reply.state == crate::rpc::LifecycleReport::Alive
    )
}

/// Handles an inbound notification that `candidate` believes it might be
/// our predecessor. Purely local: adopts `candidate` if we had no
/// predecessor, or if `candidate` is strictly between our old predecessor
/// and us. Returns any documents that now belong to `candidate` so the
/// caller can hand them off (migration itself needs a second RPC, since the
/// `notify` capability only carries an ack).
pub fn notify(state: &mut NodeState, candidate: NodeHandle) -> Vec<Document> {
    if candidate.id == state.id {
        return Vec::new();
    }
    let should_adopt = match &state.predecessor {
        None => true,
        Some(pred) => ident::in_interval(candidate.key, pred.key, state.key, false),
    };
    if !should_adopt {
        return Vec::new();
    }
    // Before a predecessor is known, this node is responsible for the whole
    // ring; migrate using its own key as the placeholder lower bound so the
    // new predecessor still only takes a contiguous arc, not everything.
    let lo = state
        .predecessor
        .as_ref()
        .map(|p| p.key)
        .unwrap_or(state.key);
    let migrated = state.documents.drain_in_range(lo, candidate.key);
    state.predecessor = Some(candidate);
    migrated
}

/// Two-phase finger refresh: every new value is computed from
/// `find_successor` (which reads the *current* table) before any entry is
/// written back, so a mid-update lookup never observes a partially updated
/// table.
pub async fn fix_fingers(
    state: &NodeState,
    home: &NodeHandle,
    rpc: &dyn NodeRpc,
) -> Result<Vec<NodeHandle>, Error> {
    let mut computed = Vec::with_capacity(state.fingers.len());
    for finger in state.fingers.iter() {
        computed.push(lookup::find_successor(home, state, rpc, finger.start).await?);
    }
    Ok(computed)
}

/// Clears the predecessor if it fails to answer a ping or reports itself
/// dead.
pub async fn check_predecessor(state: &mut NodeState, rpc: &dyn NodeRpc) {
    let Some(pred) = state.predecessor.clone() else {
        return;
    };
    match rpc.ping(pred).await {
        Ok(reply) if reply.state == crate::rpc::LifecycleReport::Alive => {}
        _ => state.predecessor = None,
    }
}

/// Marks the node dead. No outgoing action: neighbors discover the failure
/// through ping timeouts during `check_predecessor`, or `stabilize` falling
/// back through the successor list.
pub fn fail(state: &mut NodeState) {
    state.lifecycle = LifecycleState::Dead;
}

/// What a voluntary leave needs its caller to do to the node's neighbors,
/// since those live on other actors and this function only has `&mut
/// NodeState` for the leaving node.
pub struct LeavePlan {
    pub documents: Vec<Document>,
    pub predecessor: Option<NodeHandle>,
    pub successor: NodeHandle,
}

/// Prepares a voluntary leave: documents to hand off to the successor, and
/// the predecessor/successor pair that must be spliced together. The caller
/// (the ring facade) performs the two outbound notifications since they
/// target other nodes' actors, not this one.
pub fn leave(state: &mut NodeState) -> Result<LeavePlan, Error> {
    let successor = state
        .successors
        .first()
        .ok_or_else(|| Error::Fatal("leaving node has no successor".into()))?;
    let plan = LeavePlan {
        documents: state.documents.drain_all(),
        predecessor: state.predecessor.clone(),
        successor,
    };
    state.lifecycle = LifecycleState::Dead;
    Ok(plan)
}
