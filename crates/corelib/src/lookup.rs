//! `find_successor` / `closest_preceding_node`: the lookup engine.
//!
//! Structured as an iterative loop around the [`NodeRpc`] capability rather
//! than node-local recursion: a lookup must be able to suspend across an
//! outbound RPC, and the `2m`-hop bound has to be enforced by a loop
//! counter, not call-stack depth.

use crate::error::Error;
use crate::ident::{self, Key, M};
use crate::node::{NodeHandle, NodeState};
use crate::rpc::NodeRpc;

/// Scans the finger table from `i = m-1` down to `0`, returning the first
/// finger whose node lies in the open interval `(n.key, key)`. Falls back to
/// `n` itself if none qualify.
///
/// The open-interval convention (as opposed to `find_successor`'s
/// right-closed one) is what discriminates "a node at `key`" from "a node
/// merely before `key`"; conflating the two degrades routing correctness.
pub fn closest_preceding_node(state: &NodeState, key: Key) -> NodeHandle {
    for i in (0..M).rev() {
        let finger = state.fingers.get(i as usize);
        if ident::in_interval(finger.node.key, state.key, key, false) {
            return finger.node.clone();
        }
    }
    state.handle()
}

/// Resolves the node responsible for `key`, starting the walk at `home`
/// (whose local state is `local`). Hops through other nodes only via `rpc`;
/// a hop that lands back on `home` is served locally instead of round-
/// tripping through its own RPC surface, which would deadlock a
/// single-mailbox actor mid-request.
///
/// Bounded at `2m` hops; on overflow, retries once starting from `home`'s
/// successor before surfacing [`Error::LookupDiverged`].
pub async fn find_successor(
    home: &NodeHandle,
    local: &NodeState,
    rpc: &dyn NodeRpc,
    key: Key,
) -> Result<NodeHandle, Error> {
    find_successor_with_path(home, local, rpc, key)
        .await
        .map(|(found, _path)| found)
}

/// Same as [`find_successor`] but also returns the ordered list of nodes
/// visited, for diagnostic reporting on document queries.
pub async fn find_successor_with_path(
    home: &NodeHandle,
    local: &NodeState,
    rpc: &dyn NodeRpc,
    key: Key,
) -> Result<(NodeHandle, Vec<NodeHandle>), Error> {
    match walk(home, local, rpc, home.clone(), key, 2 * M).await {
        Ok(found) => Ok(found),
        Err(Error::LookupDiverged) => {
            let retry_start = local
                .successors
                .first()
                .ok_or_else(|| Error::Fatal("node has no successor to retry lookup from".into()))?;
            walk(home, local, rpc, retry_start, key, 2 * M)
                .await
                .map_err(|_| Error::LookupDiverged)
        }
        Err(e) => Err(e),
    }
}

async fn walk(
    home: &NodeHandle,
    local: &NodeState,
    rpc: &dyn NodeRpc,
    start: NodeHandle,
    key: Key,
    max_hops: u32,
) -> Result<(NodeHandle, Vec<NodeHandle>), Error> {
    let mut current = start;
    let mut path = Vec::new();
    for _ in 0..max_hops {
        path.push(current.clone());
        let is_home = current.id == home.id;

        let succ = if is_home {
            local
                .successors
                .first()
                .ok_or_else(|| Error::Fatal("node has no successor".into()))?
        } else {
            rpc.get_successor(current.clone()).await?
        };

        if current.id == succ.id || ident::in_interval(key, current.key, succ.key, true) {
            path.push(succ.clone());
            return Ok((succ, path));
        }

        let preceding = if is_home {
            closest_preceding_node(local, key)
        } else {
            rpc.closest_preceding(current.clone(), key).await?
        };

        current = if preceding.id == current.id {
            // No finger strictly precedes key: step to the successor to
            // avoid recursing on ourselves forever.
            succ
        } else {
            preceding
        };
    }
    Err(Error::LookupDiverged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Endpoint, NodeId};

    fn handle(id: u8) -> NodeHandle {
        NodeHandle::new(NodeId(vec![id]), Endpoint::InProcess)
    }

    #[test]
    fn closest_preceding_falls_back_to_self() {
        let id = NodeId(vec![1]);
        let state = NodeState::new(id, Endpoint::InProcess, 3);
        // All fingers point at self; closest_preceding_node must return self.
        let got = closest_preceding_node(&state, Key::new(200));
        assert_eq!(got.id, state.id);
    }

    #[test]
    fn handles_are_compared_by_id_not_endpoint() {
        let a = handle(7);
        let mut b = handle(7);
        b.endpoint = Endpoint::Tcp("example:1".into());
        assert_eq!(a, b);
    }
}
