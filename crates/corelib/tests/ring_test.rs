//! End-to-end scenarios driven through the public `Ring` facade.
//!
//! 1. **Lifecycle**: create, single-node invariants.
//! 2. **Convergence**: two-node and N-node stabilize rounds.
//! 3. **Documents**: placement and query, idempotent insert.
//! 4. **Failure**: successor-list failover.

use corelib::{NodeId, RingBuilder, TickKind};

fn id(hex: &str) -> NodeId {
    NodeId::from_hex(hex).expect("valid hex id")
}

// ============================================================================
// S1: single-node ring
// ============================================================================

#[tokio::test]
async fn single_node_is_its_own_successor_with_no_predecessor() {
    let ring = RingBuilder::new().build();
    let handle = ring.create_node(id("a0")).unwrap();

    assert_eq!(ring.node_count(), 1);
    let successor = ring.successor_of(&handle.id).await.unwrap();
    assert_eq!(successor.unwrap().id, handle.id, "a lone node is its own successor");
    assert!(
        ring.predecessor_of(&handle.id).await.unwrap().is_none(),
        "a lone node has no predecessor"
    );
}

// ============================================================================
// S2: two-node convergence
// ============================================================================

#[tokio::test]
async fn two_nodes_converge_to_mutual_successor_and_predecessor() {
    let ring = RingBuilder::new().build();
    let a = ring.create_node(id("a0")).unwrap();
    let b = ring.join_node(id("ff"), id("a0")).await.unwrap();

    // Two stabilize rounds are enough for both sides to notice each other
    // and tighten: a -> b, then b's notify round informs a.
    for _ in 0..2 {
        ring.stabilize_all().await;
    }

    let a_succ = ring.successor_of(&a.id).await.unwrap().unwrap();
    let b_succ = ring.successor_of(&b.id).await.unwrap().unwrap();
    assert_eq!(a_succ.id, b.id);
    assert_eq!(b_succ.id, a.id);

    let a_pred = ring.predecessor_of(&a.id).await.unwrap().unwrap();
    let b_pred = ring.predecessor_of(&b.id).await.unwrap().unwrap();
    assert_eq!(a_pred.id, b.id);
    assert_eq!(b_pred.id, a.id);
}

// ============================================================================
// N-node convergence (property 5)
// ============================================================================

#[tokio::test]
async fn n_node_ring_converges_to_a_single_cycle() {
    let ring = RingBuilder::new().build();
    let ids = ["10", "33", "5a", "80", "c1", "f0"];

    ring.create_node(id(ids[0])).unwrap();
    for raw in &ids[1..] {
        ring.join_node(id(raw), id(ids[0])).await.unwrap();
    }

    // O(n log n) maintenance rounds is sufficient per spec; run generously.
    for _ in 0..(ids.len() * 4) {
        ring.stabilize_all().await;
        ring.fix_fingers_all().await;
    }

    let start = id(ids[0]);
    let mut visited = std::collections::HashSet::new();
    let mut current = start.clone();
    for _ in 0..ids.len() {
        visited.insert(current.clone());
        current = ring.successor_of(&current).await.unwrap().unwrap().id;
    }
    assert_eq!(visited.len(), ids.len(), "every node visited exactly once per cycle");
    assert_eq!(current, start, "walking successors returns to the start");
}

// ============================================================================
// Document placement and query (S3 / S4, property 7 and 9)
// ============================================================================

#[tokio::test]
async fn document_is_placed_at_its_successor_and_found_by_query() {
    let ring = RingBuilder::new().build();
    let ids = ["10", "80", "f0"];
    ring.create_node(id(ids[0])).unwrap();
    for raw in &ids[1..] {
        ring.join_node(id(raw), id(ids[0])).await.unwrap();
    }
    for _ in 0..12 {
        ring.stabilize_all().await;
        ring.fix_fingers_all().await;
    }

    let ctx = id(ids[0]);
    let target = ring
        .add_document(&ctx, corelib::Document::new("doc1", b"payload".to_vec()))
        .await
        .unwrap();

    let result = ring.query_document(&ctx, "doc1").await.unwrap();
    assert_eq!(result.resolved_at.id, target.id, "query resolves to the same node as insert");
    let found = result.found.expect("document must be found after placement");
    assert_eq!(found.data, b"payload");
    assert!(result.path.len() <= corelib::Ring::identifier_bits() as usize * 2);
}

#[tokio::test]
async fn repeated_insert_overwrites_instead_of_duplicating() {
    let ring = RingBuilder::new().build();
    let ctx = id("a0");
    ring.create_node(ctx.clone()).unwrap();

    ring.add_document(&ctx, corelib::Document::new("doc1", b"first".to_vec()))
        .await
        .unwrap();
    ring.add_document(&ctx, corelib::Document::new("doc1", b"second".to_vec()))
        .await
        .unwrap();

    let result = ring.query_document(&ctx, "doc1").await.unwrap();
    let found = result.found.expect("document present");
    assert_eq!(found.data, b"second", "second insert overwrites the first");

    let snap = ring.snapshot_of(&ctx).await.unwrap();
    assert_eq!(
        snap.document_filenames.iter().filter(|f| *f == "doc1").count(),
        1,
        "exactly one entry for filename regardless of insert count"
    );
}

// ============================================================================
// S5: failure recovery via successor-list failover
// ============================================================================

#[tokio::test]
async fn stabilize_advances_past_a_dead_successor_list_entry() {
    let ring = RingBuilder::new().build();
    let ids = ["10", "30", "50", "70", "90"];
    ring.create_node(id(ids[0])).unwrap();
    for raw in &ids[1..] {
        ring.join_node(id(raw), id(ids[0])).await.unwrap();
    }
    for _ in 0..20 {
        ring.stabilize_all().await;
    }

    let n = id(ids[0]);
    let snap_before = ring.snapshot_of(&n).await.unwrap();
    let second_successor = snap_before.successors[1]
        .clone()
        .expect("five-node ring keeps at least two successors cached")
        .id;

    ring.fail(&second_successor).await.unwrap();
    ring.tick_node(&n, TickKind::Stabilize).await.unwrap();

    let remaining: std::collections::HashSet<_> = ids
        .iter()
        .map(|s| id(s))
        .filter(|candidate| *candidate != second_successor)
        .collect();

    let mut visited = std::collections::HashSet::new();
    let mut current = n.clone();
    for _ in 0..remaining.len() {
        visited.insert(current.clone());
        let next = ring.successor_of(&current).await.unwrap().unwrap().id;
        current = next;
    }
    assert_eq!(visited, remaining, "the four live nodes still form a cycle");
}

// ============================================================================
// Voluntary leave
// ============================================================================

#[tokio::test]
async fn leave_removes_the_node_and_splices_neighbors() {
    let ring = RingBuilder::new().build();
    let ids = ["10", "50", "90"];
    ring.create_node(id(ids[0])).unwrap();
    for raw in &ids[1..] {
        ring.join_node(id(raw), id(ids[0])).await.unwrap();
    }
    for _ in 0..8 {
        ring.stabilize_all().await;
    }

    ring.leave(&id("50")).await.unwrap();
    assert_eq!(ring.node_count(), 2);

    let a_succ = ring.successor_of(&id("10")).await.unwrap().unwrap().id;
    assert_eq!(a_succ, id("90"), "the leaving node's neighbors are spliced together");
}

#[tokio::test]
async fn duplicate_node_id_is_rejected() {
    let ring = RingBuilder::new().build();
    ring.create_node(id("a0")).unwrap();
    let err = ring.create_node(id("a0")).unwrap_err();
    assert!(matches!(err, corelib::Error::DuplicateId(_)));
}
