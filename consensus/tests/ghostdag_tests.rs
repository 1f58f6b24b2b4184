//!
//! GHOSTDAG integration tests
//!

mod common;

use blockdag_consensus::{
    consensus::BlockDag,
    test_helpers::{DagBlock, DagBuilder, build_dag, random_topology},
};
use blockdag_consensus_core::{
    BlockId, BlockIdSet, KType,
    block::Block,
    blockid::VIRTUAL,
    errors::{consensus::ConsensusError, traversal::TraversalError},
};
use blockdag_core::log::{info, try_init_logger};
use itertools::Itertools;
use serde::Deserialize;
use std::cmp::Reverse;

#[derive(Deserialize, Debug)]
struct GhostdagTestDag {
    k: KType,

    #[serde(default)]
    description: String,

    blocks: Vec<GhostdagTestBlock>,

    expected_virtual: ExpectedVirtual,
}

#[derive(Deserialize, Debug)]
struct GhostdagTestBlock {
    id: BlockId,
    parents: Vec<BlockId>,
    expected: ExpectedGhostdagData,
}

#[derive(Deserialize, Debug)]
struct ExpectedGhostdagData {
    selected_parent: Option<BlockId>,
    blue_score: u64,
    mergeset_blues: Vec<BlockId>,
    mergeset_reds: Vec<BlockId>,
}

#[derive(Deserialize, Debug)]
struct ExpectedVirtual {
    tips: Vec<BlockId>,
    sink: BlockId,
    blue_score: u64,
    selected_parent: Option<BlockId>,
    blues: Vec<BlockId>,
    reds: Vec<BlockId>,
    consensus_order: Vec<BlockId>,
}

fn ids(values: &[u64]) -> Vec<BlockId> {
    values.iter().copied().map(BlockId::from).collect()
}

fn id_set(values: &[u64]) -> BlockIdSet {
    values.iter().copied().map(BlockId::from).collect()
}

#[test]
fn ghostdag_json_test() {
    try_init_logger("info");
    for path in common::json_files("tests/testdata/dags") {
        info!("Running test {}", path.display());
        let test: GhostdagTestDag = common::read_json(&path);

        let mut dag = BlockDag::with_k(test.k);
        for block in test.blocks.iter() {
            dag.add_block(Block::new(block.id, 0, block.parents.clone())).unwrap();
        }

        for block in test.blocks.iter() {
            let data = dag.ghostdag_data(block.id).unwrap();
            let context = format!("block {} of {} ({})", block.id, path.display(), test.description);
            assert_eq!(data.selected_parent, block.expected.selected_parent, "selected parent assertion failed for {}", context);
            assert_eq!(data.mergeset_blues.to_vec(), block.expected.mergeset_blues, "mergeset blues assertion failed for {}", context);
            assert_eq!(data.mergeset_reds.to_vec(), block.expected.mergeset_reds, "mergeset reds assertion failed for {}", context);
            assert_eq!(data.blue_score, block.expected.blue_score, "blue score assertion failed for {}", context);
        }

        let expected = &test.expected_virtual;
        assert_eq!(dag.current_tips().unwrap(), expected.tips, "tips assertion failed for {}", path.display());
        assert_eq!(dag.find_sink().unwrap(), expected.sink, "sink assertion failed for {}", path.display());

        dag.with_virtual(|virtual_block| {
            assert_eq!(virtual_block.blue_score(), expected.blue_score);
            assert_eq!(virtual_block.selected_parent(), expected.selected_parent);
            assert_eq!(virtual_block.blue_blocks(), expected.blues, "virtual blues assertion failed for {}", path.display());
            assert_eq!(virtual_block.red_blocks(), expected.reds, "virtual reds assertion failed for {}", path.display());
            assert_eq!(virtual_block.consensus_order().unwrap(), expected.consensus_order);
        })
        .unwrap();
    }
}

/// The twelve-block reference DAG, with ids D < C < E < B
mod reference {
    pub const G: u64 = 1;
    pub const D: u64 = 2;
    pub const C: u64 = 3;
    pub const E: u64 = 4;
    pub const B: u64 = 5;
    pub const I: u64 = 6;
    pub const H: u64 = 7;
    pub const F: u64 = 8;
    pub const L: u64 = 9;
    pub const K: u64 = 10;
    pub const J: u64 = 11;
    pub const M: u64 = 12;

    pub const TOPOLOGY: &[(u64, &[u64])] = &[
        (G, &[]),
        (E, &[G]),
        (D, &[G]),
        (C, &[G]),
        (B, &[G]),
        (I, &[E]),
        (H, &[D, C, E]),
        (F, &[B, C]),
        (L, &[I, D]),
        (K, &[B, H, I]),
        (J, &[F, H]),
        (M, &[K, F]),
    ];
}

#[test]
fn reference_dag_test() {
    use reference::*;
    let mut dag = build_dag(3, TOPOLOGY);

    assert_eq!(dag.genesis(), Some(G.into()));
    assert_eq!(dag.len(), 12);
    assert_eq!(dag.selected_parent_chain(M.into()).unwrap(), ids(&[K, H, D, G]));
    assert!(dag.selected_parent_chain(G.into()).unwrap().is_empty());

    let scores = TOPOLOGY.iter().map(|(id, _)| dag.blue_score((*id).into()).unwrap()).collect_vec();
    assert_eq!(scores, vec![0, 1, 1, 1, 1, 2, 4, 3, 4, 6, 6, 7]);

    // H merges C and E after selecting D, and puts D first among its parents
    assert_eq!(dag.parents(H.into()).unwrap().to_vec(), ids(&[D, C, E]));
    assert_eq!(dag.sorted_merge_set_with_sp(H.into()).unwrap(), ids(&[D, C, E]));
    assert_eq!(dag.merge_set(H.into()).unwrap(), id_set(&[D, C, E]));
    // K selects H over I and B, and B is the one candidate pushed over the bound
    assert_eq!(dag.sorted_merge_set_without_sp(K.into()).unwrap(), ids(&[B, I]));
    assert_eq!(dag.ghostdag_data(K.into()).unwrap().mergeset_reds.to_vec(), ids(&[B]));

    // M's own point of view still has J and L outside its past
    let m_view = dag.local_blue_view(M.into()).unwrap();
    let (m_blues, m_reds): (Vec<_>, Vec<_>) = m_view.iter().sorted().partition(|(_, is_blue)| **is_blue);
    assert_eq!(m_blues.into_iter().map(|(id, _)| *id).collect_vec(), ids(&[G, D, C, E, I, H, K]));
    assert_eq!(m_reds.into_iter().map(|(id, _)| *id).collect_vec(), ids(&[B, F]));

    assert_eq!(dag.current_tips().unwrap(), ids(&[L, J, M]));
    assert_eq!(dag.find_sink().unwrap(), M.into());

    let (blues, reds, order) = dag
        .with_virtual(|virtual_block| {
            assert_eq!(virtual_block.parents().unwrap().to_vec(), ids(&[M, L, J]));
            assert_eq!(virtual_block.sorted_merge_set_without_sp().unwrap(), ids(&[L, J]));
            assert_eq!(virtual_block.blue_score(), 8);
            (virtual_block.blue_blocks(), virtual_block.red_blocks(), virtual_block.consensus_order().unwrap())
        })
        .unwrap();
    assert_eq!(blues, ids(&[G, D, C, E, I, H, K, M]));
    assert_eq!(reds, ids(&[B, F, L, J]));
    assert_eq!(order, ids(&[G, D, C, E, H, B, I, K, F, M, L, J]));

    assert_eq!(dag.consensus_ordered_past(H.into()).unwrap(), ids(&[G, D, C, E, H]));
    assert_eq!(dag.consensus_ordered_past(G.into()).unwrap(), ids(&[G]));

    // Folding the chain views of M gives K's view, the nearest one
    let pov = dag.all_selected_parents_pov(M.into()).unwrap();
    assert_eq!(pov, *dag.local_blue_view(K.into()).unwrap());
}

#[test]
fn reference_dag_cones_test() {
    use reference::*;
    let dag = build_dag(3, TOPOLOGY);

    assert_eq!(dag.past_cone(K.into()).unwrap(), id_set(&[G, B, H, I, D, C, E]));
    assert_eq!(dag.future_cone(C.into()).unwrap(), id_set(&[H, F, K, J, M]));
    assert_eq!(dag.anticone(L.into()).unwrap(), id_set(&[C, B, H, F, K, J, M]));
    assert_eq!(dag.anticone_in_past(B.into(), K.into()).unwrap(), id_set(&[D, C, E, H, I]));
    assert!(dag.anticone_in_past(K.into(), K.into()).unwrap().is_empty());
    assert_eq!(
        dag.anticone_in_past(J.into(), M.into()),
        Err(ConsensusError::TraversalError(TraversalError::NotAnAncestor(J.into(), M.into())))
    );
    assert_eq!(dag.past_cone(99.into()), Err(ConsensusError::BlockNotFound(99.into())));

    assert!(dag.past_cone(G.into()).unwrap().is_empty());
    assert!(dag.future_cone(M.into()).unwrap().is_empty());

    // The point of view of M on H is H's own snapshot, while J is out of M's reach
    assert_eq!(dag.pov_of(M.into(), H.into()).unwrap(), Some(dag.local_blue_view(H.into()).unwrap()));
    assert_eq!(dag.pov_of(M.into(), M.into()).unwrap(), Some(dag.local_blue_view(M.into()).unwrap()));
    assert_eq!(dag.pov_of(M.into(), J.into()).unwrap(), None);
}

#[test]
fn k_zero_keeps_a_single_chain_test() {
    use reference::*;
    let dag = build_dag(0, TOPOLOGY);
    for (id, _) in TOPOLOGY.iter().skip(1) {
        let data = dag.ghostdag_data((*id).into()).unwrap();
        assert_eq!(data.mergeset_blues.len(), 1, "only the selected parent of {} may be blue", id);
        assert_eq!(data.blue_score, dag.selected_parent_chain((*id).into()).unwrap().len() as u64);
    }
}

#[test]
fn lower_key_wins_test() {
    // Two siblings merged under k=0: the lower (blue score, id) is selected, the other is red
    let dag = build_dag(0, &[(1, &[]), (2, &[1]), (3, &[1]), (4, &[3, 2])]);
    assert_eq!(dag.selected_parent(4.into()).unwrap(), Some(2.into()));
    assert_eq!(dag.ghostdag_data(4.into()).unwrap().mergeset_reds.to_vec(), ids(&[3]));
    assert_eq!(dag.blue_score(4.into()).unwrap(), 2);

    // Three siblings under k=1: the first candidate in ascending order takes the only free slot
    let dag = build_dag(1, &[(1, &[]), (2, &[1]), (3, &[1]), (4, &[1]), (5, &[2, 3, 4])]);
    let data = dag.ghostdag_data(5.into()).unwrap();
    assert_eq!(data.mergeset_blues.to_vec(), ids(&[2, 3]));
    assert_eq!(data.mergeset_reds.to_vec(), ids(&[4]));
    assert_eq!(data.blue_score, 3);
}

#[test]
fn redundant_parent_test() {
    // 2 is already in the past of 3, so it contributes nothing to the merge set of 4
    let dag = build_dag(3, &[(1, &[]), (2, &[1]), (3, &[2]), (4, &[2, 3])]);
    let data = dag.ghostdag_data(4.into()).unwrap();
    assert_eq!(data.selected_parent, Some(3.into()));
    assert_eq!(data.mergeset_size(), 1);
    assert_eq!(data.blue_score, 3);
    assert_eq!(dag.parents(4.into()).unwrap().to_vec(), ids(&[3, 2]));
}

#[test]
fn builder_rejects_malformed_topology_test() {
    let mut dag = BlockDag::with_k(3);
    let mut builder = DagBuilder::new(&mut dag);
    builder.add_block(DagBlock::new(1.into(), vec![]));
    assert!(builder.try_add_block(DagBlock::new(3.into(), vec![2.into()])).is_err());
    assert!(builder.try_add_block(DagBlock::new(VIRTUAL, vec![1.into()])).is_err());
    builder.add_block(DagBlock::new(2.into(), vec![1.into()]));
    assert_eq!(dag.blocks(), &ids(&[1, 2])[..]);
}

/// Checks the structural properties of every block of a random DAG
fn assert_dag_properties(dag: &BlockDag) {
    for id in dag.blocks().iter().copied() {
        let past = dag.past_cone(id).unwrap();
        let future = dag.future_cone(id).unwrap();
        assert!(!past.contains(&id) && !future.contains(&id), "block {} is in its own cone", id);

        let data = dag.ghostdag_data(id).unwrap();
        let Some(selected_parent) = data.selected_parent else {
            assert_eq!(Some(id), dag.genesis());
            assert_eq!(data.blue_score, 0);
            assert!(data.local_blue_view.is_empty());
            continue;
        };

        let parents = dag.parents(id).unwrap();
        assert_eq!(parents[0], selected_parent, "selected parent of {} must come first", id);
        let heaviest = parents.iter().copied().max_by_key(|p| (dag.blue_score(*p).unwrap(), Reverse(*p))).unwrap();
        assert_eq!(heaviest, selected_parent);

        let selected_parent_score = dag.blue_score(selected_parent).unwrap();
        assert_eq!(data.blue_score, selected_parent_score + data.mergeset_blues.len() as u64);
        assert!(data.blue_score > selected_parent_score);

        // The ordered merge set is exactly past(b) \ past(sp) and starts with the selected parent
        let sorted = dag.sorted_merge_set_with_sp(id).unwrap();
        assert_eq!(sorted[0], selected_parent);
        let selected_parent_past = dag.past_cone(selected_parent).unwrap();
        let expected: BlockIdSet = past.difference(&selected_parent_past).copied().collect();
        assert_eq!(sorted.iter().copied().collect::<BlockIdSet>(), expected);
        assert_eq!(dag.merge_set(id).unwrap(), expected);
        let keys = sorted[1..].iter().map(|b| (dag.blue_score(*b).unwrap(), *b)).collect_vec();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "merge set of {} is not ascending", id);

        // The local view covers the past exactly
        assert_eq!(data.local_blue_view.keys().copied().collect::<BlockIdSet>(), past);

        let order = dag.consensus_ordered_past(id).unwrap();
        assert_eq!(order.first().copied(), dag.genesis());
        assert_eq!(order.len(), past.len() + 1);
        assert_eq!(order.iter().copied().collect::<BlockIdSet>().len(), order.len());
        assert_eq!(order.last().copied(), Some(id));
        let position = |b: &BlockId| order.iter().position(|x| x == b).unwrap();
        assert!(dag.parents(id).unwrap().iter().all(|p| position(p) < position(&id)));
    }
}

/// No blue block in the virtual view has more than k blue blocks in its anticone
fn assert_k_cluster(dag: &mut BlockDag) {
    let k = dag.k() as usize;
    dag.with_virtual(|virtual_block| {
        let view = virtual_block.local_blue_view().clone();
        for blue in virtual_block.blue_blocks() {
            let anticone = virtual_block.dag().anticone_in_past(blue, VIRTUAL).unwrap();
            let blue_anticone_size = anticone.iter().filter(|x| view.get(*x).copied().unwrap_or(false)).count();
            assert!(blue_anticone_size <= k, "blue block {} has {} blues in its anticone (k={})", blue, blue_anticone_size, k);
        }
    })
    .unwrap();
}

#[test]
fn random_dag_properties_test() {
    for (seed, k) in (0..6u64).cartesian_product([0 as KType, 1, 3, 8]) {
        let topology = random_topology(seed, 70, 4, 8);
        let mut dag = BlockDag::with_k(k);
        DagBuilder::new(&mut dag).add_blocks(topology.clone());

        assert_dag_properties(&dag);
        assert_k_cluster(&mut dag);

        // Determinism: the same topology classifies bit-identically
        let mut again = BlockDag::with_k(k);
        DagBuilder::new(&mut again).add_blocks(topology);
        for id in dag.blocks().iter().copied() {
            assert_eq!(dag.ghostdag_data(id).unwrap(), again.ghostdag_data(id).unwrap(), "seed {} k {} block {}", seed, k, id);
            assert_eq!(dag.parents(id).unwrap(), again.parents(id).unwrap());
        }
    }
}

#[test]
fn virtual_non_interference_test() {
    let mut dag = BlockDag::with_k(2);
    DagBuilder::new(&mut dag).add_blocks(random_topology(11, 50, 3, 6));

    let tips = dag.current_tips().unwrap();
    let snapshot = dag.blocks().iter().map(|id| dag.block(*id).unwrap()).collect_vec();

    let virtual_score = dag.with_virtual(|virtual_block| virtual_block.blue_score()).unwrap();
    {
        let virtual_block = dag.create_virtual().unwrap();
        assert_eq!(virtual_block.blue_score(), virtual_score);
        assert_eq!(virtual_block.dag().current_tips().unwrap(), vec![VIRTUAL]);
        virtual_block.destroy();
    }

    assert_eq!(dag.current_tips().unwrap(), tips);
    assert_eq!(dag.blocks().iter().map(|id| dag.block(*id).unwrap()).collect_vec(), snapshot);
    assert_eq!(dag.block(VIRTUAL), Err(ConsensusError::BlockNotFound(VIRTUAL)));
}
