//!
//! Test utilities for building DAGs
//!

use crate::consensus::BlockDag;
use blockdag_consensus_core::{BlockId, KType, block::Block, errors::block::BlockProcessResult};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

/// A block described only by its id and parents
#[derive(Clone, Debug)]
pub struct DagBlock {
    pub id: BlockId,
    pub parents: Vec<BlockId>,
}

impl DagBlock {
    pub fn new(id: BlockId, parents: Vec<BlockId>) -> Self {
        Self { id, parents }
    }
}

impl From<DagBlock> for Block {
    fn from(block: DagBlock) -> Self {
        Block::new(block.id, 0, block.parents)
    }
}

/// A struct with fluent API to streamline DAG building. Timestamps follow insertion order.
pub struct DagBuilder<'a> {
    dag: &'a mut BlockDag,
}

impl<'a> DagBuilder<'a> {
    pub fn new(dag: &'a mut BlockDag) -> Self {
        Self { dag }
    }

    pub fn add_block(&mut self, block: DagBlock) -> &mut Self {
        self.try_add_block(block).unwrap();
        self
    }

    pub fn try_add_block(&mut self, block: DagBlock) -> BlockProcessResult<()> {
        let timestamp = self.dag.len() as u64;
        self.dag.add_block(Block::new(block.id, timestamp, block.parents))?;
        Ok(())
    }

    pub fn add_blocks(&mut self, blocks: impl IntoIterator<Item = DagBlock>) -> &mut Self {
        for block in blocks {
            self.add_block(block);
        }
        self
    }
}

/// Builds a DAG with the given `k` out of `(id, parents)` pairs listed in topological order
pub fn build_dag(k: KType, blocks: &[(u64, &[u64])]) -> BlockDag {
    let mut dag = BlockDag::with_k(k);
    DagBuilder::new(&mut dag)
        .add_blocks(blocks.iter().map(|(id, parents)| DagBlock::new((*id).into(), parents.iter().map(|p| (*p).into()).collect())));
    dag
}

/// Generates a random topology of `num_blocks` blocks in topological order. Block ids are a random
/// permutation of `1..=num_blocks`, so insertion order and id order disagree. Each block picks up
/// to `max_parents` distinct parents among the most recent `window` blocks, which keeps the DAG
/// narrow enough to produce non-trivial anticones.
pub fn random_topology(seed: u64, num_blocks: usize, max_parents: usize, window: usize) -> Vec<DagBlock> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids: Vec<BlockId> = (1..=num_blocks as u64).map(BlockId::from).collect();
    ids.shuffle(&mut rng);

    let mut blocks: Vec<DagBlock> = Vec::with_capacity(num_blocks);
    for (i, id) in ids.iter().copied().enumerate() {
        if i == 0 {
            blocks.push(DagBlock::new(id, vec![]));
            continue;
        }
        let recent = &ids[i.saturating_sub(window.max(1))..i];
        let num_parents = rng.gen_range(1..=max_parents.max(1).min(recent.len()));
        let parents = recent.choose_multiple(&mut rng, num_parents).copied().collect();
        blocks.push(DagBlock::new(id, parents));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_topology_is_valid() {
        let blocks = random_topology(7, 60, 4, 6);
        assert_eq!(blocks.len(), 60);
        assert_eq!(blocks.iter().filter(|b| b.parents.is_empty()).count(), 1);

        let mut seen = HashSet::new();
        for block in blocks.iter() {
            assert!(block.parents.iter().all(|p| seen.contains(p)), "parents of {} must precede it", block.id);
            assert_eq!(block.parents.iter().collect::<HashSet<_>>().len(), block.parents.len());
            assert!(block.parents.len() <= 4);
            seen.insert(block.id);
        }

        // Same seed, same topology
        let again = random_topology(7, 60, 4, 6);
        assert!(blocks.iter().zip(again.iter()).all(|(a, b)| a.id == b.id && a.parents == b.parents));
    }

    #[test]
    fn test_dag_builder() {
        let dag = build_dag(2, &[(10, &[]), (20, &[10]), (30, &[10]), (40, &[30, 20])]);
        assert_eq!(dag.len(), 4);
        assert_eq!(dag.genesis(), Some(10.into()));
        assert_eq!(dag.timestamp(40.into()).unwrap(), 3);
        // Equal blue scores tie-break to the lower id
        assert_eq!(dag.selected_parent(40.into()).unwrap(), Some(20.into()));
        assert_eq!(dag.parents(40.into()).unwrap().as_slice(), &[BlockId::from(20), BlockId::from(30)]);
    }
}
