use std::sync::Arc;

use blockdag_consensus_core::{BlockId, BlockIdMap, BlockIdSet, KType, errors::traversal::TraversalResult};
use blockdag_core::log::trace;
use itertools::Itertools;

use crate::{
    model::stores::{
        ghostdag::{GhostdagData, GhostdagStoreReader},
        relations::RelationsStoreReader,
    },
    processes::traversal_manager::DagTraversalManager,
};

/// Classifies blocks by the PHANTOM k-cluster rule. Borrows the stores for the duration of one
/// query; all parents of a block passed to [`GhostdagManager::ghostdag`] must already be classified.
pub struct GhostdagManager<'a, T: GhostdagStoreReader, S: RelationsStoreReader> {
    pub(super) k: KType,
    pub(super) ghostdag_store: &'a T,
    pub(super) relations_store: &'a S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColoringOutput {
    Blue,
    Red,
}

impl<'a, T: GhostdagStoreReader, S: RelationsStoreReader> GhostdagManager<'a, T, S> {
    pub fn new(k: KType, ghostdag_store: &'a T, relations_store: &'a S) -> Self {
        Self { k, ghostdag_store, relations_store }
    }

    pub fn k(&self) -> KType {
        self.k
    }

    pub fn genesis_ghostdag_data(&self) -> GhostdagData {
        GhostdagData::new_genesis()
    }

    pub(super) fn traversal_manager(&self) -> DagTraversalManager<'a, T, S> {
        DagTraversalManager::new(self.ghostdag_store, self.relations_store)
    }

    /// Runs the GHOSTDAG protocol and calculates the block GhostdagData by the given parents.
    /// The function calculates mergeset blues by iterating over the blocks in
    /// the anticone of the new block selected parent (which is the parent with the
    /// highest blue score, ties broken by the lowest id) and adds any block to the
    /// blue set if by adding it these conditions will not be violated:
    ///
    /// 1) |anticone-of-candidate-block ∩ blue-set-of-new-block| ≤ K
    ///
    /// 2) For every blue block in blue-set-of-new-block:
    ///    |(anticone-of-blue-block ∩ blue-set-new-block) ∪ {candidate-block}| ≤ K.
    ///    We validate this condition by checking every blue block in the anticone of the candidate,
    ///    since only those gain the candidate as a new blue anticone member.
    ///
    /// Candidates are visited in ascending (blue score, id) order and the blue set grows as they
    /// are accepted, so the order is part of the result. Anticones are confined to the past of
    /// the new block, which is all the classification can observe.
    ///
    /// An empty `parents` slice yields the genesis data.
    pub fn ghostdag(&self, parents: &[BlockId]) -> TraversalResult<GhostdagData> {
        let Some(selected_parent) = self.find_selected_parent(parents.iter().copied())? else {
            return Ok(self.genesis_ghostdag_data());
        };

        let selected_parent_data = self.ghostdag_store.get_data(selected_parent)?;
        let ordered_mergeset = self.ordered_mergeset_without_selected_parent(selected_parent, parents)?;
        let past = self.traversal_manager().past_of_parents(parents)?;

        let mut new_block_data =
            Arc::new(GhostdagData::new_with_selected_parent(selected_parent, &selected_parent_data.local_blue_view));
        new_block_data.mark_candidates_red(&ordered_mergeset);

        // Anticones within `past` stay fixed throughout this classification, so they are computed at most once
        let mut anticones = BlockIdMap::new();
        for candidate in ordered_mergeset {
            match self.check_blue_candidate(&new_block_data, candidate, &past, &mut anticones)? {
                ColoringOutput::Blue => new_block_data.add_blue(candidate),
                ColoringOutput::Red => new_block_data.add_red(candidate),
            }
        }

        // The selected parent leads `mergeset_blues` and accounts for the +1
        let blue_score = selected_parent_data.blue_score + new_block_data.mergeset_blues.len() as u64;
        new_block_data.finalize_score(blue_score);

        Ok(Arc::unwrap_or_clone(new_block_data))
    }

    fn check_blue_candidate(
        &self,
        new_block_data: &GhostdagData,
        candidate: BlockId,
        past: &BlockIdSet,
        anticones: &mut BlockIdMap<BlockIdSet>,
    ) -> TraversalResult<ColoringOutput> {
        let k = self.k as usize;

        let blues_in_candidate_anticone = self
            .cached_anticone(candidate, past, anticones)?
            .iter()
            .copied()
            .filter(|block| new_block_data.is_blue(*block))
            .sorted()
            .collect_vec();
        if blues_in_candidate_anticone.len() > k {
            trace!(
                "candidate {} is red: {} blues in its anticone exceed k={}",
                candidate,
                blues_in_candidate_anticone.len(),
                self.k
            );
            return Ok(ColoringOutput::Red);
        }

        // Accepting the candidate grows the blue anticone of every blue block in its anticone by one
        for blue in blues_in_candidate_anticone {
            let blue_anticone_size =
                self.cached_anticone(blue, past, anticones)?.iter().filter(|block| new_block_data.is_blue(**block)).count();
            if blue_anticone_size + 1 > k {
                trace!(
                    "candidate {} is red: blue block {} already has {} blues in its anticone (k={})",
                    candidate,
                    blue,
                    blue_anticone_size,
                    self.k
                );
                return Ok(ColoringOutput::Red);
            }
        }

        trace!("candidate {} is blue", candidate);
        Ok(ColoringOutput::Blue)
    }

    fn cached_anticone<'c>(
        &self,
        block: BlockId,
        past: &BlockIdSet,
        anticones: &'c mut BlockIdMap<BlockIdSet>,
    ) -> TraversalResult<&'c BlockIdSet> {
        if !anticones.contains_key(&block) {
            let anticone = self.traversal_manager().anticone_within(block, past)?;
            anticones.insert(block, anticone);
        }
        Ok(&anticones[&block])
    }
}
