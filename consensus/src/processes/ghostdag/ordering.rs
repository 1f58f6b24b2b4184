use super::protocol::GhostdagManager;
use crate::model::stores::{ghostdag::GhostdagStoreReader, relations::RelationsStoreReader};
use blockdag_consensus_core::{BlockId, errors::store::StoreResult};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

/// A block keyed by (blue score, id). Ascending order is the merge set classification order.
#[derive(Clone, Copy, Debug, Eq, Serialize, Deserialize)]
pub struct SortableBlock {
    pub id: BlockId,
    pub blue_score: u64,
}

impl SortableBlock {
    pub fn new(id: BlockId, blue_score: u64) -> Self {
        Self { id, blue_score }
    }
}

impl PartialEq for SortableBlock {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl PartialOrd for SortableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.blue_score.cmp(&other.blue_score).then_with(|| self.id.cmp(&other.id))
    }
}

/// Picks the block with the highest blue score, breaking ties in favor of the lowest id.
///
/// This is the single comparator behind both selected parent choice and sink selection.
pub fn select_heaviest(candidates: impl IntoIterator<Item = SortableBlock>) -> Option<BlockId> {
    candidates.into_iter().max_by_key(|block| (block.blue_score, Reverse(block.id))).map(|block| block.id)
}

/// Reads blue scores for `blocks` and returns the heaviest one, if any
pub fn find_heaviest(
    store: &(impl GhostdagStoreReader + ?Sized),
    blocks: impl IntoIterator<Item = BlockId>,
) -> StoreResult<Option<BlockId>> {
    let candidates = blocks
        .into_iter()
        .map(|id| store.get_blue_score(id).map(|blue_score| SortableBlock::new(id, blue_score)))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(select_heaviest(candidates))
}

impl<T: GhostdagStoreReader, S: RelationsStoreReader> GhostdagManager<'_, T, S> {
    pub fn find_selected_parent(&self, parents: impl IntoIterator<Item = BlockId>) -> StoreResult<Option<BlockId>> {
        find_heaviest(self.ghostdag_store, parents)
    }

    /// Sorts `blocks` ascending by (blue score, id)
    pub fn sort_blocks(&self, blocks: impl IntoIterator<Item = BlockId>) -> StoreResult<Vec<BlockId>> {
        let mut sorted_blocks = blocks
            .into_iter()
            .map(|id| self.ghostdag_store.get_blue_score(id).map(|blue_score| SortableBlock::new(id, blue_score)))
            .collect::<StoreResult<Vec<_>>>()?;
        sorted_blocks.sort();
        Ok(sorted_blocks.into_iter().map(|block| block.id).collect())
    }
}
