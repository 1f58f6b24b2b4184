use crate::model::stores::ghostdag::GhostdagStoreReader;
use blockdag_consensus_core::{BlockId, BlockIdMap, errors::store::StoreResult};

/// Read-side linearization of a block's history along its selected parent chain
pub struct ConsensusOrderManager<'a, T: GhostdagStoreReader> {
    ghostdag_store: &'a T,
}

impl<'a, T: GhostdagStoreReader> ConsensusOrderManager<'a, T> {
    pub fn new(ghostdag_store: &'a T) -> Self {
        Self { ghostdag_store }
    }

    /// Ancestors along the selected parent chain of `block`, nearest first, ending at genesis.
    /// `block` itself is not included.
    pub fn selected_parent_chain(&self, block: BlockId) -> StoreResult<Vec<BlockId>> {
        let mut chain = Vec::new();
        let mut current = block;
        while let Some(selected_parent) = self.ghostdag_store.get_selected_parent(current)? {
            chain.push(selected_parent);
            current = selected_parent;
        }
        Ok(chain)
    }

    /// Genesis-first total order over `block` and its past. Each link of the selected parent chain is
    /// preceded by its own merge set (without the selected parent) in ascending (blue score, id) order,
    /// so every block appears after all of its parents.
    pub fn consensus_ordered_past(&self, block: BlockId) -> StoreResult<Vec<BlockId>> {
        let mut reversed = Vec::new();
        let mut current = Some(block);
        while let Some(link) = current {
            let data = self.ghostdag_store.get_data(link)?;
            let mergeset = data.ascending_mergeset_without_selected_parent(self.ghostdag_store)?;
            reversed.push(link);
            reversed.extend(mergeset.iter().rev().map(|block| block.id));
            current = data.selected_parent;
        }
        reversed.reverse();
        Ok(reversed)
    }

    /// Folds the local blue views along the selected parent chain of `block`, from genesis towards
    /// `block`, letting views closer to `block` overwrite older entries
    pub fn all_selected_parents_pov(&self, block: BlockId) -> StoreResult<BlockIdMap<bool>> {
        let mut pov = BlockIdMap::new();
        for ancestor in self.selected_parent_chain(block)?.into_iter().rev() {
            let view = self.ghostdag_store.get_local_blue_view(ancestor)?;
            pov.extend(view.iter().map(|(id, is_blue)| (*id, *is_blue)));
        }
        Ok(pov)
    }
}
