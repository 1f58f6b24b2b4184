use super::BlockDag;
use crate::model::stores::ghostdag::GhostdagData;
use blockdag_consensus_core::{
    BlockId, BlockIdMap, BlockIds, BlueView,
    blockid::VIRTUAL,
    errors::consensus::ConsensusResult,
};
use std::sync::Arc;

/// A scoped view of the DAG with an ephemeral virtual block merging all current tips.
///
/// The virtual block is linked as a child of every tip for as long as this guard lives, and is
/// detached from all of them on drop. Holding the guard borrows the DAG mutably, so no real block
/// can be added while it is alive.
pub struct VirtualBlock<'a> {
    dag: &'a mut BlockDag,
    ghostdag_data: Arc<GhostdagData>,
}

impl<'a> VirtualBlock<'a> {
    pub(super) fn new(dag: &'a mut BlockDag, ghostdag_data: Arc<GhostdagData>) -> Self {
        Self { dag, ghostdag_data }
    }

    pub fn id(&self) -> BlockId {
        VIRTUAL
    }

    /// Read access to the DAG, with the virtual block linked
    pub fn dag(&self) -> &BlockDag {
        self.dag
    }

    pub fn ghostdag_data(&self) -> &Arc<GhostdagData> {
        &self.ghostdag_data
    }

    pub fn blue_score(&self) -> u64 {
        self.ghostdag_data.blue_score
    }

    /// The sink among the tips the virtual block merges
    pub fn selected_parent(&self) -> Option<BlockId> {
        self.ghostdag_data.selected_parent
    }

    /// The tips at creation time, selected parent first
    pub fn parents(&self) -> ConsensusResult<BlockIds> {
        self.dag.parents(VIRTUAL)
    }

    /// The blue/red coloring of every block in the DAG as seen from the current tips
    pub fn local_blue_view(&self) -> &BlueView {
        &self.ghostdag_data.local_blue_view
    }

    pub fn blue_blocks(&self) -> Vec<BlockId> {
        self.colored_blocks(true)
    }

    pub fn red_blocks(&self) -> Vec<BlockId> {
        self.colored_blocks(false)
    }

    fn colored_blocks(&self, blue: bool) -> Vec<BlockId> {
        let mut blocks =
            self.ghostdag_data.local_blue_view.iter().filter(|(_, is_blue)| **is_blue == blue).map(|(id, _)| *id).collect::<Vec<_>>();
        blocks.sort();
        blocks
    }

    pub fn sorted_merge_set_without_sp(&self) -> ConsensusResult<Vec<BlockId>> {
        self.dag.sorted_merge_set_without_sp(VIRTUAL)
    }

    /// The consensus order over the whole DAG, excluding the virtual block itself
    pub fn consensus_order(&self) -> ConsensusResult<Vec<BlockId>> {
        let mut order = self.dag.consensus_ordered_past(VIRTUAL)?;
        order.retain(|id| !id.is_virtual());
        Ok(order)
    }

    pub fn all_selected_parents_pov(&self) -> ConsensusResult<BlockIdMap<bool>> {
        self.dag.all_selected_parents_pov(VIRTUAL)
    }

    /// Detaches the virtual block. Equivalent to dropping the guard.
    pub fn destroy(self) {}
}

impl Drop for VirtualBlock<'_> {
    fn drop(&mut self) {
        self.dag.detach_virtual();
    }
}
