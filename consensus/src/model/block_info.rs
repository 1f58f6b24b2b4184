use crate::model::stores::ghostdag::GhostdagData;
use blockdag_consensus_core::{BlockId, BlockIds};
use std::sync::Arc;

/// A read-only snapshot of a finalized block and its consensus attributes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub id: BlockId,
    pub timestamp: u64,
    /// Direct parents, with the selected parent (if any) at index 0
    pub parents: BlockIds,
    pub children: BlockIds,
    pub ghostdag: Arc<GhostdagData>,
}

impl BlockInfo {
    pub fn selected_parent(&self) -> Option<BlockId> {
        self.ghostdag.selected_parent
    }

    pub fn blue_score(&self) -> u64 {
        self.ghostdag.blue_score
    }

    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }
}
