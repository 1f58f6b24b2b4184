pub mod virtual_block;

use crate::{
    model::{
        block_info::BlockInfo,
        stores::{
            ghostdag::{GhostdagData, GhostdagStore, GhostdagStoreReader, MemoryGhostdagStore},
            headers::{HeaderStore, HeaderStoreReader, MemoryHeadersStore},
            relations::{MemoryRelationsStore, RelationsStore, RelationsStoreReader},
        },
    },
    processes::{
        consensus_order::ConsensusOrderManager,
        ghostdag::{ordering::find_heaviest, protocol::GhostdagManager},
        traversal_manager::DagTraversalManager,
    },
};
use blockdag_consensus_core::{
    BlockId, BlockIdMap, BlockIdSet, BlockIds, BlueView, KType,
    block::Block,
    blockid::VIRTUAL,
    config::params::Params,
    errors::{
        block::{BlockProcessResult, RuleError},
        consensus::{ConsensusError, ConsensusResult},
        store::StoreResultExtensions,
    },
};
use blockdag_core::log::{debug, info, warn};
use std::sync::Arc;

pub use virtual_block::VirtualBlock;

/// An append-only block DAG which classifies every block on insertion.
///
/// Blocks live in id-keyed arena stores; parents and children are id lists, so the DAG owns all
/// blocks and children are plain back-references. Per-block GHOSTDAG data is computed once, when the
/// block is added, and never revisited.
pub struct BlockDag {
    params: Params,
    genesis: Option<BlockId>,
    /// Real blocks in insertion order
    blocks: Vec<BlockId>,

    // Stores
    relations_store: MemoryRelationsStore,
    ghostdag_store: MemoryGhostdagStore,
    headers_store: MemoryHeadersStore,
}

impl BlockDag {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            genesis: None,
            blocks: Vec::new(),
            relations_store: MemoryRelationsStore::new(),
            ghostdag_store: MemoryGhostdagStore::new(),
            headers_store: MemoryHeadersStore::new(),
        }
    }

    pub fn with_k(k: KType) -> Self {
        Self::new(Params::new(k))
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn k(&self) -> KType {
        self.params.k
    }

    pub fn genesis(&self) -> Option<BlockId> {
        self.genesis
    }

    /// Number of real blocks (the virtual block is never counted)
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        !id.is_virtual() && self.ghostdag_store.has(id).unwrap_or(false)
    }

    /// Real blocks in insertion order
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub(crate) fn ghostdag_manager(&self) -> GhostdagManager<'_, MemoryGhostdagStore, MemoryRelationsStore> {
        GhostdagManager::new(self.params.k, &self.ghostdag_store, &self.relations_store)
    }

    pub(crate) fn traversal_manager(&self) -> DagTraversalManager<'_, MemoryGhostdagStore, MemoryRelationsStore> {
        DagTraversalManager::new(&self.ghostdag_store, &self.relations_store)
    }

    pub(crate) fn consensus_order_manager(&self) -> ConsensusOrderManager<'_, MemoryGhostdagStore> {
        ConsensusOrderManager::new(&self.ghostdag_store)
    }

    /// Validates, classifies and links a new block. Parents must already be in the DAG. Nothing is
    /// written unless the whole pipeline succeeds.
    pub fn add_block(&mut self, block: Block) -> BlockProcessResult<Arc<GhostdagData>> {
        self.detach_virtual();
        let Block { id, timestamp, parents } = block;

        if id.is_virtual() {
            return Err(RuleError::ReservedId(id));
        }
        if self.ghostdag_store.has(id)? {
            return Err(RuleError::DuplicateBlock(id));
        }
        if parents.is_empty()
            && let Some(genesis) = self.genesis
        {
            return Err(RuleError::MultipleGenesis(id, genesis));
        }
        let mut seen = BlockIdSet::with_capacity(parents.len());
        for parent in parents.iter().copied() {
            if !seen.insert(parent) {
                return Err(RuleError::DuplicateParent(id, parent));
            }
            if !self.ghostdag_store.has(parent)? {
                return Err(RuleError::UnknownParent(id, parent));
            }
        }

        let ghostdag_data = Arc::new(self.ghostdag_manager().ghostdag(&parents)?);
        let parents = selected_parent_first(ghostdag_data.selected_parent, parents);

        self.relations_store.insert(id, BlockIds::new(parents))?;
        self.ghostdag_store.insert(id, ghostdag_data.clone())?;
        self.headers_store.insert(id, timestamp)?;
        self.blocks.push(id);

        match ghostdag_data.selected_parent {
            None => {
                self.genesis = Some(id);
                info!("Genesis block {} added (k={})", id, self.params.k);
            }
            Some(selected_parent) => debug!(
                "Block {} added: selected parent {}, blue score {}, {} blues and {} reds in merge set",
                id,
                selected_parent,
                ghostdag_data.blue_score,
                ghostdag_data.mergeset_blues.len(),
                ghostdag_data.mergeset_reds.len()
            ),
        }
        Ok(ghostdag_data)
    }

    /// Adds blocks in the given (topological) order, stopping at the first failure
    pub fn add_blocks(&mut self, blocks: impl IntoIterator<Item = Block>) -> BlockProcessResult<()> {
        for block in blocks {
            self.add_block(block)?;
        }
        Ok(())
    }

    fn validate_block_exists(&self, id: BlockId) -> ConsensusResult<()> {
        if self.ghostdag_store.has(id)? { Ok(()) } else { Err(ConsensusError::BlockNotFound(id)) }
    }

    pub fn block(&self, id: BlockId) -> ConsensusResult<BlockInfo> {
        self.validate_block_exists(id)?;
        Ok(BlockInfo {
            id,
            // The virtual block carries no header
            timestamp: self.headers_store.get_timestamp(id).optional()?.unwrap_or_default(),
            parents: self.relations_store.get_parents(id)?,
            children: self.relations_store.get_children(id)?,
            ghostdag: self.ghostdag_store.get_data(id)?,
        })
    }

    pub fn timestamp(&self, id: BlockId) -> ConsensusResult<u64> {
        self.validate_block_exists(id)?;
        Ok(self.headers_store.get_timestamp(id).optional()?.unwrap_or_default())
    }

    /// Direct parents with the selected parent first
    pub fn parents(&self, id: BlockId) -> ConsensusResult<BlockIds> {
        self.validate_block_exists(id)?;
        Ok(self.relations_store.get_parents(id)?)
    }

    pub fn children(&self, id: BlockId) -> ConsensusResult<BlockIds> {
        self.validate_block_exists(id)?;
        Ok(self.relations_store.get_children(id)?)
    }

    pub fn ghostdag_data(&self, id: BlockId) -> ConsensusResult<Arc<GhostdagData>> {
        self.validate_block_exists(id)?;
        Ok(self.ghostdag_store.get_data(id)?)
    }

    pub fn selected_parent(&self, id: BlockId) -> ConsensusResult<Option<BlockId>> {
        Ok(self.ghostdag_data(id)?.selected_parent)
    }

    pub fn blue_score(&self, id: BlockId) -> ConsensusResult<u64> {
        Ok(self.ghostdag_data(id)?.blue_score)
    }

    pub fn local_blue_view(&self, id: BlockId) -> ConsensusResult<BlueView> {
        Ok(self.ghostdag_data(id)?.local_blue_view.clone())
    }

    /// The merge set of `id` including its selected parent, unordered
    pub fn merge_set(&self, id: BlockId) -> ConsensusResult<BlockIdSet> {
        Ok(self.ghostdag_data(id)?.unordered_mergeset().collect())
    }

    /// The merge set without the selected parent, ascending by (blue score, id)
    pub fn sorted_merge_set_without_sp(&self, id: BlockId) -> ConsensusResult<Vec<BlockId>> {
        let data = self.ghostdag_data(id)?;
        Ok(data.ascending_mergeset_without_selected_parent(&self.ghostdag_store)?.into_iter().map(|block| block.id).collect())
    }

    /// The selected parent followed by [`Self::sorted_merge_set_without_sp`]
    pub fn sorted_merge_set_with_sp(&self, id: BlockId) -> ConsensusResult<Vec<BlockId>> {
        Ok(self.ghostdag_data(id)?.ascending_mergeset(&self.ghostdag_store)?)
    }

    pub fn past_cone(&self, id: BlockId) -> ConsensusResult<BlockIdSet> {
        self.validate_block_exists(id)?;
        Ok(self.traversal_manager().past_cone(id)?)
    }

    pub fn future_cone(&self, id: BlockId) -> ConsensusResult<BlockIdSet> {
        self.validate_block_exists(id)?;
        Ok(self.traversal_manager().future_cone(id)?)
    }

    pub fn anticone(&self, id: BlockId) -> ConsensusResult<BlockIdSet> {
        self.validate_block_exists(id)?;
        Ok(self.traversal_manager().anticone(id)?)
    }

    /// See [`DagTraversalManager::anticone_in_past`]
    pub fn anticone_in_past(&self, id: BlockId, reference: BlockId) -> ConsensusResult<BlockIdSet> {
        self.validate_block_exists(id)?;
        self.validate_block_exists(reference)?;
        Ok(self.traversal_manager().anticone_in_past(id, reference)?)
    }

    fn all_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        let virtual_block = self.relations_store.has(VIRTUAL).unwrap_or(false).then_some(VIRTUAL);
        self.blocks.iter().copied().chain(virtual_block)
    }

    /// Blocks without children, in insertion order. While a virtual block is alive it is the only tip.
    pub fn current_tips(&self) -> ConsensusResult<Vec<BlockId>> {
        let mut tips = Vec::new();
        for id in self.all_ids() {
            if self.relations_store.get_children(id)?.is_empty() {
                tips.push(id);
            }
        }
        Ok(tips)
    }

    /// The block with the highest blue score, ties broken by the lowest id
    pub fn find_sink(&self) -> ConsensusResult<BlockId> {
        find_heaviest(&self.ghostdag_store, self.all_ids())?.ok_or(ConsensusError::EmptyDag)
    }

    /// See [`ConsensusOrderManager::selected_parent_chain`]
    pub fn selected_parent_chain(&self, id: BlockId) -> ConsensusResult<Vec<BlockId>> {
        self.validate_block_exists(id)?;
        Ok(self.consensus_order_manager().selected_parent_chain(id)?)
    }

    /// See [`ConsensusOrderManager::consensus_ordered_past`]
    pub fn consensus_ordered_past(&self, id: BlockId) -> ConsensusResult<Vec<BlockId>> {
        self.validate_block_exists(id)?;
        Ok(self.consensus_order_manager().consensus_ordered_past(id)?)
    }

    /// See [`ConsensusOrderManager::all_selected_parents_pov`]
    pub fn all_selected_parents_pov(&self, id: BlockId) -> ConsensusResult<BlockIdMap<bool>> {
        self.validate_block_exists(id)?;
        Ok(self.consensus_order_manager().all_selected_parents_pov(id)?)
    }

    /// The coloring `from` recorded for `target` at classification time: the local blue view of
    /// `target` if it lies in `past(from) ∪ {from}`, `None` otherwise
    pub fn pov_of(&self, from: BlockId, target: BlockId) -> ConsensusResult<Option<BlueView>> {
        self.validate_block_exists(from)?;
        self.validate_block_exists(target)?;
        if from != target && !self.traversal_manager().past_cone(from)?.contains(&target) {
            return Ok(None);
        }
        Ok(Some(self.ghostdag_store.get_local_blue_view(target)?))
    }

    /// Classifies and links an ephemeral virtual block on top of the current tips. The returned guard
    /// detaches it again when dropped.
    pub fn create_virtual(&mut self) -> ConsensusResult<VirtualBlock<'_>> {
        self.detach_virtual();
        let tips = self.current_tips()?;
        if tips.is_empty() {
            return Err(ConsensusError::EmptyDag);
        }

        let ghostdag_data = Arc::new(self.ghostdag_manager().ghostdag(&tips)?);
        let tip_count = tips.len();
        let parents = selected_parent_first(ghostdag_data.selected_parent, tips);
        self.relations_store.insert(VIRTUAL, BlockIds::new(parents))?;
        self.ghostdag_store.insert(VIRTUAL, ghostdag_data.clone())?;
        info!("Virtual block created on top of {} tips with blue score {}", tip_count, ghostdag_data.blue_score);

        Ok(VirtualBlock::new(self, ghostdag_data))
    }

    /// Runs `f` against a freshly created virtual block, which is detached before returning
    pub fn with_virtual<R>(&mut self, f: impl FnOnce(&VirtualBlock<'_>) -> R) -> ConsensusResult<R> {
        let virtual_block = self.create_virtual()?;
        Ok(f(&virtual_block))
    }

    /// Unlinks the virtual block from its parents and removes its data, if present.
    /// Returns whether a virtual block was detached.
    pub(crate) fn detach_virtual(&mut self) -> bool {
        if !self.relations_store.has(VIRTUAL).unwrap_or(false) {
            return false;
        }
        if let Err(err) = self.relations_store.delete(VIRTUAL) {
            warn!("Failed unlinking the virtual block: {}", err);
        }
        if let Err(err) = self.ghostdag_store.delete(VIRTUAL) {
            warn!("Failed removing virtual block data: {}", err);
        }
        info!("Virtual block destroyed");
        true
    }
}

/// Reorders `parents` so that `selected_parent` comes first, keeping the relative order of the rest
fn selected_parent_first(selected_parent: Option<BlockId>, parents: Vec<BlockId>) -> Vec<BlockId> {
    match selected_parent {
        Some(selected_parent) => {
            std::iter::once(selected_parent).chain(parents.into_iter().filter(|parent| *parent != selected_parent)).collect()
        }
        None => parents,
    }
}
