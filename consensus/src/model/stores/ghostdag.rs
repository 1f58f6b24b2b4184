use crate::processes::ghostdag::ordering::SortableBlock;

use blockdag_consensus_core::{
    BlockId, BlockIdMap, BlockIds, BlueView,
    errors::store::{StoreError, StoreResult},
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostdagData {
    pub blue_score: u64,
    /// `None` only for genesis
    pub selected_parent: Option<BlockId>,
    /// The selected parent followed by the blue merge set candidates in ascending (blue score, id) order
    pub mergeset_blues: BlockIds,
    /// The red merge set candidates in ascending (blue score, id) order
    pub mergeset_reds: BlockIds,
    /// Blue/red coloring of every block in this block's past, captured once at classification time
    pub local_blue_view: BlueView,
}

impl GhostdagData {
    pub fn new(
        blue_score: u64,
        selected_parent: Option<BlockId>,
        mergeset_blues: BlockIds,
        mergeset_reds: BlockIds,
        local_blue_view: BlueView,
    ) -> Self {
        Self { blue_score, selected_parent, mergeset_blues, mergeset_reds, local_blue_view }
    }

    pub fn new_genesis() -> Self {
        Self {
            blue_score: 0,
            selected_parent: None,
            mergeset_blues: Default::default(),
            mergeset_reds: Default::default(),
            local_blue_view: Default::default(),
        }
    }

    /// Starts the classification of a new block on top of `selected_parent`. The view inherits
    /// the selected parent's own view and marks the selected parent blue.
    pub fn new_with_selected_parent(selected_parent: BlockId, selected_parent_view: &BlueView) -> Self {
        let mergeset_blues = vec![selected_parent];

        let mut local_blue_view = BlockIdMap::clone(selected_parent_view);
        local_blue_view.insert(selected_parent, true);

        Self {
            blue_score: Default::default(),
            selected_parent: Some(selected_parent),
            mergeset_blues: BlockIds::new(mergeset_blues),
            mergeset_reds: Default::default(),
            local_blue_view: BlueView::new(local_blue_view),
        }
    }

    pub fn mergeset_size(&self) -> usize {
        self.mergeset_blues.len() + self.mergeset_reds.len()
    }

    pub fn is_genesis(&self) -> bool {
        self.selected_parent.is_none()
    }

    /// Whether `block` is marked blue in this block's view. Blocks outside the past are never blue.
    pub fn is_blue(&self, block: BlockId) -> bool {
        self.local_blue_view.get(&block).copied().unwrap_or(false)
    }

    /// Returns an iterator to the mergeset with no specified order (including the selected parent)
    pub fn unordered_mergeset(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.mergeset_blues.iter().copied().chain(self.mergeset_reds.iter().copied())
    }

    /// Returns an iterator to the mergeset with no specified order (excluding the selected parent)
    pub fn unordered_mergeset_without_selected_parent(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.mergeset_blues
            .iter()
            .skip(1) // Skip the selected parent
            .copied()
            .chain(self.mergeset_reds.iter().copied())
    }

    /// Returns the mergeset in ascending (blue score, id) order, excluding the selected parent. This is
    /// the exact order in which the candidates were classified.
    pub fn ascending_mergeset_without_selected_parent(
        &self,
        store: &(impl GhostdagStoreReader + ?Sized),
    ) -> StoreResult<Vec<SortableBlock>> {
        let to_sortable = |id: &BlockId| store.get_blue_score(*id).map(|blue_score| SortableBlock::new(*id, blue_score));
        let blues = self.mergeset_blues.iter().skip(1).map(to_sortable).collect::<StoreResult<Vec<_>>>()?;
        let reds = self.mergeset_reds.iter().map(to_sortable).collect::<StoreResult<Vec<_>>>()?;

        // Blues and reds are each stored in ascending order, so a merge join restores the full order
        Ok(blues.into_iter().merge_join_by(reds, |a, b| a.cmp(b)).map(|r| r.reduce(|block, _| block)).collect())
    }

    /// The selected parent followed by the ascending mergeset
    pub fn ascending_mergeset(&self, store: &(impl GhostdagStoreReader + ?Sized)) -> StoreResult<Vec<BlockId>> {
        Ok(self
            .selected_parent
            .into_iter()
            .chain(self.ascending_mergeset_without_selected_parent(store)?.into_iter().map(|block| block.id))
            .collect())
    }
}

impl GhostdagData {
    pub fn add_blue(self: &mut Arc<Self>, block: BlockId) {
        let data = Arc::make_mut(self);
        BlockIds::make_mut(&mut data.mergeset_blues).push(block);
        BlueView::make_mut(&mut data.local_blue_view).insert(block, true);
    }

    pub fn add_red(self: &mut Arc<Self>, block: BlockId) {
        let data = Arc::make_mut(self);
        BlockIds::make_mut(&mut data.mergeset_reds).push(block);
        BlueView::make_mut(&mut data.local_blue_view).insert(block, false);
    }

    /// Tentatively marks all merge set candidates red before any of them is classified
    pub fn mark_candidates_red(self: &mut Arc<Self>, candidates: &[BlockId]) {
        let view = BlueView::make_mut(&mut Arc::make_mut(self).local_blue_view);
        for candidate in candidates {
            view.insert(*candidate, false);
        }
    }

    pub fn finalize_score(self: &mut Arc<Self>, blue_score: u64) {
        Arc::make_mut(self).blue_score = blue_score;
    }
}

pub trait GhostdagStoreReader {
    fn get_blue_score(&self, id: BlockId) -> StoreResult<u64>;
    fn get_selected_parent(&self, id: BlockId) -> StoreResult<Option<BlockId>>;
    fn get_mergeset_blues(&self, id: BlockId) -> StoreResult<BlockIds>;
    fn get_mergeset_reds(&self, id: BlockId) -> StoreResult<BlockIds>;
    fn get_local_blue_view(&self, id: BlockId) -> StoreResult<BlueView>;

    /// Returns full block data for the requested id
    fn get_data(&self, id: BlockId) -> StoreResult<Arc<GhostdagData>>;

    /// Check if the store contains data for the requested id
    fn has(&self, id: BlockId) -> StoreResult<bool>;
}

pub trait GhostdagStore: GhostdagStoreReader {
    /// Insert GHOSTDAG data for block `id` into the store. Data of a real block is added once and
    /// never modified.
    fn insert(&mut self, id: BlockId, data: Arc<GhostdagData>) -> StoreResult<()>;

    /// Only used for tearing down the ephemeral virtual block
    fn delete(&mut self, id: BlockId) -> StoreResult<()>;
}

/// An in-memory implementation of `GhostdagStore` keyed by block id
#[derive(Clone, Default)]
pub struct MemoryGhostdagStore {
    data_map: BlockIdMap<Arc<GhostdagData>>,
}

impl MemoryGhostdagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, id: BlockId) -> StoreResult<&Arc<GhostdagData>> {
        self.data_map.get(&id).ok_or_else(|| StoreError::KeyNotFound(id.to_string()))
    }
}

impl GhostdagStoreReader for MemoryGhostdagStore {
    fn get_blue_score(&self, id: BlockId) -> StoreResult<u64> {
        Ok(self.read(id)?.blue_score)
    }

    fn get_selected_parent(&self, id: BlockId) -> StoreResult<Option<BlockId>> {
        Ok(self.read(id)?.selected_parent)
    }

    fn get_mergeset_blues(&self, id: BlockId) -> StoreResult<BlockIds> {
        Ok(Arc::clone(&self.read(id)?.mergeset_blues))
    }

    fn get_mergeset_reds(&self, id: BlockId) -> StoreResult<BlockIds> {
        Ok(Arc::clone(&self.read(id)?.mergeset_reds))
    }

    fn get_local_blue_view(&self, id: BlockId) -> StoreResult<BlueView> {
        Ok(Arc::clone(&self.read(id)?.local_blue_view))
    }

    fn get_data(&self, id: BlockId) -> StoreResult<Arc<GhostdagData>> {
        self.read(id).cloned()
    }

    fn has(&self, id: BlockId) -> StoreResult<bool> {
        Ok(self.data_map.contains_key(&id))
    }
}

impl GhostdagStore for MemoryGhostdagStore {
    fn insert(&mut self, id: BlockId, data: Arc<GhostdagData>) -> StoreResult<()> {
        if self.data_map.contains_key(&id) {
            return Err(StoreError::KeyAlreadyExists(id.to_string()));
        }
        self.data_map.insert(id, data);
        Ok(())
    }

    fn delete(&mut self, id: BlockId) -> StoreResult<()> {
        self.data_map.remove(&id).map(|_| ()).ok_or_else(|| StoreError::KeyNotFound(id.to_string()))
    }
}
