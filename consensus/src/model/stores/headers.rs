use blockdag_consensus_core::{
    BlockId, BlockIdMap,
    errors::store::{StoreError, StoreResult},
};

pub trait HeaderStoreReader {
    fn get_timestamp(&self, id: BlockId) -> StoreResult<u64>;
    fn has(&self, id: BlockId) -> StoreResult<bool>;
}

pub trait HeaderStore: HeaderStoreReader {
    // This is append only
    fn insert(&mut self, id: BlockId, timestamp: u64) -> StoreResult<()>;
}

/// An in-memory implementation of `HeaderStore`. Only the creation-time hint is kept
/// since block identity is carried by the id itself.
#[derive(Clone, Default)]
pub struct MemoryHeadersStore {
    timestamps: BlockIdMap<u64>,
}

impl MemoryHeadersStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeaderStoreReader for MemoryHeadersStore {
    fn get_timestamp(&self, id: BlockId) -> StoreResult<u64> {
        self.timestamps.get(&id).copied().ok_or_else(|| StoreError::KeyNotFound(id.to_string()))
    }

    fn has(&self, id: BlockId) -> StoreResult<bool> {
        Ok(self.timestamps.contains_key(&id))
    }
}

impl HeaderStore for MemoryHeadersStore {
    fn insert(&mut self, id: BlockId, timestamp: u64) -> StoreResult<()> {
        if self.timestamps.contains_key(&id) {
            return Err(StoreError::KeyAlreadyExists(id.to_string()));
        }
        self.timestamps.insert(id, timestamp);
        Ok(())
    }
}
