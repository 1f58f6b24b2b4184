use blockdag_consensus_core::{
    BlockId, BlockIdMap, BlockIds,
    errors::store::{StoreError, StoreResult},
};
use std::sync::Arc;

/// Reader API for `RelationsStore`.
pub trait RelationsStoreReader {
    fn get_parents(&self, id: BlockId) -> StoreResult<BlockIds>;
    fn get_children(&self, id: BlockId) -> StoreResult<BlockIds>;
    fn has(&self, id: BlockId) -> StoreResult<bool>;
}

/// Write API for `RelationsStore`. Inserting a block links it as a child of each of its
/// parents, so parents must be inserted first.
pub trait RelationsStore: RelationsStoreReader {
    fn insert(&mut self, id: BlockId, parents: BlockIds) -> StoreResult<()>;

    /// Removes `id` and unlinks it from its parents' children. Only ever applied to a block with no children.
    fn delete(&mut self, id: BlockId) -> StoreResult<()>;
}

/// An in-memory arena of parent/child adjacency keyed by block id. Children are
/// non-owning back-references which grow as later blocks are inserted.
#[derive(Clone, Default)]
pub struct MemoryRelationsStore {
    parents_map: BlockIdMap<BlockIds>,
    children_map: BlockIdMap<BlockIds>,
}

impl MemoryRelationsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parents_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents_map.is_empty()
    }
}

impl RelationsStoreReader for MemoryRelationsStore {
    fn get_parents(&self, id: BlockId) -> StoreResult<BlockIds> {
        self.parents_map.get(&id).cloned().ok_or_else(|| StoreError::KeyNotFound(id.to_string()))
    }

    fn get_children(&self, id: BlockId) -> StoreResult<BlockIds> {
        self.children_map.get(&id).cloned().ok_or_else(|| StoreError::KeyNotFound(id.to_string()))
    }

    fn has(&self, id: BlockId) -> StoreResult<bool> {
        Ok(self.parents_map.contains_key(&id))
    }
}

impl RelationsStore for MemoryRelationsStore {
    fn insert(&mut self, id: BlockId, parents: BlockIds) -> StoreResult<()> {
        if self.parents_map.contains_key(&id) {
            return Err(StoreError::KeyAlreadyExists(id.to_string()));
        }
        if let Some(missing) = parents.iter().find(|parent| !self.children_map.contains_key(*parent)) {
            return Err(StoreError::KeyNotFound(missing.to_string()));
        }

        for parent in parents.iter() {
            if let Some(children) = self.children_map.get_mut(parent) {
                BlockIds::make_mut(children).push(id);
            }
        }
        self.parents_map.insert(id, parents);
        self.children_map.insert(id, Arc::new(Vec::new()));
        Ok(())
    }

    fn delete(&mut self, id: BlockId) -> StoreResult<()> {
        let parents = self.parents_map.remove(&id).ok_or_else(|| StoreError::KeyNotFound(id.to_string()))?;
        self.children_map.remove(&id);
        for parent in parents.iter() {
            if let Some(children) = self.children_map.get_mut(parent) {
                BlockIds::make_mut(children).retain(|child| *child != id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u64]) -> BlockIds {
        Arc::new(values.iter().copied().map(BlockId::from).collect())
    }

    #[test]
    fn test_memory_relations_store() {
        let mut store = MemoryRelationsStore::new();
        store.insert(1.into(), ids(&[])).unwrap();
        store.insert(2.into(), ids(&[1])).unwrap();
        store.insert(3.into(), ids(&[1])).unwrap();
        store.insert(4.into(), ids(&[2, 3])).unwrap();

        assert_eq!(store.get_children(1.into()).unwrap(), ids(&[2, 3]));
        assert_eq!(store.get_children(3.into()).unwrap(), ids(&[4]));
        assert_eq!(store.get_parents(4.into()).unwrap(), ids(&[2, 3]));
        assert!(store.get_children(4.into()).unwrap().is_empty());
        assert_eq!(store.len(), 4);

        assert_eq!(store.insert(2.into(), ids(&[1])), Err(StoreError::KeyAlreadyExists("2".to_string())));
        assert_eq!(store.insert(5.into(), ids(&[9])), Err(StoreError::KeyNotFound("9".to_string())));
        assert!(!store.has(5.into()).unwrap());
    }

    #[test]
    fn test_delete_unlinks_children() {
        let mut store = MemoryRelationsStore::new();
        store.insert(1.into(), ids(&[])).unwrap();
        store.insert(2.into(), ids(&[1])).unwrap();
        store.insert(3.into(), ids(&[1])).unwrap();
        let children_before = store.get_children(2.into()).unwrap();

        store.insert(10.into(), ids(&[2, 3])).unwrap();
        assert_eq!(store.get_children(2.into()).unwrap(), ids(&[10]));
        // Previously handed out snapshots are unaffected by later writes
        assert!(children_before.is_empty());

        store.delete(10.into()).unwrap();
        assert!(store.get_children(2.into()).unwrap().is_empty());
        assert!(store.get_children(3.into()).unwrap().is_empty());
        assert_eq!(store.get_children(1.into()).unwrap(), ids(&[2, 3]));
        assert!(!store.has(10.into()).unwrap());
        assert!(store.delete(10.into()).is_err());
    }
}
