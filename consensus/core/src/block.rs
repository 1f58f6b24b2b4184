use crate::BlockId;
use serde::{Deserialize, Serialize};

/// A block as supplied by a topology source: an id, a creation-time hint and its direct parents.
/// Only genesis has no parents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub timestamp: u64,
    pub parents: Vec<BlockId>,
}

impl Block {
    pub fn new(id: BlockId, timestamp: u64, parents: Vec<BlockId>) -> Self {
        Self { id, timestamp, parents }
    }

    pub fn genesis(id: BlockId, timestamp: u64) -> Self {
        Self { id, timestamp, parents: Vec::new() }
    }

    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }
}
