use crate::{
    BlockId,
    errors::{store::StoreError, traversal::TraversalError},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("block {0} has no parents but genesis {1} already exists")]
    MultipleGenesis(BlockId, BlockId),

    #[error("block {0} already exists")]
    DuplicateBlock(BlockId),

    #[error("id {0} is reserved for the virtual block")]
    ReservedId(BlockId),

    #[error("block {0} references unknown parent {1}")]
    UnknownParent(BlockId, BlockId),

    #[error("block {0} lists parent {1} more than once")]
    DuplicateParent(BlockId, BlockId),

    #[error("data store error")]
    StoreError(#[from] StoreError),

    #[error("traversal error")]
    TraversalError(#[from] TraversalError),
}

pub type BlockProcessResult<T> = std::result::Result<T, RuleError>;
