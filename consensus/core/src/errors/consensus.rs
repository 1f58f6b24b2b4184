use crate::{
    BlockId,
    errors::{block::RuleError, store::StoreError, traversal::TraversalError},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("couldn't find block {0}")]
    BlockNotFound(BlockId),

    #[error("the DAG has no blocks")]
    EmptyDag,

    #[error(transparent)]
    RuleError(#[from] RuleError),

    #[error(transparent)]
    TraversalError(#[from] TraversalError),

    #[error("data store error")]
    StoreError(#[from] StoreError),
}

pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;
