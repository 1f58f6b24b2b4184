use crate::{BlockId, errors::store::StoreError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraversalError {
    #[error("block {0} is neither {1} itself nor an ancestor of it")]
    NotAnAncestor(BlockId, BlockId),

    #[error("data store error")]
    StoreError(#[from] StoreError),
}

pub type TraversalResult<T> = std::result::Result<T, TraversalError>;
