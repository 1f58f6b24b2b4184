use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("key not found in store: {0}")]
    KeyNotFound(String),

    #[error("key already exists in store: {0}")]
    KeyAlreadyExists(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait StoreResultExtensions<T> {
    /// Converts a `KeyNotFound` error into `None`, leaving other errors as-is
    fn optional(self) -> StoreResult<Option<T>>;
}

impl<T> StoreResultExtensions<T> for StoreResult<T> {
    fn optional(self) -> StoreResult<Option<T>> {
        match self {
            Ok(data) => Ok(Some(data)),
            Err(StoreError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
