use crate::KType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Configuration: expected a positive value for {0} but got {1}")]
    NonPositiveValue(&'static str, f64),

    #[error("Configuration: tail probability delta must lie in (0, 1), got {0}")]
    InvalidDelta(f64),

    #[error("Configuration: k={0} exceeds the supported maximum {max}", max = KType::MAX)]
    KOutOfRange(u64),

    #[error("Configuration: no block rate maps to k={0}")]
    UnknownKThreshold(KType),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
