pub use super::constants::consensus::*;
use crate::{
    KType,
    config::bps::k_from_network,
    errors::config::{ConfigError, ConfigResult},
};
use serde::{Deserialize, Serialize};

/// Consensus parameters. The core trusts these as given; clamping and validation of
/// user input happen in the configuration layer that builds them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// The k-cluster bound: the maximal number of blue blocks allowed in the anticone of any blue block
    pub k: KType,
}

impl Params {
    pub const fn new(k: KType) -> Self {
        Self { k }
    }

    /// Derives k from the network block rate (blocks per second) and the network delay bound (seconds)
    pub fn from_network(bps: f64, max_delay: f64, delta: f64) -> ConfigResult<Self> {
        let k = k_from_network(bps, max_delay, delta)?;
        let k = KType::try_from(k).map_err(|_| ConfigError::KOutOfRange(k))?;
        Ok(Self { k })
    }
}

impl Default for Params {
    fn default() -> Self {
        Self { k: DEFAULT_GHOSTDAG_K }
    }
}
