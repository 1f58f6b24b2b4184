use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Opaque block identifier. It stands in for a block hash and is only ever used as a
/// deterministic tie-breaker, never for content addressing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(u64);

/// `blockid::VIRTUAL` is a special id representing the ephemeral `virtual` block.
/// It is never assigned to a real block.
pub const VIRTUAL: BlockId = BlockId(u64::MAX);

impl BlockId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub fn is_virtual(&self) -> bool {
        self.eq(&VIRTUAL)
    }
}

impl From<u64> for BlockId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<BlockId> for u64 {
    fn from(id: BlockId) -> Self {
        id.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_virtual() { write!(f, "virtual") } else { write!(f, "{}", self.0) }
    }
}

impl FromStr for BlockId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}
