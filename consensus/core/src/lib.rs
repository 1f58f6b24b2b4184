pub mod block;
pub mod blockid;
pub mod config;
pub mod errors;

pub use blockid::BlockId;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

pub type KType = u16; // Widen if the cluster bound ever needs to exceed 65535

pub type BlockIds = Arc<Vec<BlockId>>;
pub type BlockIdMap<V> = HashMap<BlockId, V>;
pub type BlockIdSet = HashSet<BlockId>;

/// Point-in-time blue (`true`) / red (`false`) coloring of every block in some block's past
pub type BlueView = Arc<BlockIdMap<bool>>;
