pub mod block_info;
pub mod stores;
