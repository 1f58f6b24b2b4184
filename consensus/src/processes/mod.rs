pub mod consensus_order;
pub mod ghostdag;
pub mod traversal_manager;
