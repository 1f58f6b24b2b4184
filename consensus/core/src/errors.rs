pub mod block;
pub mod config;
pub mod consensus;
pub mod store;
pub mod traversal;
