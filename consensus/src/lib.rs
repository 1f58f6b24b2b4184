//!
//! GHOSTDAG consensus over an in-memory block DAG.
//!
//! Blocks are classified once, on insertion, in topological order: the selected parent is picked,
//! the merge set is derived and every merge set candidate is colored blue or red under the
//! k-cluster rule. Read-side queries (cones, tips, sink, consensus order) and the scoped virtual
//! block are exposed through [`consensus::BlockDag`].
//!

pub mod consensus;
pub mod model;
pub mod processes;
pub mod test_helpers;
