use crate::model::stores::{ghostdag::GhostdagStoreReader, relations::RelationsStoreReader};
use blockdag_consensus_core::{
    BlockId, BlockIdSet,
    errors::traversal::{TraversalError, TraversalResult},
};

/// Cone queries over the parent/child adjacency. All traversals are iterative with an explicit
/// visited set, so deep chains never grow the call stack.
pub struct DagTraversalManager<'a, T: GhostdagStoreReader, S: RelationsStoreReader> {
    ghostdag_store: &'a T,
    relations_store: &'a S,
}

impl<'a, T: GhostdagStoreReader, S: RelationsStoreReader> DagTraversalManager<'a, T, S> {
    pub fn new(ghostdag_store: &'a T, relations_store: &'a S) -> Self {
        Self { ghostdag_store, relations_store }
    }

    /// Strict ancestors of `block`
    pub fn past_cone(&self, block: BlockId) -> TraversalResult<BlockIdSet> {
        let parents = self.relations_store.get_parents(block)?;
        self.past_of_parents(&parents)
    }

    /// The union of `parents` and their past cones, i.e. the past cone of a (possibly not yet
    /// inserted) block with these parents
    pub fn past_of_parents(&self, parents: &[BlockId]) -> TraversalResult<BlockIdSet> {
        let mut visited: BlockIdSet = parents.iter().copied().collect();
        let mut stack: Vec<BlockId> = parents.to_vec();
        while let Some(current) = stack.pop() {
            for parent in self.relations_store.get_parents(current)?.iter() {
                if visited.insert(*parent) {
                    stack.push(*parent);
                }
            }
        }
        Ok(visited)
    }

    /// Strict descendants of `block`
    pub fn future_cone(&self, block: BlockId) -> TraversalResult<BlockIdSet> {
        self.collect_future(block, |_| true)
    }

    /// Descendants of `block` which lie inside `space`. For a `space` closed under taking
    /// ancestors (such as any past cone) this is exactly `future_cone(block) ∩ space`.
    pub fn future_cone_within(&self, block: BlockId, space: &BlockIdSet) -> TraversalResult<BlockIdSet> {
        self.collect_future(block, |child| space.contains(&child))
    }

    fn collect_future(&self, block: BlockId, include: impl Fn(BlockId) -> bool) -> TraversalResult<BlockIdSet> {
        let mut visited = BlockIdSet::new();
        let mut stack = vec![block];
        while let Some(current) = stack.pop() {
            for child in self.relations_store.get_children(current)?.iter() {
                if include(*child) && visited.insert(*child) {
                    stack.push(*child);
                }
            }
        }
        Ok(visited)
    }

    /// `space \ past(block) \ future(block) \ {block}` for an ancestor-closed `space`
    pub fn anticone_within(&self, block: BlockId, space: &BlockIdSet) -> TraversalResult<BlockIdSet> {
        let past = self.past_cone(block)?;
        let future = self.future_cone_within(block, space)?;
        Ok(space.iter().copied().filter(|x| *x != block && !past.contains(x) && !future.contains(x)).collect())
    }

    /// Anticone of `block` restricted to `past(reference) ∪ {reference}`.
    ///
    /// Fails with [`TraversalError::NotAnAncestor`] unless `block` is `reference` itself or lies in its past.
    pub fn anticone_in_past(&self, block: BlockId, reference: BlockId) -> TraversalResult<BlockIdSet> {
        let mut space = self.past_cone(reference)?;
        if block == reference {
            return Ok(BlockIdSet::new());
        }
        if !space.contains(&block) {
            return Err(TraversalError::NotAnAncestor(block, reference));
        }
        space.insert(reference);
        self.anticone_within(block, &space)
    }

    /// Walks the selected parent chain of `block` down to its root
    pub fn genesis_of(&self, block: BlockId) -> TraversalResult<BlockId> {
        let mut current = block;
        while let Some(selected_parent) = self.ghostdag_store.get_selected_parent(current)? {
            current = selected_parent;
        }
        Ok(current)
    }

    /// Unbounded anticone of `block` relative to the whole DAG reachable from genesis
    pub fn anticone(&self, block: BlockId) -> TraversalResult<BlockIdSet> {
        let genesis = self.genesis_of(block)?;
        let mut space = self.future_cone(genesis)?;
        space.insert(genesis);
        let past = self.past_cone(block)?;
        let future = self.future_cone(block)?;
        Ok(space.into_iter().filter(|x| *x != block && !past.contains(x) && !future.contains(x)).collect())
    }
}
