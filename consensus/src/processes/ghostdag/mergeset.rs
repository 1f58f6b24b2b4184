use super::protocol::GhostdagManager;
use crate::model::stores::ghostdag::GhostdagStoreReader;
use crate::model::stores::relations::RelationsStoreReader;
use blockdag_consensus_core::{BlockId, BlockIdSet, errors::traversal::TraversalResult};
use std::collections::VecDeque;

impl<T: GhostdagStoreReader, S: RelationsStoreReader> GhostdagManager<'_, T, S> {
    /// `past(parents) \ past(selected_parent) \ {selected_parent}`, sorted ascending by (blue score, id)
    pub fn ordered_mergeset_without_selected_parent(
        &self,
        selected_parent: BlockId,
        parents: &[BlockId],
    ) -> TraversalResult<Vec<BlockId>> {
        let selected_parent_past = self.traversal_manager().past_cone(selected_parent)?;
        let known = |block: &BlockId| *block == selected_parent || selected_parent_past.contains(block);

        // Parents may be redundant, i.e. already in the past of the selected parent
        let mut queue: VecDeque<_> = parents.iter().copied().filter(|p| !known(p)).collect();
        let mut mergeset: BlockIdSet = queue.iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            let current_parents = self.relations_store.get_parents(current)?;

            // Every parent outside the selected parent's past joins the merge set and is explored in turn
            for parent in current_parents.iter() {
                if mergeset.contains(parent) || known(parent) {
                    continue;
                }
                mergeset.insert(*parent);
                queue.push_back(*parent);
            }
        }

        Ok(self.sort_blocks(mergeset)?)
    }
}
