use rustc_hash::FxHashMap;
use tact_cfg::{Block, Edge};

use crate::lattice::JoinSemiLattice;

/// Pending abstract values, keyed by the edge (or entry block) they wait on.
///
/// A mark is produced when a block's output is propagated and consumed
/// exactly once, when the target block is interpreted. Marking an edge that
/// already holds a value joins into it; loop-exit edges accumulate one
/// contribution per loop iteration this way.
#[derive(Debug)]
pub(crate) struct MarkStore<D> {
    edges: FxHashMap<Edge, D>,
    /// Values waiting on callee entry blocks, which are reached through a
    /// CALL edge rather than a marked intraprocedural edge.
    entries: FxHashMap<Block, D>,
}

impl<D> Default for MarkStore<D> {
    fn default() -> Self {
        Self {
            edges: FxHashMap::default(),
            entries: FxHashMap::default(),
        }
    }
}

impl<D: JoinSemiLattice> MarkStore<D> {
    pub fn mark_edge(&mut self, edge: Edge, value: D) {
        match self.edges.entry(edge) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                slot.get_mut().join_with(&value);
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }

    pub fn take_edge(&mut self, edge: Edge) -> Option<D> {
        self.edges.remove(&edge)
    }

    pub fn peek_edge(&self, edge: Edge) -> Option<&D> {
        self.edges.get(&edge)
    }

    pub fn edge_mut(&mut self, edge: Edge) -> Option<&mut D> {
        self.edges.get_mut(&edge)
    }

    pub fn is_marked(&self, edge: Edge) -> bool {
        self.edges.contains_key(&edge)
    }

    pub fn mark_block(&mut self, block: Block, value: D) {
        match self.entries.entry(block) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                slot.get_mut().join_with(&value);
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }

    pub fn take_block(&mut self, block: Block) -> Option<D> {
        self.entries.remove(&block)
    }

    /// Number of values still waiting to be consumed.
    pub fn pending(&self) -> usize {
        self.edges.len() + self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.entries.clear();
    }
}
