use rustc_hash::FxHashMap;
use tact_cfg::{Block, CfgId, Edge};

use crate::lattice::JoinSemiLattice;

/// One frame of the solver's interprocedural traversal: the CALL edge being
/// resolved and the CFG it was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallFrame {
    pub edge: Edge,
    pub caller: CfgId,
}

/// The observation emitted after one application of the transfer function.
///
/// `call_stack` is the traversal's current stack of open calls, outermost
/// first; it is empty for blocks of the root CFG.
#[derive(Debug)]
pub struct BlockEvent<'a, D> {
    pub block: Block,
    pub cfg: CfgId,
    pub input: &'a D,
    pub output: &'a D,
    pub call_stack: &'a [CallFrame],
}

/// Observer of solver progress.
///
/// A block inside a loop is reported once per iteration and a callee's
/// blocks once per call occurrence, so a listener accumulating results must
/// join repeated reports rather than overwrite them.
pub trait Listener<D> {
    fn block_interpreted(&mut self, event: BlockEvent<'_, D>);

    /// A loop header has converged. The solver drops the loop's scratch
    /// state right after this call.
    fn fixpoint_reached(&mut self, _header: Block) {}
}

/// Listener that discards every event.
#[derive(Debug, Default)]
pub struct NullListener;

impl<D> Listener<D> for NullListener {
    fn block_interpreted(&mut self, _event: BlockEvent<'_, D>) {}
}

/// Listener that accumulates the per-block input (and optionally output)
/// states of the whole analysis.
///
/// Repeated reports of one block are joined, so after the solve the table
/// holds the least upper bound over all loop iterations and call
/// occurrences. This is what makes the analysis call-site-insensitive: a
/// callee invoked from two sites ends up with the join of both entry
/// values.
#[derive(Debug)]
pub struct StateCollector<D> {
    ins: FxHashMap<Block, D>,
    outs: Option<FxHashMap<Block, D>>,
    converged: Vec<Block>,
}

impl<D: JoinSemiLattice + Clone> StateCollector<D> {
    pub fn new() -> Self {
        Self {
            ins: FxHashMap::default(),
            outs: None,
            converged: Vec::new(),
        }
    }

    /// Also record per-block outputs.
    pub fn with_outputs() -> Self {
        Self {
            outs: Some(FxHashMap::default()),
            ..Self::new()
        }
    }

    pub fn input_of(&self, block: Block) -> Option<&D> {
        self.ins.get(&block)
    }

    pub fn output_of(&self, block: Block) -> Option<&D> {
        self.outs.as_ref().and_then(|outs| outs.get(&block))
    }

    /// Whether the transfer function ever ran on `block`.
    pub fn visited(&self, block: Block) -> bool {
        self.ins.contains_key(&block)
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.ins.keys().copied()
    }

    /// Headers whose loops converged, in convergence order.
    pub fn converged_headers(&self) -> &[Block] {
        &self.converged
    }

    fn join_into(table: &mut FxHashMap<Block, D>, block: Block, value: &D) {
        match table.entry(block) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                slot.get_mut().join_with(value);
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value.clone());
            }
        }
    }
}

impl<D: JoinSemiLattice + Clone> Default for StateCollector<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: JoinSemiLattice + Clone> Listener<D> for StateCollector<D> {
    fn block_interpreted(&mut self, event: BlockEvent<'_, D>) {
        Self::join_into(&mut self.ins, event.block, event.input);
        if let Some(outs) = &mut self.outs {
            Self::join_into(outs, event.block, event.output);
        }
    }

    fn fixpoint_reached(&mut self, header: Block) {
        self.converged.push(header);
    }
}
