use rustc_hash::FxHashMap;
use tact_cfg::Block;

use tact_absint::{
    EdgeUnions, HasBottom, JoinFixpoint, JoinSemiLattice, LoopVerdict, Problem,
};

/// A [`Problem`] built from a plain transfer function, using
/// [`JoinFixpoint`] for loop convergence.
///
/// The problem counts how many times each block's transfer function runs,
/// which is what the iteration-order tests assert on.
pub struct TransferProblem<D, F> {
    entry: D,
    transfer: F,
    visits: FxHashMap<Block, usize>,
}

impl<D, F> TransferProblem<D, F>
where
    D: JoinSemiLattice + HasBottom + Clone + PartialEq,
    F: FnMut(&D, Block) -> D,
{
    pub fn new(entry: D, transfer: F) -> Self {
        Self {
            entry,
            transfer,
            visits: FxHashMap::default(),
        }
    }

    /// How many times the transfer function ran on `block`.
    pub fn visit_count(&self, block: Block) -> usize {
        self.visits.get(&block).copied().unwrap_or(0)
    }
}

impl<D, F> Problem for TransferProblem<D, F>
where
    D: JoinSemiLattice + HasBottom + Clone + PartialEq,
    F: FnMut(&D, Block) -> D,
{
    type Domain = D;
    type LoopState = JoinFixpoint<D>;

    fn entry(&self) -> D {
        self.entry.clone()
    }

    fn update(&mut self, input: &D, block: Block) -> D {
        *self.visits.entry(block).or_default() += 1;
        (self.transfer)(input, block)
    }

    fn loop_state(&mut self, _header: Block) -> Self::LoopState {
        JoinFixpoint::new()
    }

    fn loop_step(
        &mut self,
        _header: Block,
        state: &mut Self::LoopState,
        unions: EdgeUnions<D>,
        first_iteration: bool,
    ) -> LoopVerdict<D> {
        state.step(unions, first_iteration)
    }
}
