use tact_cfg::Block;

use crate::lattice::{HasBottom, JoinSemiLattice};

/// The kind of context the solver enters or leaves while traversing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    /// A loop, identified by its header block.
    Loop,
    /// A function, identified by the entry block of its CFG.
    Function,
}

/// The two incoming-edge unions a loop header sees on one visit.
///
/// `back` is the union of the pending values on the header's back edges and
/// is `bottom` on the first iteration, when back edges carry nothing yet.
/// `entry` is the union of the pending values on the edges entering the loop
/// from outside, with [`Problem::enter_context`] already applied.
#[derive(Debug)]
pub struct EdgeUnions<D> {
    pub back: D,
    pub entry: D,
}

/// The outcome of one loop-header step: the header's input for this
/// iteration and whether the loop has stabilized.
#[derive(Debug)]
pub struct LoopVerdict<D> {
    pub input: D,
    pub converged: bool,
}

/// An abstract-interpretation problem: the domain, its transfer function,
/// and the per-loop convergence protocol.
///
/// The solver drives the traversal; the problem only ever sees one block at
/// a time. Per-loop scratch state is allocated through
/// [`loop_state`](Self::loop_state) when a header is first visited and
/// dropped by the solver as soon as the loop converges, so its lifetime is
/// bounded by the loop's iteration, not by the whole analysis.
pub trait Problem {
    type Domain: JoinSemiLattice + HasBottom + Clone + PartialEq;

    /// Scratch state kept per currently-iterating loop header. Use
    /// [`JoinFixpoint`](crate::JoinFixpoint) or
    /// [`WideningFixpoint`](crate::WideningFixpoint) unless the domain
    /// needs a custom protocol.
    type LoopState;

    /// The abstract value flowing into the entry of the root CFG.
    fn entry(&self) -> Self::Domain;

    /// Transfer function: the abstract effect of executing `block` on
    /// `input`.
    fn update(&mut self, input: &Self::Domain, block: Block) -> Self::Domain;

    /// Hook invoked on a value entering a loop or a function. Identity by
    /// default; context-sensitive domains tag the value here.
    fn enter_context(&mut self, _value: &mut Self::Domain, _block: Block, _kind: ContextKind) {}

    /// Hook invoked on a value leaving a loop or a function.
    fn leave_context(&mut self, _value: &mut Self::Domain, _block: Block, _kind: ContextKind) {}

    /// Fresh scratch state for a loop header about to start iterating.
    fn loop_state(&mut self, header: Block) -> Self::LoopState;

    /// One convergence step at a loop header.
    ///
    /// `first_iteration` is true exactly on the visit that allocated
    /// `state`; a loop must not report convergence on that visit. The
    /// returned input becomes the header's input for this iteration.
    fn loop_step(
        &mut self,
        header: Block,
        state: &mut Self::LoopState,
        unions: EdgeUnions<Self::Domain>,
        first_iteration: bool,
    ) -> LoopVerdict<Self::Domain>;
}
