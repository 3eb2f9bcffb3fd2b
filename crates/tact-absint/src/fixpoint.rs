//! Stock per-loop convergence protocols.
//!
//! A [`Problem`](crate::Problem) picks its `LoopState` from here unless it
//! needs something custom: [`JoinFixpoint`] iterates until the header input
//! stops growing, [`WideningFixpoint`] additionally widens to force
//! stabilization on domains with tall or infinite ascending chains.

use crate::lattice::{HasBottom, JoinSemiLattice};
use crate::problem::{EdgeUnions, LoopVerdict};

/// Plain Kleene iteration: the loop converges once the joined header input
/// repeats.
///
/// Sound for any domain; terminating only when the domain's ascending
/// chains are finite.
#[derive(Debug)]
pub struct JoinFixpoint<D> {
    header_in: D,
}

impl<D: JoinSemiLattice + HasBottom + Clone + PartialEq> JoinFixpoint<D> {
    pub fn new() -> Self {
        Self {
            header_in: D::bottom(),
        }
    }

    pub fn step(&mut self, unions: EdgeUnions<D>, first_iteration: bool) -> LoopVerdict<D> {
        let mut next = unions.entry;
        next.join_with(&unions.back);
        let converged = !first_iteration && next == self.header_in;
        self.header_in = next.clone();
        LoopVerdict {
            input: next,
            converged,
        }
    }
}

impl<D: JoinSemiLattice + HasBottom + Clone + PartialEq> Default for JoinFixpoint<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Widening operator. `prev.widen(next)` must be an upper bound of both
/// arguments, and repeated widening along any chain must stabilize.
pub trait Widen: JoinSemiLattice {
    fn widen(&self, next: &Self) -> Self;
}

/// When [`WideningFixpoint`] applies the widening operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WideningStrategy {
    /// Widen on every revisit of the header.
    Always,
    /// Never widen; equivalent to [`JoinFixpoint`].
    Never,
    /// Join for the first `n` revisits, widen afterwards. Trades precision
    /// on short chains for guaranteed stabilization on long ones.
    Delayed(usize),
}

impl WideningStrategy {
    fn merge<D: Widen>(&self, prev: &D, next: &D, revisits: usize) -> D {
        match *self {
            WideningStrategy::Always => prev.widen(next),
            WideningStrategy::Never => prev.join(next),
            WideningStrategy::Delayed(n) if revisits > n => prev.widen(next),
            WideningStrategy::Delayed(_) => prev.join(next),
        }
    }
}

/// Kleene iteration accelerated by widening.
#[derive(Debug)]
pub struct WideningFixpoint<D> {
    header_in: D,
    revisits: usize,
    strategy: WideningStrategy,
}

impl<D: Widen + HasBottom + Clone + PartialEq> WideningFixpoint<D> {
    pub fn new(strategy: WideningStrategy) -> Self {
        Self {
            header_in: D::bottom(),
            revisits: 0,
            strategy,
        }
    }

    pub fn step(&mut self, unions: EdgeUnions<D>, first_iteration: bool) -> LoopVerdict<D> {
        let mut incoming = unions.entry;
        incoming.join_with(&unions.back);
        let next = if first_iteration {
            incoming
        } else {
            self.revisits += 1;
            self.strategy.merge(&self.header_in, &incoming, self.revisits)
        };
        let converged = !first_iteration && next == self.header_in;
        self.header_in = next.clone();
        LoopVerdict {
            input: next,
            converged,
        }
    }
}
