//! Interprocedural abstract-interpretation fixpoint solver.
//!
//! The solver walks a [`tact_cfg::Program`] with a LIFO worklist, carrying
//! abstract values as pending marks on edges. Loops are resolved by iterating
//! their headers until the domain reports convergence; calls are resolved by
//! descending into the callee CFG and resuming the caller with the callee's
//! exit value. The abstract domain is supplied through the [`Problem`] trait
//! and per-block results are observed through a [`Listener`].

pub mod fixpoint;
pub mod lattice;
pub mod listener;
mod marks;
pub mod problem;
pub mod solver;

pub use fixpoint::{JoinFixpoint, Widen, WideningFixpoint, WideningStrategy};
pub use lattice::{HasBottom, HasTop, JoinSemiLattice};
pub use listener::{BlockEvent, CallFrame, Listener, NullListener, StateCollector};
pub use problem::{ContextKind, EdgeUnions, LoopVerdict, Problem};
pub use solver::Solver;
