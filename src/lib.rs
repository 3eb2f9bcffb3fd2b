//! Interprocedural abstract interpretation over control-flow graphs.
//!
//! The [`cfg`] crate holds the program representation (CFGs, CALL edges,
//! dominance, loop metadata); [`absint`] holds the worklist fixpoint solver
//! and the traits an abstract domain plugs into.

pub use tact_absint as absint;
pub use tact_cfg as cfg;

pub mod prelude {
    pub use tact_absint::{
        BlockEvent, ContextKind, EdgeUnions, HasBottom, HasTop, JoinFixpoint, JoinSemiLattice,
        Listener, LoopVerdict, NullListener, Problem, Solver, StateCollector, Widen,
        WideningFixpoint, WideningStrategy,
    };
    pub use tact_cfg::{
        Block, BlockKind, CfgId, Dominance, Edge, EdgeKind, GraphError, LoopInfo, Program,
    };
}
