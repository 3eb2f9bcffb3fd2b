mod arena;
mod dominance;
mod ids;
mod loops;
mod program;

pub use arena::Arena;
pub use dominance::Dominance;
pub use ids::{Block, CfgId, Edge, EntityId, Idx};
pub use loops::LoopInfo;
pub use program::{BlockData, BlockKind, CfgData, EdgeData, EdgeKind, GraphError, Program};

pub use smallvec::{self, SmallVec};
