//! Shared fixtures and assertion helpers for the analysis test suites:
//! small abstract domains with known heights, canned program shapes, and
//! lattice-law checks.

pub mod domains;
pub mod fixtures;
pub mod lattice;
pub mod problem;

pub use domains::{Clamp, Flat, ReachSet};
pub use fixtures::{CallFixture, CallInLoop, Graphs, LoopFixture, NestedLoops};
pub use lattice::{assert_bottom_laws, assert_join_semilattice_laws};
pub use problem::TransferProblem;
