//! Acyclic, single-CFG traversals: propagation order, joins at merge
//! points, and entry-value plumbing.

use tact::prelude::*;
use tact_test_utils::domains::{Flat, ReachSet};
use tact_test_utils::fixtures;
use tact_test_utils::problem::TransferProblem;
use test_log::test;

/// Transfer function that records every block a value flows through.
fn trace_blocks(input: &ReachSet, block: Block) -> ReachSet {
    input.clone().with(block)
}

#[test]
fn straight_line_interprets_each_block_once() {
    let (graphs, [a, b, c]) = fixtures::straight_line();
    let problem = TransferProblem::new(ReachSet::bottom(), trace_blocks);
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    );
    let steps = solver.solve(None, None);

    // entry, a, b, c, exit.
    assert_eq!(steps, 5);
    for block in [a, b, c] {
        assert_eq!(solver.problem().visit_count(block), 1);
    }
    let collector = solver.listener();
    assert!(collector.input_of(c).unwrap().contains(a));
    assert!(collector.input_of(c).unwrap().contains(b));
    assert!(!collector.input_of(a).unwrap().contains(b));
}

#[test]
fn diamond_joins_both_branches_before_the_merge() {
    let (graphs, [a, b, c, d]) = fixtures::diamond();
    let problem = TransferProblem::new(ReachSet::bottom(), trace_blocks);
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    );
    solver.solve(None, None);

    // The merge block is interpreted once, with both branches joined in.
    assert_eq!(solver.problem().visit_count(d), 1);
    let collector = solver.into_listener();
    let merged = collector.input_of(d).unwrap();
    assert!(merged.contains(b) && merged.contains(c));
    assert!(merged.contains(a));
}

#[test]
fn entry_value_overrides_the_problem_default() {
    let (graphs, [a, _, _]) = fixtures::straight_line();
    let problem = TransferProblem::new(Flat::Value(1u32), |d: &Flat<u32>, _| d.clone());
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    );
    solver.solve(None, Some(Flat::Value(7)));
    assert_eq!(solver.listener().input_of(a), Some(&Flat::Value(7)));
}

#[test]
fn resolving_twice_is_deterministic() {
    let (graphs, _) = fixtures::diamond();
    let problem = TransferProblem::new(ReachSet::bottom(), trace_blocks);
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        NullListener,
    );
    let first = solver.solve(None, None);
    let second = solver.solve(None, None);
    assert_eq!(first, second);
}
