//! Interprocedural traversal: descending into callees, resuming call
//! sites with the callee's exit value, opting out of a callee, and calls
//! inside loops.

use tact::prelude::*;
use tact_cfg::Block;
use tact_test_utils::domains::{Clamp, Flat, ReachSet};
use tact_test_utils::fixtures;
use tact_test_utils::problem::TransferProblem;
use test_log::test;

/// Records the traversal's call-stack depth for every interpreted block.
#[derive(Default)]
struct DepthListener {
    depths: Vec<(Block, usize)>,
}

impl<D> Listener<D> for DepthListener {
    fn block_interpreted(&mut self, event: BlockEvent<'_, D>) {
        self.depths.push((event.block, event.call_stack.len()));
    }
}

impl DepthListener {
    fn depth_of(&self, block: Block) -> Option<usize> {
        self.depths
            .iter()
            .find(|(b, _)| *b == block)
            .map(|(_, d)| *d)
    }
}

#[test]
fn call_site_resumes_with_the_callee_exit_value() {
    let fix = fixtures::call_pair();
    let graphs = &fix.graphs;
    let problem = TransferProblem::new(ReachSet::bottom(), |d: &ReachSet, b| d.clone().with(b));
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    );
    solver.solve(None, None);

    // The site's transfer function ran once, before the descent; the
    // return visit reuses the callee's result as-is.
    let site = fix.sites[0];
    assert_eq!(solver.problem().visit_count(site), 1);
    assert_eq!(solver.problem().visit_count(fix.callee_body), 1);

    // What flows past the call site has been through the callee.
    let main_exit = graphs.program.exit_of(fix.main);
    let at_exit = solver.listener().input_of(main_exit).unwrap();
    assert!(at_exit.contains(fix.callee_body));
    assert!(at_exit.contains(site));

    // And the callee saw the caller's value.
    let callee_in = solver
        .listener()
        .input_of(graphs.program.entry_of(fix.callee))
        .unwrap();
    assert!(callee_in.contains(site));
}

#[test]
fn callee_blocks_report_the_open_call() {
    let fix = fixtures::call_pair();
    let graphs = &fix.graphs;
    let problem = TransferProblem::new(ReachSet::bottom(), |d: &ReachSet, _| d.clone());
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        DepthListener::default(),
    );
    solver.solve(None, None);

    let listener = solver.listener();
    assert_eq!(listener.depth_of(fix.sites[0]), Some(0));
    assert_eq!(listener.depth_of(fix.callee_body), Some(1));
    assert_eq!(listener.depth_of(graphs.program.exit_of(fix.main)), Some(0));
}

#[test]
fn two_sites_join_in_the_callee_table() {
    let fix = fixtures::two_call_sites();
    let graphs = &fix.graphs;
    let (site1, site2) = (fix.sites[0], fix.sites[1]);
    let problem = TransferProblem::new(Flat::<u32>::None, move |d: &Flat<u32>, b| {
        if b == site1 {
            Flat::Value(1)
        } else if b == site2 {
            Flat::Value(2)
        } else {
            d.clone()
        }
    });
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    );
    solver.solve(None, None);

    // One full descent per call occurrence.
    assert_eq!(solver.problem().visit_count(fix.callee_body), 2);

    // The collector's callee table is the join over both entry values;
    // this is what makes the result call-site-insensitive.
    let collector = solver.listener();
    assert_eq!(collector.input_of(fix.callee_body), Some(&Flat::Any));

    // The flow through main stays path-accurate.
    let main_exit = graphs.program.exit_of(fix.main);
    assert_eq!(collector.input_of(main_exit), Some(&Flat::Value(2)));
}

#[test]
fn dont_enter_skips_the_callee_entirely() {
    let fix = fixtures::call_pair();
    let graphs = &fix.graphs;
    let problem = TransferProblem::new(ReachSet::bottom(), |d: &ReachSet, b| d.clone().with(b));
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    )
    .with_dont_enter(fix.callee);
    solver.solve(None, None);

    assert_eq!(solver.problem().visit_count(fix.callee_body), 0);
    assert!(!solver.listener().visited(fix.callee_body));

    // The site's own output flows on instead of a callee result.
    let main_exit = graphs.program.exit_of(fix.main);
    let at_exit = solver.listener().input_of(main_exit).unwrap();
    assert!(at_exit.contains(fix.sites[0]));
    assert!(!at_exit.contains(fix.callee_body));
}

#[test]
fn call_inside_a_loop_descends_once_per_iteration() {
    let fix = fixtures::call_in_loop();
    let graphs = &fix.graphs;
    let callee_body = fix.callee_body;
    let problem = TransferProblem::new(Clamp::<2>(0), move |d: &Clamp<2>, b| {
        if b == callee_body { d.bump() } else { *d }
    });
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    );
    solver.solve(None, None);

    // Three growing iterations before the loop stabilizes, each one
    // solving the callee afresh.
    assert_eq!(solver.problem().visit_count(callee_body), 3);
    assert_eq!(solver.problem().visit_count(fix.site), 3);
    assert_eq!(solver.listener().converged_headers(), &[fix.header]);
    assert_eq!(solver.listener().input_of(fix.after), Some(&Clamp(2)));
}
