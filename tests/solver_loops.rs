//! Loop convergence: iteration counts, accumulation on exit edges, nested
//! loops restarting their inner loop, and widening.

use tact::prelude::*;
use tact_cfg::Block;
use tact_test_utils::domains::{Clamp, ReachSet};
use tact_test_utils::fixtures;
use tact_test_utils::problem::TransferProblem;
use test_log::test;

#[test]
fn single_loop_iterates_to_the_domain_height() {
    let fix = fixtures::single_loop();
    let graphs = &fix.graphs;
    let body = fix.body[0];
    // Counting domain of height 4; only the body block counts.
    let problem = TransferProblem::new(Clamp::<3>(0), move |d: &Clamp<3>, b| {
        if b == body { d.bump() } else { *d }
    });
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    );
    let steps = solver.solve(None, None);

    // Four growing iterations, then the convergence visit.
    assert_eq!(solver.problem().visit_count(fix.header), 4);
    assert_eq!(solver.problem().visit_count(body), 4);
    assert_eq!(solver.problem().visit_count(fix.after), 1);
    assert_eq!(steps, 12);

    let collector = solver.listener();
    // The exit edge accumulated one contribution per iteration.
    assert_eq!(collector.input_of(fix.after), Some(&Clamp(3)));
    // The reported header input is the join over all iterations.
    assert_eq!(collector.input_of(fix.header), Some(&Clamp(3)));
    assert_eq!(collector.converged_headers(), &[fix.header]);
}

#[test]
fn branching_body_runs_once_per_iteration() {
    let fix = fixtures::loop_with_branch();
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

    // The set stabilizes after two iterations: the first discovers the
    // loop blocks, the second reproduces the same input.
    for &block in &fix.body {
        assert_eq!(solver.problem().visit_count(block), 2);
    }
    assert_eq!(solver.problem().visit_count(fix.header), 2);

    let after = solver.listener().input_of(fix.after).unwrap();
    for &block in &fix.body {
        assert!(after.contains(block));
    }
    assert!(after.contains(fix.header));
}

#[test]
fn inner_loop_restarts_on_every_outer_iteration() {
    let fix = fixtures::nested_loops();
    let graphs = &fix.graphs;
    let body = fix.body;
    let problem = TransferProblem::new(Clamp::<2>(0), move |d: &Clamp<2>, b| {
        if b == body { d.bump() } else { *d }
    });
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::new(),
    );
    solver.solve(None, None);

    // The inner loop converges once per outer iteration, the outer loop
    // once at the end.
    assert_eq!(
        solver.listener().converged_headers(),
        &[fix.inner, fix.inner, fix.outer]
    );
    assert_eq!(solver.problem().visit_count(fix.outer), 2);
    assert_eq!(solver.problem().visit_count(fix.inner), 4);
    assert_eq!(solver.problem().visit_count(body), 4);
    assert_eq!(solver.listener().input_of(fix.after), Some(&Clamp(2)));
}

#[test]
fn reapplying_update_at_the_fixpoint_is_stable() {
    let fix = fixtures::single_loop();
    let graphs = &fix.graphs;
    let body = fix.body[0];
    let problem = TransferProblem::new(Clamp::<3>(0), move |d: &Clamp<3>, b| {
        if b == body { d.bump() } else { *d }
    });
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        StateCollector::with_outputs(),
    );
    solver.solve(None, None);

    // At the fixpoint, the recorded tables absorb one more transfer
    // application: update(IN) equals the recorded OUT for every block.
    let blocks: Vec<Block> = solver.listener().blocks().collect();
    for block in blocks {
        let input = *solver.listener().input_of(block).unwrap();
        let output = *solver.listener().output_of(block).unwrap();
        assert_eq!(
            solver.problem_mut().update(&input, block),
            output,
            "transfer not idempotent at the fixpoint for {block}"
        );
    }
}

/// Records every input a chosen block is interpreted with.
struct ChainListener {
    watched: Block,
    inputs: Vec<Clamp<3>>,
}

impl Listener<Clamp<3>> for ChainListener {
    fn block_interpreted(&mut self, event: BlockEvent<'_, Clamp<3>>) {
        if event.block == self.watched {
            self.inputs.push(*event.input);
        }
    }
}

#[test]
fn header_inputs_form_a_monotone_chain() {
    let fix = fixtures::single_loop();
    let graphs = &fix.graphs;
    let body = fix.body[0];
    let problem = TransferProblem::new(Clamp::<3>(0), move |d: &Clamp<3>, b| {
        if b == body { d.bump() } else { *d }
    });
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        problem,
        ChainListener {
            watched: fix.header,
            inputs: Vec::new(),
        },
    );
    solver.solve(None, None);

    let inputs = &solver.listener().inputs;
    assert!(inputs.len() >= 2, "a loop header iterates at least twice");
    for pair in inputs.windows(2) {
        assert!(
            pair[0].is_subseteq(&pair[1]),
            "header inputs must ascend: {:?}",
            inputs
        );
    }
    // Convergence is reported exactly when the chain stops growing: the
    // converged visit does not call the transfer function again, so the
    // last recorded input is the loop's fixpoint.
    assert_eq!(*inputs.last().unwrap(), Clamp(3));
}

/// Problem with a tall chain that relies on widening to stabilize.
struct WidenProblem {
    body: Block,
}

impl Problem for WidenProblem {
    type Domain = Clamp<1000>;
    type LoopState = WideningFixpoint<Clamp<1000>>;

    fn entry(&self) -> Self::Domain {
        Clamp(0)
    }

    fn update(&mut self, input: &Self::Domain, block: Block) -> Self::Domain {
        if block == self.body { input.bump() } else { *input }
    }

    fn loop_state(&mut self, _header: Block) -> Self::LoopState {
        WideningFixpoint::new(WideningStrategy::Always)
    }

    fn loop_step(
        &mut self,
        _header: Block,
        state: &mut Self::LoopState,
        unions: EdgeUnions<Self::Domain>,
        first_iteration: bool,
    ) -> LoopVerdict<Self::Domain> {
        state.step(unions, first_iteration)
    }
}

#[test]
fn widening_cuts_a_tall_chain_short() {
    let fix = fixtures::single_loop();
    let graphs = &fix.graphs;
    let mut solver = Solver::new(
        &graphs.program,
        &graphs.dom,
        &graphs.loops,
        WidenProblem { body: fix.body[0] },
        StateCollector::new(),
    );
    let steps = solver.solve(None, None);

    // Without widening this loop would take ~1000 iterations.
    assert!(steps < 20, "widening did not accelerate: {steps} steps");
    assert_eq!(solver.listener().input_of(fix.after), Some(&Clamp(1000)));
}
