//! Dead-code report over a tiny interprocedural program.
//!
//! Builds three CFGs (main with a loop, a helper called from the loop body,
//! and a helper nothing calls), runs a constant-propagation domain through
//! the solver, and prints which blocks the analysis reached with which
//! values. Blocks of the uncalled helper never show up in the collector:
//! they are dead. Run with `RUST_LOG=trace` to watch the traversal.

use log::info;
use tact_absint::{
    EdgeUnions, HasBottom, JoinFixpoint, JoinSemiLattice, LoopVerdict, Problem, Solver,
    StateCollector,
};
use tact_cfg::{Block, Dominance, EdgeKind, LoopInfo, Program};

/// Flat constant lattice over one integer variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Const {
    Unknown,
    Val(i64),
    Any,
}

impl JoinSemiLattice for Const {
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Const::Unknown, x) | (x, Const::Unknown) => *x,
            (Const::Val(a), Const::Val(b)) if a == b => *self,
            _ => Const::Any,
        }
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        match (self, other) {
            (Const::Unknown, _) | (_, Const::Any) => true,
            (Const::Val(a), Const::Val(b)) => a == b,
            _ => false,
        }
    }
}

impl HasBottom for Const {
    fn bottom() -> Self {
        Const::Unknown
    }
}

/// The abstract effect of each block on the single tracked variable.
struct ConstProp {
    init: Block,
    increment: Block,
}

impl Problem for ConstProp {
    type Domain = Const;
    type LoopState = JoinFixpoint<Const>;

    fn entry(&self) -> Const {
        Const::Unknown
    }

    fn update(&mut self, input: &Const, block: Block) -> Const {
        if block == self.init {
            Const::Val(0)
        } else if block == self.increment {
            match input {
                Const::Val(n) => Const::Val(n + 1),
                other => *other,
            }
        } else {
            *input
        }
    }

    fn loop_state(&mut self, _header: Block) -> Self::LoopState {
        JoinFixpoint::new()
    }

    fn loop_step(
        &mut self,
        _header: Block,
        state: &mut Self::LoopState,
        unions: EdgeUnions<Const>,
        first_iteration: bool,
    ) -> LoopVerdict<Const> {
        state.step(unions, first_iteration)
    }
}

/// main calls `helper` from its loop body; `unused` is never called.
fn build() -> (Program, ConstProp) {
    let mut prog = Program::new();
    let main = prog.add_cfg("main");
    let helper = prog.add_cfg("helper");
    let unused = prog.add_cfg("unused");

    let increment = prog.add_basic(helper);
    prog.add_edge(prog.entry_of(helper), increment, EdgeKind::Entry);
    prog.add_edge(increment, prog.exit_of(helper), EdgeKind::Exit);

    let dead = prog.add_basic(unused);
    prog.add_edge(prog.entry_of(unused), dead, EdgeKind::Entry);
    prog.add_edge(dead, prog.exit_of(unused), EdgeKind::Exit);

    let init = prog.add_basic(main);
    let header = prog.add_basic(main);
    let site = prog.add_basic(main);
    let done = prog.add_basic(main);
    prog.add_edge(prog.entry_of(main), init, EdgeKind::Entry);
    prog.add_edge(init, header, EdgeKind::Taken);
    prog.add_edge(header, site, EdgeKind::Taken);
    prog.add_edge(site, header, EdgeKind::Taken);
    prog.add_edge(header, done, EdgeKind::NotTaken);
    prog.add_edge(done, prog.exit_of(main), EdgeKind::Exit);
    prog.add_call_edge(site, helper);

    (prog, ConstProp { init, increment })
}

fn main() {
    env_logger::init();

    let (program, problem) = build();
    program.validate().expect("demo program is well formed");
    let dom = Dominance::compute(&program);
    let loops = LoopInfo::compute(&program, &dom);

    let mut solver = Solver::new(&program, &dom, &loops, problem, StateCollector::new());
    let steps = solver.solve(None, None);
    info!("solved in {steps} block interpretations");

    let collector = solver.listener();
    println!("reached blocks:");
    for block in program.blocks() {
        if let Some(input) = collector.input_of(block) {
            let label = &program.cfg(program.cfg_of(block)).label;
            println!("  {label}/{block}: {input:?}");
        }
    }

    let dead: Vec<_> = program
        .blocks()
        .filter(|&b| !collector.visited(b))
        .collect();
    println!("dead blocks (never interpreted):");
    for block in &dead {
        let label = &program.cfg(program.cfg_of(*block)).label;
        println!("  {label}/{block}");
    }
}
