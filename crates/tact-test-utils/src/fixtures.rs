//! Canned program shapes for the solver tests.
//!
//! Every fixture validates its program and precomputes dominance and loop
//! metadata, so a test only has to pick a domain and a transfer function.

use tact_cfg::{Block, CfgId, Dominance, Edge, EdgeKind, LoopInfo, Program};

/// A program bundled with its precomputed analyses.
pub struct Graphs {
    pub program: Program,
    pub dom: Dominance,
    pub loops: LoopInfo,
}

impl Graphs {
    pub fn new(program: Program) -> Self {
        program.validate().expect("fixture must be well formed");
        let dom = Dominance::compute(&program);
        let loops = LoopInfo::compute(&program, &dom);
        Self { program, dom, loops }
    }
}

/// entry -> a -> b -> c -> exit
pub fn straight_line() -> (Graphs, [Block; 3]) {
    let mut prog = Program::new();
    let cfg = prog.add_cfg("line");
    let a = prog.add_basic(cfg);
    let b = prog.add_basic(cfg);
    let c = prog.add_basic(cfg);
    prog.add_edge(prog.entry_of(cfg), a, EdgeKind::Entry);
    prog.add_edge(a, b, EdgeKind::Taken);
    prog.add_edge(b, c, EdgeKind::Taken);
    prog.add_edge(c, prog.exit_of(cfg), EdgeKind::Exit);
    (Graphs::new(prog), [a, b, c])
}

/// entry -> a -> {b, c} -> d -> exit
pub fn diamond() -> (Graphs, [Block; 4]) {
    let mut prog = Program::new();
    let cfg = prog.add_cfg("diamond");
    let a = prog.add_basic(cfg);
    let b = prog.add_basic(cfg);
    let c = prog.add_basic(cfg);
    let d = prog.add_basic(cfg);
    prog.add_edge(prog.entry_of(cfg), a, EdgeKind::Entry);
    prog.add_edge(a, b, EdgeKind::Taken);
    prog.add_edge(a, c, EdgeKind::NotTaken);
    prog.add_edge(b, d, EdgeKind::Taken);
    prog.add_edge(c, d, EdgeKind::Taken);
    prog.add_edge(d, prog.exit_of(cfg), EdgeKind::Exit);
    (Graphs::new(prog), [a, b, c, d])
}

/// A single natural loop plus the blocks around it.
pub struct LoopFixture {
    pub graphs: Graphs,
    pub header: Block,
    /// Loop body blocks, header excluded.
    pub body: Vec<Block>,
    pub exit_edge: Edge,
    /// The block the loop exits into.
    pub after: Block,
}

/// entry -> header -> body -> header (back), header -> after -> exit
pub fn single_loop() -> LoopFixture {
    let mut prog = Program::new();
    let cfg = prog.add_cfg("loop");
    let header = prog.add_basic(cfg);
    let body = prog.add_basic(cfg);
    let after = prog.add_basic(cfg);
    prog.add_edge(prog.entry_of(cfg), header, EdgeKind::Entry);
    prog.add_edge(header, body, EdgeKind::Taken);
    prog.add_edge(body, header, EdgeKind::Taken);
    let exit_edge = prog.add_edge(header, after, EdgeKind::NotTaken);
    prog.add_edge(after, prog.exit_of(cfg), EdgeKind::Exit);
    LoopFixture {
        graphs: Graphs::new(prog),
        header,
        body: vec![body],
        exit_edge,
        after,
    }
}

/// A loop whose body branches and re-joins at the latch:
/// header -> {left, right} -> latch -> header, header -> after.
pub fn loop_with_branch() -> LoopFixture {
    let mut prog = Program::new();
    let cfg = prog.add_cfg("loop_branch");
    let header = prog.add_basic(cfg);
    let left = prog.add_basic(cfg);
    let right = prog.add_basic(cfg);
    let latch = prog.add_basic(cfg);
    let after = prog.add_basic(cfg);
    prog.add_edge(prog.entry_of(cfg), header, EdgeKind::Entry);
    prog.add_edge(header, left, EdgeKind::Taken);
    prog.add_edge(header, right, EdgeKind::NotTaken);
    prog.add_edge(left, latch, EdgeKind::Taken);
    prog.add_edge(right, latch, EdgeKind::Taken);
    prog.add_edge(latch, header, EdgeKind::Taken);
    let exit_edge = prog.add_edge(header, after, EdgeKind::NotTaken);
    prog.add_edge(after, prog.exit_of(cfg), EdgeKind::Exit);
    LoopFixture {
        graphs: Graphs::new(prog),
        header,
        body: vec![left, right, latch],
        exit_edge,
        after,
    }
}

/// Two nested loops sharing no blocks but the usual nesting.
pub struct NestedLoops {
    pub graphs: Graphs,
    pub outer: Block,
    pub inner: Block,
    pub body: Block,
    /// Exits the inner loop only.
    pub inner_exit: Edge,
    /// Exits both loops at once.
    pub outer_exit: Edge,
    pub after: Block,
}

/// entry -> outer -> inner -> body -> inner (back),
/// inner -> outer (back of outer), body -> after (leaves both loops).
pub fn nested_loops() -> NestedLoops {
    let mut prog = Program::new();
    let cfg = prog.add_cfg("nested");
    let outer = prog.add_basic(cfg);
    let inner = prog.add_basic(cfg);
    let body = prog.add_basic(cfg);
    let after = prog.add_basic(cfg);
    prog.add_edge(prog.entry_of(cfg), outer, EdgeKind::Entry);
    prog.add_edge(outer, inner, EdgeKind::Taken);
    prog.add_edge(inner, body, EdgeKind::Taken);
    prog.add_edge(body, inner, EdgeKind::Taken);
    let inner_exit = prog.add_edge(inner, outer, EdgeKind::NotTaken);
    let outer_exit = prog.add_edge(body, after, EdgeKind::NotTaken);
    prog.add_edge(after, prog.exit_of(cfg), EdgeKind::Exit);
    NestedLoops {
        graphs: Graphs::new(prog),
        outer,
        inner,
        body,
        inner_exit,
        outer_exit,
        after,
    }
}

/// A root CFG calling one callee from one or more sites.
pub struct CallFixture {
    pub graphs: Graphs,
    pub main: CfgId,
    pub callee: CfgId,
    /// Call-site blocks in the root CFG, in control-flow order.
    pub sites: Vec<Block>,
    /// The single basic block of the callee.
    pub callee_body: Block,
}

fn call_fixture(site_count: usize) -> CallFixture {
    let mut prog = Program::new();
    let main = prog.add_cfg("main");
    let callee = prog.add_cfg("callee");

    let callee_body = prog.add_basic(callee);
    prog.add_edge(prog.entry_of(callee), callee_body, EdgeKind::Entry);
    prog.add_edge(callee_body, prog.exit_of(callee), EdgeKind::Exit);

    let mut sites = Vec::new();
    let mut pred = prog.entry_of(main);
    for i in 0..site_count {
        let site = prog.add_basic(main);
        let kind = if i == 0 { EdgeKind::Entry } else { EdgeKind::Taken };
        prog.add_edge(pred, site, kind);
        prog.add_call_edge(site, callee);
        sites.push(site);
        pred = site;
    }
    prog.add_edge(pred, prog.exit_of(main), EdgeKind::Exit);

    CallFixture {
        graphs: Graphs::new(prog),
        main,
        callee,
        sites,
        callee_body,
    }
}

/// main: entry -> site -> exit, with site calling the callee.
pub fn call_pair() -> CallFixture {
    call_fixture(1)
}

/// main: entry -> site1 -> site2 -> exit, both sites calling the same
/// callee.
pub fn two_call_sites() -> CallFixture {
    call_fixture(2)
}

/// A call site inside a loop body.
pub struct CallInLoop {
    pub graphs: Graphs,
    pub main: CfgId,
    pub callee: CfgId,
    pub header: Block,
    pub site: Block,
    pub callee_body: Block,
    pub after: Block,
}

/// entry -> header -> site -> header (back), header -> after -> exit, with
/// site calling the callee.
pub fn call_in_loop() -> CallInLoop {
    let mut prog = Program::new();
    let main = prog.add_cfg("main");
    let callee = prog.add_cfg("callee");

    let callee_body = prog.add_basic(callee);
    prog.add_edge(prog.entry_of(callee), callee_body, EdgeKind::Entry);
    prog.add_edge(callee_body, prog.exit_of(callee), EdgeKind::Exit);

    let header = prog.add_basic(main);
    let site = prog.add_basic(main);
    let after = prog.add_basic(main);
    prog.add_edge(prog.entry_of(main), header, EdgeKind::Entry);
    prog.add_edge(header, site, EdgeKind::Taken);
    prog.add_edge(site, header, EdgeKind::Taken);
    prog.add_edge(header, after, EdgeKind::NotTaken);
    prog.add_edge(after, prog.exit_of(main), EdgeKind::Exit);
    prog.add_call_edge(site, callee);

    CallInLoop {
        graphs: Graphs::new(prog),
        main,
        callee,
        header,
        site,
        callee_body,
        after,
    }
}
