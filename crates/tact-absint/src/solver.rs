//! The worklist fixpoint solver.
//!
//! Traversal state lives on the graph as pending marks (see
//! [`MarkStore`]): every interpreted block leaves its output on its
//! out-edges, and a block becomes schedulable once all of its in-edges are
//! resolved. The worklist is a LIFO stack, which keeps the traversal depth
//! first: a callee is fully solved before its caller resumes and a loop
//! body is drained before its header is revisited.

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tact_cfg::{Block, BlockKind, CfgId, Dominance, Edge, EdgeKind, LoopInfo, Program};

use crate::lattice::{HasBottom, JoinSemiLattice};
use crate::listener::{BlockEvent, CallFrame, Listener};
use crate::marks::MarkStore;
use crate::problem::{ContextKind, EdgeUnions, Problem};

/// Per-header iteration bookkeeping.
///
/// `state` holds the problem's scratch state while the loop iterates and is
/// dropped at convergence; `first_iteration` resets to true at the same
/// time so an enclosing loop can restart the inner loop cleanly. `fixed`
/// stays set after convergence: it is what releases the loop's exit edges,
/// and it is cleared again only if the header starts a fresh round of
/// iterations.
#[derive(Debug)]
struct HeaderRecord<S> {
    first_iteration: bool,
    fixed: bool,
    state: Option<S>,
}

impl<S> Default for HeaderRecord<S> {
    fn default() -> Self {
        Self {
            first_iteration: true,
            fixed: false,
            state: None,
        }
    }
}

/// The out-going CALL edge of a block, if it has an enterable one.
#[derive(Clone, Copy, Debug)]
struct CallSite {
    edge: Edge,
    callee: CfgId,
    /// False once the callee has run and left its result on the edge, i.e.
    /// this visit of the call site is the return, not the call.
    pending: bool,
}

/// Interprocedural abstract-interpretation solver over a [`Program`].
///
/// The solver borrows the program together with its precomputed
/// [`Dominance`] and [`LoopInfo`]; the problem and listener are owned, and
/// the listener can be recovered with
/// [`into_listener`](Self::into_listener) after solving.
pub struct Solver<'p, P: Problem, L: Listener<P::Domain>> {
    program: &'p Program,
    dom: &'p Dominance,
    loops: &'p LoopInfo,
    problem: P,
    listener: L,

    marks: MarkStore<P::Domain>,
    call_stack: Vec<CallFrame>,
    headers: FxHashMap<Block, HeaderRecord<P::LoopState>>,
    worklist: Vec<Block>,
    dont_enter: FxHashSet<CfgId>,
    cur_cfg: CfgId,
    entry_value: P::Domain,
}

impl<'p, P: Problem, L: Listener<P::Domain>> Solver<'p, P, L> {
    /// Panics if `program` has no CFG.
    pub fn new(
        program: &'p Program,
        dom: &'p Dominance,
        loops: &'p LoopInfo,
        problem: P,
        listener: L,
    ) -> Self {
        let cur_cfg = program.main().expect("program has no CFG");
        let entry_value = problem.entry();
        Self {
            program,
            dom,
            loops,
            problem,
            listener,
            marks: MarkStore::default(),
            call_stack: Vec::new(),
            headers: FxHashMap::default(),
            worklist: Vec::new(),
            dont_enter: FxHashSet::default(),
            cur_cfg,
            entry_value,
        }
    }

    /// Treat CALL edges into `cfg` as absent: call sites keep their own
    /// transfer-function output instead of descending.
    pub fn with_dont_enter(mut self, cfg: CfgId) -> Self {
        self.dont_enter.insert(cfg);
        self
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut P {
        &mut self.problem
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Run the analysis from `root` (default: the program's main CFG) with
    /// `entry_value` flowing into its entry block (default:
    /// [`Problem::entry`]). Returns the number of block interpretations
    /// performed.
    ///
    /// Panics if the traversal observes a malformed graph; run
    /// [`Program::validate`] first when the CFG comes from untrusted
    /// construction.
    pub fn solve(&mut self, root: Option<CfgId>, entry_value: Option<P::Domain>) -> usize {
        let program = self.program;
        self.marks.clear();
        self.call_stack.clear();
        self.headers.clear();
        self.worklist.clear();
        self.cur_cfg = root.or_else(|| program.main()).expect("program has no CFG");
        self.entry_value = entry_value.unwrap_or_else(|| self.problem.entry());
        self.worklist.push(program.entry_of(self.cur_cfg));
        debug!(
            "solving from {} ({})",
            self.cur_cfg,
            program.cfg(self.cur_cfg).label
        );

        let mut iterations = 0usize;
        while let Some(block) = self.worklist.pop() {
            iterations += 1;
            trace!("#{iterations}: interpreting {block} in {}", self.cur_cfg);
            let call = self.detect_call(block);
            let (input, converged) = self.process_input(block, call);
            self.process_output(block, call, input, converged);
        }

        debug_assert!(self.call_stack.is_empty(), "traversal ended inside a call");
        debug_assert!(
            self.marks.is_empty(),
            "{} pending values were never consumed",
            self.marks.pending()
        );
        debug!("fixpoint reached after {iterations} block interpretations");
        iterations
    }

    /// Find the block's enterable CALL edge. A block has at most one.
    fn detect_call(&self, block: Block) -> Option<CallSite> {
        let program = self.program;
        let mut found: Option<CallSite> = None;
        for edge in program.out_edges(block) {
            let Some(callee) = program.edge(edge).callee else {
                continue;
            };
            if self.dont_enter.contains(&callee) {
                continue;
            }
            debug_assert!(
                found.is_none(),
                "block {block} has more than one enterable call edge"
            );
            if found.is_none() {
                found = Some(CallSite {
                    edge,
                    callee,
                    pending: !self.marks.is_marked(edge),
                });
            }
        }
        found
    }

    /// Compute the block's input, consuming the pending values it waits on.
    /// The second component is true when the block is a loop header whose
    /// loop converged on this visit.
    fn process_input(&mut self, block: Block, call: Option<CallSite>) -> (P::Domain, bool) {
        let program = self.program;

        if program.block(block).kind == BlockKind::Entry {
            // Callee entries carry the caller's value as a block mark; the
            // root entry falls back to the configured entry value.
            if let Some(value) = self.marks.take_block(block) {
                return (value, false);
            }
            return (self.entry_value.clone(), false);
        }

        if let Some(site) = call
            && !site.pending
        {
            // Call return: the callee left its exit output on the call
            // edge. This takes precedence over the header protocol, so a
            // calling header completes its loop iteration only once the
            // callee is solved.
            let value = self
                .marks
                .take_edge(site.edge)
                .expect("call return without a result on the call edge");
            return (value, false);
        }

        if self.loops.is_header(block) {
            return self.loop_header_input(block);
        }

        let mut input = P::Domain::bottom();
        for edge in program.in_edges(block) {
            if program.edge(edge).kind == EdgeKind::Call {
                continue;
            }
            let value = self
                .marks
                .take_edge(edge)
                .expect("join block scheduled with an unresolved in-edge");
            input.join_with(&value);
        }
        (input, false)
    }

    /// One visit of a loop header: hand the back-edge and entry-edge unions
    /// to the problem's convergence protocol and maintain the header's
    /// iteration flags.
    fn loop_header_input(&mut self, header: Block) -> (P::Domain, bool) {
        let program = self.program;
        let dom = self.dom;

        let first = self
            .headers
            .entry(header)
            .or_default()
            .first_iteration;
        if first {
            trace!("{header}: starting loop iteration");
            let state = self.problem.loop_state(header);
            self.headers.get_mut(&header).unwrap().state = Some(state);
        }

        // Back edges carry nothing on the first iteration and are consumed
        // on every later one.
        let mut back = P::Domain::bottom();
        if !first {
            for edge in program.in_edges(header) {
                let data = program.edge(edge);
                if data.kind == EdgeKind::Call || !dom.dominates(header, data.source) {
                    continue;
                }
                let value = self
                    .marks
                    .peek_edge(edge)
                    .expect("iterating header with an unmarked back edge");
                back.join_with(value);
            }
        }

        // Entry edges stay marked for the whole life of the loop so every
        // iteration can re-read them.
        let mut entry = P::Domain::bottom();
        for edge in program.in_edges(header) {
            let data = program.edge(edge);
            if data.kind == EdgeKind::Call || dom.dominates(header, data.source) {
                continue;
            }
            let value = self
                .marks
                .peek_edge(edge)
                .expect("loop header scheduled with an unmarked entry edge");
            entry.join_with(value);
        }
        self.problem
            .enter_context(&mut entry, header, ContextKind::Loop);

        let record = self.headers.get_mut(&header).unwrap();
        let state = record
            .state
            .as_mut()
            .expect("iterating header without scratch state");
        let verdict = self
            .problem
            .loop_step(header, state, EdgeUnions { back, entry }, first);
        let converged = verdict.converged;
        if first {
            assert!(
                !converged,
                "loop at {header} cannot converge on its first iteration"
            );
            record.first_iteration = false;
        }
        record.fixed = converged;
        if converged {
            record.state = None;
            record.first_iteration = true;
        }

        for edge in program.in_edges(header) {
            let data = program.edge(edge);
            if data.kind != EdgeKind::Call && dom.dominates(header, data.source) {
                self.marks.take_edge(edge);
            }
        }
        if converged {
            trace!("{header}: loop converged");
            self.listener.fixpoint_reached(header);
            for edge in program.in_edges(header) {
                let data = program.edge(edge);
                if data.kind != EdgeKind::Call && !dom.dominates(header, data.source) {
                    self.marks.take_edge(edge);
                }
            }
        }
        (verdict.input, converged)
    }

    /// Route the block's output: release a converged loop, return from or
    /// descend into a call, or propagate along the out-edges.
    fn process_output(
        &mut self,
        block: Block,
        call: Option<CallSite>,
        input: P::Domain,
        converged: bool,
    ) {
        let program = self.program;

        if converged {
            // A converged header is not re-interpreted; its job on this
            // visit is to release the loop's exit edges.
            self.activate_exit_edges(block);
            return;
        }

        let returning = call.is_some_and(|site| !site.pending);
        let output = if returning {
            // The consumed call-edge value already is the callee's exit
            // output; the site's own effect ran before the call descended.
            input
        } else {
            let output = self.problem.update(&input, block);
            self.listener.block_interpreted(BlockEvent {
                block,
                cfg: self.cur_cfg,
                input: &input,
                output: &output,
                call_stack: &self.call_stack,
            });
            output
        };

        if program.block(block).kind == BlockKind::Exit && !self.call_stack.is_empty() {
            self.return_from_call(output);
            return;
        }

        if let Some(site) = call.filter(|site| site.pending) {
            self.descend_into_call(site, output);
            return;
        }

        for edge in program.out_edges(block) {
            if program.edge(edge).kind == EdgeKind::Call {
                continue;
            }
            self.marks.mark_edge(edge, output.clone());
            self.try_schedule(program.edge(edge).target);
        }
    }

    /// Schedule the targets of a converged loop's exit edges and let the
    /// problem strip the loop context off the accumulated exit values.
    fn activate_exit_edges(&mut self, header: Block) {
        let program = self.program;
        let loops = self.loops;
        // One target can be reached by several exit edges of this loop;
        // schedule it once.
        let mut scheduled: SmallVec<[Block; 4]> = SmallVec::new();
        for &edge in loops.exit_edges(header) {
            let target = program.edge(edge).target;
            if !scheduled.contains(&target) && self.try_schedule(target) {
                scheduled.push(target);
            }
            let value = self
                .marks
                .edge_mut(edge)
                .expect("converged loop with an unmarked exit edge");
            self.problem.leave_context(value, header, ContextKind::Loop);
        }
    }

    fn return_from_call(&mut self, mut output: P::Domain) {
        let program = self.program;
        let frame = self.call_stack.pop().expect("checked non-empty");
        let callee_entry = program.entry_of(self.cur_cfg);
        trace!("returning from {} to {}", self.cur_cfg, frame.caller);
        self.cur_cfg = frame.caller;
        self.problem
            .leave_context(&mut output, callee_entry, ContextKind::Function);
        self.marks.mark_edge(frame.edge, output);
        // The call site resumes unconditionally; its other in-edges were
        // consumed when it was first interpreted.
        self.worklist.push(program.edge(frame.edge).source);
    }

    fn descend_into_call(&mut self, site: CallSite, mut output: P::Domain) {
        let program = self.program;
        let callee_entry = program.entry_of(site.callee);
        trace!("descending from {} into {}", self.cur_cfg, site.callee);
        self.call_stack.push(CallFrame {
            edge: site.edge,
            caller: self.cur_cfg,
        });
        self.cur_cfg = site.callee;
        self.problem
            .enter_context(&mut output, callee_entry, ContextKind::Function);
        self.marks.mark_block(callee_entry, output);
        self.worklist.push(callee_entry);
    }

    /// Push `block` if every non-CALL in-edge is resolved. Returns whether
    /// it was pushed.
    fn try_schedule(&mut self, block: Block) -> bool {
        let program = self.program;
        for edge in program.in_edges(block) {
            if program.edge(edge).kind == EdgeKind::Call {
                continue;
            }
            if !self.edge_done(edge) {
                return false;
            }
        }
        trace!("scheduling {block}");
        self.worklist.push(block);
        true
    }

    /// An edge is resolved when it carries a pending value that is free to
    /// flow (not held back by a still-iterating loop it exits), or when it
    /// is a back edge of a header waiting for its first iteration.
    fn edge_done(&self, edge: Edge) -> bool {
        let data = self.program.edge(edge);

        let released = self.marks.is_marked(edge)
            && self.loops.exit_of(edge).is_none_or(|header| {
                self.headers
                    .get(&header)
                    .is_some_and(|record| record.fixed)
            });
        if released {
            return true;
        }

        self.dom.dominates(data.target, data.source)
            && self
                .headers
                .get(&data.target)
                .is_none_or(|record| record.first_iteration)
    }
}
