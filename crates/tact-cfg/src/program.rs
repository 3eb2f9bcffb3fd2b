use petgraph::graph::DiGraph;
use smallvec::SmallVec;

use crate::arena::Arena;
use crate::ids::{Block, CfgId, Edge};

/// The role of a block inside its CFG.
///
/// Every CFG owns exactly one `Entry` and one `Exit` block; both are
/// virtual (no program code) and are created together with the CFG.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BlockKind {
    Entry,
    Exit,
    Basic,
    /// A block inserted by a CFG transformation rather than decoded from
    /// the program, e.g. the stand-in block of an inlined call site.
    Synthetic,
}

/// The kind of a control-flow edge.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum EdgeKind {
    /// From the virtual entry to the first real block.
    Entry,
    /// From a returning block to the virtual exit.
    Exit,
    /// Interprocedural edge from a call site to the entry of the callee
    /// CFG. The only edge kind allowed to cross CFGs.
    Call,
    /// Branch taken.
    Taken,
    /// Branch fall-through.
    NotTaken,
    /// Edge inserted by a CFG transformation.
    Virtual,
}

#[derive(Debug)]
pub struct BlockData {
    pub cfg: CfgId,
    pub kind: BlockKind,
    ins: SmallVec<[Edge; 4]>,
    outs: SmallVec<[Edge; 4]>,
}

#[derive(Debug)]
pub struct EdgeData {
    pub source: Block,
    pub target: Block,
    pub kind: EdgeKind,
    /// The CFG entered through this edge. `Some` iff `kind == Call`.
    pub callee: Option<CfgId>,
}

#[derive(Debug)]
pub struct CfgData {
    pub label: String,
    pub entry: Block,
    pub exit: Block,
    blocks: Vec<Block>,
}

impl CfgData {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

/// Structural defects detected by [`Program::validate`].
///
/// Validation is the caller's responsibility: the fixpoint solver assumes a
/// well-formed program and treats violations found mid-run as fatal.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The call relation contains a cycle; the solver requires it acyclic.
    #[error("call relation is cyclic through {cfg}")]
    RecursiveCall { cfg: CfgId },
    /// A non-CALL edge connects blocks of two different CFGs.
    #[error("edge {edge} crosses CFGs without CALL kind")]
    CrossCfgEdge { edge: Edge },
    /// A CALL edge carries no callee.
    #[error("call edge {edge} has no callee")]
    MissingCallee { edge: Edge },
    /// A CALL edge does not target the entry block of its callee.
    #[error("call edge {edge} does not target its callee's entry")]
    CallTargetMismatch { edge: Edge },
}

/// A set of control-flow graphs plus the interprocedural CALL edges
/// connecting them.
///
/// The store is append-only and program-global: block and edge identifiers
/// are unique across all CFGs, which lets the analyses key their tables by
/// block identity alone.
#[derive(Debug, Default)]
pub struct Program {
    cfgs: Arena<CfgId, CfgData>,
    blocks: Arena<Block, BlockData>,
    edges: Arena<Edge, EdgeData>,
    main: Option<CfgId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a CFG with its virtual entry and exit blocks. The first CFG
    /// added becomes the main CFG unless [`set_main`](Self::set_main) says
    /// otherwise.
    pub fn add_cfg(&mut self, label: impl Into<String>) -> CfgId {
        let id = self.cfgs.next_id();
        let entry = self.blocks.alloc(BlockData {
            cfg: id,
            kind: BlockKind::Entry,
            ins: SmallVec::new(),
            outs: SmallVec::new(),
        });
        let exit = self.blocks.alloc(BlockData {
            cfg: id,
            kind: BlockKind::Exit,
            ins: SmallVec::new(),
            outs: SmallVec::new(),
        });
        self.cfgs.alloc(CfgData {
            label: label.into(),
            entry,
            exit,
            blocks: vec![entry, exit],
        });
        if self.main.is_none() {
            self.main = Some(id);
        }
        id
    }

    pub fn set_main(&mut self, cfg: CfgId) {
        self.main = Some(cfg);
    }

    /// The main CFG, i.e. the default traversal root.
    pub fn main(&self) -> Option<CfgId> {
        self.main
    }

    pub fn add_block(&mut self, cfg: CfgId, kind: BlockKind) -> Block {
        assert!(
            !matches!(kind, BlockKind::Entry | BlockKind::Exit),
            "entry/exit blocks are created with their CFG"
        );
        let block = self.blocks.alloc(BlockData {
            cfg,
            kind,
            ins: SmallVec::new(),
            outs: SmallVec::new(),
        });
        self.cfgs[cfg].blocks.push(block);
        block
    }

    pub fn add_basic(&mut self, cfg: CfgId) -> Block {
        self.add_block(cfg, BlockKind::Basic)
    }

    /// Add an intraprocedural edge. CALL edges go through
    /// [`add_call_edge`](Self::add_call_edge).
    pub fn add_edge(&mut self, source: Block, target: Block, kind: EdgeKind) -> Edge {
        assert!(
            kind != EdgeKind::Call,
            "call edges carry a callee; use add_call_edge"
        );
        assert_eq!(
            self.blocks[source].cfg, self.blocks[target].cfg,
            "non-CALL edge must stay within one CFG"
        );
        let edge = self.edges.alloc(EdgeData {
            source,
            target,
            kind,
            callee: None,
        });
        self.blocks[source].outs.push(edge);
        self.blocks[target].ins.push(edge);
        edge
    }

    /// Add a CALL edge from `source` to the entry block of `callee`.
    pub fn add_call_edge(&mut self, source: Block, callee: CfgId) -> Edge {
        let target = self.cfgs[callee].entry;
        let edge = self.edges.alloc(EdgeData {
            source,
            target,
            kind: EdgeKind::Call,
            callee: Some(callee),
        });
        self.blocks[source].outs.push(edge);
        self.blocks[target].ins.push(edge);
        edge
    }

    pub fn cfg(&self, cfg: CfgId) -> &CfgData {
        &self.cfgs[cfg]
    }

    pub fn block(&self, block: Block) -> &BlockData {
        &self.blocks[block]
    }

    pub fn edge(&self, edge: Edge) -> &EdgeData {
        &self.edges[edge]
    }

    pub fn cfg_of(&self, block: Block) -> CfgId {
        self.blocks[block].cfg
    }

    pub fn entry_of(&self, cfg: CfgId) -> Block {
        self.cfgs[cfg].entry
    }

    pub fn exit_of(&self, cfg: CfgId) -> Block {
        self.cfgs[cfg].exit
    }

    pub fn in_edges(&self, block: Block) -> impl Iterator<Item = Edge> + '_ {
        self.blocks[block].ins.iter().copied()
    }

    pub fn out_edges(&self, block: Block) -> impl Iterator<Item = Edge> + '_ {
        self.blocks[block].outs.iter().copied()
    }

    pub fn cfgs(&self) -> impl Iterator<Item = CfgId> + '_ {
        self.cfgs.ids()
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.blocks.ids()
    }

    pub fn edges(&self) -> impl Iterator<Item = (Edge, &EdgeData)> {
        self.edges.iter()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check the structural preconditions the fixpoint solver relies on:
    /// CFG-local discipline of non-CALL edges, callees on CALL edges, and
    /// an acyclic call relation.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (edge, data) in self.edges.iter() {
            match data.kind {
                EdgeKind::Call => {
                    let callee = data.callee.ok_or(GraphError::MissingCallee { edge })?;
                    if data.target != self.cfgs[callee].entry {
                        return Err(GraphError::CallTargetMismatch { edge });
                    }
                }
                _ => {
                    if self.blocks[data.source].cfg != self.blocks[data.target].cfg {
                        return Err(GraphError::CrossCfgEdge { edge });
                    }
                }
            }
        }

        // Call-relation acyclicity via topological sort.
        let mut graph: DiGraph<CfgId, ()> = DiGraph::new();
        let nodes: Vec<_> = self.cfgs.ids().map(|cfg| graph.add_node(cfg)).collect();
        for (_, data) in self.edges.iter() {
            if let Some(callee) = data.callee {
                let caller = self.blocks[data.source].cfg;
                graph.add_edge(nodes[caller.0.raw()], nodes[callee.0.raw()], ());
            }
        }
        petgraph::algo::toposort(&graph, None).map_err(|cycle| GraphError::RecursiveCall {
            cfg: graph[cycle.node_id()],
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cfg_owns_virtual_entry_and_exit() {
        let mut prog = Program::new();
        let cfg = prog.add_cfg("f");
        assert_eq!(prog.block(prog.entry_of(cfg)).kind, BlockKind::Entry);
        assert_eq!(prog.block(prog.exit_of(cfg)).kind, BlockKind::Exit);
        assert_eq!(prog.main(), Some(cfg));
    }

    #[test]
    fn edges_link_in_and_out_lists() {
        let mut prog = Program::new();
        let cfg = prog.add_cfg("f");
        let b = prog.add_basic(cfg);
        let e1 = prog.add_edge(prog.entry_of(cfg), b, EdgeKind::Entry);
        let e2 = prog.add_edge(b, prog.exit_of(cfg), EdgeKind::Exit);
        assert_eq!(prog.in_edges(b).collect::<Vec<_>>(), vec![e1]);
        assert_eq!(prog.out_edges(b).collect::<Vec<_>>(), vec![e2]);
        assert_eq!(prog.edge(e1).source, prog.entry_of(cfg));
        assert_eq!(prog.edge(e2).target, prog.exit_of(cfg));
    }

    #[test]
    fn call_edge_targets_callee_entry() {
        let mut prog = Program::new();
        let main = prog.add_cfg("main");
        let callee = prog.add_cfg("callee");
        let site = prog.add_basic(main);
        let call = prog.add_call_edge(site, callee);
        assert_eq!(prog.edge(call).kind, EdgeKind::Call);
        assert_eq!(prog.edge(call).callee, Some(callee));
        assert_eq!(prog.edge(call).target, prog.entry_of(callee));
        assert!(prog.validate().is_ok());
    }

    #[test]
    fn validate_rejects_call_cycle() {
        let mut prog = Program::new();
        let f = prog.add_cfg("f");
        let g = prog.add_cfg("g");
        let in_f = prog.add_basic(f);
        let in_g = prog.add_basic(g);
        prog.add_call_edge(in_f, g);
        prog.add_call_edge(in_g, f);
        assert!(matches!(
            prog.validate(),
            Err(GraphError::RecursiveCall { .. })
        ));
    }
}
