use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use crate::ids::Block;
use crate::program::{EdgeKind, Program};

/// Dominator trees for every CFG of a program.
///
/// Dominance is intraprocedural: CALL edges are ignored, and blocks of
/// different CFGs never dominate each other. Blocks unreachable from their
/// CFG's entry have no dominator information and are dominated by nothing.
#[derive(Debug)]
pub struct Dominance {
    /// Immediate dominator per block; entry blocks (and unreachable
    /// blocks) are absent.
    idom: FxHashMap<Block, Block>,
}

impl Dominance {
    pub fn compute(program: &Program) -> Self {
        let mut idom = FxHashMap::default();
        for cfg in program.cfgs() {
            let mut graph: DiGraph<Block, ()> = DiGraph::new();
            let mut nodes: FxHashMap<Block, NodeIndex> = FxHashMap::default();
            for &block in program.cfg(cfg).blocks() {
                nodes.insert(block, graph.add_node(block));
            }
            for &block in program.cfg(cfg).blocks() {
                for edge in program.out_edges(block) {
                    let data = program.edge(edge);
                    if data.kind == EdgeKind::Call {
                        continue;
                    }
                    graph.add_edge(nodes[&data.source], nodes[&data.target], ());
                }
            }
            let doms = petgraph::algo::dominators::simple_fast(&graph, nodes[&program.entry_of(cfg)]);
            for &block in program.cfg(cfg).blocks() {
                if let Some(parent) = doms.immediate_dominator(nodes[&block]) {
                    idom.insert(block, graph[parent]);
                }
            }
        }
        Self { idom }
    }

    /// Whether `a` dominates `b` (reflexively).
    pub fn dominates(&self, a: Block, b: Block) -> bool {
        if a == b {
            return true;
        }
        let mut cursor = b;
        while let Some(&parent) = self.idom.get(&cursor) {
            if parent == a {
                return true;
            }
            cursor = parent;
        }
        false
    }

    /// Whether a non-CALL edge is a loop back edge, i.e. its target
    /// dominates its source.
    pub fn is_back_edge(&self, program: &Program, edge: crate::ids::Edge) -> bool {
        let data = program.edge(edge);
        data.kind != EdgeKind::Call && self.dominates(data.target, data.source)
    }
}
