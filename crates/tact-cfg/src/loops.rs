use rustc_hash::{FxHashMap, FxHashSet};

use crate::dominance::Dominance;
use crate::ids::{Block, Edge};
use crate::program::{EdgeKind, Program};

/// Loop metadata consumed by the fixpoint solver: loop headers, natural
/// loop bodies, and the exit edges of each loop.
///
/// A block is a loop header when it is the target of a back edge (an edge
/// whose source it dominates). The body of a loop is the union of the
/// natural loops of all back edges sharing the header. An exit edge leaves
/// the body; an edge leaving several nested loops appears in the exit list
/// of every loop it leaves, and [`exit_of`](Self::exit_of) reports the
/// outermost one.
#[derive(Debug, Default)]
pub struct LoopInfo {
    bodies: FxHashMap<Block, FxHashSet<Block>>,
    exit_lists: FxHashMap<Block, Vec<Edge>>,
    exit_of: FxHashMap<Edge, Block>,
}

impl LoopInfo {
    pub fn compute(program: &Program, dom: &Dominance) -> Self {
        let mut bodies: FxHashMap<Block, FxHashSet<Block>> = FxHashMap::default();

        for (_, data) in program.edges() {
            if data.kind == EdgeKind::Call || !dom.dominates(data.target, data.source) {
                continue;
            }
            let header = data.target;
            let body = bodies.entry(header).or_default();
            body.insert(header);
            // Natural loop: walk predecessors backwards from the back-edge
            // source until the header fences the search.
            let mut stack = vec![data.source];
            while let Some(block) = stack.pop() {
                if !body.insert(block) {
                    continue;
                }
                for edge in program.in_edges(block) {
                    let pred = program.edge(edge);
                    if pred.kind != EdgeKind::Call && !body.contains(&pred.source) {
                        stack.push(pred.source);
                    }
                }
            }
        }

        let mut exit_lists: FxHashMap<Block, Vec<Edge>> = FxHashMap::default();
        let mut exit_of: FxHashMap<Edge, Block> = FxHashMap::default();
        for (header, body) in &bodies {
            let mut exits = Vec::new();
            for &block in body {
                for edge in program.out_edges(block) {
                    let data = program.edge(edge);
                    if data.kind != EdgeKind::Call && !body.contains(&data.target) {
                        exits.push(edge);
                        // The outermost exited loop is the one with the
                        // largest body; exited loops always nest.
                        let outermost = exit_of
                            .get(&edge)
                            .is_none_or(|prev| bodies[prev].len() < body.len());
                        if outermost {
                            exit_of.insert(edge, *header);
                        }
                    }
                }
            }
            exit_lists.insert(*header, exits);
        }

        Self {
            bodies,
            exit_lists,
            exit_of,
        }
    }

    pub fn is_header(&self, block: Block) -> bool {
        self.bodies.contains_key(&block)
    }

    pub fn headers(&self) -> impl Iterator<Item = Block> + '_ {
        self.bodies.keys().copied()
    }

    pub fn header_count(&self) -> usize {
        self.bodies.len()
    }

    /// Whether `block` belongs to the loop of `header` (the header itself
    /// included).
    pub fn in_loop(&self, header: Block, block: Block) -> bool {
        self.bodies
            .get(&header)
            .is_some_and(|body| body.contains(&block))
    }

    /// The edges leaving the loop of `header`. Empty for non-headers.
    pub fn exit_edges(&self, header: Block) -> &[Edge] {
        self.exit_lists
            .get(&header)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The header of the outermost loop this edge exits, if any.
    pub fn exit_of(&self, edge: Edge) -> Option<Block> {
        self.exit_of.get(&edge).copied()
    }
}
