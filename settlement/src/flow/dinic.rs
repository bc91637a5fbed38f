//! Dinic's maximum flow algorithm
//!
//! # Algorithm
//!
//! 1. BFS from the source over edges with remaining capacity builds the level
//!    graph. If the sink is unreached the current flow is maximal.
//! 2. Blocking flow: repeated DFS restricted to level-increasing edges. Each
//!    vertex keeps a next-edge pointer for the phase so exhausted edges are
//!    never rescanned.
//! 3. Repeat until the sink becomes unreachable. `O(V^2 E)` overall.
//!
//! The DFS keeps its path on an explicit stack, so deep graphs cannot exhaust
//! the call stack.
//!
//! Vertices reached by the final BFS form the source side of a minimum cut.

use super::{Amount, EdgeId, FlowGraph, VertexId};
use crate::{Error, Result};
use std::collections::VecDeque;

/// Seeds the bottleneck `min()` chain; never stored as an edge capacity
const UNBOUNDED: Amount = Amount::MAX / 2;

/// Result of a maximum flow computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxFlow {
    /// Maximum flow value from source to sink
    pub value: Amount,

    /// `min_cut[v]` is true when `v` is on the source side of the minimum cut
    pub min_cut: Vec<bool>,

    /// Number of BFS phases that reached the sink
    pub phases: usize,
}

impl MaxFlow {
    /// Vertices on the source side of the minimum cut
    pub fn source_side(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.min_cut
            .iter()
            .enumerate()
            .filter_map(|(v, &reached)| reached.then_some(v))
    }
}

/// Compute the maximum flow from `source` to `sink`.
///
/// Edge flows of `graph` are updated to realise one maximum flow.
pub fn max_flow(graph: &mut FlowGraph, source: VertexId, sink: VertexId) -> Result<MaxFlow> {
    graph.check_vertex(source)?;
    graph.check_vertex(sink)?;
    if source == sink {
        return Err(Error::SameTerminals(source));
    }

    Dinic::new(graph, source, sink).run()
}

/// Total capacity of forward edges crossing from the source side to the sink side
pub fn cut_capacity(graph: &FlowGraph, source_side: &[bool]) -> Result<Amount> {
    if source_side.len() != graph.vertex_count() {
        return Err(Error::LabelCountMismatch {
            expected: graph.vertex_count(),
            actual: source_side.len(),
        });
    }

    graph
        .forward_edges()
        .filter(|e| source_side[e.from] && !source_side[e.to])
        .try_fold(0 as Amount, |total, e| {
            total.checked_add(e.capacity).ok_or(Error::AmountOverflow)
        })
}

struct Dinic<'g> {
    graph: &'g mut FlowGraph,
    source: VertexId,
    sink: VertexId,
    level: Vec<Option<usize>>,
    next: Vec<usize>,
}

impl<'g> Dinic<'g> {
    fn new(graph: &'g mut FlowGraph, source: VertexId, sink: VertexId) -> Self {
        let n = graph.vertex_count();
        Self {
            graph,
            source,
            sink,
            level: vec![None; n],
            next: vec![0; n],
        }
    }

    fn run(mut self) -> Result<MaxFlow> {
        let mut value: Amount = 0;
        let mut phases = 0;
        let mut path = Vec::new();

        while self.build_levels() {
            phases += 1;
            self.next.fill(0);

            loop {
                let pushed = self.augment_path(&mut path);
                if pushed == 0 {
                    break;
                }
                value = value.checked_add(pushed).ok_or(Error::AmountOverflow)?;
            }
        }

        Ok(MaxFlow {
            value,
            min_cut: self.level.iter().map(Option::is_some).collect(),
            phases,
        })
    }

    /// BFS from the source; returns whether the sink was reached
    fn build_levels(&mut self) -> bool {
        self.level.fill(None);
        self.level[self.source] = Some(0);

        let mut queue = VecDeque::from([self.source]);
        while let Some(node) = queue.pop_front() {
            let next_level = self.level[node].map(|l| l + 1);
            for &id in self.graph.adjacent(node) {
                let edge = self.graph.edge(id);
                if edge.remaining_capacity() > 0 && self.level[edge.to].is_none() {
                    self.level[edge.to] = next_level;
                    queue.push_back(edge.to);
                }
            }
        }

        self.level[self.sink].is_some()
    }

    /// Find one source-sink path in the level graph and saturate its bottleneck.
    ///
    /// Returns the amount pushed, zero once the phase is blocked.
    fn augment_path(&mut self, path: &mut Vec<EdgeId>) -> Amount {
        path.clear();
        let mut at = self.source;

        while at != self.sink {
            match self.advance(at) {
                Some(id) => {
                    path.push(id);
                    at = self.graph.edge(id).to;
                }
                None => {
                    // dead end: step back and skip the edge that led here
                    let Some(id) = path.pop() else {
                        return 0;
                    };
                    at = self.graph.edge(id).from;
                    self.next[at] += 1;
                }
            }
        }

        let bottleneck = path.iter().fold(UNBOUNDED, |acc, &id| {
            acc.min(self.graph.edge(id).remaining_capacity())
        });
        for &id in path.iter() {
            self.graph.augment(id, bottleneck);
        }

        bottleneck
    }

    /// Next admissible edge out of `at`, advancing its pointer past dead ones
    fn advance(&mut self, at: VertexId) -> Option<EdgeId> {
        let wanted = self.level[at]? + 1;
        let adjacent = self.graph.adjacent(at);

        while self.next[at] < adjacent.len() {
            let id = adjacent[self.next[at]];
            let edge = self.graph.edge(id);
            if edge.remaining_capacity() > 0 && self.level[edge.to] == Some(wanted) {
                return Some(id);
            }
            self.next[at] += 1;
        }

        None
    }
}
