//! Flow network model
//!
//! Edges live in a single arena. Every forward edge is paired with a residual
//! twin and each of them stores the arena index of the other, so the pair never
//! forms an ownership cycle.
//!
//! Invariants, for every forward edge `e` with residual `r`:
//! - `0 <= e.flow <= e.capacity`
//! - `e.flow == -r.flow`

pub mod dinic;

pub use dinic::{cut_capacity, max_flow, MaxFlow};

use crate::{Error, Result};

/// Dense vertex index within one solve pass
pub type VertexId = usize;

/// Index of an edge in the arena
pub type EdgeId = usize;

/// Amount in minor currency units
pub type Amount = i64;

/// Directed capacity edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    /// Tail vertex
    pub from: VertexId,

    /// Head vertex
    pub to: VertexId,

    /// Capacity (zero for residual edges)
    pub capacity: Amount,

    /// Current flow
    pub flow: Amount,

    /// Arena index of the paired edge
    pub residual: EdgeId,

    /// Whether this is the reverse twin of a real edge
    pub is_residual: bool,
}

impl FlowEdge {
    /// Capacity still available on this edge
    pub fn remaining_capacity(&self) -> Amount {
        self.capacity - self.flow
    }
}

/// Capacitated directed graph with residual edges
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    vertex_count: usize,
    edges: Vec<FlowEdge>,
    adjacency: Vec<Vec<EdgeId>>,
    forward: Vec<EdgeId>,
}

impl FlowGraph {
    /// Create an empty graph over `vertex_count` vertices
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            edges: Vec::new(),
            adjacency: vec![Vec::new(); vertex_count],
            forward: Vec::new(),
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Add a forward edge and its zero-capacity residual twin.
    ///
    /// Returns the arena index of the forward edge.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, capacity: Amount) -> Result<EdgeId> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;
        if capacity < 0 {
            return Err(Error::NegativeCapacity { from, to, capacity });
        }

        let id = self.edges.len();
        self.edges.push(FlowEdge {
            from,
            to,
            capacity,
            flow: 0,
            residual: id + 1,
            is_residual: false,
        });
        self.edges.push(FlowEdge {
            from: to,
            to: from,
            capacity: 0,
            flow: 0,
            residual: id,
            is_residual: true,
        });

        self.adjacency[from].push(id);
        self.adjacency[to].push(id + 1);
        self.forward.push(id);

        Ok(id)
    }

    /// Edge by arena index
    pub fn edge(&self, id: EdgeId) -> &FlowEdge {
        &self.edges[id]
    }

    /// Edges incident to `vertex` (forward edges leaving it, residuals entering it)
    pub fn adjacent(&self, vertex: VertexId) -> &[EdgeId] {
        &self.adjacency[vertex]
    }

    /// Forward (non-residual) edges in insertion order
    pub fn forward_edges(&self) -> impl Iterator<Item = &FlowEdge> + '_ {
        self.forward.iter().map(move |&id| &self.edges[id])
    }

    /// Number of forward edges
    pub fn edge_count(&self) -> usize {
        self.forward.len()
    }

    /// Push `amount` along edge `id`, mirroring it on the residual twin.
    ///
    /// This is the only way flow changes.
    pub fn augment(&mut self, id: EdgeId, amount: Amount) {
        let residual = self.edges[id].residual;
        self.edges[id].flow += amount;
        self.edges[residual].flow -= amount;
    }

    /// Verify the flow invariants on every edge pair
    pub fn check_invariants(&self) -> Result<()> {
        for &id in &self.forward {
            let edge = &self.edges[id];
            let twin = &self.edges[edge.residual];

            if edge.flow < 0 || edge.flow > edge.capacity {
                return Err(Error::InvariantViolation(format!(
                    "edge {} -> {} carries flow {} outside [0, {}]",
                    edge.from, edge.to, edge.flow, edge.capacity
                )));
            }
            if edge.flow != -twin.flow || twin.residual != id || !twin.is_residual {
                return Err(Error::InvariantViolation(format!(
                    "edge {} -> {} is out of sync with its residual",
                    edge.from, edge.to
                )));
            }
        }
        Ok(())
    }

    /// Render forward edges as `label ----capacity----> label`, one per line.
    ///
    /// `labels` must hold one label per vertex.
    pub fn describe_edges<L: std::fmt::Display>(&self, labels: &[L]) -> Result<Vec<String>> {
        if labels.len() != self.vertex_count {
            return Err(Error::LabelCountMismatch {
                expected: self.vertex_count,
                actual: labels.len(),
            });
        }

        Ok(self
            .forward_edges()
            .map(|e| format!("{} ----{}----> {}", labels[e.from], e.capacity, labels[e.to]))
            .collect())
    }

    pub(crate) fn check_vertex(&self, vertex: VertexId) -> Result<()> {
        if vertex >= self.vertex_count {
            return Err(Error::VertexOutOfRange {
                vertex,
                vertex_count: self.vertex_count,
            });
        }
        Ok(())
    }
}
