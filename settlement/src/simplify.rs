//! Debt simplification driver
//!
//! Repeatedly runs Dinic over the whole current graph between two parties and
//! contracts the routed flow into one direct edge. Every pass builds a fresh
//! graph from the remaining capacities of the previous one; nothing is reset
//! or reused across passes.
//!
//! # Phases
//!
//! 1. **Consolidation**: pick an unresolved edge `s -> t`, contract the max
//!    flow `s -> t`, mark `(s, t)` resolved, until every edge is resolved.
//! 2. **Circulation cancellation**: for each edge `u -> v`, contract the max
//!    flow `v -> u` and re-net the graph so the two directions cancel.
//! 3. **Chain collapse**: for each net debtor `s` and net creditor `t`,
//!    contract the max flow `s -> t` into a direct transfer.
//!
//! After phase 3 every edge runs from a net debtor to a net creditor, so no
//! party pays and receives at the same time and the total moved equals the
//! sum of positive balances.

use crate::{
    config::{EdgeSelection, SimplifierConfig},
    flow::{max_flow, Amount, FlowGraph, VertexId},
    netting::net_obligations,
    types::{Obligation, PartyId, SettlementTransaction},
    Error, Result,
};
use std::collections::HashSet;
use tracing::{debug, info};

/// Output of the driver, still in vertex space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simplification {
    /// Final settlement edges sorted by (from, to)
    pub obligations: Vec<Obligation>,

    /// Max-flow passes run
    pub passes: usize,
}

/// Debt simplification driver for one party index space
#[derive(Debug, Clone)]
pub struct DebtSimplifier {
    labels: Vec<PartyId>,
    config: SimplifierConfig,
}

impl DebtSimplifier {
    /// Create a simplifier over `vertex_count` parties labelled by `labels`.
    ///
    /// Fails before any solving if the label count does not match.
    pub fn new(vertex_count: usize, labels: Vec<PartyId>, config: SimplifierConfig) -> Result<Self> {
        if labels.len() != vertex_count {
            return Err(Error::LabelCountMismatch {
                expected: vertex_count,
                actual: labels.len(),
            });
        }
        Ok(Self { labels, config })
    }

    /// Number of parties
    pub fn vertex_count(&self) -> usize {
        self.labels.len()
    }

    /// Simplify netted obligations into a minimal set of direct transfers
    pub fn simplify(&self, netted: &[Obligation]) -> Result<Simplification> {
        let mut graph = self.build_graph(netted)?;
        let mut passes = 0;

        graph = self.consolidate(graph, &mut passes)?;

        if self.config.cancel_circulations {
            graph = self.cancel_circulations(graph, &mut passes)?;
        }

        if self.config.collapse_chains {
            graph = self.collapse_chains(graph, &mut passes)?;
        }

        let mut obligations: Vec<Obligation> = graph
            .forward_edges()
            .map(|e| Obligation::new(e.from, e.to, e.capacity))
            .collect();
        obligations.sort_by(|x, y| (x.from, x.to).cmp(&(y.from, y.to)));

        if tracing::enabled!(tracing::Level::DEBUG) {
            for line in graph.describe_edges(&self.labels)? {
                debug!("{}", line);
            }
        }
        info!(
            input_edges = netted.len(),
            output_edges = obligations.len(),
            passes,
            "Debt simplification complete"
        );

        Ok(Simplification { obligations, passes })
    }

    /// Map settlement edges back to party labels
    pub fn export(&self, obligations: &[Obligation]) -> Vec<SettlementTransaction> {
        obligations
            .iter()
            .map(|o| SettlementTransaction {
                from: self.labels[o.from].clone(),
                to: self.labels[o.to].clone(),
                amount: o.amount,
            })
            .collect()
    }

    fn build_graph(&self, obligations: &[Obligation]) -> Result<FlowGraph> {
        let mut graph = FlowGraph::new(self.vertex_count());
        for o in obligations {
            if o.from == o.to {
                return Err(Error::InvariantViolation(format!(
                    "self-debt on vertex {} reached the simplifier",
                    o.from
                )));
            }
            graph.add_edge(o.from, o.to, o.amount)?;
        }
        Ok(graph)
    }

    /// Phase 1: resolve every edge key once
    fn consolidate(&self, mut graph: FlowGraph, passes: &mut usize) -> Result<FlowGraph> {
        let limit = graph.edge_count();
        let mut resolved = HashSet::new();
        let mut rounds = 0;

        while let Some((source, sink)) = self.select_unresolved(&graph, &resolved) {
            rounds += 1;
            if rounds > limit {
                return Err(Error::InvariantViolation(format!(
                    "consolidation exceeded {} passes",
                    limit
                )));
            }

            let (next, flow) = self.contract(graph, source, sink)?;
            debug!(source, sink, flow, "Consolidated edge");

            graph = next;
            resolved.insert((source, sink));
            *passes += 1;
        }

        Ok(graph)
    }

    fn select_unresolved(
        &self,
        graph: &FlowGraph,
        resolved: &HashSet<(VertexId, VertexId)>,
    ) -> Option<(VertexId, VertexId)> {
        let mut unresolved = graph
            .forward_edges()
            .map(|e| (e.from, e.to))
            .filter(|key| !resolved.contains(key));

        match self.config.selection {
            EdgeSelection::First => unresolved.next(),
            EdgeSelection::Last => unresolved.last(),
        }
    }

    /// Phase 2: route flow backwards along every edge and let netting cancel it.
    ///
    /// Every iteration checks a new ordered pair, so at most `n * (n - 1)`
    /// passes run.
    fn cancel_circulations(&self, mut graph: FlowGraph, passes: &mut usize) -> Result<FlowGraph> {
        let mut checked = HashSet::new();

        loop {
            let Some((from, to)) = graph
                .forward_edges()
                .map(|e| (e.from, e.to))
                .find(|key| !checked.contains(key))
            else {
                break;
            };

            checked.insert((from, to));
            let (next, flow) = self.contract(graph, to, from)?;
            *passes += 1;

            graph = if flow > 0 {
                debug!(from, to, flow, "Cancelled circulation");
                self.renet(&next)?
            } else {
                next
            };
        }

        Ok(graph)
    }

    /// Phase 3: every debtor pays every creditor it reaches directly
    fn collapse_chains(&self, mut graph: FlowGraph, passes: &mut usize) -> Result<FlowGraph> {
        let balances = vertex_balances(&graph)?;
        let debtors: Vec<VertexId> = (0..balances.len()).filter(|&v| balances[v] < 0).collect();
        let creditors: Vec<VertexId> = (0..balances.len()).filter(|&v| balances[v] > 0).collect();

        for &source in &debtors {
            for &sink in &creditors {
                let (next, flow) = self.contract(graph, source, sink)?;
                if flow > 0 {
                    debug!(source, sink, flow, "Collapsed chain");
                }
                graph = next;
                *passes += 1;
            }
        }

        if vertex_balances(&graph)? != balances {
            return Err(Error::InvariantViolation(
                "chain collapse changed party balances".to_string(),
            ));
        }

        Ok(graph)
    }

    /// Run max flow `source -> sink` over the whole graph and rebuild it with the
    /// remaining capacities plus one `source -> sink` edge carrying the flow.
    ///
    /// The solved graph is consumed.
    fn contract(
        &self,
        mut graph: FlowGraph,
        source: VertexId,
        sink: VertexId,
    ) -> Result<(FlowGraph, Amount)> {
        let flow = max_flow(&mut graph, source, sink)?;
        if self.config.verify_invariants {
            graph.check_invariants()?;
        }

        let mut next = FlowGraph::new(graph.vertex_count());
        for edge in graph.forward_edges() {
            let remaining = edge.remaining_capacity();
            if remaining > 0 {
                next.add_edge(edge.from, edge.to, remaining)?;
            }
        }
        if flow.value > 0 {
            next.add_edge(source, sink, flow.value)?;
        }

        Ok((next, flow.value))
    }

    fn renet(&self, graph: &FlowGraph) -> Result<FlowGraph> {
        let edges: Vec<Obligation> = graph
            .forward_edges()
            .map(|e| Obligation::new(e.from, e.to, e.capacity))
            .collect();
        self.build_graph(&net_obligations(&edges)?.obligations)
    }
}

/// Net position per vertex implied by the forward edges (receivable - owed)
fn vertex_balances(graph: &FlowGraph) -> Result<Vec<Amount>> {
    let mut balances = vec![0 as Amount; graph.vertex_count()];
    for edge in graph.forward_edges() {
        balances[edge.from] = balances[edge.from]
            .checked_sub(edge.capacity)
            .ok_or(Error::AmountOverflow)?;
        balances[edge.to] = balances[edge.to]
            .checked_add(edge.capacity)
            .ok_or(Error::AmountOverflow)?;
    }
    Ok(balances)
}
