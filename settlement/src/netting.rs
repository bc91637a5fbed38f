//! Pairwise netting
//!
//! Reduces raw debts to at most one edge per unordered pair of parties before
//! any flow is computed.
//!
//! # Example
//!
//! ```text
//! Raw debts:
//!   A owes B: 100
//!   A owes B: 20
//!   B owes A: 80
//!   C owes C: 5     (self-debt, dropped)
//!   B owes C: 0     (no obligation, dropped)
//!
//! Netted:
//!   A owes B: 40
//! ```

use crate::{
    flow::{Amount, VertexId},
    types::{Obligation, PartyBalance, PartyId},
    Error, Result,
};
use std::collections::{BTreeMap, BTreeSet};

/// Netted edges plus what was dropped on the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NettingOutcome {
    /// At most one edge per unordered pair, sorted by (from, to)
    pub obligations: Vec<Obligation>,

    /// Records with amount <= 0
    pub discarded_non_positive: usize,

    /// Records with from == to
    pub discarded_self_loops: usize,

    /// Pairs whose opposing debts cancelled exactly
    pub cancelled_pairs: usize,
}

/// Aggregate duplicate debts and cancel opposing ones.
///
/// Non-positive amounts and self-debts carry no obligation and are dropped
/// rather than rejected.
pub fn net_obligations(raw: &[Obligation]) -> Result<NettingOutcome> {
    let mut outcome = NettingOutcome::default();

    // Step 1: aggregate by ordered pair
    let mut gross: BTreeMap<(VertexId, VertexId), Amount> = BTreeMap::new();
    for obligation in raw {
        if obligation.amount <= 0 {
            outcome.discarded_non_positive += 1;
            continue;
        }
        if obligation.from == obligation.to {
            outcome.discarded_self_loops += 1;
            continue;
        }

        let sum = gross.entry((obligation.from, obligation.to)).or_insert(0);
        *sum = sum
            .checked_add(obligation.amount)
            .ok_or(Error::AmountOverflow)?;
    }

    // Step 2: net each unordered pair exactly once
    let mut visited = BTreeSet::new();
    for (&(a, b), &forward) in &gross {
        if !visited.insert((a.min(b), a.max(b))) {
            continue;
        }

        let backward = gross.get(&(b, a)).copied().unwrap_or(0);
        let net = forward - backward;

        if net > 0 {
            outcome.obligations.push(Obligation::new(a, b, net));
        } else if net < 0 {
            outcome.obligations.push(Obligation::new(b, a, -net));
        } else {
            outcome.cancelled_pairs += 1;
        }
    }

    // Step 3: deterministic order
    outcome
        .obligations
        .sort_by(|x, y| (x.from, x.to).cmp(&(y.from, y.to)));

    if outcome.discarded_non_positive > 0 || outcome.discarded_self_loops > 0 {
        tracing::warn!(
            non_positive = outcome.discarded_non_positive,
            self_loops = outcome.discarded_self_loops,
            "Dropped debts that carry no obligation"
        );
    }

    Ok(outcome)
}

/// Net position of every party, in party order
pub fn net_positions(parties: &[PartyId], obligations: &[Obligation]) -> Result<Vec<PartyBalance>> {
    let mut positions: Vec<PartyBalance> =
        parties.iter().cloned().map(PartyBalance::new).collect();

    for obl in obligations {
        if obl.amount <= 0 || obl.from == obl.to {
            continue;
        }
        for vertex in [obl.from, obl.to] {
            if vertex >= positions.len() {
                return Err(Error::VertexOutOfRange {
                    vertex,
                    vertex_count: positions.len(),
                });
            }
        }

        positions[obl.from].add_obligation(obl.amount, true)?;
        positions[obl.to].add_obligation(obl.amount, false)?;
    }

    Ok(positions)
}
