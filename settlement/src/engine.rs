//! Main settlement engine
//!
//! Orchestrates party indexing, netting and simplification for one settle-up
//! request. Every call is independent: no state survives between requests.

use crate::{
    config::Config,
    flow::{Amount, VertexId},
    netting::{net_obligations, net_positions},
    simplify::DebtSimplifier,
    splits::{debts_from_splits, ExpenseSplit},
    types::*,
    Error, Result,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// Input of one settle-up request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    /// Ordered, unique party labels; their position is the vertex index
    pub parties: Vec<PartyId>,

    /// Debts between parties
    #[serde(default)]
    pub debts: Vec<DebtRecord>,

    /// Expense splits, converted to debts before netting
    #[serde(default)]
    pub splits: Vec<ExpenseSplit>,
}

impl SettlementRequest {
    /// Request from parties and debts
    pub fn new(parties: Vec<PartyId>, debts: Vec<DebtRecord>) -> Self {
        Self {
            parties,
            debts,
            splits: Vec::new(),
        }
    }

    /// Load a request from a `.json` or `.toml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            other => Err(Error::Config(format!(
                "Unsupported request format: {:?}",
                other
            ))),
        }
    }

    /// Debts plus the debts implied by expense splits
    pub fn all_debts(&self) -> Vec<DebtRecord> {
        let mut debts = self.debts.clone();
        debts.extend(debts_from_splits(&self.splits));
        debts
    }
}

/// Settlement engine
#[derive(Debug, Clone, Default)]
pub struct SettlementEngine {
    /// Configuration
    config: Config,
}

impl SettlementEngine {
    /// Create new settlement engine
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Settle a request
    pub fn settle(&self, request: &SettlementRequest) -> Result<SettlementPlan> {
        self.settle_debts(&request.parties, &request.all_debts())
    }

    /// Compute the settlement plan for `debts` among `parties`
    pub fn settle_debts(&self, parties: &[PartyId], debts: &[DebtRecord]) -> Result<SettlementPlan> {
        tracing::info!(
            parties = parties.len(),
            debts = debts.len(),
            "Starting settlement"
        );

        // Step 1: dense index space
        let raw = index_debts(parties, debts)?;

        // Step 2: pairwise netting
        let netting = net_obligations(&raw)?;
        tracing::debug!(
            netted_edges = netting.obligations.len(),
            cancelled_pairs = netting.cancelled_pairs,
            "Netting complete"
        );

        // Step 3: max-flow simplification
        let simplifier =
            DebtSimplifier::new(parties.len(), parties.to_vec(), self.config.simplifier.clone())?;
        let simplified = simplifier.simplify(&netting.obligations)?;

        // Step 4: every party must end exactly where the raw debts put them
        let balances = net_positions(parties, &raw)?;
        verify_settlement(&balances, parties, &simplified.obligations)?;

        let total_gross = sum_amounts(raw.iter().filter(|o| o.amount > 0 && o.from != o.to))?;
        let total_settled = sum_amounts(simplified.obligations.iter())?;

        let stats = SettlementStats {
            party_count: parties.len(),
            debt_count: debts.len(),
            discarded_non_positive: netting.discarded_non_positive,
            discarded_self_loops: netting.discarded_self_loops,
            netted_edge_count: netting.obligations.len(),
            passes: simplified.passes,
            total_gross,
            total_settled,
        };

        let plan = SettlementPlan {
            plan_id: Uuid::new_v4(),
            transactions: simplifier.export(&simplified.obligations),
            balances,
            stats,
            created_at: Utc::now(),
        };

        tracing::info!(
            "Settlement complete: {} gross -> {} settled in {} transfers ({:.1}% efficiency)",
            plan.stats.total_gross,
            plan.stats.total_settled,
            plan.transactions.len(),
            plan.efficiency() * 100.0
        );

        Ok(plan)
    }
}

/// Map labelled debts onto vertex indices
fn index_debts(parties: &[PartyId], debts: &[DebtRecord]) -> Result<Vec<Obligation>> {
    let mut index: HashMap<&PartyId, VertexId> = HashMap::with_capacity(parties.len());
    for (vertex, party) in parties.iter().enumerate() {
        if index.insert(party, vertex).is_some() {
            return Err(Error::DuplicateParty(party.to_string()));
        }
    }

    debts
        .iter()
        .map(|debt| {
            let from = *index
                .get(&debt.from)
                .ok_or_else(|| Error::UnknownParty(debt.from.to_string()))?;
            let to = *index
                .get(&debt.to)
                .ok_or_else(|| Error::UnknownParty(debt.to.to_string()))?;
            Ok(Obligation::new(from, to, debt.amount))
        })
        .collect()
}

fn verify_settlement(
    expected: &[PartyBalance],
    parties: &[PartyId],
    settlement: &[Obligation],
) -> Result<()> {
    if let Some(bad) = settlement.iter().find(|o| o.amount <= 0 || o.from == o.to) {
        return Err(Error::InvariantViolation(format!(
            "invalid settlement transfer {} -> {}: {}",
            bad.from, bad.to, bad.amount
        )));
    }

    let actual = net_positions(parties, settlement)?;
    for (want, got) in expected.iter().zip(&actual) {
        if want.net_position != got.net_position {
            return Err(Error::InvariantViolation(format!(
                "party {} should net {} but settlement nets {}",
                want.party, want.net_position, got.net_position
            )));
        }
    }

    Ok(())
}

fn sum_amounts<'a>(mut obligations: impl Iterator<Item = &'a Obligation>) -> Result<Amount> {
    obligations.try_fold(0 as Amount, |total, o| {
        total.checked_add(o.amount).ok_or(Error::AmountOverflow)
    })
}
