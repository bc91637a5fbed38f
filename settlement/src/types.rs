//! Core types for the settlement engine

use crate::flow::{Amount, VertexId};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque party label supplied by the caller (user id, name, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    /// Create new party ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PartyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Raw debt: `from` owes `to` the given amount in minor currency units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRecord {
    /// Debtor
    pub from: PartyId,

    /// Creditor
    pub to: PartyId,

    /// Amount owed (minor units)
    pub amount: Amount,
}

impl DebtRecord {
    /// Create new debt record
    pub fn new(from: impl Into<PartyId>, to: impl Into<PartyId>, amount: Amount) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}

/// Debt between dense vertex indices, the unit the netting and flow layers work on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Obligation {
    /// Debtor vertex
    pub from: VertexId,

    /// Creditor vertex
    pub to: VertexId,

    /// Amount owed (minor units)
    pub amount: Amount,
}

impl Obligation {
    /// Create new obligation
    pub fn new(from: VertexId, to: VertexId, amount: Amount) -> Self {
        Self { from, to, amount }
    }
}

/// Transfer to execute so that everyone ends at their net balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTransaction {
    /// Payer
    pub from: PartyId,

    /// Payee
    pub to: PartyId,

    /// Amount to transfer (minor units, always positive)
    pub amount: Amount,
}

/// A party's aggregate position across all debts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyBalance {
    /// Party
    pub party: PartyId,

    /// Total owed to others
    pub total_owed: Amount,

    /// Total owed by others
    pub total_receivable: Amount,

    /// Net position (positive = net receiver, negative = net payer)
    pub net_position: Amount,
}

impl PartyBalance {
    /// Create new zero balance
    pub fn new(party: PartyId) -> Self {
        Self {
            party,
            total_owed: 0,
            total_receivable: 0,
            net_position: 0,
        }
    }

    /// Update balance with one debt
    pub fn add_obligation(&mut self, amount: Amount, is_debtor: bool) -> Result<()> {
        let total = if is_debtor {
            &mut self.total_owed
        } else {
            &mut self.total_receivable
        };
        *total = total.checked_add(amount).ok_or(Error::AmountOverflow)?;
        self.net_position = self
            .total_receivable
            .checked_sub(self.total_owed)
            .ok_or(Error::AmountOverflow)?;
        Ok(())
    }

    /// Check if net payer (owes money)
    pub fn is_net_payer(&self) -> bool {
        self.net_position < 0
    }

    /// Check if net receiver (receives money)
    pub fn is_net_receiver(&self) -> bool {
        self.net_position > 0
    }

    /// Settled up already
    pub fn is_settled(&self) -> bool {
        self.net_position == 0
    }
}

/// Counters collected while computing a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementStats {
    /// Number of parties
    pub party_count: usize,

    /// Raw debt records received
    pub debt_count: usize,

    /// Records dropped for non-positive amounts
    pub discarded_non_positive: usize,

    /// Records dropped as self-debts
    pub discarded_self_loops: usize,

    /// Edges left after netting
    pub netted_edge_count: usize,

    /// Max-flow passes run by the simplifier
    pub passes: usize,

    /// Sum of valid raw debt amounts
    pub total_gross: Amount,

    /// Sum of settlement transaction amounts
    pub total_settled: Amount,
}

/// Result of one settle-up request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Plan ID
    pub plan_id: Uuid,

    /// Transactions to execute, sorted by (payer, payee) party order
    pub transactions: Vec<SettlementTransaction>,

    /// Net position of every party
    pub balances: Vec<PartyBalance>,

    /// Statistics
    pub stats: SettlementStats,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl SettlementPlan {
    /// Share of the gross debt volume that no longer has to move (0.0 - 1.0)
    pub fn efficiency(&self) -> f64 {
        if self.stats.total_gross == 0 {
            return 0.0;
        }
        (self.stats.total_gross - self.stats.total_settled) as f64 / self.stats.total_gross as f64
    }

    /// Amount saved compared to paying every debt individually
    pub fn savings(&self) -> Amount {
        self.stats.total_gross - self.stats.total_settled
    }

    /// Nothing to pay
    pub fn is_settled(&self) -> bool {
        self.transactions.is_empty()
    }
}
