//! Expense splits to debt records
//!
//! An expense paid by one party is split into shares; every participant owes
//! the payer their share.

use crate::{
    flow::Amount,
    types::{DebtRecord, PartyId},
};
use serde::{Deserialize, Serialize};

/// One participant's share of an expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSplit {
    /// Party who owes the share
    pub participant: PartyId,

    /// Party who paid the expense
    pub payer: PartyId,

    /// Share in minor units
    pub share: Amount,
}

/// Convert splits into debts `participant -> payer: share`.
///
/// The payer's own share becomes a self-debt, which netting drops.
pub fn debts_from_splits<'a, I>(splits: I) -> Vec<DebtRecord>
where
    I: IntoIterator<Item = &'a ExpenseSplit>,
{
    splits
        .into_iter()
        .map(|split| DebtRecord {
            from: split.participant.clone(),
            to: split.payer.clone(),
            amount: split.share,
        })
        .collect()
}
