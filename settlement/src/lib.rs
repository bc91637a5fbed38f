//! Debt Settlement Core
//!
//! Computes the smallest set of direct transfers that settles a group's
//! pairwise debts.
//!
//! # Architecture
//!
//! 1. **Indexing**: party labels become dense vertex indices
//! 2. **Netting**: duplicate and opposing debts collapse to one edge per pair
//! 3. **Simplification**: Dinic max-flow passes over the whole debt graph
//!    contract multi-hop routes into direct transfers
//! 4. **Export**: settlement edges are mapped back to party labels
//!
//! # Invariants
//!
//! - Conservation: every party's net balance is unchanged by settlement
//! - Flow: `0 <= flow <= capacity` and `flow == -residual.flow` on every edge
//! - No self-settlement, every amount strictly positive
//!
//! # Example
//!
//! ```
//! use debt_settlement::{DebtRecord, PartyId, SettlementEngine};
//!
//! let engine = SettlementEngine::default();
//! let parties: Vec<PartyId> = ["A", "B", "C"].into_iter().map(PartyId::from).collect();
//! let debts = vec![DebtRecord::new("A", "B", 10), DebtRecord::new("B", "C", 10)];
//!
//! let plan = engine.settle_debts(&parties, &debts)?;
//! assert_eq!(plan.transactions.len(), 1);
//! assert_eq!(plan.transactions[0].amount, 10);
//! # Ok::<(), debt_settlement::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod netting;
pub mod simplify;
pub mod splits;
pub mod types;

// Re-exports
pub use config::{Config, EdgeSelection, SimplifierConfig};
pub use engine::{SettlementEngine, SettlementRequest};
pub use error::{Error, Result};
pub use flow::{Amount, FlowGraph, VertexId};
pub use simplify::DebtSimplifier;
pub use types::*;
