//! End-to-end settle-up scenarios
//!
//! Covers exact cancellation, transitive chains, diamonds and the seven-party
//! worked example, under both edge selection policies.

use debt_settlement::{
    Config, DebtRecord, EdgeSelection, PartyId, SettlementEngine, SettlementPlan,
    SettlementRequest, SettlementTransaction,
};
use std::collections::{HashMap, HashSet};

const WORKED_EXAMPLE: &str = include_str!("../fixtures/worked_example.toml");

fn parties(names: &[&str]) -> Vec<PartyId> {
    names.iter().map(|n| PartyId::new(*n)).collect()
}

fn tx(from: &str, to: &str, amount: i64) -> SettlementTransaction {
    SettlementTransaction {
        from: PartyId::new(from),
        to: PartyId::new(to),
        amount,
    }
}

fn engine(selection: EdgeSelection) -> SettlementEngine {
    let mut config = Config::default();
    config.simplifier.selection = selection;
    SettlementEngine::new(config).unwrap()
}

fn settle(names: &[&str], debts: &[(&str, &str, i64)]) -> SettlementPlan {
    let debts: Vec<_> = debts
        .iter()
        .map(|&(from, to, amount)| DebtRecord::new(from, to, amount))
        .collect();
    SettlementEngine::default()
        .settle_debts(&parties(names), &debts)
        .unwrap()
}

/// Net position per party straight from the raw debts
fn raw_balances(debts: &[DebtRecord]) -> HashMap<PartyId, i64> {
    let mut balances = HashMap::new();
    for debt in debts.iter().filter(|d| d.amount > 0 && d.from != d.to) {
        *balances.entry(debt.from.clone()).or_insert(0) -= debt.amount;
        *balances.entry(debt.to.clone()).or_insert(0) += debt.amount;
    }
    balances
}

fn has_cycle(transactions: &[SettlementTransaction]) -> bool {
    let mut adjacency: HashMap<&PartyId, Vec<&PartyId>> = HashMap::new();
    for t in transactions {
        adjacency.entry(&t.from).or_default().push(&t.to);
    }

    fn visit<'a>(
        node: &'a PartyId,
        adjacency: &HashMap<&'a PartyId, Vec<&'a PartyId>>,
        on_stack: &mut HashSet<&'a PartyId>,
        done: &mut HashSet<&'a PartyId>,
    ) -> bool {
        if on_stack.contains(node) {
            return true;
        }
        if !done.insert(node) {
            return false;
        }
        on_stack.insert(node);
        let cyclic = adjacency
            .get(node)
            .into_iter()
            .flatten()
            .any(|&next| visit(next, adjacency, on_stack, done));
        on_stack.remove(node);
        cyclic
    }

    let mut done = HashSet::new();
    transactions
        .iter()
        .any(|t| visit(&t.from, &adjacency, &mut HashSet::new(), &mut done))
}

#[test]
fn test_opposite_debts_cancel() {
    let plan = settle(&["A", "B"], &[("A", "B", 10), ("B", "A", 10)]);
    assert!(plan.is_settled());
    assert_eq!(plan.stats.total_settled, 0);
}

#[test]
fn test_transitive_chain_collapses() {
    let plan = settle(&["A", "B", "C"], &[("A", "B", 10), ("B", "C", 10)]);
    assert_eq!(plan.transactions, vec![tx("A", "C", 10)]);
}

#[test]
fn test_diamond_collapses() {
    let plan = settle(
        &["A", "B", "C", "D"],
        &[("A", "B", 10), ("A", "C", 10), ("B", "D", 10), ("C", "D", 10)],
    );
    assert_eq!(plan.transactions, vec![tx("A", "D", 20)]);
}

#[test]
fn test_long_chain_collapses() {
    let names = ["P0", "P1", "P2", "P3", "P4", "P5"];
    let debts: Vec<_> = names.windows(2).map(|w| (w[0], w[1], 75)).collect();
    let plan = settle(&names, &debts);
    assert_eq!(plan.transactions, vec![tx("P0", "P5", 75)]);
}

#[test]
fn test_worked_example() {
    let request: SettlementRequest = toml::from_str(WORKED_EXAMPLE).unwrap();
    let expected = raw_balances(&request.debts);
    let positive_total: i64 = expected.values().filter(|&&b| b > 0).sum();
    assert_eq!(positive_total, 110);

    for selection in [EdgeSelection::First, EdgeSelection::Last] {
        let plan = engine(selection).settle(&request).unwrap();

        assert_eq!(plan.stats.total_settled, positive_total);
        assert!(!has_cycle(&plan.transactions));

        let mut actual: HashMap<PartyId, i64> = HashMap::new();
        for t in &plan.transactions {
            assert!(t.amount > 0);
            assert_ne!(t.from, t.to);
            *actual.entry(t.from.clone()).or_insert(0) -= t.amount;
            *actual.entry(t.to.clone()).or_insert(0) += t.amount;
        }
        for party in &request.parties {
            let want = expected.get(party).copied().unwrap_or(0);
            let got = actual.get(party).copied().unwrap_or(0);
            assert_eq!(want, got, "balance of {}", party);
        }

        // Alice owes nothing, Bob nets to zero
        assert!(plan
            .transactions
            .iter()
            .all(|t| !["Alice", "Bob"].contains(&t.from.as_str())
                && !["Alice", "Bob"].contains(&t.to.as_str())));
        assert!(plan.transactions.len() < request.debts.len());
    }
}

#[test]
fn test_worked_example_reference_procedure() {
    let request: SettlementRequest = toml::from_str(WORKED_EXAMPLE).unwrap();
    let mut config = Config::default();
    config.simplifier.collapse_chains = false;
    config.simplifier.cancel_circulations = false;

    let plan = SettlementEngine::new(config).unwrap().settle(&request).unwrap();

    // Balances still hold, but intermediaries keep paying and receiving
    assert!(plan.stats.total_settled >= 110);
    assert!(plan.stats.total_settled < plan.stats.total_gross);
}

#[test]
fn test_trip_fixture_with_splits() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/weekend_trip.json");
    let request = SettlementRequest::from_file(path).unwrap();

    let plan = SettlementEngine::default().settle(&request).unwrap();

    assert_eq!(plan.stats.discarded_self_loops, 1);
    assert_eq!(plan.stats.total_settled, 8250);
    let nets: Vec<_> = plan.balances.iter().map(|b| b.net_position).collect();
    assert_eq!(nets, vec![7750, 500, -5500, -2750]);
    assert!(plan
        .transactions
        .iter()
        .all(|t| t.from.as_str() == "cleo" || t.from.as_str() == "dev"));
}

#[test]
fn test_plan_serializes_to_json() {
    let plan = settle(&["A", "B"], &[("A", "B", 10)]);
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["transactions"][0]["from"], "A");
    assert_eq!(json["transactions"][0]["amount"], 10);
    assert_eq!(json["stats"]["party_count"], 2);
}
