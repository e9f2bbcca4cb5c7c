//! Coverage and automation statistics over a closed set of transactions.

use std::collections::{BTreeMap, HashSet};

use bankrules_core::{BankTransaction, Rule};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::matcher::test_rule;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStat {
    pub account: String,
    pub label: String,
    pub transaction_count: usize,
    /// Share of this account in all transactions.
    pub total_pct: f64,
    /// Share of this account's transactions covered by an active rule.
    pub covered_pct: f64,
    pub remaining_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStatistics {
    pub matched_count: usize,
    pub total_count: usize,
    pub coverage_pct: f64,
    pub matched_amount: Decimal,
    pub total_amount: Decimal,
    pub amount_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionDetail {
    pub account: String,
    pub label: String,
    pub amount: Decimal,
}

/// Outcome of probing a draft rule against one target account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleProbe {
    pub matched_total: usize,
    pub matched_in_account: usize,
    pub matched_elsewhere: usize,
    pub coverage_pct: f64,
    pub collision_pct: f64,
    pub collisions: Vec<CollisionDetail>,
}

/// Ids of transactions matched by at least one active rule. A transaction
/// matched by several rules is counted once.
fn covered_ids(transactions: &[BankTransaction], rules: &[Rule]) -> HashSet<i64> {
    let mut covered = HashSet::new();
    for rule in rules.iter().filter(|r| r.is_active) {
        covered.extend(test_rule(rule, transactions).iter().map(|tx| tx.id));
    }
    covered
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 1 decimal normally; 2 decimals under 0.1 so a near-zero share does not
/// display as exactly zero.
fn round_pct(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else if value < 0.1 {
        (value * 100.0).round() / 100.0
    } else {
        round1(value)
    }
}

/// Share of all transactions covered by at least one active rule, in percent.
pub fn automation_rate(transactions: &[BankTransaction], rules: &[Rule]) -> f64 {
    if transactions.is_empty() {
        return 0.0;
    }
    let covered = covered_ids(transactions, rules);
    round1(covered.len() as f64 / transactions.len() as f64 * 100.0)
}

/// Per-counterpart-account coverage, sorted by group size descending (ties by
/// account code, so repeated calls agree).
pub fn account_statistics(transactions: &[BankTransaction], rules: &[Rule]) -> Vec<AccountStat> {
    let total = transactions.len();
    if total == 0 {
        return Vec::new();
    }

    let covered = covered_ids(transactions, rules);

    let mut groups: BTreeMap<&str, (Vec<&BankTransaction>, &str)> = BTreeMap::new();
    for tx in transactions {
        let entry = groups
            .entry(tx.counterpart_account.as_str())
            .or_insert_with(|| (Vec::new(), tx.account_label.as_str()));
        entry.0.push(tx);
    }

    let mut stats: Vec<AccountStat> = groups
        .into_iter()
        .map(|(account, (txs, label))| {
            let count = txs.len();
            let covered_count = txs.iter().filter(|tx| covered.contains(&tx.id)).count();
            let covered_pct = covered_count as f64 / count as f64 * 100.0;
            AccountStat {
                account: account.to_string(),
                label: label.to_string(),
                transaction_count: count,
                total_pct: round_pct(count as f64 / total as f64 * 100.0),
                covered_pct: round_pct(covered_pct),
                remaining_pct: round_pct((100.0 - covered_pct).max(0.0)),
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.transaction_count
            .cmp(&a.transaction_count)
            .then_with(|| a.account.cmp(&b.account))
    });
    stats
}

/// Number of distinct counterpart accounts where two or more active rules
/// each match at least one transaction. One account is one collision unit no
/// matter how many rules overlap there.
pub fn collision_count(rules: &[Rule], transactions: &[BankTransaction]) -> usize {
    let mut rules_per_account: BTreeMap<&str, usize> = BTreeMap::new();
    for rule in rules.iter().filter(|r| r.is_active) {
        let accounts: HashSet<&str> = test_rule(rule, transactions)
            .iter()
            .map(|tx| tx.counterpart_account.as_str())
            .collect();
        for account in accounts {
            *rules_per_account.entry(account).or_default() += 1;
        }
    }
    rules_per_account.values().filter(|&&n| n >= 2).count()
}

/// Coverage of a single rule across the whole transaction set, in counts and
/// summed amounts.
pub fn rule_statistics(rule: &Rule, transactions: &[BankTransaction]) -> RuleStatistics {
    let matched = test_rule(rule, transactions);
    let matched_amount: Decimal = matched.iter().map(|tx| tx.amount).sum();
    let total_amount: Decimal = transactions.iter().map(|tx| tx.amount).sum();

    let coverage_pct = if transactions.is_empty() {
        0.0
    } else {
        matched.len() as f64 / transactions.len() as f64 * 100.0
    };
    let amount_pct = if total_amount.is_zero() {
        0.0
    } else {
        (matched_amount / total_amount).to_f64().unwrap_or(0.0) * 100.0
    };

    RuleStatistics {
        matched_count: matched.len(),
        total_count: transactions.len(),
        coverage_pct: (coverage_pct * 100.0).round() / 100.0,
        matched_amount,
        total_amount,
        amount_pct: (amount_pct * 100.0).round() / 100.0,
    }
}

/// Probes a draft rule: how much of the target account it covers, and how
/// hard it bleeds into other accounts. The collision percentage is relative
/// to the in-account matches, so a rule with no in-account match probes at 0.
pub fn probe_rule(
    rule: &Rule,
    transactions: &[BankTransaction],
    target_account: &str,
) -> RuleProbe {
    let matched = test_rule(rule, transactions);

    let mut in_account = 0usize;
    let mut collisions = Vec::new();
    for tx in &matched {
        if tx.counterpart_account == target_account {
            in_account += 1;
        } else {
            collisions.push(CollisionDetail {
                account: tx.counterpart_account.clone(),
                label: tx.label.clone(),
                amount: tx.amount,
            });
        }
    }

    let account_total = transactions
        .iter()
        .filter(|tx| tx.counterpart_account == target_account)
        .count();

    let coverage_pct = if account_total == 0 {
        0.0
    } else {
        round1(in_account as f64 / account_total as f64 * 100.0)
    };
    let collision_pct = if in_account == 0 {
        0.0
    } else {
        round1(collisions.len() as f64 / in_account as f64 * 100.0)
    };

    RuleProbe {
        matched_total: matched.len(),
        matched_in_account: in_account,
        matched_elsewhere: collisions.len(),
        coverage_pct,
        collision_pct,
        collisions,
    }
}
