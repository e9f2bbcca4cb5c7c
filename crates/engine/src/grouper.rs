//! Similarity clustering of one account's transactions, used to surface
//! recurring label shapes before any rule exists for them.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use bankrules_core::BankTransaction;
use tracing::debug;

use crate::config::EngineConfig;
use crate::normalize::{is_significant, normalize_for_grouping};
use crate::similarity::token_set_ratio;

#[derive(Debug)]
pub struct TransactionGroup<'a> {
    /// Short human-readable tag built from the group's shared words.
    pub pattern: String,
    /// Up to three shared words, rule-editor prefill material.
    pub suggested_keywords: Vec<String>,
    pub transactions: Vec<&'a BankTransaction>,
}

#[derive(Debug)]
pub enum GroupedItem<'a> {
    Group(TransactionGroup<'a>),
    Single(&'a BankTransaction),
}

pub struct Grouper {
    config: EngineConfig,
}

impl Default for Grouper {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Grouper {
    pub fn new(config: EngineConfig) -> Self {
        Grouper { config }
    }

    /// Transitive clustering: a transaction joins a group when its label is
    /// similar enough to *any* member already in it (breadth-first closure),
    /// so "CHEQUE 12" chains to "CHEQUE 99" through intermediates. Groups
    /// come back largest first.
    pub fn group_by_similarity<'a>(
        &self,
        transactions: &[&'a BankTransaction],
    ) -> Vec<Vec<&'a BankTransaction>> {
        let normalized: Vec<String> = transactions
            .iter()
            .map(|tx| normalize_for_grouping(&tx.label))
            .collect();

        let n = transactions.len();
        let mut visited = vec![false; n];
        let mut groups = Vec::new();

        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut group = vec![transactions[start]];
            let mut queue = VecDeque::from([start]);

            while let Some(current) = queue.pop_front() {
                for other in 0..n {
                    if visited[other] {
                        continue;
                    }
                    let score =
                        token_set_ratio(&normalized[current], &normalized[other]) as f64 / 100.0;
                    if score >= self.config.similarity_threshold {
                        visited[other] = true;
                        group.push(transactions[other]);
                        queue.push_back(other);
                    }
                }
            }
            groups.push(group);
        }

        // Stable sort: equal-sized groups keep their discovery order.
        groups.sort_by(|a, b| b.len().cmp(&a.len()));
        groups
    }

    /// Words shared by every label of a group; when there are none, the words
    /// present in at least half the labels, most frequent first, at most
    /// three.
    pub fn common_patterns(&self, labels: &[String]) -> Vec<String> {
        let keyword_sets: Vec<BTreeSet<String>> = labels
            .iter()
            .map(|label| {
                normalize_for_grouping(label)
                    .split_whitespace()
                    .filter(|w| is_significant(w))
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        let Some(first) = keyword_sets.first() else {
            return Vec::new();
        };

        let mut shared: Vec<String> = first
            .iter()
            .filter(|word| keyword_sets[1..].iter().all(|set| set.contains(*word)))
            .cloned()
            .collect();
        if !shared.is_empty() {
            shared.sort();
            return shared;
        }

        let mut frequencies: BTreeMap<&str, usize> = BTreeMap::new();
        for set in &keyword_sets {
            for word in set {
                *frequencies.entry(word).or_default() += 1;
            }
        }
        let mut ordered: Vec<(&str, usize)> = frequencies.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ordered
            .into_iter()
            .filter(|(_, count)| count * 2 >= labels.len())
            .take(3)
            .map(|(word, _)| word.to_string())
            .collect()
    }

    /// Clusters every counterpart account separately. Groups big enough to
    /// matter carry their shared patterns; the rest surface as singles.
    pub fn group_by_account<'a>(
        &self,
        transactions: &'a [BankTransaction],
    ) -> BTreeMap<String, Vec<GroupedItem<'a>>> {
        let mut by_account: BTreeMap<&str, Vec<&'a BankTransaction>> = BTreeMap::new();
        for tx in transactions {
            by_account
                .entry(tx.counterpart_account.as_str())
                .or_default()
                .push(tx);
        }

        let mut organized = BTreeMap::new();
        for (account, txs) in by_account {
            debug!(account, transactions = txs.len(), "clustering account");
            let mut items = Vec::new();
            for group in self.group_by_similarity(&txs) {
                if group.len() >= self.config.min_occurrences {
                    let labels: Vec<String> =
                        group.iter().map(|tx| tx.label.clone()).collect();
                    let patterns = self.common_patterns(&labels);
                    let pattern = if patterns.is_empty() {
                        "GROUPE".to_string()
                    } else {
                        patterns[..patterns.len().min(2)].join(" & ")
                    };
                    let mut transactions = group;
                    transactions.sort_by(|a, b| b.amount.cmp(&a.amount));
                    items.push(GroupedItem::Group(TransactionGroup {
                        pattern,
                        suggested_keywords: patterns.into_iter().take(3).collect(),
                        transactions,
                    }));
                } else {
                    items.extend(group.into_iter().map(GroupedItem::Single));
                }
            }
            organized.insert(account.to_string(), items);
        }
        organized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn tx(id: i64, label: &str, account: &str, amount: i64) -> BankTransaction {
        BankTransaction::new(
            id,
            NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
            label,
            Some("BQ"),
            Decimal::from(amount),
            account,
            "",
        )
    }

    #[test]
    fn digit_variants_cluster_together() {
        let txs = vec![
            tx(1, "CHEQUE 101", "606000", -50),
            tx(2, "CHEQUE 102", "606000", -60),
            tx(3, "CHEQUE 103", "606000", -70),
            tx(4, "VIREMENT SALAIRE", "421000", -2000),
        ];
        let refs: Vec<&BankTransaction> = txs.iter().collect();
        let groups = Grouper::default().group_by_similarity(&refs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 3); // largest first
    }

    #[test]
    fn common_patterns_prefer_words_shared_by_all() {
        let grouper = Grouper::default();
        let labels = vec![
            "PRLV ASSURANCE AXA 01".to_string(),
            "PRLV ASSURANCE AXA 02".to_string(),
        ];
        let patterns = grouper.common_patterns(&labels);
        // PRLV is banking noise, the numbers fold away; the insurer remains.
        assert_eq!(patterns, vec!["ASSURANCE".to_string(), "AXA".to_string()]);
    }

    #[test]
    fn half_presence_fallback_kicks_in() {
        let grouper = Grouper::default();
        let labels = vec![
            "ABONNEMENT FIBRE".to_string(),
            "ABONNEMENT MOBILE".to_string(),
            "FORFAIT MOBILE".to_string(),
            "FORFAIT FIBRE".to_string(),
        ];
        let patterns = grouper.common_patterns(&labels);
        // Nothing is shared by all four; everything appears in exactly half.
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns[0], "ABONNEMENT");
    }

    #[test]
    fn group_by_account_separates_accounts_and_sizes() {
        let txs = vec![
            tx(1, "CHEQUE 101", "606000", -50),
            tx(2, "CHEQUE 102", "606000", -80),
            tx(3, "CHEQUE 103", "606000", -20),
            tx(4, "LOYER", "613000", -500),
        ];
        let organized = Grouper::default().group_by_account(&txs);

        let groups = &organized["606000"];
        assert_eq!(groups.len(), 1);
        match &groups[0] {
            GroupedItem::Group(group) => {
                assert_eq!(group.pattern, "CHEQUE");
                assert_eq!(group.suggested_keywords, vec!["CHEQUE".to_string()]);
                // Sorted by amount descending.
                assert_eq!(group.transactions[0].id, 3);
                assert_eq!(group.transactions[2].id, 2);
            }
            GroupedItem::Single(_) => panic!("expected a group"),
        }

        match &organized["613000"][0] {
            GroupedItem::Single(single) => assert_eq!(single.id, 4),
            GroupedItem::Group(_) => panic!("expected a single"),
        }
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(Grouper::default().group_by_account(&[]).is_empty());
    }
}
