use std::collections::{BTreeSet, HashMap};

use bankrules_core::BankTransaction;

use crate::normalize::normalize;

/// Inverted index over normalized labels: token → positions of the
/// transactions whose label contains that token. Collision scans and
/// candidate coverage checks go through this instead of re-reading the full
/// transaction list once per candidate, which does not survive realistic
/// volumes.
pub struct LabelIndex<'a> {
    transactions: Vec<&'a BankTransaction>,
    normalized: Vec<String>,
    postings: HashMap<String, Vec<usize>>,
}

impl<'a> LabelIndex<'a> {
    pub fn build(transactions: &'a [BankTransaction]) -> Self {
        let mut index = LabelIndex {
            transactions: Vec::with_capacity(transactions.len()),
            normalized: Vec::with_capacity(transactions.len()),
            postings: HashMap::new(),
        };
        for tx in transactions {
            let position = index.transactions.len();
            let label = normalize(&tx.label);
            for token in label.split_whitespace().collect::<BTreeSet<_>>() {
                index
                    .postings
                    .entry(token.to_string())
                    .or_default()
                    .push(position);
            }
            index.transactions.push(tx);
            index.normalized.push(label);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transaction(&self, position: usize) -> &'a BankTransaction {
        self.transactions[position]
    }

    pub fn normalized_label(&self, position: usize) -> &str {
        &self.normalized[position]
    }

    /// Positions of transactions whose normalized label contains `keyword` as
    /// a substring. The posting lists prefilter on the keyword's first word —
    /// matching the vocabulary by substring, so "LOYER" also reaches labels
    /// that only carry "LOYERS" — and the full phrase is then verified against
    /// the stored label.
    pub fn positions_containing(&self, keyword: &str) -> Vec<usize> {
        let Some(first_word) = keyword.split_whitespace().next() else {
            return Vec::new();
        };

        let mut positions = BTreeSet::new();
        for (token, posts) in &self.postings {
            if token.contains(first_word) {
                positions.extend(posts.iter().copied());
            }
        }

        positions
            .into_iter()
            .filter(|&p| self.normalized[p].contains(keyword))
            .collect()
    }
}
