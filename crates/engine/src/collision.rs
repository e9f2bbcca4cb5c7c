//! Cross-account collision checking and the second-keyword refinement pass.
//!
//! A candidate that also fires on transactions destined for other accounts
//! would silently misclassify them; refinement trades a larger keyword set
//! for specificity before giving up on the candidate.

use std::collections::BTreeSet;

use bankrules_core::BankTransaction;
use tracing::debug;

use crate::config::EngineConfig;
use crate::index::LabelIndex;
use crate::normalize::{is_significant, normalize};
use crate::suggest::{attach_criteria, CandidateRule};

/// Flags every candidate that matches at least one transaction belonging to
/// a different counterpart account.
pub fn check_collisions(
    candidates: &mut [CandidateRule],
    target_account: &str,
    index: &LabelIndex<'_>,
) {
    for candidate in candidates.iter_mut() {
        candidate.colliding = collides(candidate, target_account, index);
        if candidate.colliding {
            debug!(keyword = %candidate.keyword_1, "candidate collides outside target account");
        }
    }
}

/// True when any transaction outside `target_account` satisfies all of the
/// candidate's criteria.
pub(crate) fn collides(
    candidate: &CandidateRule,
    target_account: &str,
    index: &LabelIndex<'_>,
) -> bool {
    index
        .positions_containing(&candidate.keyword_1)
        .into_iter()
        .any(|position| {
            let tx = index.transaction(position);
            if tx.counterpart_account == target_account {
                return false;
            }
            if !candidate.matches_label(index.normalized_label(position)) {
                return false;
            }
            if let Some(journal) = candidate.journal_code.as_deref() {
                if tx.journal_code.as_deref() != Some(journal) {
                    return false;
                }
            }
            if let Some(criterion) = &candidate.amount_criterion {
                if !criterion.accepts(tx.amount) {
                    return false;
                }
            }
            true
        })
}

/// Tries to rescue colliding candidates by adding a second keyword drawn from
/// the words shared by every target-account transaction the candidate already
/// matches. Greedy first-success, longest word first; candidates that cannot
/// be rescued are dropped.
pub fn refine(
    candidates: Vec<CandidateRule>,
    target_account: &str,
    account_transactions: &[&BankTransaction],
    index: &LabelIndex<'_>,
    config: &EngineConfig,
) -> Vec<CandidateRule> {
    let mut refined = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.colliding {
            refined.push(candidate);
            continue;
        }
        match second_keyword(&candidate, target_account, account_transactions, index) {
            Some(improved) => {
                debug!(
                    keyword_1 = %improved.keyword_1,
                    keyword_2 = improved.keyword_2.as_deref().unwrap_or(""),
                    "collision resolved with second keyword"
                );
                // Re-infer journal/amount for the narrower covered set.
                refined.extend(attach_criteria(
                    vec![improved],
                    account_transactions,
                    config,
                ));
            }
            None => {
                debug!(keyword = %candidate.keyword_1, "candidate dropped, collision unresolved");
            }
        }
    }
    refined
}

fn second_keyword(
    candidate: &CandidateRule,
    target_account: &str,
    account_transactions: &[&BankTransaction],
    index: &LabelIndex<'_>,
) -> Option<CandidateRule> {
    let matching_labels: Vec<String> = account_transactions
        .iter()
        .map(|tx| normalize(&tx.label))
        .filter(|label| label.contains(candidate.keyword_1.as_str()))
        .collect();
    let first = matching_labels.first()?;

    let mut common: BTreeSet<&str> = first.split_whitespace().collect();
    for label in &matching_labels[1..] {
        let words: BTreeSet<&str> = label.split_whitespace().collect();
        common = common.intersection(&words).copied().collect();
    }

    let keyword_words: BTreeSet<&str> = candidate.keyword_1.split_whitespace().collect();
    let mut options: Vec<&str> = common
        .into_iter()
        .filter(|word| is_significant(word) && !keyword_words.contains(word))
        .collect();
    // Longest first: a longer word is the better discriminator.
    options.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

    for word in options {
        let mut trial = candidate.clone();
        trial.keyword_2 = Some(word.to_string());
        trial.colliding = false;
        if !collides(&trial, target_account, index) {
            return Some(trial);
        }
    }
    None
}
