//! Candidate generation: proposes matching rules for one destination account
//! from its historical transactions.

use std::collections::{BTreeMap, BTreeSet};

use bankrules_core::{AccountFamily, AmountCriterion, AmountOp, BankTransaction, Rule};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::collision;
use crate::config::EngineConfig;
use crate::index::LabelIndex;
use crate::ngram::{common_ngrams, extract_ngrams, is_distinctive};
use crate::normalize::{is_significant, normalize};
use crate::rank::rank_and_select;
use crate::similarity::{partial_ratio, token_set_ratio};

/// Known social-body names appearing in contribution debits.
const SOCIAL_BODIES: &[&str] = &[
    "URSSAF",
    "MALAKOFF",
    "KLESIA",
    "AGIRC",
    "ARRCO",
    "POLE EMPLOI",
    "CPAM",
];

/// VAT return form references, most specific first.
const VAT_FORMS: &[&str] = &["3517SCA12", "3310CA3", "TVA"];

const LOCAL_TAXES: &[&str] = &["CFE", "CVAE"];

/// Tag carried by income-tax withholding debits issued through payroll
/// declarations.
const WITHHOLDING_TAG: &str = "PASDSN";

/// A rule-in-progress: keywords found by an analyzer, plus the criteria
/// inferred from the transactions it covers. Keywords are stored in
/// normalized (uppercase, unaccented) form.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRule {
    pub keyword_1: String,
    pub keyword_2: Option<String>,
    pub journal_code: Option<String>,
    pub amount_criterion: Option<AmountCriterion>,
    pub coverage_count: usize,
    pub colliding: bool,
}

impl CandidateRule {
    pub fn new(keyword: &str) -> Self {
        CandidateRule {
            keyword_1: keyword.to_string(),
            keyword_2: None,
            journal_code: None,
            amount_criterion: None,
            coverage_count: 0,
            colliding: false,
        }
    }

    pub fn keyword_count(&self) -> usize {
        if self.keyword_2.is_some() {
            2
        } else {
            1
        }
    }

    pub fn keyword_len(&self) -> usize {
        self.keyword_1.len() + self.keyword_2.as_deref().map_or(0, str::len)
    }

    /// Substring test against an already-normalized label.
    pub(crate) fn matches_label(&self, label: &str) -> bool {
        label.contains(self.keyword_1.as_str())
            && self
                .keyword_2
                .as_deref()
                .is_none_or(|k2| label.contains(k2))
    }
}

/// A ranked, collision-free candidate with its provenance, ready to be
/// promoted to a persisted [`Rule`] by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedRule {
    pub keyword_1: String,
    pub keyword_2: Option<String>,
    pub journal_code: Option<String>,
    pub amount_criterion: Option<AmountCriterion>,
    pub destination_account: String,
    pub destination_label: String,
    pub coverage_count: usize,
    pub coverage_ratio: f64,
    pub collision_count: usize,
    pub collision_ratio: f64,
    pub composite_score: f64,
}

impl SuggestedRule {
    pub fn into_rule(self) -> Rule {
        Rule {
            id: None,
            name: format!("Règle {}", self.destination_account),
            keyword_1: self.keyword_1,
            keyword_2: self.keyword_2,
            journal_code: self.journal_code,
            amount_criterion: self.amount_criterion,
            destination_account: self.destination_account,
            destination_label: self.destination_label,
            is_active: true,
        }
    }
}

pub struct Suggester {
    config: EngineConfig,
    loan_digits: Regex,
    collector_codes: Regex,
}

impl Default for Suggester {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Suggester {
    pub fn new(config: EngineConfig) -> Self {
        let loan_digits = Regex::new(&format!(r"\d{{{},}}", config.min_loan_digits))
            .expect("digit-run pattern is valid");
        let collector_codes = Regex::new(r"UR\d+").expect("collector-code pattern is valid");
        Suggester {
            config,
            loan_digits,
            collector_codes,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full pipeline for one account: generate → check collisions → refine →
    /// keep collision-free → rank. Returns at most
    /// `config.suggestion_limit` suggestions, never an error.
    pub fn suggest(
        &self,
        account_code: &str,
        account_label: &str,
        all_transactions: &[BankTransaction],
    ) -> Vec<SuggestedRule> {
        let account_txs: Vec<&BankTransaction> = all_transactions
            .iter()
            .filter(|tx| tx.counterpart_account == account_code)
            .collect();

        debug!(
            account = account_code,
            transactions = account_txs.len(),
            "analyzing account"
        );

        let mut candidates = self.generate_candidates(account_code, account_label, &account_txs);
        if candidates.is_empty() {
            return Vec::new();
        }

        let index = LabelIndex::build(all_transactions);
        collision::check_collisions(&mut candidates, account_code, &index);
        let candidates =
            collision::refine(candidates, account_code, &account_txs, &index, &self.config);

        let survivors: Vec<CandidateRule> =
            candidates.into_iter().filter(|c| !c.colliding).collect();
        let ranked = rank_and_select(survivors, self.config.suggestion_limit);

        info!(
            account = account_code,
            suggestions = ranked.len(),
            "suggestion pipeline finished"
        );

        ranked
            .into_iter()
            .map(|c| self.to_suggestion(c, account_code, account_label, account_txs.len()))
            .collect()
    }

    /// Account-family dispatch. Below `min_occurrences` transactions nothing
    /// is attempted, except for third-party accounts whose own label is a
    /// strong enough prior to try anyway.
    pub fn generate_candidates(
        &self,
        account_code: &str,
        account_label: &str,
        transactions: &[&BankTransaction],
    ) -> Vec<CandidateRule> {
        let family = AccountFamily::classify(account_code);
        if transactions.len() < self.config.min_occurrences
            && family != AccountFamily::ThirdParty
        {
            debug!(
                account = account_code,
                %family,
                "not enough transactions to analyze"
            );
            return Vec::new();
        }
        debug!(account = account_code, %family, "family analysis");

        let raw = match family {
            AccountFamily::Loan => self.analyze_loan(transactions),
            AccountFamily::ThirdParty => self.analyze_third_party(account_label, transactions),
            AccountFamily::Payroll => self.analyze_payroll(transactions),
            AccountFamily::SocialCollector => self.analyze_social_collector(transactions),
            AccountFamily::SocialBody => self.analyze_vocabulary(transactions, SOCIAL_BODIES, 3),
            AccountFamily::WithholdingTax => {
                self.analyze_vocabulary(transactions, &[WITHHOLDING_TAG], 1)
            }
            AccountFamily::Vat => self.analyze_vocabulary(transactions, VAT_FORMS, 3),
            AccountFamily::LocalTax => {
                self.analyze_vocabulary(transactions, LOCAL_TAXES, LOCAL_TAXES.len())
            }
            AccountFamily::Generic => self.analyze_generic(transactions),
        };

        attach_criteria(raw, transactions, &self.config)
    }

    /// Loan labels repeat the contract number; digit runs are the pattern.
    fn analyze_loan(&self, transactions: &[&BankTransaction]) -> Vec<CandidateRule> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for tx in transactions {
            let label = normalize(&tx.label);
            // Each run counted once per label, however often it repeats.
            let unique: BTreeSet<&str> = self
                .loan_digits
                .find_iter(&label)
                .map(|m| m.as_str())
                .collect();
            for run in unique {
                *counts.entry(run.to_string()).or_default() += 1;
            }
        }
        top_by_count(counts, 3, self.config.min_occurrences)
    }

    /// Vendor/customer accounts: the counterpart's name should appear in
    /// every label. Cross-checks the account's own label against the n-grams
    /// shared by all transactions, with a fuzzy fallback for misspellings.
    fn analyze_third_party(
        &self,
        account_label: &str,
        transactions: &[&BankTransaction],
    ) -> Vec<CandidateRule> {
        let labels: Vec<String> = transactions.iter().map(|tx| normalize(&tx.label)).collect();
        let common: Vec<String> = common_ngrams(&labels, self.config.max_ngram_words)
            .into_iter()
            .filter(|ngram| is_distinctive(ngram))
            .collect();
        debug!(count = common.len(), "distinctive n-grams shared by every label");

        let mut keywords: Vec<String> = Vec::new();

        let cleaned_account = clean_for_fuzzy(account_label);
        let best = if cleaned_account.chars().count() >= 3 {
            self.best_fuzzy_ngram(&cleaned_account, &common)
        } else {
            None
        };
        let best = best.or_else(|| {
            common
                .iter()
                .max_by_key(|n| (n.split_whitespace().count(), n.len(), std::cmp::Reverse(n.as_str())))
                .cloned()
        });
        if let Some(ngram) = best {
            keywords.push(ngram);
        }

        // The account label itself, word by word, is a strong prior; these
        // run below the usual occurrence floor.
        for word in normalize(account_label).split_whitespace() {
            if !is_significant(word) {
                continue;
            }
            if labels.iter().any(|label| label.contains(word)) {
                keywords.push(word.to_string());
            }
        }

        // Auxiliary sources: domain names and hyphenated compounds are
        // distinctive enough to stand alone.
        let mut compound_counts: BTreeMap<String, usize> = BTreeMap::new();
        for label in &labels {
            let unique: BTreeSet<&str> = label
                .split_whitespace()
                .filter(|t| t.len() >= 4 && (t.contains('.') || t.contains('-')))
                .filter(|t| t.chars().any(char::is_alphabetic))
                .collect();
            for token in unique {
                *compound_counts.entry(token.to_string()).or_default() += 1;
            }
        }
        keywords.extend(
            compound_counts
                .into_iter()
                .filter(|(_, count)| *count >= self.config.min_occurrences)
                .map(|(token, _)| token),
        );

        let mut seen = BTreeSet::new();
        let candidates: Vec<CandidateRule> = keywords
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .map(|k| CandidateRule::new(&k))
            .collect();

        if candidates.is_empty() {
            debug!("no third-party pattern, falling back to generic analysis");
            return self.analyze_generic(transactions);
        }
        candidates
    }

    /// Best common n-gram by fuzzy similarity to the account label, ties
    /// broken towards the more specific phrasing.
    fn best_fuzzy_ngram(&self, cleaned_account: &str, common: &[String]) -> Option<String> {
        let mut scored: Vec<(u32, usize, usize, &String)> = common
            .iter()
            .filter_map(|ngram| {
                let cleaned = clean_for_fuzzy(ngram);
                let score = partial_ratio(cleaned_account, &cleaned)
                    .max(token_set_ratio(cleaned_account, &cleaned));
                (score >= self.config.fuzzy_threshold)
                    .then_some((score, ngram.split_whitespace().count(), ngram.len(), ngram))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(b.1.cmp(&a.1))
                .then(b.2.cmp(&a.2))
                .then(a.3.cmp(b.3))
        });
        let best = scored.first().map(|(score, _, _, ngram)| {
            debug!(ngram = %ngram, score, "fuzzy match against account label");
            (*ngram).clone()
        });
        best
    }

    /// Individual payroll accounts carry the employee's name in every label;
    /// collective ones fall back to recurring name frequencies.
    fn analyze_payroll(&self, transactions: &[&BankTransaction]) -> Vec<CandidateRule> {
        let labels: Vec<String> = transactions.iter().map(|tx| normalize(&tx.label)).collect();
        let common: Vec<String> = common_ngrams(&labels, 3)
            .into_iter()
            .filter(|ngram| is_distinctive(ngram))
            .collect();

        // First/last name heuristic: two purely alphabetic words.
        let best_name = common
            .iter()
            .filter(|ngram| {
                let words: Vec<&str> = ngram.split_whitespace().collect();
                words.len() == 2 && words.iter().all(|w| w.chars().all(char::is_alphabetic))
            })
            .max_by_key(|ngram| (ngram.len(), std::cmp::Reverse(ngram.as_str())));

        let best = best_name.or_else(|| {
            common
                .iter()
                .max_by_key(|n| (n.split_whitespace().count(), n.len(), std::cmp::Reverse(n.as_str())))
        });

        if let Some(ngram) = best {
            debug!(ngram = %ngram, "payroll name found in every label");
            return vec![CandidateRule::new(ngram)];
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for label in &labels {
            let words: Vec<&str> = label.split_whitespace().collect();
            for pair in words.windows(2) {
                if pair.iter().all(|w| is_significant(w)) {
                    *counts.entry(pair.join(" ")).or_default() += 1;
                }
            }
            for word in &words {
                if is_significant(word) {
                    *counts.entry((*word).to_string()).or_default() += 1;
                }
            }
        }
        top_by_count(counts, 3, self.config.min_occurrences)
    }

    /// URSSAF debits carry per-establishment `URxxxx` codes; fall back to the
    /// body's plain name when no code recurs.
    fn analyze_social_collector(&self, transactions: &[&BankTransaction]) -> Vec<CandidateRule> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let labels: Vec<String> = transactions.iter().map(|tx| normalize(&tx.label)).collect();
        for label in &labels {
            let unique: BTreeSet<&str> = self
                .collector_codes
                .find_iter(label)
                .map(|m| m.as_str())
                .collect();
            for code in unique {
                *counts.entry(code.to_string()).or_default() += 1;
            }
        }
        let mut candidates = top_by_count(counts, 3, self.config.min_occurrences);
        if candidates.is_empty() {
            let count = labels.iter().filter(|l| l.contains("URSSAF")).count();
            if count >= self.config.min_occurrences {
                candidates.push(CandidateRule::new("URSSAF"));
            }
        }
        candidates
    }

    /// Fixed-vocabulary accounts: a short list of known markers, kept in
    /// preference order.
    fn analyze_vocabulary(
        &self,
        transactions: &[&BankTransaction],
        vocabulary: &[&str],
        limit: usize,
    ) -> Vec<CandidateRule> {
        let labels: Vec<String> = transactions.iter().map(|tx| normalize(&tx.label)).collect();
        vocabulary
            .iter()
            .filter(|pattern| {
                labels.iter().filter(|l| l.contains(*pattern)).count()
                    >= self.config.min_occurrences
            })
            .take(limit)
            .map(|pattern| CandidateRule::new(pattern))
            .collect()
    }

    /// Frequency analysis over all n-grams, deduplicating phrasings that
    /// cover the same transactions in favour of the longer one.
    fn analyze_generic(&self, transactions: &[&BankTransaction]) -> Vec<CandidateRule> {
        if transactions.len() < self.config.min_occurrences {
            return Vec::new();
        }

        let mut coverage: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
        for tx in transactions {
            let label = normalize(&tx.label);
            for ngram in extract_ngrams(&label, self.config.max_ngram_words) {
                coverage.entry(ngram).or_default().insert(tx.id);
            }
        }

        let mut frequent: Vec<(String, BTreeSet<i64>)> = coverage
            .into_iter()
            .filter(|(_, ids)| ids.len() >= self.config.min_occurrences)
            .collect();
        frequent.sort_by(|a, b| {
            b.1.len()
                .cmp(&a.1.len())
                .then(b.0.len().cmp(&a.0.len()))
                .then(a.0.cmp(&b.0))
        });

        let mut selected: Vec<(String, BTreeSet<i64>)> = Vec::new();
        for (ngram, ids) in frequent.into_iter().take(10) {
            match selected.iter().position(|(_, kept)| *kept == ids) {
                // Same covered set: keep whichever phrasing is longer.
                Some(pos) => {
                    if ngram.len() > selected[pos].0.len() {
                        selected[pos] = (ngram, ids);
                    }
                }
                None => selected.push((ngram, ids)),
            }
        }

        selected
            .into_iter()
            .take(3)
            .map(|(ngram, _)| CandidateRule::new(&ngram))
            .collect()
    }

    fn to_suggestion(
        &self,
        candidate: CandidateRule,
        account_code: &str,
        account_label: &str,
        account_total: usize,
    ) -> SuggestedRule {
        let coverage_ratio = if account_total == 0 {
            0.0
        } else {
            candidate.coverage_count as f64 / account_total as f64
        };
        SuggestedRule {
            keyword_1: candidate.keyword_1,
            keyword_2: candidate.keyword_2,
            journal_code: candidate.journal_code,
            amount_criterion: candidate.amount_criterion,
            destination_account: account_code.to_string(),
            destination_label: account_label.to_string(),
            coverage_count: candidate.coverage_count,
            coverage_ratio,
            // Survivors of the collision pass are clean by construction.
            collision_count: 0,
            collision_ratio: 0.0,
            composite_score: (coverage_ratio * 1000.0).round() / 10.0,
        }
    }
}

/// Recomputes, for each candidate, which of the account's transactions it
/// covers, and infers journal and amount criteria from that set: the journal
/// when all covered transactions share one, the amount when they are all
/// positive, all negative, or dominated by a single value. Candidates that no
/// longer cover anything are dropped.
pub(crate) fn attach_criteria(
    candidates: Vec<CandidateRule>,
    transactions: &[&BankTransaction],
    config: &EngineConfig,
) -> Vec<CandidateRule> {
    let labels: Vec<String> = transactions.iter().map(|tx| normalize(&tx.label)).collect();

    candidates
        .into_iter()
        .filter_map(|mut candidate| {
            let matched: Vec<&BankTransaction> = transactions
                .iter()
                .zip(&labels)
                .filter(|(_, label)| candidate.matches_label(label))
                .map(|(tx, _)| *tx)
                .collect();
            if matched.is_empty() {
                return None;
            }

            candidate.coverage_count = matched.len();
            candidate.journal_code = uniform_journal(&matched);
            candidate.amount_criterion = infer_amount_criterion(&matched, config.amount_dominance);
            Some(candidate)
        })
        .collect()
}

fn uniform_journal(matched: &[&BankTransaction]) -> Option<String> {
    let mut journals = matched.iter().map(|tx| tx.journal_code.as_deref());
    let first = journals.next().flatten()?;
    journals
        .all(|j| j == Some(first))
        .then(|| first.to_string())
}

fn infer_amount_criterion(
    matched: &[&BankTransaction],
    dominance: f64,
) -> Option<AmountCriterion> {
    if matched.is_empty() {
        return None;
    }

    // A single dominant value beats the weaker sign-only criteria.
    let mut counts: BTreeMap<Decimal, usize> = BTreeMap::new();
    for tx in matched {
        *counts.entry(tx.amount).or_default() += 1;
    }
    let (value, count) = counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))?;
    if count as f64 / matched.len() as f64 >= dominance {
        return Some(AmountCriterion {
            op: AmountOp::Eq,
            value,
            upper: None,
        });
    }

    if matched.iter().all(|tx| tx.amount > Decimal::ZERO) {
        return Some(AmountCriterion {
            op: AmountOp::Gt,
            value: Decimal::ZERO,
            upper: None,
        });
    }
    if matched.iter().all(|tx| tx.amount < Decimal::ZERO) {
        return Some(AmountCriterion {
            op: AmountOp::Lt,
            value: Decimal::ZERO,
            upper: None,
        });
    }
    None
}

fn top_by_count(
    counts: BTreeMap<String, usize>,
    limit: usize,
    min_occurrences: usize,
) -> Vec<CandidateRule> {
    let mut entries: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_occurrences)
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
        .into_iter()
        .take(limit)
        .map(|(keyword, _)| CandidateRule::new(&keyword))
        .collect()
}

fn clean_for_fuzzy(text: &str) -> String {
    normalize(text).replace(['-', '_'], " ")
}
