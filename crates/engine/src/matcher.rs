use bankrules_core::{BankTransaction, Rule};

/// Decides whether one transaction satisfies one rule. Criteria are tested in
/// order and short-circuit on the first failure; a rule with an empty first
/// keyword matches nothing.
pub fn matches(rule: &Rule, tx: &BankTransaction) -> bool {
    let keyword_1 = rule.keyword_1.trim().to_lowercase();
    if keyword_1.is_empty() {
        return false;
    }

    let label = tx.label.to_lowercase();
    if !label.contains(&keyword_1) {
        return false;
    }

    if let Some(keyword_2) = rule.keyword_2.as_deref() {
        let keyword_2 = keyword_2.trim().to_lowercase();
        if !keyword_2.is_empty() && !label.contains(&keyword_2) {
            return false;
        }
    }

    if let Some(journal) = rule.journal_code.as_deref().filter(|j| !j.is_empty()) {
        if tx.journal_code.as_deref() != Some(journal) {
            return false;
        }
    }

    if let Some(criterion) = &rule.amount_criterion {
        if !criterion.accepts(tx.amount) {
            return false;
        }
    }

    true
}

/// Applies [`matches`] to the whole list; always scans every transaction.
pub fn test_rule<'a>(rule: &Rule, transactions: &'a [BankTransaction]) -> Vec<&'a BankTransaction> {
    transactions.iter().filter(|tx| matches(rule, tx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankrules_core::AmountCriterion;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn tx(label: &str, journal: &str, amount: i64) -> BankTransaction {
        BankTransaction::new(
            1,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            label,
            Some(journal),
            Decimal::from(amount),
            "613000",
            "Locations",
        )
    }

    #[test]
    fn empty_keyword_never_matches() {
        let rule = Rule::new("", "613000");
        assert!(!matches(&rule, &tx("VIREMENT LOYER", "BQ", -500)));

        let rule = Rule::new("   ", "613000");
        assert!(!matches(&rule, &tx("VIREMENT LOYER", "BQ", -500)));
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let rule = Rule::new("FACTURE", "401000");
        assert!(matches(&rule, &tx("Paiement facture 123", "AC", -80)));
        assert!(!matches(&rule, &tx("Paiement avoir 123", "AC", -80)));
    }

    #[test]
    fn second_keyword_is_anded() {
        let mut rule = Rule::new("LOYER", "613000");
        rule.keyword_2 = Some("JANVIER".to_string());
        assert!(matches(&rule, &tx("VIREMENT LOYER JANVIER", "BQ", -500)));
        assert!(!matches(&rule, &tx("VIREMENT LOYER FEVRIER", "BQ", -500)));
    }

    #[test]
    fn empty_second_keyword_is_ignored() {
        let mut rule = Rule::new("LOYER", "613000");
        rule.keyword_2 = Some(String::new());
        assert!(matches(&rule, &tx("VIREMENT LOYER MARS", "BQ", -500)));
    }

    #[test]
    fn journal_filter_requires_equality() {
        let mut rule = Rule::new("FACTURE", "401000");
        rule.journal_code = Some("BQ".to_string());
        assert!(!matches(&rule, &tx("Paiement facture 123", "AC", -80)));
        assert!(matches(&rule, &tx("Paiement facture 123", "BQ", -80)));
    }

    #[test]
    fn unset_journal_means_no_filter() {
        let rule = Rule::new("FACTURE", "401000");
        assert!(matches(&rule, &tx("Paiement facture 123", "AC", -80)));
    }

    #[test]
    fn transaction_without_journal_fails_journal_filter() {
        let mut rule = Rule::new("LOYER", "613000");
        rule.journal_code = Some("BQ".to_string());
        let mut t = tx("VIREMENT LOYER", "BQ", -500);
        t.journal_code = None;
        assert!(!matches(&rule, &t));
    }

    #[test]
    fn amount_criterion_is_enforced() {
        let mut rule = Rule::new("LOYER", "613000");
        rule.amount_criterion = Some(">= 100.0".parse::<AmountCriterion>().unwrap());

        let mut t = tx("VIREMENT LOYER", "BQ", 0);
        t.amount = Decimal::new(9999, 2); // 99.99
        assert!(!matches(&rule, &t));
        t.amount = Decimal::new(10000, 2); // 100.00
        assert!(matches(&rule, &t));
    }

    #[test]
    fn test_rule_scans_the_full_list() {
        let rule = Rule::new("LOYER", "613000");
        let txs = vec![
            tx("VIREMENT LOYER JANVIER", "BQ", -500),
            tx("EDF FACTURE", "BQ", -80),
            tx("VIREMENT LOYER FEVRIER", "BQ", -500),
        ];
        let matched = test_rule(&rule, &txs);
        assert_eq!(matched.len(), 2);
    }
}
