use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sentinel counterpart code for bank lines whose offset account could not be
/// resolved by the ingestion step.
pub const UNKNOWN_COUNTERPART: &str = "UNKNOWN";

/// One bank-statement line item, as supplied by the external ingestion
/// pipeline. The engine treats a slice of these as a closed, immutable
/// universe for the duration of one computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: i64,
    pub date: NaiveDate,
    pub label: String,
    pub journal_code: Option<String>,
    /// Signed amount; positive is a debit, negative a credit.
    pub amount: Decimal,
    pub counterpart_account: String,
    pub account_label: String,
}

impl BankTransaction {
    pub fn new(
        id: i64,
        date: NaiveDate,
        label: &str,
        journal_code: Option<&str>,
        amount: Decimal,
        counterpart_account: &str,
        account_label: &str,
    ) -> Self {
        BankTransaction {
            id,
            date,
            label: label.to_string(),
            journal_code: journal_code.map(str::to_string),
            amount,
            counterpart_account: counterpart_account.to_string(),
            account_label: account_label.to_string(),
        }
    }

    pub fn is_debit(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_credit(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn has_known_counterpart(&self) -> bool {
        self.counterpart_account != UNKNOWN_COUNTERPART
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn tx(amount: i64, counterpart: &str) -> BankTransaction {
        BankTransaction::new(
            1,
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            "VIREMENT LOYER",
            Some("BQ"),
            Decimal::from(amount),
            counterpart,
            "Loyers",
        )
    }

    #[test]
    fn sign_encodes_direction() {
        assert!(tx(500, "613000").is_debit());
        assert!(tx(-500, "613000").is_credit());
        assert!(!tx(-500, "613000").is_debit());
    }

    #[test]
    fn unknown_counterpart_sentinel() {
        assert!(tx(100, "401000").has_known_counterpart());
        assert!(!tx(100, UNKNOWN_COUNTERPART).has_known_counterpart());
    }
}
