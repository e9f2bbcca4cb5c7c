use serde::{Deserialize, Serialize};
use std::fmt;

/// Family of a counterpart account, derived from its code prefix in the
/// French chart of accounts. The family decides which candidate-generation
/// strategy the suggestion engine applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountFamily {
    /// 164x — loans; labels carry stable contract numbers.
    Loan,
    /// 401x / 411x — vendors and customers.
    ThirdParty,
    /// 42x — payroll and related personnel accounts.
    Payroll,
    /// 431 — URSSAF collection account.
    SocialCollector,
    /// Other 43x — social bodies (pension, health funds).
    SocialBody,
    /// 4421 — income-tax withholding.
    WithholdingTax,
    /// 4455x — VAT due.
    Vat,
    /// 63511 — local business taxes.
    LocalTax,
    Generic,
}

impl AccountFamily {
    /// Prefix dispatch; more specific prefixes are tested before the broad
    /// ones they share digits with (431 before 43). 4421 never reaches the
    /// 42x arm because its first two digits are 44.
    pub fn classify(code: &str) -> Self {
        if code.starts_with("164") {
            AccountFamily::Loan
        } else if code.starts_with("401") || code.starts_with("411") {
            AccountFamily::ThirdParty
        } else if code.starts_with("42") {
            AccountFamily::Payroll
        } else if code.starts_with("431") {
            AccountFamily::SocialCollector
        } else if code.starts_with("43") {
            AccountFamily::SocialBody
        } else if code.starts_with("4421") {
            AccountFamily::WithholdingTax
        } else if code.starts_with("4455") {
            AccountFamily::Vat
        } else if code.starts_with("63511") {
            AccountFamily::LocalTax
        } else {
            AccountFamily::Generic
        }
    }
}

impl fmt::Display for AccountFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountFamily::Loan => write!(f, "loan"),
            AccountFamily::ThirdParty => write!(f, "third-party"),
            AccountFamily::Payroll => write!(f, "payroll"),
            AccountFamily::SocialCollector => write!(f, "social-collector"),
            AccountFamily::SocialBody => write!(f, "social-body"),
            AccountFamily::WithholdingTax => write!(f, "withholding-tax"),
            AccountFamily::Vat => write!(f, "vat"),
            AccountFamily::LocalTax => write!(f, "local-tax"),
            AccountFamily::Generic => write!(f, "generic"),
        }
    }
}
