pub mod account;
pub mod rule;
pub mod transaction;

pub use account::AccountFamily;
pub use rule::{AmountCriterion, AmountOp, Rule, RuleError};
pub use transaction::{BankTransaction, UNKNOWN_COUNTERPART};
