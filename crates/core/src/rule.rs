use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("Unknown amount operator: '{0}'")]
    UnknownOperator(String),
    #[error("Invalid amount bound: '{0}'")]
    InvalidBound(String),
    #[error("Between criterion requires a second bound")]
    MissingUpperBound,
    #[error("Between criterion requires low <= high, got {0} > {1}")]
    InvertedBounds(Decimal, Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Between,
}

impl FromStr for AmountOp {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(AmountOp::Eq),
            "!=" => Ok(AmountOp::Ne),
            "<" => Ok(AmountOp::Lt),
            ">" => Ok(AmountOp::Gt),
            "<=" => Ok(AmountOp::Le),
            ">=" => Ok(AmountOp::Ge),
            s if s.eq_ignore_ascii_case("between") => Ok(AmountOp::Between),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for AmountOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountOp::Eq => write!(f, "="),
            AmountOp::Ne => write!(f, "!="),
            AmountOp::Lt => write!(f, "<"),
            AmountOp::Gt => write!(f, ">"),
            AmountOp::Le => write!(f, "<="),
            AmountOp::Ge => write!(f, ">="),
            AmountOp::Between => write!(f, "between"),
        }
    }
}

/// Numeric predicate over a transaction amount. `Between` carries the upper
/// bound in `upper`; every other operator compares against `value` alone.
///
/// Operators are a closed enum: malformed text is rejected here, at
/// construction, so the matcher never evaluates an unknown operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountCriterion {
    pub op: AmountOp,
    pub value: Decimal,
    pub upper: Option<Decimal>,
}

impl AmountCriterion {
    pub fn new(op: AmountOp, value: Decimal) -> Result<Self, RuleError> {
        if op == AmountOp::Between {
            return Err(RuleError::MissingUpperBound);
        }
        Ok(AmountCriterion { op, value, upper: None })
    }

    pub fn between(low: Decimal, high: Decimal) -> Result<Self, RuleError> {
        if low > high {
            return Err(RuleError::InvertedBounds(low, high));
        }
        Ok(AmountCriterion {
            op: AmountOp::Between,
            value: low,
            upper: Some(high),
        })
    }

    pub fn accepts(&self, amount: Decimal) -> bool {
        match self.op {
            AmountOp::Eq => amount == self.value,
            AmountOp::Ne => amount != self.value,
            AmountOp::Lt => amount < self.value,
            AmountOp::Gt => amount > self.value,
            AmountOp::Le => amount <= self.value,
            AmountOp::Ge => amount >= self.value,
            // Inclusive on both ends.
            AmountOp::Between => {
                let high = self.upper.unwrap_or(self.value);
                amount >= self.value && amount <= high
            }
        }
    }
}

impl FromStr for AmountCriterion {
    type Err = RuleError;

    /// Parses the textual forms the suggestion engine and rule editors emit:
    /// `"> 0"`, `"= -500"`, `"between 100 200"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let op: AmountOp = parts.next().unwrap_or_default().parse()?;
        let value = parse_bound(parts.next())?;
        if op == AmountOp::Between {
            let high = match parts.next() {
                Some(raw) => parse_bound(Some(raw))?,
                None => return Err(RuleError::MissingUpperBound),
            };
            AmountCriterion::between(value, high)
        } else {
            AmountCriterion::new(op, value)
        }
    }
}

fn parse_bound(raw: Option<&str>) -> Result<Decimal, RuleError> {
    let raw = raw.ok_or_else(|| RuleError::InvalidBound(String::new()))?;
    Decimal::from_str(raw).map_err(|_| RuleError::InvalidBound(raw.to_string()))
}

impl fmt::Display for AmountCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.op, self.upper) {
            (AmountOp::Between, Some(high)) => write!(f, "between {} {}", self.value, high),
            _ => write!(f, "{} {}", self.op, self.value),
        }
    }
}

/// A user-authored (or promoted) assignment rule mapping matching transactions
/// to a destination ledger account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: Option<i64>,
    pub name: String,
    /// Required keyword; an empty keyword makes the rule match nothing.
    pub keyword_1: String,
    /// Optional second keyword, ANDed with the first.
    pub keyword_2: Option<String>,
    pub journal_code: Option<String>,
    pub amount_criterion: Option<AmountCriterion>,
    pub destination_account: String,
    pub destination_label: String,
    pub is_active: bool,
}

impl Rule {
    pub fn new(keyword_1: &str, destination_account: &str) -> Self {
        Rule {
            id: None,
            name: format!("Règle {destination_account}"),
            keyword_1: keyword_1.to_string(),
            keyword_2: None,
            journal_code: None,
            amount_criterion: None,
            destination_account: destination_account.to_string(),
            destination_label: String::new(),
            is_active: true,
        }
    }

    pub fn keyword_count(&self) -> usize {
        if self.keyword_2.as_deref().is_some_and(|k| !k.is_empty()) {
            2
        } else {
            1
        }
    }

    /// Combined character length of the keywords, the specificity proxy used
    /// when ranking suggestions.
    pub fn keyword_len(&self) -> usize {
        self.keyword_1.len() + self.keyword_2.as_deref().map_or(0, str::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parse_simple_operators() {
        for (text, op) in [
            ("=", AmountOp::Eq),
            ("!=", AmountOp::Ne),
            ("<", AmountOp::Lt),
            (">", AmountOp::Gt),
            ("<=", AmountOp::Le),
            (">=", AmountOp::Ge),
        ] {
            assert_eq!(text.parse::<AmountOp>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operator_is_rejected() {
        assert_eq!(
            "~=".parse::<AmountOp>(),
            Err(RuleError::UnknownOperator("~=".to_string()))
        );
        assert!(matches!(
            "almost 100".parse::<AmountCriterion>(),
            Err(RuleError::UnknownOperator(_))
        ));
    }

    #[test]
    fn criterion_round_trips_through_display() {
        for text in ["> 0", "< 0", "= -500", ">= 100.50", "between 10 20"] {
            let crit: AmountCriterion = text.parse().unwrap();
            assert_eq!(crit.to_string(), text);
        }
    }

    #[test]
    fn ge_boundary_is_inclusive() {
        let crit: AmountCriterion = ">= 100.0".parse().unwrap();
        assert!(!crit.accepts(dec("99.99")));
        assert!(crit.accepts(dec("100.0")));
        assert!(crit.accepts(dec("100.01")));
    }

    #[test]
    fn between_is_inclusive_both_ends() {
        let crit = AmountCriterion::between(dec("-500"), dec("-100")).unwrap();
        assert!(crit.accepts(dec("-500")));
        assert!(crit.accepts(dec("-100")));
        assert!(crit.accepts(dec("-250")));
        assert!(!crit.accepts(dec("-501")));
        assert!(!crit.accepts(dec("-99")));
    }

    #[test]
    fn between_rejects_inverted_bounds() {
        assert!(matches!(
            AmountCriterion::between(dec("200"), dec("100")),
            Err(RuleError::InvertedBounds(_, _))
        ));
        assert_eq!(
            "between 5".parse::<AmountCriterion>(),
            Err(RuleError::MissingUpperBound)
        );
    }

    #[test]
    fn malformed_bound_is_rejected() {
        assert_eq!(
            "> abc".parse::<AmountCriterion>(),
            Err(RuleError::InvalidBound("abc".to_string()))
        );
    }

    #[test]
    fn criterion_survives_json() {
        // Rule editors ship criteria as JSON; make sure the enum tags are stable.
        let crit: AmountCriterion = "= -500".parse().unwrap();
        let json = serde_json::to_string(&crit).unwrap();
        assert!(json.contains("\"eq\""));
        let back: AmountCriterion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, crit);
    }

    #[test]
    fn keyword_accounting() {
        let mut rule = Rule::new("LOYER", "613000");
        assert_eq!(rule.keyword_count(), 1);
        assert_eq!(rule.keyword_len(), 5);

        rule.keyword_2 = Some("JANVIER".to_string());
        assert_eq!(rule.keyword_count(), 2);
        assert_eq!(rule.keyword_len(), 12);

        rule.keyword_2 = Some(String::new());
        assert_eq!(rule.keyword_count(), 1);
    }
}
