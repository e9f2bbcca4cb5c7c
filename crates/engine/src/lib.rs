pub mod collision;
pub mod config;
pub mod grouper;
pub mod index;
pub mod matcher;
pub mod ngram;
pub mod normalize;
pub mod rank;
pub(crate) mod similarity;
pub mod stats;
pub mod suggest;

pub use config::{ConfigError, EngineConfig};
pub use grouper::{GroupedItem, Grouper, TransactionGroup};
pub use index::LabelIndex;
pub use matcher::{matches, test_rule};
pub use normalize::{normalize, normalize_for_grouping};
pub use stats::{
    account_statistics, automation_rate, collision_count, probe_rule, rule_statistics,
    AccountStat, CollisionDetail, RuleProbe, RuleStatistics,
};
pub use suggest::{CandidateRule, SuggestedRule, Suggester};
