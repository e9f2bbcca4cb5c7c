use crate::suggest::CandidateRule;

/// Orders collision-free candidates: coverage first, then keyword count and
/// combined keyword length as specificity proxies, then the keyword text so
/// that repeated calls over identical input agree. Returns at most `limit`.
pub fn rank_and_select(mut candidates: Vec<CandidateRule>, limit: usize) -> Vec<CandidateRule> {
    candidates.sort_by(|a, b| {
        b.coverage_count
            .cmp(&a.coverage_count)
            .then_with(|| b.keyword_count().cmp(&a.keyword_count()))
            .then_with(|| b.keyword_len().cmp(&a.keyword_len()))
            .then_with(|| a.keyword_1.cmp(&b.keyword_1))
            .then_with(|| a.keyword_2.cmp(&b.keyword_2))
    });
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(keyword_1: &str, keyword_2: Option<&str>, coverage: usize) -> CandidateRule {
        let mut c = CandidateRule::new(keyword_1);
        c.keyword_2 = keyword_2.map(str::to_string);
        c.coverage_count = coverage;
        c
    }

    #[test]
    fn coverage_dominates() {
        let ranked = rank_and_select(
            vec![candidate("AAA", None, 2), candidate("B", None, 10)],
            3,
        );
        assert_eq!(ranked[0].keyword_1, "B");
    }

    #[test]
    fn two_keywords_beat_one_at_equal_coverage() {
        let ranked = rank_and_select(
            vec![
                candidate("LONGKEYWORD", None, 5),
                candidate("AB", Some("CD"), 5),
            ],
            3,
        );
        assert_eq!(ranked[0].keyword_1, "AB");
    }

    #[test]
    fn longer_keywords_win_at_equal_count() {
        let ranked = rank_and_select(
            vec![candidate("CB", None, 5), candidate("LOYER", None, 5)],
            3,
        );
        assert_eq!(ranked[0].keyword_1, "LOYER");
    }

    #[test]
    fn limit_is_enforced_and_empty_input_is_fine() {
        let many: Vec<CandidateRule> = (0..10)
            .map(|i| candidate(&format!("KW{i}"), None, i))
            .collect();
        assert_eq!(rank_and_select(many, 3).len(), 3);
        assert!(rank_and_select(Vec::new(), 3).is_empty());
    }

    #[test]
    fn ties_are_deterministic_across_calls() {
        let pool = vec![
            candidate("ALPHA", None, 5),
            candidate("BRAVO", None, 5),
            candidate("DELTA", None, 5),
        ];
        let first = rank_and_select(pool.clone(), 2);
        for _ in 0..5 {
            assert_eq!(rank_and_select(pool.clone(), 2), first);
        }
        assert_eq!(first[0].keyword_1, "ALPHA");
    }
}
