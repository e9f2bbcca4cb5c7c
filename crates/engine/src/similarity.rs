//! Fuzzy string scoring used by the third-party analyzer and the grouper.
//! Scores are integers in 0..=100, 100 meaning identical.

/// Levenshtein edit distance using the two-row O(min(m,n)) space algorithm.
pub fn levenshtein(s1: &str, s2: &str) -> usize {
    let a = s1.as_bytes();
    let b = s2.as_bytes();
    let (m, n) = (a.len(), b.len());

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Keep the shorter string in the inner loop to minimise allocation.
    let (a, b, m, n) = if m <= n { (a, b, m, n) } else { (b, a, n, m) };

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Plain edit-distance similarity.
pub fn ratio(s1: &str, s2: &str) -> u32 {
    let max_len = s1.len().max(s2.len());
    if max_len == 0 {
        return 100;
    }
    let dist = levenshtein(s1, s2);
    (100.0 * (1.0 - dist as f64 / max_len as f64)).round() as u32
}

/// Best score of the shorter string against every same-length window of the
/// longer one; catches a vendor name buried inside a longer label.
pub fn partial_ratio(s1: &str, s2: &str) -> u32 {
    let (short, long) = if s1.len() <= s2.len() { (s1, s2) } else { (s2, s1) };
    if short.is_empty() {
        return if long.is_empty() { 100 } else { 0 };
    }
    if short.len() == long.len() {
        return ratio(short, long);
    }

    let short_bytes = short.as_bytes();
    let long_bytes = long.as_bytes();
    let mut best = 0;
    for start in 0..=(long_bytes.len() - short_bytes.len()) {
        let window = &long_bytes[start..start + short_bytes.len()];
        // Labels are ASCII after accent folding, so byte windows stay valid.
        let window = std::str::from_utf8(window).unwrap_or(long);
        best = best.max(ratio(short, window));
        if best == 100 {
            break;
        }
    }
    best
}

/// Word-order-insensitive score: compares the shared token set against each
/// side's full token set, so "DUPONT SARL PARIS" and "SARL DUPONT" score high.
pub fn token_set_ratio(s1: &str, s2: &str) -> u32 {
    use std::collections::BTreeSet;

    let set1: BTreeSet<&str> = s1.split_whitespace().collect();
    let set2: BTreeSet<&str> = s2.split_whitespace().collect();

    let intersection: Vec<&str> = set1.intersection(&set2).copied().collect();
    let only1: Vec<&str> = set1.difference(&set2).copied().collect();
    let only2: Vec<&str> = set2.difference(&set1).copied().collect();

    let base = intersection.join(" ");
    let combined1 = join_parts(&base, &only1);
    let combined2 = join_parts(&base, &only2);

    ratio(&base, &combined1)
        .max(ratio(&base, &combined2))
        .max(ratio(&combined1, &combined2))
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        rest.join(" ")
    } else {
        format!("{} {}", base, rest.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("cat", "bat"), 1);
        assert_eq!(levenshtein("amazon", "amzn"), levenshtein("amzn", "amazon"));
    }

    #[test]
    fn ratio_bounds() {
        assert_eq!(ratio("", ""), 100);
        assert_eq!(ratio("LOYER", "LOYER"), 100);
        assert!(ratio("LOYER", "XXXXX") < 30);
    }

    #[test]
    fn partial_ratio_finds_embedded_name() {
        assert_eq!(partial_ratio("DUPONT", "VIR SEPA DUPONT 2024"), 100);
        assert!(partial_ratio("DUPOND", "VIR SEPA DUPONT 2024") >= 80);
    }

    #[test]
    fn token_set_ignores_word_order() {
        assert_eq!(
            token_set_ratio("DUPONT SARL", "SARL DUPONT"),
            100
        );
        assert_eq!(token_set_ratio("DUPONT SARL PARIS", "SARL DUPONT"), 100);
        assert!(token_set_ratio("DUPONT SARL", "MARTIN SAS") < 50);
    }
}
