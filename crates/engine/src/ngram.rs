//! N-gram extraction over normalized labels.

use std::collections::BTreeSet;

use crate::normalize::{is_numeric, is_significant, is_stopword};

/// All distinct n-grams of 1..=`max_words` consecutive words. N-grams made of
/// nothing but stopwords or nothing but numbers are skipped; mixed ones stay.
pub fn extract_ngrams(text: &str, max_words: usize) -> BTreeSet<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut ngrams = BTreeSet::new();
    for n in 1..=max_words.min(words.len()) {
        for window in words.windows(n) {
            if window.iter().all(|w| is_stopword(w)) {
                continue;
            }
            if window.iter().all(|w| is_numeric(w)) {
                continue;
            }
            ngrams.insert(window.join(" "));
        }
    }
    ngrams
}

/// N-grams of the first label that appear, as substrings, in every label of
/// the slice. Empty input yields the empty set.
pub fn common_ngrams(labels: &[String], max_words: usize) -> BTreeSet<String> {
    let Some(first) = labels.first() else {
        return BTreeSet::new();
    };
    extract_ngrams(first, max_words)
        .into_iter()
        .filter(|ngram| labels.iter().all(|label| label.contains(ngram.as_str())))
        .collect()
}

/// True when every word of the n-gram is a significant word.
pub fn is_distinctive(ngram: &str) -> bool {
    let mut has_words = false;
    for word in ngram.split_whitespace() {
        if !is_significant(word) {
            return false;
        }
        has_words = true;
    }
    has_words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_lengths_up_to_max() {
        let ngrams = extract_ngrams("ASSURANCE AXA 2024", 3);
        assert!(ngrams.contains("ASSURANCE"));
        assert!(ngrams.contains("AXA"));
        assert!(ngrams.contains("ASSURANCE AXA"));
        assert!(ngrams.contains("ASSURANCE AXA 2024"));
        // purely numeric
        assert!(!ngrams.contains("2024"));
    }

    #[test]
    fn skips_stopword_only_ngrams() {
        let ngrams = extract_ngrams("VIREMENT DE LA SOCIETE", 2);
        assert!(!ngrams.contains("VIREMENT"));
        assert!(!ngrams.contains("DE LA"));
        assert!(ngrams.contains("SOCIETE"));
        assert!(ngrams.contains("LA SOCIETE"));
    }

    #[test]
    fn common_ngrams_require_presence_in_every_label() {
        let labels = vec![
            "VIREMENT LOYER JANVIER".to_string(),
            "VIREMENT LOYER FEVRIER".to_string(),
            "VIREMENT LOYER MARS".to_string(),
        ];
        let common = common_ngrams(&labels, 5);
        assert!(common.contains("LOYER"));
        assert!(common.contains("VIREMENT LOYER"));
        assert!(!common.contains("JANVIER"));
    }

    #[test]
    fn common_ngrams_of_nothing_is_nothing() {
        assert!(common_ngrams(&[], 5).is_empty());
    }

    #[test]
    fn distinctive_ngrams_have_only_significant_words() {
        assert!(is_distinctive("AXA ASSURANCE"));
        assert!(!is_distinctive("LA SOCIETE")); // stopword inside
        assert!(!is_distinctive("AXA 123456")); // number inside
        assert!(!is_distinctive(""));
    }
}
