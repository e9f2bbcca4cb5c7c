//! Label normalization shared by every other engine component.

/// Uppercase accented Latin letters and their unaccented equivalents. A fixed
/// table, not full Unicode decomposition: bank labels only ever carry the
/// French repertoire.
const ACCENTS: &[(char, char)] = &[
    ('À', 'A'),
    ('Á', 'A'),
    ('Â', 'A'),
    ('Ã', 'A'),
    ('Ä', 'A'),
    ('Ç', 'C'),
    ('È', 'E'),
    ('É', 'E'),
    ('Ê', 'E'),
    ('Ë', 'E'),
    ('Ì', 'I'),
    ('Í', 'I'),
    ('Î', 'I'),
    ('Ï', 'I'),
    ('Ñ', 'N'),
    ('Ò', 'O'),
    ('Ó', 'O'),
    ('Ô', 'O'),
    ('Õ', 'O'),
    ('Ö', 'O'),
    ('Ù', 'U'),
    ('Ú', 'U'),
    ('Û', 'U'),
    ('Ü', 'U'),
    ('Ý', 'Y'),
];

/// French function words plus generic banking vocabulary; none of these can
/// carry a matching pattern on its own.
pub const STOPWORDS: &[&str] = &[
    "de", "du", "des", "le", "la", "les", "un", "une", "et", "ou", "pour", "par", "sur", "avec",
    "sans", "au", "aux", "carte", "cb", "vir", "virement", "paiement", "retrait", "facture",
    "fact", "fac", "operation", "oper", "transaction", "trans", "prelevement", "prlv", "echeance",
    "ech",
];

fn fold_accent(c: char) -> char {
    ACCENTS
        .iter()
        .find(|(accented, _)| *accented == c)
        .map(|(_, plain)| *plain)
        .unwrap_or(c)
}

/// Uppercases, folds accents and trims. Punctuation is preserved: dots and
/// hyphens inside labels (domains, compound names) are meaningful tokens.
/// Idempotent, and total over empty input.
pub fn normalize(text: &str) -> String {
    text.to_uppercase()
        .chars()
        .map(fold_accent)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Normalization for similarity clustering only: on top of [`normalize`],
/// digit runs collapse to a single `0` and punctuation to spaces, so that
/// "CHEQUE 123" and "CHEQUE 456" compare equal.
pub fn normalize_for_grouping(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_digits = false;
    for c in normalize(text).chars() {
        if c.is_ascii_digit() {
            if !in_digits {
                out.push('0');
            }
            in_digits = true;
        } else {
            in_digits = false;
            if c.is_alphanumeric() {
                out.push(c);
            } else {
                out.push(' ');
            }
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

pub fn is_numeric(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

/// A word that can carry a pattern: at least three characters, not a number,
/// not a stopword.
pub fn is_significant(word: &str) -> bool {
    word.chars().count() >= 3 && !is_numeric(word) && !is_stopword(word)
}
