use std::collections::HashSet;

/// Minimum shared-token count for a loose match.
pub const LOOSE_MATCH_THRESHOLD: usize = 2;

/// Words too generic to carry matching signal. Commit messages are full
/// of them and they would dominate the overlap score.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "into", "that", "this", "when", "where", "after",
    "before", "add", "added", "adds", "fix", "fixed", "fixes", "update", "updated", "updates",
    "remove", "removed", "removes", "change", "changed", "changes", "merge", "branch", "issue",
    "bug", "feature", "minor", "small", "some", "more", "not", "now", "new",
];

/// Tokenize free text for loose matching: lowercase, strip punctuation
/// except hyphens, split on whitespace, drop short tokens and stop words.
pub fn significant_tokens(text: &str, extra_stop_words: &[String]) -> HashSet<String> {
    let mut tokens = HashSet::new();

    for raw in text.split_whitespace() {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-')
            .collect::<String>()
            .to_lowercase();

        if cleaned.len() <= 2 {
            continue;
        }
        if STOP_WORDS.contains(&cleaned.as_str()) {
            continue;
        }
        if extra_stop_words.iter().any(|w| w == &cleaned) {
            continue;
        }

        tokens.insert(cleaned);
    }

    tokens
}

/// Overlap score between two token sets: set-intersection cardinality.
pub fn overlap_score(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}
