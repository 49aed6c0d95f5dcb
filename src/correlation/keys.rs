use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Tracker keys look like "ABC-123": two or more letters, a hyphen,
/// digits. Matching is case-insensitive; results are uppercased.
fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b[a-z]{2,}-[0-9]+\b").expect("valid key pattern"))
}

/// Scan commit text for issue-key references, preserving first-seen
/// order and deduplicating case-insensitively.
pub fn extract_reference_keys(title: &str, message: &str) -> Vec<String> {
    let text = format!("{title}\n{message}");
    let mut seen = HashSet::new();
    let mut keys = Vec::new();

    for m in key_pattern().find_iter(&text) {
        let key = m.as_str().to_uppercase();
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }

    keys
}
