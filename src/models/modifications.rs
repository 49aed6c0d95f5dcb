use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A manual issue/commit link the user created directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualMatch {
    pub issue_id: String,
    pub commit_id: String,
}

/// An unordered pair the user explicitly severed. The loose matcher must
/// never re-establish a severed pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedPair {
    pub item1_id: String,
    pub item2_id: String,
}

impl UnmatchedPair {
    pub fn new(a: &str, b: &str) -> Self {
        UnmatchedPair {
            item1_id: a.to_string(),
            item2_id: b.to_string(),
        }
    }

    /// Unordered comparison: {A, B} severs both A→B and B→A.
    pub fn covers(&self, a: &str, b: &str) -> bool {
        (self.item1_id == a && self.item2_id == b) || (self.item1_id == b && self.item2_id == a)
    }
}

/// Durable record of everything the user changed by hand for one release
/// context. Persists across summary runs; everything else is rebuilt fresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserModifications {
    #[serde(default)]
    pub manual_matches: Vec<ManualMatch>,
    #[serde(default)]
    pub user_unmatches: Vec<UnmatchedPair>,
    #[serde(default)]
    pub flagged_items: HashMap<String, bool>,
}

impl UserModifications {
    pub fn is_unmatched(&self, a: &str, b: &str) -> bool {
        self.user_unmatches.iter().any(|pair| pair.covers(a, b))
    }
}

/// Identifies one release-comparison scenario: which project and fix
/// version on the tracker side, which repository and tag pair on the
/// source-control side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseContext {
    pub project_key: String,
    pub fix_version: String,
    pub repo: String,
    pub tag_from: String,
    pub tag_to: String,
}

impl ReleaseContext {
    /// Stable string key scoping persisted user modifications. Project
    /// keys compare case-insensitively on the tracker, so the key is
    /// uppercased; the remaining parts are trimmed verbatim.
    pub fn context_key(&self) -> String {
        [
            self.project_key.trim().to_uppercase(),
            self.fix_version.trim().to_string(),
            self.repo.trim().to_string(),
            self.tag_from.trim().to_string(),
            self.tag_to.trim().to_string(),
        ]
        .join("::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_pair_covers_both_orders() {
        let pair = UnmatchedPair::new("I1", "c1");
        assert!(pair.covers("I1", "c1"));
        assert!(pair.covers("c1", "I1"));
        assert!(!pair.covers("I1", "c2"));
    }

    #[test]
    fn context_key_normalizes_case_and_whitespace() {
        let ctx = ReleaseContext {
            project_key: " abc ".to_string(),
            fix_version: " 1.2.0 ".to_string(),
            repo: "42".to_string(),
            tag_from: "v1.1.0".to_string(),
            tag_to: " v1.2.0".to_string(),
        };
        assert_eq!(ctx.context_key(), "ABC::1.2.0::42::v1.1.0::v1.2.0");
    }

    #[test]
    fn context_keys_differ_when_any_part_differs() {
        let base = ReleaseContext {
            project_key: "ABC".to_string(),
            fix_version: "1.2.0".to_string(),
            repo: "42".to_string(),
            tag_from: "v1".to_string(),
            tag_to: "v2".to_string(),
        };
        let mut other = base.clone();
        other.tag_to = "v3".to_string();
        assert_ne!(base.context_key(), other.context_key());
    }
}
