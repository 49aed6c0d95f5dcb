use serde::{Deserialize, Serialize};

/// How an issue/commit pair came to be linked.
///
/// Precedence when deciding whether a link may still be altered:
/// `Manual` > `Explicit` > `Loose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Commit text literally names the issue key.
    Explicit,
    /// The user linked the pair by hand.
    Manual,
    /// Keyword-overlap heuristic.
    Loose,
}

/// One directed half of an issue/commit link. The engine always writes
/// the reciprocal half too, so association lists stay symmetric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub counterpart_id: String,
    pub match_type: MatchType,
}

/// A tracked work item from the issue tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub summary: String,
    pub status: String,
    #[serde(default)]
    pub associations: Vec<Association>,
    #[serde(default)]
    pub needs_action: bool,
}

impl Issue {
    pub fn new(id: &str, key: &str, summary: &str, status: &str) -> Self {
        Issue {
            id: id.to_string(),
            key: key.to_string(),
            summary: summary.to_string(),
            status: status.to_string(),
            associations: Vec::new(),
            needs_action: false,
        }
    }

    pub fn has_match_type(&self, match_type: MatchType) -> bool {
        self.associations.iter().any(|a| a.match_type == match_type)
    }

    pub fn is_linked_to(&self, counterpart_id: &str) -> bool {
        self.associations
            .iter()
            .any(|a| a.counterpart_id == counterpart_id)
    }
}
