use crate::models::issue::{Association, MatchType};
use serde::{Deserialize, Serialize};

/// One recorded change in source control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: String,
    pub short_id: String,
    pub title: String,
    pub message: String,
    /// Unix timestamp of the commit, when the source provides one.
    pub committed_at: Option<i64>,
    /// Issue keys found in title+message, uppercased and deduplicated.
    #[serde(default)]
    pub explicit_reference_keys: Vec<String>,
    #[serde(default)]
    pub associations: Vec<Association>,
    #[serde(default)]
    pub needs_action: bool,
}

impl Commit {
    pub fn new(id: &str, short_id: &str, title: &str, message: &str) -> Self {
        Commit {
            id: id.to_string(),
            short_id: short_id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            committed_at: None,
            explicit_reference_keys: Vec::new(),
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
