use crate::models::commit::Commit;
use crate::models::issue::Issue;
use serde::{Deserialize, Serialize};

/// Result of one summary run: the annotated records plus bucket counts
/// for the report header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummary {
    pub context_key: String,
    pub issues: Vec<Issue>,
    pub commits: Vec<Commit>,
    pub matched_issue_count: usize,
    pub unmatched_issue_count: usize,
    pub matched_commit_count: usize,
    pub unmatched_commit_count: usize,
    /// Human-readable repository path, used only to build commit links.
    pub repo_web_path: Option<String>,
}

impl ReleaseSummary {
    pub fn from_annotated(
        context_key: String,
        issues: Vec<Issue>,
        commits: Vec<Commit>,
        repo_web_path: Option<String>,
    ) -> Self {
        let matched_issue_count = issues.iter().filter(|i| !i.associations.is_empty()).count();
        let matched_commit_count = commits.iter().filter(|c| !c.associations.is_empty()).count();

        ReleaseSummary {
            context_key,
            matched_issue_count,
            unmatched_issue_count: issues.len() - matched_issue_count,
            matched_commit_count,
            unmatched_commit_count: commits.len() - matched_commit_count,
            issues,
            commits,
            repo_web_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::{Association, MatchType};

    #[test]
    fn bucket_counts_split_matched_from_unmatched() {
        let mut matched = Issue::new("I1", "ABC-1", "one", "Done");
        matched.associations.push(Association {
            counterpart_id: "c1".to_string(),
            match_type: MatchType::Explicit,
        });
        let unmatched = Issue::new("I2", "ABC-2", "two", "Open");

        let summary = ReleaseSummary::from_annotated(
            "K".to_string(),
            vec![matched, unmatched],
            vec![Commit::new("c1", "c1s", "t", "")],
            None,
        );

        assert_eq!(summary.matched_issue_count, 1);
        assert_eq!(summary.unmatched_issue_count, 1);
        assert_eq!(summary.matched_commit_count, 0);
        assert_eq!(summary.unmatched_commit_count, 1);
    }
}
