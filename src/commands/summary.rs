use crate::commands::db;
use crate::commands::settings::{load_effective_settings, EffectiveSettings};
use crate::correlation::engine::{correlate_with, CorrelationSettings};
use crate::models::commit::Commit;
use crate::models::issue::{Issue, MatchType};
use crate::models::modifications::{ReleaseContext, UserModifications};
use crate::models::summary::ReleaseSummary;
use crate::sources::gitlab::GitLabCommitSource;
use crate::sources::jira::JiraIssueSource;
use crate::sources::local_git;
use std::path::Path;

/// Fetch issues and commits for the context, apply the stored user
/// modifications, and correlate. Commits come from the hosted API
/// unless `local_repo` points at a checkout on disk.
pub async fn build_release_summary(
    data_dir: &Path,
    context: &ReleaseContext,
    local_repo: Option<&str>,
) -> Result<ReleaseSummary, String> {
    let settings = load_effective_settings(data_dir)?;

    if settings.jira_base_url.is_empty() {
        return Err("SETTINGS_MISSING: jiraBaseUrl is not configured".to_string());
    }

    let issue_source = JiraIssueSource::new(&settings.jira_base_url, &settings.jira_token)?;
    let issues = issue_source
        .fetch_issues(&context.project_key, &context.fix_version)
        .await?;

    let (commits, repo_web_path) = match local_repo {
        Some(path) => {
            let commits =
                local_git::list_commits_between_tags(path, &context.tag_from, &context.tag_to)?;
            (commits, None)
        }
        None => {
            if settings.gitlab_base_url.is_empty() {
                return Err("SETTINGS_MISSING: gitlabBaseUrl is not configured".to_string());
            }
            let source = GitLabCommitSource::new(&settings.gitlab_base_url, &settings.gitlab_token)?;
            let commits = source
                .fetch_commits(&context.repo, &context.tag_from, &context.tag_to)
                .await?;
            let web_path = source.fetch_project_path(&context.repo).await.ok();
            (commits, web_path)
        }
    };

    let conn = db::get_db_connection(data_dir).map_err(|e| format!("DB error: {e}"))?;
    let mods = db::load_user_modifications(&conn, &context.context_key())
        .map_err(|e| format!("Query error: {e}"))?;

    Ok(assemble_summary(
        context,
        issues,
        commits,
        &mods,
        &settings,
        repo_web_path,
    ))
}

/// The pure tail of the summary command: run the engine over records
/// already in hand. Split out so tests can skip the network.
pub fn assemble_summary(
    context: &ReleaseContext,
    mut issues: Vec<Issue>,
    mut commits: Vec<Commit>,
    mods: &UserModifications,
    settings: &EffectiveSettings,
    repo_web_path: Option<String>,
) -> ReleaseSummary {
    let correlation = CorrelationSettings {
        loose_match_threshold: settings.loose_match_threshold,
        extra_stop_words: settings.extra_stop_words.clone(),
    };
    correlate_with(&mut issues, &mut commits, mods, &correlation);

    ReleaseSummary::from_annotated(context.context_key(), issues, commits, repo_web_path)
}

/// Plain-text report: matched pairs grouped by issue, then the leftover
/// buckets. Flagged items carry a marker.
pub fn render_text(summary: &ReleaseSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("Release summary for {}\n", summary.context_key));
    out.push_str(&format!(
        "  issues: {} matched, {} unmatched | commits: {} matched, {} unmatched\n\n",
        summary.matched_issue_count,
        summary.unmatched_issue_count,
        summary.matched_commit_count,
        summary.unmatched_commit_count
    ));

    out.push_str("Matched issues\n");
    for issue in summary.issues.iter().filter(|i| !i.associations.is_empty()) {
        out.push_str(&format!(
            "  {}{} [{}] {}\n",
            flag_marker(issue.needs_action),
            issue.key,
            issue.status,
            issue.summary
        ));
        for assoc in &issue.associations {
            let commit = summary.commits.iter().find(|c| c.id == assoc.counterpart_id);
            let label = commit.map(|c| c.short_id.as_str()).unwrap_or("?");
            let title = commit.map(|c| c.title.as_str()).unwrap_or("");
            out.push_str(&format!(
                "      {} {} - {}\n",
                match_type_label(assoc.match_type),
                commit_link(summary, label),
                title
            ));
        }
    }

    out.push_str("\nUnmatched issues\n");
    for issue in summary.issues.iter().filter(|i| i.associations.is_empty()) {
        out.push_str(&format!(
            "  {}{} [{}] {}\n",
            flag_marker(issue.needs_action),
            issue.key,
            issue.status,
            issue.summary
        ));
    }

    out.push_str("\nUnmatched commits\n");
    for commit in summary.commits.iter().filter(|c| c.associations.is_empty()) {
        out.push_str(&format!(
            "  {}{} {}\n",
            flag_marker(commit.needs_action),
            commit_link(summary, &commit.short_id),
            commit.title
        ));
    }

    out
}

fn commit_link(summary: &ReleaseSummary, short_id: &str) -> String {
    match &summary.repo_web_path {
        Some(path) => format!("{path}@{short_id}"),
        None => short_id.to_string(),
    }
}

fn match_type_label(match_type: MatchType) -> &'static str {
    match match_type {
        MatchType::Explicit => "[explicit]",
        MatchType::Manual => "[manual]  ",
        MatchType::Loose => "[loose]   ",
    }
}

fn flag_marker(needs_action: bool) -> &'static str {
    if needs_action {
        "! "
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::modifications::ManualMatch;

    fn settings() -> EffectiveSettings {
        EffectiveSettings {
            jira_base_url: String::new(),
            jira_token: String::new(),
            gitlab_base_url: String::new(),
            gitlab_token: String::new(),
            gitlab_project_id: String::new(),
            loose_match_threshold: 2,
            extra_stop_words: Vec::new(),
        }
    }

    fn context() -> ReleaseContext {
        ReleaseContext {
            project_key: "ABC".to_string(),
            fix_version: "1.2.0".to_string(),
            repo: "42".to_string(),
            tag_from: "v1.1.0".to_string(),
            tag_to: "v1.2.0".to_string(),
        }
    }

    #[test]
    fn assemble_applies_manual_matches_and_counts_buckets() {
        let issues = vec![
            Issue::new("ABC-1", "ABC-1", "Add login retry", "Done"),
            Issue::new("ABC-2", "ABC-2", "Untouched ticket", "Open"),
        ];
        let commits = vec![Commit::new("c1", "c1s", "rework session handling", "")];
        let mods = UserModifications {
            manual_matches: vec![ManualMatch {
                issue_id: "ABC-1".to_string(),
                commit_id: "c1".to_string(),
            }],
            ..Default::default()
        };

        let summary = assemble_summary(&context(), issues, commits, &mods, &settings(), None);

        assert_eq!(summary.matched_issue_count, 1);
        assert_eq!(summary.unmatched_issue_count, 1);
        assert_eq!(summary.matched_commit_count, 1);
        assert_eq!(summary.issues[0].associations[0].match_type, MatchType::Manual);
    }

    #[test]
    fn render_lists_every_bucket_and_marks_flags() {
        let issues = vec![
            Issue::new("ABC-1", "ABC-1", "Add login retry", "Done"),
            Issue::new("ABC-2", "ABC-2", "Orphan ticket", "Open"),
        ];
        let mut commits = vec![
            Commit::new("c1", "c1s", "ABC-1 add login retry logic", ""),
            Commit::new("c2", "c2s", "orphan commit", ""),
        ];
        commits[0].explicit_reference_keys = vec!["ABC-1".to_string()];
        let mods = UserModifications {
            flagged_items: [("ABC-2".to_string(), true)].into_iter().collect(),
            ..Default::default()
        };

        let summary = assemble_summary(
            &context(),
            issues,
            commits,
            &mods,
            &settings(),
            Some("platform/payments".to_string()),
        );
        let text = render_text(&summary);

        assert!(text.contains("1 matched, 1 unmatched"));
        assert!(text.contains("[explicit] platform/payments@c1s"));
        assert!(text.contains("! ABC-2"));
        assert!(text.contains("orphan commit"));
    }
}
