use git2::{Repository, Signature, Time};
use releaselens_lib::commands::db;
use releaselens_lib::commands::links;
use releaselens_lib::commands::settings::{save_settings_to_disk, EffectiveSettings};
use releaselens_lib::commands::summary::{assemble_summary, build_release_summary, render_text};
use releaselens_lib::models::issue::{Issue, MatchType};
use releaselens_lib::models::modifications::ReleaseContext;
use releaselens_lib::sources::local_git::list_commits_between_tags;
use serde_json::json;
use tempfile::TempDir;

fn release_context() -> ReleaseContext {
    ReleaseContext {
        project_key: "ABC".to_string(),
        fix_version: "1.2.0".to_string(),
        repo: "42".to_string(),
        tag_from: "v1.1.0".to_string(),
        tag_to: "v1.2.0".to_string(),
    }
}

fn default_effective_settings() -> EffectiveSettings {
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

/// Fixture repository with three commits; v1.1.0 tags the first and
/// v1.2.0 tags the last, so two commits sit between the tags.
fn create_tagged_repo() -> (TempDir, String, Vec<String>) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("init git repo");

    let mut commit_ids = Vec::new();
    let messages = [
        "initial scaffolding",
        "Fix ABC-1 login retry\n\nBack off between attempts.",
        "database connection pooling improvements",
    ];

    let mut parent = None;
    for (index, message) in messages.iter().enumerate() {
        let file = format!("file{index}.txt");
        std::fs::write(temp_dir.path().join(&file), message).expect("write file");

        let mut index_file = repo.index().expect("open index");
        index_file
            .add_path(std::path::Path::new(&file))
            .expect("add file");
        index_file.write().expect("write index");
        let tree_id = index_file.write_tree().expect("write tree");
        let tree = repo.find_tree(tree_id).expect("find tree");

        // Distinct timestamps keep the revwalk time ordering stable.
        let when = Time::new(1_700_000_000 + (index as i64) * 100, 0);
        let signature =
            Signature::new("Test User", "test@example.com", &when).expect("signature");

        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("commit");
        commit_ids.push(oid.to_string());
        parent = Some(repo.find_commit(oid).expect("find commit"));
    }

    let first = repo
        .find_commit(commit_ids[0].parse().expect("oid"))
        .expect("first commit");
    let last = repo
        .find_commit(commit_ids[2].parse().expect("oid"))
        .expect("last commit");
    repo.tag_lightweight("v1.1.0", first.as_object(), false)
        .expect("tag from");
    repo.tag_lightweight("v1.2.0", last.as_object(), false)
        .expect("tag to");

    let path = temp_dir.path().to_string_lossy().to_string();
    (temp_dir, path, commit_ids)
}

#[test]
fn local_git_source_yields_commits_between_tags_newest_first() {
    let (_tmp, repo_path, commit_ids) = create_tagged_repo();

    let commits =
        list_commits_between_tags(&repo_path, "v1.1.0", "v1.2.0").expect("list commits");

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].id, commit_ids[2]);
    assert_eq!(commits[1].id, commit_ids[1]);
    // Title/message split and key extraction happen at the source.
    assert_eq!(commits[1].title, "Fix ABC-1 login retry");
    assert_eq!(commits[1].message, "Back off between attempts.");
    assert_eq!(commits[1].explicit_reference_keys, vec!["ABC-1".to_string()]);
    assert!(commits[0].committed_at.unwrap() > commits[1].committed_at.unwrap());
}

#[test]
fn local_git_source_reports_missing_tags() {
    let (_tmp, repo_path, _ids) = create_tagged_repo();

    let err = list_commits_between_tags(&repo_path, "v9.9.9", "v1.2.0")
        .expect_err("unknown tag should fail");
    assert!(err.starts_with("TAG_NOT_FOUND"), "got: {err}");
}

#[test]
fn fixture_commits_correlate_with_tracker_issues_end_to_end() {
    let (_tmp, repo_path, _ids) = create_tagged_repo();
    let data_dir = tempfile::tempdir().expect("data dir");
    let ctx = release_context();

    let commits =
        list_commits_between_tags(&repo_path, "v1.1.0", "v1.2.0").expect("list commits");
    let issues = vec![
        Issue::new("ABC-1", "ABC-1", "Login keeps failing on retry", "Done"),
        Issue::new("ABC-2", "ABC-2", "Improve database connection pooling", "Done"),
        Issue::new("ABC-3", "ABC-3", "Completely unrelated ticket", "Open"),
    ];

    let conn = db::get_db_connection(data_dir.path()).expect("db");
    let mods = db::load_user_modifications(&conn, &ctx.context_key()).expect("load mods");

    let summary = assemble_summary(
        &ctx,
        issues,
        commits,
        &mods,
        &default_effective_settings(),
        None,
    );

    // ABC-1 by explicit reference, ABC-2 by token overlap, ABC-3 unmatched.
    assert_eq!(summary.matched_issue_count, 2);
    assert_eq!(summary.unmatched_issue_count, 1);
    let abc1 = &summary.issues[0];
    assert_eq!(abc1.associations[0].match_type, MatchType::Explicit);
    let abc2 = &summary.issues[1];
    assert_eq!(abc2.associations[0].match_type, MatchType::Loose);

    // Both in-range commits found a ticket.
    assert_eq!(summary.unmatched_commit_count, 0);

    let text = render_text(&summary);
    assert!(text.contains("ABC-3"));
    assert!(text.contains("[explicit]"));
    assert!(text.contains("[loose]"));
}

#[test]
fn recorded_unmatch_survives_into_the_next_correlation_run() {
    let (_tmp, repo_path, commit_ids) = create_tagged_repo();
    let data_dir = tempfile::tempdir().expect("data dir");
    let ctx = release_context();

    let pooling_commit = &commit_ids[2];
    links::record_unmatch(data_dir.path(), &ctx, "ABC-2", pooling_commit).expect("unmatch");

    let commits =
        list_commits_between_tags(&repo_path, "v1.1.0", "v1.2.0").expect("list commits");
    let issues = vec![Issue::new(
        "ABC-2",
        "ABC-2",
        "Improve database connection pooling",
        "Done",
    )];

    let conn = db::get_db_connection(data_dir.path()).expect("db");
    let mods = db::load_user_modifications(&conn, &ctx.context_key()).expect("load mods");
    let summary = assemble_summary(
        &ctx,
        issues,
        commits,
        &mods,
        &default_effective_settings(),
        None,
    );

    assert!(summary.issues[0].associations.is_empty());

    // Re-matching by hand revives the pair with manual confidence.
    links::record_match(data_dir.path(), &ctx, "ABC-2", pooling_commit).expect("match");
    let mods = db::load_user_modifications(&conn, &ctx.context_key()).expect("reload mods");
    let commits =
        list_commits_between_tags(&repo_path, "v1.1.0", "v1.2.0").expect("list again");
    let issues = vec![Issue::new(
        "ABC-2",
        "ABC-2",
        "Improve database connection pooling",
        "Done",
    )];
    let summary = assemble_summary(
        &ctx,
        issues,
        commits,
        &mods,
        &default_effective_settings(),
        None,
    );

    assert_eq!(summary.issues[0].associations[0].match_type, MatchType::Manual);
}

#[test]
fn flags_recorded_through_the_command_layer_reach_the_summary() {
    let (_tmp, repo_path, _ids) = create_tagged_repo();
    let data_dir = tempfile::tempdir().expect("data dir");
    let ctx = release_context();

    links::set_flag(data_dir.path(), &ctx, "ABC-1", true).expect("flag");

    let commits =
        list_commits_between_tags(&repo_path, "v1.1.0", "v1.2.0").expect("list commits");
    let issues = vec![Issue::new("ABC-1", "ABC-1", "Login keeps failing", "Done")];

    let conn = db::get_db_connection(data_dir.path()).expect("db");
    let mods = db::load_user_modifications(&conn, &ctx.context_key()).expect("load mods");
    let summary = assemble_summary(
        &ctx,
        issues,
        commits,
        &mods,
        &default_effective_settings(),
        None,
    );

    assert!(summary.issues[0].needs_action);
}

#[tokio::test]
async fn summary_command_refuses_to_run_without_tracker_settings() {
    let data_dir = tempfile::tempdir().expect("data dir");
    save_settings_to_disk(data_dir.path(), json!({})).expect("seed settings");

    let err = build_release_summary(data_dir.path(), &release_context(), None)
        .await
        .expect_err("missing jiraBaseUrl should fail");
    assert!(err.starts_with("SETTINGS_MISSING"), "got: {err}");
}
