use crate::correlation::keys::extract_reference_keys;
use crate::models::commit::Commit;
use git2::Repository;

/// Collect the commits reachable from `tag_to` but not from `tag_from`,
/// newest first. The offline counterpart to the GitLab compare endpoint.
pub fn list_commits_between_tags(
    repo_path: &str,
    tag_from: &str,
    tag_to: &str,
) -> Result<Vec<Commit>, String> {
    let repo = Repository::open(repo_path).map_err(|e| format!("Git error: {}", e))?;

    let to_oid = resolve_tag(&repo, tag_to)?;
    let from_oid = resolve_tag(&repo, tag_from)?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| format!("Revwalk error: {}", e))?;
    revwalk
        .push(to_oid)
        .map_err(|e| format!("Revwalk error: {}", e))?;
    revwalk
        .hide(from_oid)
        .map_err(|e| format!("Revwalk error: {}", e))?;
    revwalk.set_sorting(git2::Sort::TIME).ok();

    let mut commits = Vec::new();
    for oid in revwalk.flatten() {
        let commit = match repo.find_commit(oid) {
            Ok(c) => c,
            Err(_) => continue,
        };

        let title = commit.summary().unwrap_or("").to_string();
        let message = commit_body(commit.message().unwrap_or(""), &title);

        let id = oid.to_string();
        let short_id = id.chars().take(8).collect::<String>();

        let mut record = Commit::new(&id, &short_id, &title, &message);
        record.committed_at = Some(commit.time().seconds());
        record.explicit_reference_keys = extract_reference_keys(&title, &message);
        commits.push(record);
    }

    log::info!(
        "local git: {} commits between {} and {}",
        commits.len(),
        tag_from,
        tag_to
    );

    Ok(commits)
}

fn resolve_tag(repo: &Repository, tag: &str) -> Result<git2::Oid, String> {
    let reference = repo
        .revparse_single(tag)
        .map_err(|_| format!("TAG_NOT_FOUND: {} does not resolve in this repository", tag))?;
    // Annotated tags point at a tag object; peel down to the commit.
    reference
        .peel_to_commit()
        .map(|c| c.id())
        .map_err(|e| format!("Git error: {}", e))
}

/// Everything after the summary line, trimmed. Mirrors the split the
/// hosted API does between `title` and `message`.
fn commit_body(full_message: &str, title: &str) -> String {
    full_message
        .strip_prefix(title)
        .unwrap_or(full_message)
        .trim()
        .to_string()
}
