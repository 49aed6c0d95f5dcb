use crate::correlation::keys::extract_reference_keys;
use crate::models::commit::Commit;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Commit source backed by the GitLab REST API: the compare endpoint
/// yields the commits between two tags, and the project endpoint yields
/// the human-readable path used for link construction.
pub struct GitLabCommitSource {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    #[serde(default)]
    commits: Vec<GitLabCommit>,
}

#[derive(Debug, Deserialize)]
struct GitLabCommit {
    id: String,
    short_id: String,
    title: String,
    #[serde(default)]
    message: String,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    path_with_namespace: String,
}

impl GitLabCommitSource {
    pub fn new(base_url: &str, token: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("HTTP client error: {}", e))?;

        Ok(GitLabCommitSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Commits reachable from `tag_to` but not `tag_from`, as reported
    /// by the compare endpoint.
    pub async fn fetch_commits(
        &self,
        project_id: &str,
        tag_from: &str,
        tag_to: &str,
    ) -> Result<Vec<Commit>, String> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/compare",
            self.base_url, project_id
        );

        let response = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[("from", tag_from.trim()), ("to", tag_to.trim())])
            .send()
            .await
            .map_err(|e| format!("Repository request error: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "REPO_ERROR: compare returned HTTP {}",
                response.status()
            ));
        }

        let compare: CompareResponse = response
            .json()
            .await
            .map_err(|e| format!("Repository response error: {}", e))?;

        let commits: Vec<Commit> = compare.commits.into_iter().map(to_commit).collect();
        log::info!(
            "repository: {} commits between {} and {}",
            commits.len(),
            tag_from,
            tag_to
        );
        Ok(commits)
    }

    /// Human-readable project path ("group/project"), used only to
    /// build commit links in rendered summaries.
    pub async fn fetch_project_path(&self, project_id: &str) -> Result<String, String> {
        let url = format!("{}/api/v4/projects/{}", self.base_url, project_id);

        let response = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
            .map_err(|e| format!("Repository request error: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "REPO_ERROR: project lookup returned HTTP {}",
                response.status()
            ));
        }

        let project: ProjectResponse = response
            .json()
            .await
            .map_err(|e| format!("Repository response error: {}", e))?;

        Ok(project.path_with_namespace)
    }
}

fn to_commit(raw: GitLabCommit) -> Commit {
    let mut commit = Commit::new(&raw.id, &raw.short_id, &raw.title, &raw.message);
    commit.committed_at = raw
        .created_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.timestamp());
    commit.explicit_reference_keys = extract_reference_keys(&raw.title, &raw.message);
    commit
}
