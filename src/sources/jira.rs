use crate::models::issue::Issue;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

const PAGE_SIZE: usize = 50;

/// Issue source backed by the Jira REST search API. Yields issue
/// records for one project + fix-version filter, already deduplicated
/// by id; pagination is handled here and invisible to callers.
pub struct JiraIssueSource {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total: usize,
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraFields,
}

#[derive(Debug, Deserialize)]
struct JiraFields {
    #[serde(default)]
    summary: String,
    status: Option<JiraStatus>,
}

#[derive(Debug, Deserialize)]
struct JiraStatus {
    name: String,
}

impl JiraIssueSource {
    pub fn new(base_url: &str, token: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("HTTP client error: {}", e))?;

        Ok(JiraIssueSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Fetch every issue of `project_key` targeted at `fix_version`,
    /// following `startAt` pages until the reported total is reached.
    pub async fn fetch_issues(
        &self,
        project_key: &str,
        fix_version: &str,
    ) -> Result<Vec<Issue>, String> {
        let jql = format!(
            "project = \"{}\" AND fixVersion = \"{}\" ORDER BY key ASC",
            project_key.trim().to_uppercase(),
            fix_version.trim()
        );

        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let mut start_at = 0usize;

        loop {
            let url = format!("{}/rest/api/2/search", self.base_url);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[
                    ("jql", jql.as_str()),
                    ("fields", "summary,status"),
                    ("startAt", &start_at.to_string()),
                    ("maxResults", &PAGE_SIZE.to_string()),
                ])
                .send()
                .await
                .map_err(|e| format!("Tracker request error: {}", e))?;

            if !response.status().is_success() {
                return Err(format!(
                    "TRACKER_ERROR: search returned HTTP {}",
                    response.status()
                ));
            }

            let page: SearchResponse = response
                .json()
                .await
                .map_err(|e| format!("Tracker response error: {}", e))?;

            let fetched = page.issues.len();
            for raw in page.issues {
                if seen.insert(raw.key.clone()) {
                    issues.push(to_issue(raw));
                }
            }

            start_at += fetched;
            if fetched == 0 || start_at >= page.total {
                break;
            }
        }

        log::info!("tracker: {} issues for {}", issues.len(), jql);
        Ok(issues)
    }
}

fn to_issue(raw: JiraIssue) -> Issue {
    let status = raw
        .fields
        .status
        .map(|s| s.name)
        .unwrap_or_else(|| "Unknown".to_string());
    // The tracker key doubles as the stable id.
    Issue::new(&raw.key, &raw.key, &raw.fields.summary, &status)
}
