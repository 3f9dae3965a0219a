use anyhow::{Context, Result};
use async_trait::async_trait;

use super::JiraApi;
use crate::model::jira::{JiraIssue, JiraRemoteLink, JiraVersion, SearchResponse};

/// Fields every smoke-test search asks for; custom field ids are appended.
pub const SEARCH_FIELDS: &[&str] = &[
    "attachment",
    "summary",
    "description",
    "comment",
    "assignee",
    "reporter",
    "parent",
    "issuelinks",
    "subtasks",
    "fixVersions",
    "created",
    "updated",
    "priority",
    "status",
];

pub struct JiraClient {
    base_url: String,
    auth_header: Option<String>,
    page_size: u32,
    client: reqwest::Client,
}

impl JiraClient {
    /// `auth_header` is `None` when no usable auth method was configured;
    /// requests then go out anonymously and fail on the server side.
    pub fn new(jira_url: &str, auth_header: Option<String>, page_size: u32) -> Self {
        Self {
            base_url: jira_url.trim_end_matches('/').to_string(),
            auth_header,
            page_size: page_size.max(1),
            client: reqwest::Client::new(),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.client.get(url).header("Accept", "application/json");
        match &self.auth_header {
            Some(h) => req.header("Authorization", h),
            None => req,
        }
    }

    fn search_url(&self, jql: &str, fields: &[String], start_at: u64) -> String {
        format!(
            "{}/rest/api/2/search?jql={}&fields={}&startAt={start_at}&maxResults={}",
            self.base_url,
            urlencoding::encode(jql),
            fields.join(","),
            self.page_size
        )
    }
}

/// JQL for every issue in a project, newest first.
pub fn project_jql(project: &str) -> String {
    format!("project = \"{project}\" ORDER BY created DESC")
}

/// Standard search fields followed by `custom`, without duplicates.
pub fn search_fields(custom: &[&str]) -> Vec<String> {
    let mut fields: Vec<String> = SEARCH_FIELDS.iter().map(|f| f.to_string()).collect();
    for id in custom {
        if !fields.iter().any(|f| f == id) {
            fields.push(id.to_string());
        }
    }
    fields
}

/// `startAt` of the next search page, or `None` once every issue is in.
/// An empty page ends the search regardless of `total`.
fn next_page_start(collected: usize, page_len: usize, total: Option<u64>) -> Option<u64> {
    let total = total.unwrap_or(0);
    (page_len > 0 && (collected as u64) < total).then_some(collected as u64)
}

#[async_trait]
impl JiraApi for JiraClient {
    async fn search_issues(&self, jql: &str, fields: &[String]) -> Result<Vec<JiraIssue>> {
        let mut issues = Vec::new();
        let mut start_at = 0;
        loop {
            let url = self.search_url(jql, fields, start_at);
            let page: SearchResponse = self
                .get(&url)
                .send()
                .await
                .context("Jira search request failed")?
                .error_for_status()
                .context("Jira rejected the search")?
                .json()
                .await
                .context("Failed to parse Jira search response")?;

            let fetched = page.issues.len();
            issues.extend(page.issues);
            tracing::debug!(fetched, total = ?page.total, "Fetched Jira search page");

            match next_page_start(issues.len(), fetched, page.total) {
                Some(next) => start_at = next,
                None => break,
            }
        }
        Ok(issues)
    }

    async fn list_releases(&self, project: &str) -> Result<Vec<JiraVersion>> {
        let url = format!("{}/rest/api/2/project/{project}/version?expand=*", self.base_url);
        self.get(&url)
            .send()
            .await
            .context("Jira releases request failed")?
            .error_for_status()
            .with_context(|| format!("Jira refused releases of {project}"))?
            .json()
            .await
            .context("Failed to parse Jira releases")
    }

    async fn remote_links(&self, issue_key: &str) -> Result<Vec<JiraRemoteLink>> {
        let url = format!("{}/rest/api/2/issue/{issue_key}/remotelink", self.base_url);
        self.get(&url)
            .send()
            .await
            .with_context(|| format!("Jira remote link request for {issue_key} failed"))?
            .error_for_status()
            .with_context(|| format!("Jira refused remote links of {issue_key}"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse remote links of {issue_key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_jql() {
        let client = JiraClient::new("https://acme.atlassian.net/", None, 50);
        let url = client.search_url(&project_jql("AB"), &search_fields(&[]), 0);
        assert!(url.starts_with("https://acme.atlassian.net/rest/api/2/search?jql="));
        assert!(url.contains("project%20%3D%20%22AB%22%20ORDER%20BY%20created%20DESC"));
        assert!(url.contains("&fields=attachment,summary,"));
        assert!(url.ends_with("&startAt=0&maxResults=50"));
    }

    #[test]
    fn search_fields_append_custom_ids_once() {
        let fields = search_fields(&["customfield_10066", "summary", "customfield_10066"]);
        assert_eq!(fields.len(), SEARCH_FIELDS.len() + 1);
        assert_eq!(fields.last().map(String::as_str), Some("customfield_10066"));
    }

    #[test]
    fn paging_continues_after_a_full_page() {
        assert_eq!(next_page_start(50, 50, Some(120)), Some(50));
        assert_eq!(next_page_start(100, 50, Some(120)), Some(100));
    }

    #[test]
    fn paging_stops_on_short_final_page() {
        assert_eq!(next_page_start(120, 20, Some(120)), None);
    }

    #[test]
    fn paging_stops_on_empty_page() {
        assert_eq!(next_page_start(40, 0, Some(120)), None);
    }

    #[test]
    fn paging_stops_without_total() {
        assert_eq!(next_page_start(50, 50, None), None);
    }

    #[test]
    fn page_size_is_never_zero() {
        let client = JiraClient::new("https://jira.acme.com", None, 0);
        assert!(client.search_url("x", &[], 0).ends_with("maxResults=1"));
    }
}
