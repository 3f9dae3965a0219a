pub mod ado;
pub mod auth;
pub mod jira;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::ado::{AdoComment, AdoWorkItem};
use crate::model::jira::{JiraIssue, JiraRemoteLink, JiraVersion};

#[async_trait]
pub trait AdoApi: Send + Sync {
    /// Run a WIQL query and return the matching work item ids in result order.
    async fn query_work_item_ids(&self, wiql: &str) -> Result<Vec<u64>>;
    async fn get_work_item(&self, id: u64) -> Result<AdoWorkItem>;
    async fn delete_work_item(&self, id: u64) -> Result<()>;
    async fn get_comments(&self, id: u64) -> Result<Vec<AdoComment>>;
}

#[async_trait]
pub trait JiraApi: Send + Sync {
    /// All issues matching `jql`, following search pages to the end.
    async fn search_issues(&self, jql: &str, fields: &[String]) -> Result<Vec<JiraIssue>>;
    async fn list_releases(&self, project: &str) -> Result<Vec<JiraVersion>>;
    async fn remote_links(&self, issue_key: &str) -> Result<Vec<JiraRemoteLink>>;
}

#[cfg(test)]
pub mod tests;
