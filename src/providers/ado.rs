use anyhow::{Context, Result};
use async_trait::async_trait;

use super::auth::ado_auth_header;
use super::AdoApi;
use crate::model::ado::{AdoComment, AdoWorkItem, CommentList, WiqlResponse};

const API_VERSION: &str = "6.0";
const COMMENTS_API_VERSION: &str = "6.0-preview.3";

pub struct AdoClient {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl AdoClient {
    pub fn new(organization_url: &str, project: &str, token: &str) -> Self {
        Self {
            base_url: format!("{}/{}", organization_url.trim_end_matches('/'), project),
            auth_header: ado_auth_header(token),
            client: reqwest::Client::new(),
        }
    }

    fn work_item_url(&self, id: u64) -> String {
        format!(
            "{}/_apis/wit/workitems/{id}?$expand=All&api-version={API_VERSION}",
            self.base_url
        )
    }
}

/// WIQL selecting every work item of a project.
pub fn project_wiql(project: &str) -> String {
    format!("SELECT [Id] FROM WorkItems WHERE [System.TeamProject] = '{project}'")
}

#[async_trait]
impl AdoApi for AdoClient {
    async fn query_work_item_ids(&self, wiql: &str) -> Result<Vec<u64>> {
        let url = format!("{}/_apis/wit/wiql?api-version={API_VERSION}", self.base_url);
        let body = serde_json::json!({ "query": wiql });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("ADO WIQL request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("ADO WIQL query rejected: {wiql}"))?;

        let result: WiqlResponse = resp
            .json()
            .await
            .context("Failed to parse ADO WIQL response")?;
        Ok(result.work_items.into_iter().map(|w| w.id).collect())
    }

    async fn get_work_item(&self, id: u64) -> Result<AdoWorkItem> {
        self.client
            .get(self.work_item_url(id))
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .send()
            .await
            .with_context(|| format!("ADO request for work item {id} failed"))?
            .error_for_status()
            .with_context(|| format!("ADO refused work item {id}"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse ADO work item {id}"))
    }

    async fn delete_work_item(&self, id: u64) -> Result<()> {
        self.client
            .delete(self.work_item_url(id))
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .send()
            .await
            .with_context(|| format!("ADO delete of work item {id} failed"))?
            .error_for_status()
            .with_context(|| format!("ADO refused to delete work item {id}"))?;
        Ok(())
    }

    async fn get_comments(&self, id: u64) -> Result<Vec<AdoComment>> {
        let url = format!(
            "{}/_apis/wit/workitems/{id}/comments?$expand=All&api-version={COMMENTS_API_VERSION}",
            self.base_url
        );
        let list: CommentList = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .send()
            .await
            .with_context(|| format!("ADO comments request for work item {id} failed"))?
            .error_for_status()
            .with_context(|| format!("ADO refused comments of work item {id}"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse comments of work item {id}"))?;
        Ok(list.comments)
    }
}
