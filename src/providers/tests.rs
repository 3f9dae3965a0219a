use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{AdoApi, JiraApi};
use crate::model::ado::{AdoComment, AdoWorkItem};
use crate::model::jira::{JiraIssue, JiraRemoteLink, JiraVersion};

/// An in-memory ADO project that records the calls made against it.
pub struct MockAdo {
    items: HashMap<u64, AdoWorkItem>,
    listing: Vec<u64>,
    comments: HashMap<u64, Vec<AdoComment>>,
    failing_deletes: Vec<u64>,
    deleted: Arc<Mutex<Vec<u64>>>,
    fetched: Arc<Mutex<Vec<u64>>>,
    comment_requests: Arc<Mutex<Vec<u64>>>,
}

impl MockAdo {
    /// `items` is a JSON array of work items as the REST API returns them.
    pub fn new(items: Value) -> Self {
        let items: Vec<AdoWorkItem> = serde_json::from_value(items).unwrap();
        let listing = items.iter().map(|i| i.id).collect();
        Self {
            items: items.into_iter().map(|i| (i.id, i)).collect(),
            listing,
            comments: HashMap::new(),
            failing_deletes: Vec::new(),
            deleted: Arc::new(Mutex::new(Vec::new())),
            fetched: Arc::new(Mutex::new(Vec::new())),
            comment_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_listing(mut self, ids: Vec<u64>) -> Self {
        self.listing = ids;
        self
    }

    pub fn with_comments(mut self, id: u64, texts: &[&str]) -> Self {
        let comments = texts
            .iter()
            .map(|t| AdoComment {
                text: t.to_string(),
            })
            .collect();
        self.comments.insert(id, comments);
        self
    }

    pub fn with_failing_delete(mut self, id: u64) -> Self {
        self.failing_deletes.push(id);
        self
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn fetch_requests(&self) -> Vec<u64> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn comment_requests(&self) -> Vec<u64> {
        self.comment_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdoApi for MockAdo {
    async fn query_work_item_ids(&self, _wiql: &str) -> Result<Vec<u64>> {
        Ok(self.listing.clone())
    }

    async fn get_work_item(&self, id: u64) -> Result<AdoWorkItem> {
        self.fetched.lock().unwrap().push(id);
        self.items.get(&id).cloned().context("Mock work item not found")
    }

    async fn delete_work_item(&self, id: u64) -> Result<()> {
        if self.failing_deletes.contains(&id) {
            anyhow::bail!("Mock delete failure for {id}");
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }

    async fn get_comments(&self, id: u64) -> Result<Vec<AdoComment>> {
        self.comment_requests.lock().unwrap().push(id);
        self.comments
            .get(&id)
            .cloned()
            .context("Mock comments not found")
    }
}

/// An in-memory Jira project.
pub struct MockJira {
    issues: Vec<JiraIssue>,
    releases: Vec<JiraVersion>,
    remote_links: HashMap<String, Vec<JiraRemoteLink>>,
    should_fail: bool,
    searches: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl MockJira {
    pub fn new(issues: Value) -> Self {
        Self {
            issues: serde_json::from_value(issues).unwrap(),
            releases: Vec::new(),
            remote_links: HashMap::new(),
            should_fail: false,
            searches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn with_releases(mut self, releases: Value) -> Self {
        self.releases = serde_json::from_value(releases).unwrap();
        self
    }

    pub fn with_remote_links(mut self, key: &str, links: Value) -> Self {
        self.remote_links
            .insert(key.to_string(), serde_json::from_value(links).unwrap());
        self
    }

    pub fn searches(&self) -> Vec<(String, Vec<String>)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl JiraApi for MockJira {
    async fn search_issues(&self, jql: &str, fields: &[String]) -> Result<Vec<JiraIssue>> {
        if self.should_fail {
            anyhow::bail!("Mock failure");
        }
        self.searches
            .lock()
            .unwrap()
            .push((jql.to_string(), fields.to_vec()));
        Ok(self.issues.clone())
    }

    async fn list_releases(&self, _project: &str) -> Result<Vec<JiraVersion>> {
        Ok(self.releases.clone())
    }

    async fn remote_links(&self, issue_key: &str) -> Result<Vec<JiraRemoteLink>> {
        Ok(self.remote_links.get(issue_key).cloned().unwrap_or_default())
    }
}

#[tokio::test]
async fn mock_ado_records_deletes() {
    let ado = MockAdo::new(serde_json::json!([])).with_listing(vec![3, 4]);
    ado.delete_work_item(3).await.unwrap();
    assert_eq!(ado.deleted(), vec![3]);
}

#[tokio::test]
async fn mock_ado_failing_delete_propagates() {
    let ado = MockAdo::new(serde_json::json!([])).with_failing_delete(7);
    let result = ado.delete_work_item(7).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Mock delete failure"));
    assert!(ado.deleted().is_empty());
}

#[tokio::test]
async fn apis_are_usable_as_trait_objects() {
    let ado: Box<dyn AdoApi> = Box::new(MockAdo::new(serde_json::json!([
        {"id": 1, "fields": {"System.Title": "[AB-1] a"}}
    ])));
    let jira: Box<dyn JiraApi> = Box::new(
        MockJira::new(serde_json::json!([])).with_releases(serde_json::json!([{"name": "1.0"}])),
    );

    assert_eq!(ado.query_work_item_ids("q").await.unwrap(), vec![1]);
    assert_eq!(ado.get_work_item(1).await.unwrap().title(), "[AB-1] a");
    assert!(ado.get_work_item(2).await.is_err());
    assert_eq!(jira.list_releases("AB").await.unwrap()[0].name, "1.0");
    assert!(jira.remote_links("AB-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn smoke_test_searches_with_configured_custom_fields() {
    use crate::config::VerifyConfig;
    use crate::model::user_map::UserMap;
    use crate::verify::{run_smoke_test, SmokeTest};

    let jira = MockJira::new(serde_json::json!([]));
    let ado = MockAdo::new(serde_json::json!([]));
    let test = SmokeTest {
        ado_project: "Smoke".into(),
        jira_project: "AB".into(),
        jira_url: "https://jira.acme.com".into(),
        users: UserMap::default(),
        config: VerifyConfig::default(),
    };
    run_smoke_test(&ado, &jira, &test).await.unwrap();

    let searches = jira.searches();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].0, "project = \"AB\" ORDER BY created DESC");
    assert!(searches[0].1.iter().any(|f| f == "customfield_10084"));
    assert!(searches[0].1.iter().any(|f| f == "summary"));
}

#[tokio::test]
async fn remote_links_compared_when_enabled() {
    use crate::config::VerifyConfig;
    use crate::model::user_map::UserMap;
    use crate::verify::{run_smoke_test, SmokeTest};

    let jira = MockJira::new(serde_json::json!([
        {"key": "AB-1", "fields": {"summary": "a"}}
    ]))
    .with_remote_links(
        "AB-1",
        serde_json::json!([{"id": 1, "object": {"url": "https://wiki/x", "title": "x"}}]),
    );
    let ado = MockAdo::new(serde_json::json!([{
        "id": 1,
        "fields": {
            "System.Title": "[AB-1] a",
            "System.AreaPath": "AzureDevOps-Jira-Migrator-Smoke-Tests\\Migrated"
        },
        "relations": [{"rel": "Hyperlink", "url": "https://wiki/x"}]
    }]));
    let mut config = VerifyConfig::default();
    config.check_remote_links = true;
    let test = SmokeTest {
        ado_project: "Smoke".into(),
        jira_project: "AB".into(),
        jira_url: "https://jira.acme.com".into(),
        users: UserMap::default(),
        config,
    };

    let report = run_smoke_test(&ado, &jira, &test).await.unwrap();
    assert!(report.is_success(), "{:?}", report.mismatches());
}
