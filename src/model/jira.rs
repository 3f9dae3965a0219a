use std::collections::HashMap;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// ADO rejects titles longer than this, so the migrator cuts them down.
pub const MAX_TITLE_LEN: usize = 255;
const TRUNCATED_PREFIX_LEN: usize = MAX_TITLE_LEN - 3;

/// Build the `[KEY] summary` title a migrated work item carries.
pub fn mapped_title(key: &str, summary: Option<&str>) -> String {
    format!("[{}] {}", key, summary.unwrap_or_default())
}

/// The form a mapped title takes after ADO truncation: first 252 chars plus `...`.
pub fn truncate_title(title: &str) -> String {
    let prefix: String = title.chars().take(TRUNCATED_PREFIX_LEN).collect();
    format!("{prefix}...")
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<JiraIssue>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    #[serde(default)]
    pub fields: JiraFields,
}

impl JiraIssue {
    pub fn mapped_title(&self) -> String {
        mapped_title(&self.key, self.fields.summary.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraFields {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status: Option<NamedValue>,
    pub priority: Option<NamedValue>,
    pub assignee: Option<JiraUser>,
    pub reporter: Option<JiraUser>,
    pub parent: Option<LinkedIssue>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub issuelinks: Vec<IssueLink>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subtasks: Vec<LinkedIssue>,
    #[serde(default, rename = "fixVersions", deserialize_with = "null_as_empty")]
    pub fix_versions: Vec<NamedValue>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub attachment: Option<Vec<JiraAttachment>>,
    pub comment: Option<CommentPage>,
    /// Custom fields, keyed by their `customfield_NNNNN` id.
    #[serde(flatten)]
    pub custom: HashMap<String, Value>,
}

impl JiraFields {
    /// Raw value of a non-null field that has no typed slot.
    pub fn custom(&self, key: &str) -> Option<&Value> {
        self.custom.get(key).filter(|v| !v.is_null())
    }

    /// Text of a field that may be typed (`description`) or a custom one.
    pub fn text(&self, key: &str) -> Option<&str> {
        match key {
            "description" => self.description.as_deref(),
            "summary" => self.summary.as_deref(),
            _ => self.custom(key).and_then(Value::as_str),
        }
    }

    pub fn user(&self, key: &str) -> Option<JiraUser> {
        match key {
            "assignee" => self.assignee.clone(),
            "reporter" => self.reporter.clone(),
            _ => self.decode_custom(key, "user object"),
        }
    }

    /// A list-of-objects field such as `fixVersions`. `None` when absent or null.
    pub fn named_list(&self, key: &str) -> Option<Vec<NamedValue>> {
        match key {
            "fixVersions" => Some(self.fix_versions.clone()),
            _ => self.decode_custom(key, "list of named values"),
        }
    }

    /// Decode a custom field into a typed shape, warning when it has another shape.
    fn decode_custom<T: DeserializeOwned>(&self, key: &str, expected: &str) -> Option<T> {
        let value = self.custom(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(
                    field = key,
                    error = %e,
                    "Jira field is not a {expected}, skipping check"
                );
                None
            }
        }
    }

    pub fn timestamp(&self, key: &str) -> Option<&str> {
        match key {
            "created" => self.created.as_deref(),
            "updated" => self.updated.as_deref(),
            _ => self.custom(key).and_then(Value::as_str),
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comment.as_ref().map_or(0, |c| c.comments.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedValue {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub account_id: Option<String>,
    pub email_address: Option<String>,
    pub display_name: Option<String>,
}

impl JiraUser {
    pub fn identifier(&self, field: IdentityField) -> Option<&str> {
        match field {
            IdentityField::AccountId => self.account_id.as_deref(),
            IdentityField::EmailAddress => self.email_address.as_deref(),
        }
    }
}

/// Which user attribute keys the user mapping file. Jira Cloud hides e-mail
/// addresses, so it is mapped by account id; Server/DC by e-mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    AccountId,
    EmailAddress,
}

impl IdentityField {
    pub fn for_jira_url(jira_url: &str, cloud_host_marker: &str) -> Self {
        if jira_url.contains(cloud_host_marker) {
            IdentityField::AccountId
        } else {
            IdentityField::EmailAddress
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkedIssue {
    pub key: String,
    #[serde(default)]
    pub fields: LinkedFields,
}

impl LinkedIssue {
    pub fn mapped_title(&self) -> String {
        mapped_title(&self.key, self.fields.summary.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkedFields {
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    #[serde(rename = "type")]
    pub link_type: NamedValue,
    pub inward_issue: Option<LinkedIssue>,
    pub outward_issue: Option<LinkedIssue>,
}

impl IssueLink {
    pub fn linked_issue(&self) -> Option<&LinkedIssue> {
        self.inward_issue.as_ref().or(self.outward_issue.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraAttachment {
    #[serde(default)]
    pub size: u64,
}

/// Only the number of comments matters, not their bodies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub comments: Vec<IgnoredAny>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraVersion {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraRemoteLink {
    #[serde(default)]
    pub object: RemoteLinkObject,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteLinkObject {
    pub url: Option<String>,
}
