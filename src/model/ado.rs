use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const REL_ATTACHED_FILE: &str = "AttachedFile";
pub const REL_HYPERLINK: &str = "Hyperlink";
pub const REL_PARENT: &str = "System.LinkTypes.Hierarchy-Reverse";
pub const REL_CHILD: &str = "System.LinkTypes.Hierarchy-Forward";
pub const REL_RELATED: &str = "System.LinkTypes.Related";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResponse {
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemReference {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoWorkItem {
    pub id: u64,
    #[serde(default)]
    pub fields: AdoFields,
    /// `None` when the API left the key out, which is not the same as no links.
    pub relations: Option<Vec<Relation>>,
}

impl AdoWorkItem {
    pub fn title(&self) -> &str {
        &self.fields.title
    }

    /// Relations carrying `rel`, or `None` when the item has no relations key at all.
    pub fn relations_of(&self, rel: &str) -> Option<Vec<&Relation>> {
        self.relations
            .as_ref()
            .map(|all| all.iter().filter(|r| r.rel == rel).collect())
    }

    pub fn relation_count(&self, rel: &str) -> usize {
        self.relations_of(rel).map_or(0, |r| r.len())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdoFields {
    #[serde(rename = "System.Title", default)]
    pub title: String,
    #[serde(rename = "System.Description")]
    pub description: Option<String>,
    #[serde(rename = "System.State")]
    pub state: Option<String>,
    #[serde(rename = "System.AreaPath")]
    pub area_path: Option<String>,
    #[serde(rename = "Microsoft.VSTS.Common.Priority")]
    pub priority: Option<i64>,
    #[serde(rename = "System.AssignedTo")]
    pub assigned_to: Option<IdentityRef>,
    #[serde(rename = "System.CreatedDate")]
    pub created_date: Option<String>,
    #[serde(rename = "System.ChangedDate")]
    pub changed_date: Option<String>,
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

impl AdoFields {
    /// Raw value of a field without a typed slot (`Custom.*`, story points).
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.other.get(key).filter(|v| !v.is_null())
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match key {
            "System.Title" => Some(self.title.as_str()),
            "System.Description" => self.description.as_deref(),
            "System.State" => self.state.as_deref(),
            "System.AreaPath" => self.area_path.as_deref(),
            _ => self.value(key).and_then(Value::as_str),
        }
    }

    /// Any scalar field as JSON, typed or not.
    pub fn json(&self, key: &str) -> Option<Value> {
        match key {
            "Microsoft.VSTS.Common.Priority" => self.priority.map(Value::from),
            "System.Title" | "System.Description" | "System.State" | "System.AreaPath" => {
                self.text(key).map(Value::from)
            }
            _ => self.value(key).cloned(),
        }
    }

    pub fn identity(&self, key: &str) -> Option<IdentityRef> {
        match key {
            "System.AssignedTo" => self.assigned_to.clone(),
            _ => self
                .value(key)
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        }
    }

    pub fn timestamp(&self, key: &str) -> Option<&str> {
        match key {
            "System.CreatedDate" => self.created_date.as_deref(),
            "System.ChangedDate" => self.changed_date.as_deref(),
            _ => self.value(key).and_then(Value::as_str),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub unique_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relation {
    pub rel: String,
    pub url: String,
}

impl Relation {
    /// Id of the linked work item, taken from the URL's last path segment.
    pub fn target_id(&self) -> Option<u64> {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|id| id.parse().ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentList {
    #[serde(default)]
    pub comments: Vec<AdoComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoComment {
    #[serde(default)]
    pub text: String,
}
