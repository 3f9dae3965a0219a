use crate::config::VerifyConfig;
use crate::model::ado::{AdoComment, AdoWorkItem};
use crate::model::cache::WorkItemCache;
use crate::model::jira::{IdentityField, JiraIssue, JiraRemoteLink, JiraVersion};
use crate::model::user_map::UserMap;

/// State shared by every comparison in one smoke-test run.
pub struct RunContext<'a> {
    pub config: &'a VerifyConfig,
    pub cache: &'a WorkItemCache,
    pub users: &'a UserMap,
    pub releases: &'a [JiraVersion],
    pub identity: IdentityField,
    /// Reporters only survive migration from Jira Cloud.
    pub verify_reporter: bool,
}

/// One Jira issue paired with the work item it was migrated to.
pub struct ComparisonContext<'a> {
    pub run: &'a RunContext<'a>,
    pub issue: &'a JiraIssue,
    pub item: &'a AdoWorkItem,
    pub title: String,
    /// Fetched only when the issue has comments; `None` if not fetched.
    pub comments: Option<&'a [AdoComment]>,
    pub remote_links: Option<&'a [JiraRemoteLink]>,
}

impl<'a> ComparisonContext<'a> {
    pub fn new(run: &'a RunContext<'a>, issue: &'a JiraIssue, item: &'a AdoWorkItem) -> Self {
        Self {
            run,
            issue,
            item,
            title: issue.mapped_title(),
            comments: None,
            remote_links: None,
        }
    }

    pub fn with_comments(mut self, comments: Option<&'a [AdoComment]>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_remote_links(mut self, links: Option<&'a [JiraRemoteLink]>) -> Self {
        self.remote_links = links;
        self
    }

    pub fn config(&self) -> &VerifyConfig {
        self.run.config
    }
}
