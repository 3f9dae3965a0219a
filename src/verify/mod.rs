pub mod comparators;
pub mod context;
pub mod matcher;
pub mod report;

use anyhow::{Context, Result};

use crate::config::VerifyConfig;
use crate::model::ado::AdoComment;
use crate::model::cache::WorkItemCache;
use crate::model::jira::{IdentityField, JiraRemoteLink};
use crate::model::user_map::UserMap;
use crate::providers::ado::project_wiql;
use crate::providers::jira::{project_jql, search_fields};
use crate::providers::{AdoApi, JiraApi};

use self::context::{ComparisonContext, RunContext};
use self::report::{Mismatch, Report};

/// What the smoke test compares and how.
pub struct SmokeTest {
    pub ado_project: String,
    pub jira_project: String,
    pub jira_url: String,
    pub users: UserMap,
    pub config: VerifyConfig,
}

/// Fetch every work item the WIQL listing names, each id only once.
pub async fn build_cache(ado: &dyn AdoApi, project: &str) -> Result<WorkItemCache> {
    let ids = ado
        .query_work_item_ids(&project_wiql(project))
        .await
        .with_context(|| format!("Failed to list work items of {project}"))?;

    let mut cache = WorkItemCache::new();
    for id in ids {
        if cache.contains(id) {
            cache.push_listed(id);
            continue;
        }
        let item = ado.get_work_item(id).await?;
        cache.insert(item);
    }
    tracing::info!(count = cache.len(), project, "Fetched ADO work items");
    Ok(cache)
}

pub async fn run_smoke_test(ado: &dyn AdoApi, jira: &dyn JiraApi, test: &SmokeTest) -> Result<Report> {
    let config = &test.config;

    let fields = search_fields(&config.custom_field_ids());
    let issues = jira
        .search_issues(&project_jql(&test.jira_project), &fields)
        .await
        .with_context(|| format!("Failed to fetch Jira issues of {}", test.jira_project))?;
    tracing::info!(count = issues.len(), project = %test.jira_project, "Fetched Jira issues");

    let releases = match jira.list_releases(&test.jira_project).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "Could not fetch Jira releases");
            Vec::new()
        }
    };

    let cache = build_cache(ado, &test.ado_project).await?;

    let mut report = Report::new();
    if issues.len() != cache.len() {
        report.record(Mismatch::IssueCount {
            jira: issues.len(),
            ado: cache.len(),
        });
    }

    let identity = IdentityField::for_jira_url(&test.jira_url, &config.cloud_host_marker);
    let run = RunContext {
        config,
        cache: &cache,
        users: &test.users,
        releases: &releases,
        identity,
        verify_reporter: identity == IdentityField::AccountId,
    };

    let items = cache.items();
    for issue in &issues {
        let Some(item) = matcher::find_counterpart(issue, &items) else {
            if config.report_unmatched {
                report.record(Mismatch::NoCounterpart {
                    issue: issue.mapped_title(),
                });
            } else {
                tracing::debug!(issue = %issue.key, "No migrated work item found");
            }
            continue;
        };
        tracing::debug!(issue = %issue.key, work_item = item.id, "Comparing");

        let comments: Option<Vec<AdoComment>> = if issue.fields.comment_count() > 0 {
            match ado.get_comments(item.id).await {
                Ok(c) => Some(c),
                Err(e) => {
                    report.record(Mismatch::Transport {
                        issue: issue.mapped_title(),
                        what: "comments".into(),
                        reason: format!("{e:#}"),
                    });
                    None
                }
            }
        } else {
            None
        };

        let remote_links: Option<Vec<JiraRemoteLink>> = if config.check_remote_links {
            match jira.remote_links(&issue.key).await {
                Ok(l) => Some(l),
                Err(e) => {
                    report.record(Mismatch::Transport {
                        issue: issue.mapped_title(),
                        what: "remote links".into(),
                        reason: format!("{e:#}"),
                    });
                    None
                }
            }
        } else {
            None
        };

        let ctx = ComparisonContext::new(&run, issue, item)
            .with_comments(comments.as_deref())
            .with_remote_links(remote_links.as_deref());
        report.extend(comparators::compare_all(&ctx));
        report.mark_checked();
    }

    tracing::info!(
        checked = report.issues_checked(),
        mismatches = report.mismatches().len(),
        "Smoke test finished"
    );
    Ok(report)
}
